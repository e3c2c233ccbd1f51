use std::fmt;
use std::str::FromStr;

/// Breaking-change risk of moving from one version spec to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Major,
    Minor,
    Patch,
    #[default]
    None,
}

impl Severity {
    /// Sort rank, more severe first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Major => 0,
            Severity::Minor => 1,
            Severity::Patch => 2,
            Severity::None => 3,
        }
    }

    pub fn color(self) -> Option<colored::Color> {
        match self {
            Severity::Major => Some(colored::Color::Red),
            Severity::Minor => Some(colored::Color::Yellow),
            Severity::Patch => Some(colored::Color::Green),
            Severity::None => None,
        }
    }

    fn from_split_index(index: usize) -> Self {
        match index {
            0 => Severity::Major,
            1 => Severity::Minor,
            2 => Severity::Patch,
            _ => Severity::None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Major => "major",
            Severity::Minor => "minor",
            Severity::Patch => "patch",
            Severity::None => "",
        };
        f.write_str(label)
    }
}

/// Parses an update type filter; `none` is not a selectable type.
impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Severity::Major),
            "minor" => Ok(Severity::Minor),
            "patch" => Ok(Severity::Patch),
            other => Err(format!(
                "unknown update type '{other}' (expected major, minor or patch)"
            )),
        }
    }
}

/// Range operator shared by both sides of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wildcard {
    #[default]
    None,
    Caret,
    Tilde,
}

impl Wildcard {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(Wildcard::Caret),
            '~' => Some(Wildcard::Tilde),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Wildcard::None => "",
            Wildcard::Caret => "^",
            Wildcard::Tilde => "~",
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing two version specs, split for highlighting.
///
/// `uncolored` is the common prefix of the compared parts and `colored` is
/// everything from the first differing part onward.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionDiff {
    pub severity: Severity,
    pub wildcard: Wildcard,
    pub split_index: usize,
    pub uncolored: String,
    pub colored: String,
    part_count: usize,
}

impl VersionDiff {
    pub fn none() -> Self {
        Self::default()
    }

    /// The dot joining `uncolored` and `colored`, when both are non-empty.
    pub fn separator(&self) -> &'static str {
        if self.split_index > 0 && self.split_index < self.part_count {
            "."
        } else {
            ""
        }
    }

    pub fn is_change(&self) -> bool {
        self.severity != Severity::None
    }

    /// Plain-text rendering, e.g. `^1.3.0`.
    pub fn text(&self) -> String {
        format!(
            "{}{}{}{}",
            self.wildcard,
            self.uncolored,
            self.separator(),
            self.colored
        )
    }
}

/// Classify the upgrade from `current` to `upgrade`, splitting the upgrade
/// spec for display.
pub fn classify(current: Option<&str>, upgrade: Option<&str>) -> VersionDiff {
    compare(current, upgrade, Side::Upgrade)
}

/// Same classification as [`classify`] but with the current spec split
/// for display.
pub fn classify_current(current: Option<&str>, upgrade: Option<&str>) -> VersionDiff {
    compare(current, upgrade, Side::Current)
}

#[derive(Clone, Copy)]
enum Side {
    Current,
    Upgrade,
}

fn compare(current: Option<&str>, upgrade: Option<&str>, side: Side) -> VersionDiff {
    let (current, upgrade) = match (current, upgrade) {
        (Some(c), Some(u)) if !c.is_empty() && !u.is_empty() => (c, u),
        _ => return VersionDiff::none(),
    };

    let shared = upgrade
        .chars()
        .next()
        .and_then(Wildcard::from_char)
        .filter(|_| current.chars().next() == upgrade.chars().next());

    let (wildcard, current, upgrade) = match shared {
        Some(wildcard) => (wildcard, &current[1..], &upgrade[1..]),
        None => (Wildcard::None, current, upgrade),
    };

    let upgrade_parts: Vec<&str> = upgrade.split('.').collect();
    let current_parts: Vec<&str> = current.split('.').collect();

    let split_index = upgrade_parts
        .iter()
        .enumerate()
        .position(|(i, part)| current_parts.get(i) != Some(part))
        .unwrap_or(upgrade_parts.len());

    let unchanged = split_index == upgrade_parts.len();
    let unstable = upgrade_parts.first() == Some(&"0");
    let severity = if unchanged {
        Severity::None
    } else if unstable {
        Severity::Major
    } else {
        Severity::from_split_index(split_index)
    };

    let parts = match side {
        Side::Current => current_parts,
        Side::Upgrade => upgrade_parts,
    };
    let split = split_index.min(parts.len());

    VersionDiff {
        severity,
        wildcard,
        split_index,
        uncolored: parts[..split].join("."),
        colored: parts[split..].join("."),
        part_count: parts.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_differing_part() {
        let cases = [
            ("1.2.3", "2.0.0", Severity::Major, 0),
            ("1.2.3", "1.3.0", Severity::Minor, 1),
            ("1.2.3", "1.2.4", Severity::Patch, 2),
            ("^1.2.3", "^2.0.0", Severity::Major, 0),
            ("^1.2.3", "^1.4.0", Severity::Minor, 1),
            ("~1.2.3", "~1.2.9", Severity::Patch, 2),
            ("1.2.3", "1.2.3", Severity::None, 3),
            ("^4.17.21", "^4.17.21", Severity::None, 3),
        ];

        for (current, upgrade, severity, split) in cases {
            let diff = classify(Some(current), Some(upgrade));
            assert_eq!(diff.severity, severity, "{current} -> {upgrade}");
            assert_eq!(diff.split_index, split, "{current} -> {upgrade}");
        }
    }

    #[test]
    fn major_only_changes_split_at_zero() {
        for (current, upgrade) in [("1.0.0", "2.0.0"), ("3.4.5", "10.4.5"), ("^7.1.1", "^8.1.1")] {
            let diff = classify(Some(current), Some(upgrade));
            assert_eq!(diff.severity, Severity::Major);
            assert_eq!(diff.split_index, 0);
        }
    }

    #[test]
    fn zero_major_is_always_major_when_changed() {
        assert_eq!(
            classify(Some("0.1.2"), Some("0.1.3")).severity,
            Severity::Major
        );
        assert_eq!(
            classify(Some("^0.4.0"), Some("^0.5.0")).severity,
            Severity::Major
        );
    }

    #[test]
    fn identical_specs_are_none() {
        for spec in ["1.0.0", "^2.3.4", "~0.1.0", "0.0.1"] {
            assert_eq!(classify(Some(spec), Some(spec)).severity, Severity::None);
        }
    }

    #[test]
    fn missing_input_yields_empty_diff() {
        assert_eq!(classify(None, Some("1.0.0")), VersionDiff::none());
        assert_eq!(classify(Some("1.0.0"), None), VersionDiff::none());
        assert_eq!(classify(Some(""), Some("1.0.0")), VersionDiff::none());
    }

    #[test]
    fn wildcard_only_applies_when_shared() {
        let shared = classify(Some("^1.0.0"), Some("^1.1.0"));
        assert_eq!(shared.wildcard, Wildcard::Caret);
        assert_eq!(shared.uncolored, "1");
        assert_eq!(shared.colored, "1.0");

        let mismatched = classify(Some("~1.0.0"), Some("^1.1.0"));
        assert_eq!(mismatched.wildcard, Wildcard::None);
        assert_eq!(mismatched.severity, Severity::Major);

        let exact = classify(Some("1.0.0"), Some("^1.0.0"));
        assert_eq!(exact.wildcard, Wildcard::None);
    }

    #[test]
    fn display_parts_reconstruct_upgrade() {
        for (current, upgrade) in [
            ("^1.2.0", "^1.3.0"),
            ("~2.0.1", "~2.0.5"),
            ("^1.2.0", "^2.0.0"),
            ("1.0.0", "1.0.0"),
        ] {
            let diff = classify(Some(current), Some(upgrade));
            assert_eq!(diff.text(), upgrade);
            let body = format!("{}{}{}", diff.wildcard, diff.uncolored, diff.colored);
            assert_eq!(body.replace('.', ""), upgrade.replace('.', ""));
        }
    }

    #[test]
    fn separator_only_between_parts() {
        assert_eq!(classify(Some("1.2.3"), Some("1.2.4")).separator(), ".");
        assert_eq!(classify(Some("1.2.3"), Some("2.0.0")).separator(), "");
        assert_eq!(classify(Some("1.2.3"), Some("1.2.3")).separator(), "");
    }

    #[test]
    fn current_side_splits_current_parts() {
        let diff = classify_current(Some("^1.2.3"), Some("^1.4.0"));
        assert_eq!(diff.uncolored, "1");
        assert_eq!(diff.colored, "2.3");
        assert_eq!(diff.severity, Severity::Minor);
    }

    #[test]
    fn malformed_specs_do_not_panic() {
        let diff = classify(Some("latest"), Some("^"));
        assert_eq!(diff.wildcard, Wildcard::None);
        let diff = classify(Some("^"), Some("^"));
        assert_eq!(diff.severity, Severity::None);
        let diff = classify(Some("1.x"), Some("1.2.3"));
        assert_eq!(diff.severity, Severity::Minor);
    }

    #[test]
    fn identical_short_specs_are_unchanged() {
        for spec in ["^", "1", "1.2", "~1.2", "latest", "0.1"] {
            let diff = classify(Some(spec), Some(spec));
            assert_eq!(diff.severity, Severity::None, "{spec}");
            assert!(!diff.is_change());
        }
        assert_eq!(classify(Some("1.2"), Some("1.3")).severity, Severity::Minor);
    }

    #[test]
    fn parses_update_types() {
        assert_eq!("Major".parse::<Severity>(), Ok(Severity::Major));
        assert_eq!(" patch".parse::<Severity>(), Ok(Severity::Patch));
        assert!("none".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_rank_orders_most_severe_first() {
        let mut all = [Severity::None, Severity::Patch, Severity::Major, Severity::Minor];
        all.sort_by_key(|s| s.rank());
        assert_eq!(
            all,
            [Severity::Major, Severity::Minor, Severity::Patch, Severity::None]
        );
    }
}
