use semver::{Version, VersionReq};

/// An npm-style version range expressed as alternatives of `semver`
/// requirements.
///
/// npm treats a bare `1.2.3` as exact and separates comparators with
/// spaces, while the `semver` crate defaults to caret and wants commas.
/// The parser bridges the two.
#[derive(Debug, Clone)]
pub struct NpmRange {
    alternatives: Vec<VersionReq>,
}

impl NpmRange {
    pub fn parse(range: &str) -> Option<Self> {
        let trimmed = range.trim();
        if matches!(trimmed, "" | "*" | "x" | "X" | "latest") {
            return Some(Self {
                alternatives: vec![VersionReq::STAR],
            });
        }

        let alternatives = trimmed
            .split("||")
            .map(Self::parse_alternative)
            .collect::<Option<Vec<_>>>()?;

        Some(Self { alternatives })
    }

    fn parse_alternative(alternative: &str) -> Option<VersionReq> {
        let tokens: Vec<&str> = alternative.split_whitespace().collect();
        if tokens.is_empty() {
            return Some(VersionReq::STAR);
        }

        // hyphen range: `1.2.3 - 2.0.0`
        if let [from, "-", to] = tokens.as_slice() {
            return VersionReq::parse(&format!(">={}, <={}", strip_v(from), strip_v(to))).ok();
        }

        let mut comparators = Vec::new();
        let mut pending_op: Option<&str> = None;
        for token in tokens {
            if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
                pending_op = Some(token);
                continue;
            }
            let comparator = match pending_op.take() {
                Some(op) => format!("{op}{}", strip_v(token)),
                None => normalize_comparator(token),
            };
            comparators.push(comparator);
        }

        VersionReq::parse(&comparators.join(", ")).ok()
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

fn strip_v(token: &str) -> &str {
    token
        .strip_prefix('v')
        .or_else(|| token.strip_prefix('='))
        .unwrap_or(token)
}

fn normalize_comparator(token: &str) -> String {
    let first = token.chars().next().unwrap_or_default();
    if matches!(first, '<' | '>' | '=' | '^' | '~') {
        return token.to_string();
    }

    let token = strip_v(token);
    let core = token.split(['-', '+']).next().unwrap_or(token);
    if core.split('.').any(|part| matches!(part, "x" | "X" | "*")) {
        token.to_string()
    } else {
        format!("={token}")
    }
}

/// First character of a range when it is a caret or tilde.
pub fn leading_wildcard(range: &str) -> &str {
    match range.trim_start().chars().next() {
        Some('^') => "^",
        Some('~') => "~",
        _ => "",
    }
}

/// Whether an installed version satisfies a target range.
///
/// Unparseable input on either side never satisfies.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Ok(version) = Version::parse(version.trim()) else {
        return false;
    };
    NpmRange::parse(range).is_some_and(|range| range.matches(&version))
}

/// Highest version in `versions` satisfying `range`.
pub fn max_satisfying<'a, I>(versions: I, range: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let range = NpmRange::parse(range)?;
    versions
        .into_iter()
        .filter_map(|raw| Version::parse(raw).ok().map(|parsed| (parsed, raw)))
        .filter(|(parsed, _)| range.matches(parsed))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw.clone())
}

/// Versions ordered newest first; entries that are not valid semver sink to
/// the end in their original order.
pub fn newest_first<'a, I>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut parsed = Vec::new();
    let mut unparsed = Vec::new();
    for raw in versions {
        match Version::parse(raw) {
            Ok(v) => parsed.push((v, raw.clone())),
            Err(_) => unparsed.push(raw.clone()),
        }
    }
    parsed.sort_by(|(a, _), (b, _)| b.cmp(a));
    parsed
        .into_iter()
        .map(|(_, raw)| raw)
        .chain(unparsed)
        .collect()
}
