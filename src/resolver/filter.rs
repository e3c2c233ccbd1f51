use regex::Regex;

/// Matches dependency names against exact names or `*`/`?` globs.
#[derive(Debug, Default)]
pub struct NameFilter {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl NameFilter {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut filter = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.contains(['*', '?']) {
                match compile_glob(name) {
                    Some(regex) => filter.patterns.push(regex),
                    None => filter.exact.push(name.to_string()),
                }
            } else {
                filter.exact.push(name.to_string());
            }
        }
        filter
    }

    /// An empty filter accepts everything.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.is_empty()
            || self.exact.iter().any(|exact| exact == name)
            || self.patterns.iter().any(|regex| regex.is_match(name))
    }
}

fn compile_glob(pattern: &str) -> Option<Regex> {
    let mut regex = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '{' | '}' | '[' | ']' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            _ => regex.push(ch),
        }
    }
    regex.push('$');

    match Regex::new(&regex) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Ignoring invalid dependency pattern '{}': {}", pattern, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_accepts_all() {
        let filter = NameFilter::new::<&str>(&[]);
        assert!(filter.matches("anything"));
    }

    #[test]
    fn exact_names_are_case_sensitive() {
        let filter = NameFilter::new(&["chalk"]);
        assert!(filter.matches("chalk"));
        assert!(!filter.matches("Chalk"));
        assert!(!filter.matches("chalk-template"));
    }

    #[test]
    fn globs_match_scopes_and_prefixes() {
        let filter = NameFilter::new(&["@types/*", "eslint-plugin-?"]);
        assert!(filter.matches("@types/node"));
        assert!(filter.matches("eslint-plugin-x"));
        assert!(!filter.matches("eslint-plugin-react"));
        assert!(!filter.matches("types/node"));
    }
}
