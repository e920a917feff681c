use regex::Regex;

use crate::error::{Error, Result};

/// A compiled container-identifier pattern.
///
/// Uses extended regular expression syntax and reports match/no-match only. Matching is
/// case-sensitive and unanchored: `web` matches `my-web-1`, `^web$` only matches `web`.
///
/// The dialect is that of the [`regex`] crate, not strict POSIX ERE. Bracket expressions and
/// classes such as `[[:digit:]]` behave the same, but:
///
/// - a backslash inside brackets escapes (`[\.]` matches only `.`, never `\`)
/// - backreferences such as `\1` are rejected as invalid
/// - Perl classes such as `\d` and `\w` are accepted
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the expression does not compile.
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_owned(),
            regex,
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        self.regex.is_match(id)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_match() {
        let pattern = Pattern::compile("web").unwrap();
        assert!(pattern.matches("web"));
        assert!(pattern.matches("my-web-1"));
        assert!(!pattern.matches("db"));
    }

    #[test]
    fn test_anchors_and_classes() {
        let pattern = Pattern::compile("^web-[0-9]+$").unwrap();
        assert!(pattern.matches("web-12"));
        assert!(!pattern.matches("web-12a"));
        assert!(!pattern.matches("x-web-12"));
    }

    #[test]
    fn test_case_sensitive() {
        let pattern = Pattern::compile("^Web").unwrap();
        assert!(!pattern.matches("web"));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let pattern = Pattern::compile("").unwrap();
        assert!(pattern.matches("anything"));
    }

    #[test]
    fn test_dialect_differences() {
        let pattern = Pattern::compile(r"^a[\.]b$").unwrap();
        assert!(pattern.matches("a.b"));
        assert!(!pattern.matches(r"a\b"));

        assert!(Pattern::compile(r"^web\d+$").unwrap().matches("web7"));
        assert!(Pattern::compile("^web[[:digit:]]+$").unwrap().matches("web7"));
        assert!(matches!(
            Pattern::compile(r"(a)\1"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Pattern::compile("web[").unwrap_err();
        match err {
            Error::InvalidPattern { pattern, .. } => assert_eq!(pattern, "web["),
            other => panic!("unexpected error: {other}"),
        }
    }
}
