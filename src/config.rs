use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_NESTING: usize = 64;
pub const DEFAULT_MAX_OPERATORS: usize = 256;

/// Options that change how condition text is scanned and parsed.
///
/// The default accepts variables only in bracketed form (`[name]`). Hosts that still carry rules
/// written for the older grammar can allow bare identifiers by listing the prefixes they start
/// with, e.g. `ParserConfig::legacy()`.
///
/// Parsing and evaluation recurse over the tree, so its size is capped: at most `max_nesting`
/// levels of parentheses and `max_operators` binary operators per condition. Conditions beyond
/// either limit are rejected with a syntax error. Raising them needs a correspondingly larger
/// stack on the threads that parse, evaluate and drop the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Case-insensitive prefixes a bare word must start with to be read as a variable.
    pub bare_identifier_prefixes: Vec<String>,
    pub max_nesting: usize,
    pub max_operators: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            bare_identifier_prefixes: Vec::new(),
            max_nesting: DEFAULT_MAX_NESTING,
            max_operators: DEFAULT_MAX_OPERATORS,
        }
    }
}

impl ParserConfig {
    /// Accepts bare identifiers starting with `C` or `P`, as the older grammar did.
    pub fn legacy() -> Self {
        Self::default().with_bare_identifier_prefixes(["C", "P"])
    }

    pub fn with_bare_identifier_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bare_identifier_prefixes = prefixes
            .into_iter()
            .map(|prefix| prefix.into().to_uppercase())
            .collect();
        self
    }

    pub fn with_limits(mut self, max_nesting: usize, max_operators: usize) -> Self {
        self.max_nesting = max_nesting;
        self.max_operators = max_operators;
        self
    }

    pub(crate) fn accepts_bare_identifier(&self, word: &str) -> bool {
        let upper = word.to_uppercase();
        self.bare_identifier_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && upper.starts_with(&prefix.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rejects_bare_identifiers() {
        let config = ParserConfig::default();
        for word in ["C1", "price", "P0", "A"] {
            assert!(!config.accepts_bare_identifier(word), "{}", word);
        }
    }

    #[test]
    fn test_legacy_prefixes() {
        let config = ParserConfig::legacy();
        for word in ["C1", "count", "P0", "price"] {
            assert!(config.accepts_bare_identifier(word), "{}", word);
        }
        for word in ["A", "DEMO", "x1"] {
            assert!(!config.accepts_bare_identifier(word), "{}", word);
        }
    }

    #[test]
    fn test_empty_prefix_never_matches() {
        let config = ParserConfig::default().with_bare_identifier_prefixes([""]);
        assert!(!config.accepts_bare_identifier("anything"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: ParserConfig = serde_json::from_str(r#"{"bare_identifier_prefixes": ["v"]}"#).unwrap();
        assert!(config.accepts_bare_identifier("var0"));

        let config: ParserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ParserConfig::default());

        let config: ParserConfig = serde_json::from_str(r#"{"max_nesting": 8}"#).unwrap();
        assert_eq!(config.max_nesting, 8);
        assert_eq!(config.max_operators, DEFAULT_MAX_OPERATORS);
    }
}
