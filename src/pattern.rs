//! Wildcard name patterns
//!
//! A pattern is a comma-separated list of alternatives. Each alternative is
//! matched case-insensitively against the whole name; `*` and `%` stand for
//! any run of characters. An empty pattern matches everything.

use regex::Regex;

use crate::error::{Result, SchemaError};

/// Convert a single wildcard alternative into an anchored, case-insensitive regex
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::from("(?i)^");
    let mut in_wildcard = false;
    for (i, literal) in pattern.trim().split(['*', '%']).enumerate() {
        if i > 0 && !in_wildcard {
            out.push_str(".*");
        }
        in_wildcard = literal.is_empty() && i > 0;
        out.push_str(&regex::escape(literal));
    }
    out.push('$');
    out
}

/// A compiled, comma-separated wildcard pattern
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    alternatives: Vec<Regex>,
}

impl WildcardPattern {
    /// Compile a pattern such as `"orders,user*"`
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in pattern.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let regex = Regex::new(&wildcard_to_regex(part)).map_err(|source| {
                SchemaError::Pattern {
                    pattern: part.to_string(),
                    source,
                }
            })?;
            alternatives.push(regex);
        }
        Ok(Self {
            source: pattern.to_string(),
            alternatives,
        })
    }

    /// Pattern that accepts every name
    pub fn any() -> Self {
        Self {
            source: String::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The literal text of each alternative with wildcards removed
    pub fn literals(&self) -> Vec<String> {
        self.source
            .split(',')
            .map(|p| p.trim().replace(['*', '%'], ""))
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn matches(&self, value: &str) -> bool {
        self.is_match_all() || self.alternatives.iter().any(|re| re.is_match(value))
    }
}

/// One-shot match of `value` against a comma-separated wildcard pattern
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    WildcardPattern::parse(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}
