use std::fmt;

use crate::extract::normalize_candidate;
use crate::ExtractionRules;

pub const MIN_NAME_CHARS: usize = 3;
pub const MAX_NAME_CHARS: usize = 40;

/// A normalized, validated network name such as `Ethereum Mainnet`.
///
/// Ordering is lexicographic on the normalized text, which is also the
/// display order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkName(String);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("empty candidate")]
    Empty,
    #[error("length {len} outside {MIN_NAME_CHARS}..={MAX_NAME_CHARS}")]
    Length { len: usize },
    #[error("denylisted phrase")]
    Stopword,
    #[error("no allowlisted suffix")]
    Suffix,
}

impl NetworkName {
    /// Normalizes `raw` and checks it against `rules`.
    pub fn parse(raw: &str, rules: &ExtractionRules) -> Result<Self, NameError> {
        let normalized = normalize_candidate(raw);
        if normalized.is_empty() {
            return Err(NameError::Empty);
        }
        let len = normalized.chars().count();
        if !(MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&len) {
            return Err(NameError::Length { len });
        }
        if rules.is_stopword(&normalized) {
            return Err(NameError::Stopword);
        }
        if !rules.has_allowed_suffix(&normalized) {
            return Err(NameError::Suffix);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<NetworkName, NameError> {
        NetworkName::parse(raw, &ExtractionRules::default())
    }

    #[test]
    fn collapses_and_trims_whitespace() {
        let name = parse("  Polygon \t  Network \n").unwrap();
        assert_eq!(name.as_str(), "Polygon Network");
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert_eq!(parse("   "), Err(NameError::Empty));
        let long = format!("{} Mainnet", "x".repeat(40));
        assert_eq!(parse(&long), Err(NameError::Length { len: 48 }));
    }

    #[test]
    fn rejects_chrome_and_unsuffixed_text() {
        assert_eq!(parse("Wrong Network"), Err(NameError::Stopword));
        assert_eq!(parse("Connect Wallet"), Err(NameError::Stopword));
        assert_eq!(parse("Ethereum"), Err(NameError::Suffix));
    }
}
