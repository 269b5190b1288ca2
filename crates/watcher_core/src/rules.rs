use scraper::Selector;

/// Allow/deny configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRules {
    /// Accepted trailing tokens. Matched case-sensitively at the end of a
    /// candidate, after a space.
    pub suffixes: Vec<String>,
    /// UI chrome phrases. Matched case-insensitively as whole words.
    pub stopwords: Vec<String>,
    /// Optional CSS selector whose matches each hold one entity.
    pub item_selector: Option<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            suffixes: [
                "Mainnet", "Network", "Chain", "Layer 1", "Layer 2", "Layer 3", "L2", "Testnet",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            stopwords: [
                "connect wallet",
                "bridge",
                "settings",
                "select network",
                "select a network",
                "switch network",
                "wrong network",
                "unsupported network",
                "language",
                "docs",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            item_selector: None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("suffix allowlist is empty")]
    NoSuffixes,
    #[error("invalid item selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

impl ExtractionRules {
    pub(crate) fn compile_selector(&self) -> Result<Option<Selector>, RulesError> {
        match self.item_selector.as_deref() {
            None => Ok(None),
            Some(raw) => Selector::parse(raw)
                .map(Some)
                .map_err(|err| RulesError::InvalidSelector {
                    selector: raw.to_string(),
                    message: err.to_string(),
                }),
        }
    }

    /// True when `candidate` ends in an allowlisted suffix preceded by at
    /// least one other word.
    pub(crate) fn has_allowed_suffix(&self, candidate: &str) -> bool {
        self.suffixes.iter().any(|suffix| {
            candidate
                .strip_suffix(suffix.as_str())
                .and_then(|head| head.strip_suffix(' '))
                .is_some_and(|head| !head.trim().is_empty())
        })
    }

    /// True when `candidate` is, or contains as a whole-word sequence, any
    /// denylisted phrase.
    pub(crate) fn is_stopword(&self, candidate: &str) -> bool {
        let words: Vec<String> = candidate
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self.stopwords.iter().any(|stop| {
            let stop_words: Vec<String> = stop.split_whitespace().map(str::to_lowercase).collect();
            !stop_words.is_empty()
                && words
                    .windows(stop_words.len())
                    .any(|window| window == stop_words.as_slice())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_needs_a_preceding_word() {
        let rules = ExtractionRules::default();
        assert!(rules.has_allowed_suffix("Ethereum Mainnet"));
        assert!(rules.has_allowed_suffix("Arbitrum Layer 2"));
        assert!(!rules.has_allowed_suffix("Mainnet"));
        assert!(!rules.has_allowed_suffix("EthereumMainnet"));
        assert!(!rules.has_allowed_suffix("Ethereum mainnet"));
    }

    #[test]
    fn stopwords_match_whole_words_ignoring_case() {
        let rules = ExtractionRules::default();
        assert!(rules.is_stopword("Connect Wallet"));
        assert!(rules.is_stopword("Switch Network"));
        assert!(rules.is_stopword("BRIDGE Chain"));
        assert!(!rules.is_stopword("Bridgeless Chain"));
    }

    #[test]
    fn bad_selector_is_reported() {
        let rules = ExtractionRules {
            item_selector: Some("div[".to_string()),
            ..ExtractionRules::default()
        };
        assert!(matches!(
            rules.compile_selector(),
            Err(RulesError::InvalidSelector { .. })
        ));
    }
}
