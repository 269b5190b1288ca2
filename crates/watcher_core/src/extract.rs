//! Extraction pipeline: raw content -> text fragments -> boundary split ->
//! normalization -> allow/deny filtering -> deduplicated [`Snapshot`].
//!
//! Every stage is a plain function so it can be exercised on literal
//! fixture strings without a live page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node, Selector};

use engine_logging::engine_trace;

use crate::{ExtractionRules, NetworkName, RulesError, Snapshot};

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|•·,;\t\r\n]+| {2,}").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("raw content is empty")]
    EmptyInput,
}

/// Collapses runs of whitespace to a single space and trims both ends.
pub fn normalize_candidate(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Splits raw content into text fragments.
///
/// Markup is parsed; with an item selector each matching element yields one
/// fragment, otherwise each run of visible text under one block element
/// does. Plain text is split on line breaks.
pub fn collect_text(raw: &str, item_selector: Option<&Selector>) -> Vec<String> {
    if !raw.contains('<') {
        return raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    let doc = Html::parse_document(raw);
    let fragments: Vec<String> = match item_selector {
        Some(selector) => doc
            .select(selector)
            .map(|el| {
                el.text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect(),
        None => {
            // Consecutive text under the same block element is one fragment,
            // so inline markup inside a name does not break it apart.
            let mut fragments = Vec::new();
            let mut block = None;
            let mut buffer = String::new();
            for node in doc.root_element().descendants() {
                let Some(text) = node.value().as_text() else {
                    continue;
                };
                let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                    Node::Element(el) => SKIPPED_ELEMENTS.contains(&el.name()),
                    _ => false,
                });
                if hidden {
                    continue;
                }
                let owner = node
                    .ancestors()
                    .find(|ancestor| match ancestor.value() {
                        Node::Element(el) => !INLINE_ELEMENTS.contains(&el.name()),
                        _ => false,
                    })
                    .map(|ancestor| ancestor.id());
                if owner != block {
                    fragments.push(std::mem::take(&mut buffer));
                    block = owner;
                }
                buffer.push_str(text);
            }
            fragments.push(buffer);
            fragments
        }
    };

    fragments
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Splits a fragment into candidates.
///
/// Breaks on separator characters and on a standalone suffix token that runs
/// straight into an uppercase letter or digit (`Ethereum MainnetBase Chain`).
pub fn split_boundaries(fragment: &str, suffixes: &[String]) -> Vec<String> {
    SEPARATORS
        .split(fragment)
        .flat_map(|piece| split_concatenated(piece, suffixes))
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn split_concatenated<'a>(piece: &'a str, suffixes: &[String]) -> Vec<&'a str> {
    let mut cuts: Vec<usize> = suffixes
        .iter()
        .filter(|suffix| !suffix.is_empty())
        .flat_map(|suffix| {
            piece
                .match_indices(suffix.as_str())
                .map(move |(start, _)| (start, start + suffix.len()))
        })
        .filter(|&(start, end)| {
            let standalone = piece[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
            let runs_on = piece[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
            standalone && runs_on
        })
        .map(|(_, end)| end)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut from = 0;
    for cut in cuts {
        pieces.push(&piece[from..cut]);
        from = cut;
    }
    pieces.push(&piece[from..]);
    pieces
}

/// Turns raw page content into the canonical set of network names.
#[derive(Debug, Clone)]
pub struct NetworkExtractor {
    rules: ExtractionRules,
    item_selector: Option<Selector>,
}

impl NetworkExtractor {
    pub fn new(rules: ExtractionRules) -> Result<Self, RulesError> {
        if rules.suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(RulesError::NoSuffixes);
        }
        let item_selector = rules.compile_selector()?;
        Ok(Self {
            rules,
            item_selector,
        })
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Runs the full pipeline. No matches is an empty snapshot, not an error.
    pub fn extract(&self, raw: &str) -> Result<Snapshot, ExtractionError> {
        if raw.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let snapshot: Snapshot = collect_text(raw, self.item_selector.as_ref())
            .iter()
            .flat_map(|fragment| split_boundaries(fragment, &self.rules.suffixes))
            .filter_map(|candidate| match NetworkName::parse(&candidate, &self.rules) {
                Ok(name) => Some(name),
                Err(reason) => {
                    engine_trace!("Dropped candidate {:?}: {}", candidate, reason);
                    None
                }
            })
            .collect();
        Ok(snapshot)
    }

    /// Re-validates names loaded from elsewhere (e.g. a persisted state
    /// file), dropping any that no longer pass the rules.
    pub fn accept_names<I, S>(&self, names: I) -> Snapshot
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| NetworkName::parse(name.as_ref(), &self.rules).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        ExtractionRules::default().suffixes
    }

    #[test]
    fn splits_concatenated_names() {
        assert_eq!(
            split_boundaries("Ethereum MainnetPolygon NetworkBase Chain", &suffixes()),
            vec!["Ethereum Mainnet", "Polygon Network", "Base Chain"]
        );
    }

    #[test]
    fn splits_on_digit_runs_and_separators() {
        assert_eq!(
            split_boundaries("Arbitrum Layer 2 | Zora Network1 Extra Chain", &suffixes()),
            vec!["Arbitrum Layer 2", "Zora Network", "1 Extra Chain"]
        );
    }

    #[test]
    fn does_not_split_inside_words() {
        assert_eq!(
            split_boundaries("ChainX Network", &suffixes()),
            vec!["ChainX Network"]
        );
    }

    #[test]
    fn plain_text_is_split_by_line() {
        assert_eq!(
            collect_text("  one\n\n two  \n", None),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn markup_skips_scripts() {
        let html = "<html><body><script>var x = 'Fake Chain';</script><p>Real Chain</p></body></html>";
        assert_eq!(collect_text(html, None), vec!["Real Chain".to_string()]);
    }

    #[test]
    fn inline_markup_stays_in_one_fragment() {
        let html = "<div><div>Dyor <b>Mainnet</b></div><div>Top<div>Nested</div>Tail</div></div>";
        assert_eq!(
            collect_text(html, None),
            vec!["Dyor Mainnet", "Top", "Nested", "Tail"]
        );
    }

    #[test]
    fn empty_suffix_list_is_rejected() {
        let rules = ExtractionRules {
            suffixes: vec![" ".to_string()],
            ..ExtractionRules::default()
        };
        assert_eq!(NetworkExtractor::new(rules).unwrap_err(), RulesError::NoSuffixes);
    }
}
