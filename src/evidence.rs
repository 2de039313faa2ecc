use std::sync::LazyLock;

use regex::Regex;

use crate::dates::DateParser;
use crate::models::{DateEvidence, EvidenceCategory, EvidenceSet};

pub const CONTEXT_BEFORE: usize = 50;
pub const CONTEXT_AFTER: usize = 200;

pub const LISTING_MARKER: &str = "niêm yết";
pub const TRADING_MARKER: &str = "giao dịch";

/// Ways the Ho Chi Minh City exchange is named in company histories.
///
/// One entry keeps its capitals, so it never matches lower-cased text unless
/// the vocabulary is built with [`ExchangeVocabulary::case_folded`].
pub const HOSE_VARIANTS: [&str; 7] = [
    "hose",
    "sở giao dịch chứng khoán thành phố hồ chí minh",
    "sở giao dịch chứng khoán tp. Hồ Chí Minh",
    "sở giao dịch chứng khoán tp hcm",
    "ttgd ck tp.hcm",
    "trung tâm giao dịch chứng khoán thành phố hồ chí minh",
    "sàn giao dịch chứng khoán thành phố hồ chí minh",
];

static DAY_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{2}/[0-9]{2}/[0-9]{4})\b").unwrap());
static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{2}/[0-9]{4})\b").unwrap());
static BARE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:năm\s*)?([0-9]{4})\b").unwrap());

/// A date-shaped match. `start`/`end` are char offsets of the whole match
/// (including a leading "năm"); `fragment` is the captured date text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub fragment: String,
}

/// Every match of every pattern, pattern by pattern. Spans from different
/// patterns may overlap and are all reported.
pub fn date_spans(text: &str) -> Vec<MatchSpan> {
    let mut spans = Vec::new();
    for pattern in [&*DAY_MONTH_YEAR, &*MONTH_YEAR, &*BARE_YEAR] {
        for captures in pattern.captures_iter(text) {
            let (Some(whole), Some(fragment)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            spans.push(MatchSpan {
                start: text[..whole.start()].chars().count(),
                end: text[..whole.end()].chars().count(),
                fragment: fragment.as_str().to_string(),
            });
        }
    }
    spans
}

/// 50 chars before the span and 200 chars after it, joined by a space.
pub fn context_window(chars: &[char], span: &MatchSpan) -> String {
    let before_start = span.start.saturating_sub(CONTEXT_BEFORE);
    let after_end = (span.end + CONTEXT_AFTER).min(chars.len());
    let mut window: String = chars[before_start..span.start].iter().collect();
    window.push(' ');
    if span.end < after_end {
        window.extend(&chars[span.end..after_end]);
    }
    window
}

#[derive(Debug, Clone)]
pub struct ExchangeVocabulary {
    variants: Vec<String>,
}

impl Default for ExchangeVocabulary {
    fn default() -> Self {
        Self {
            variants: HOSE_VARIANTS.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl ExchangeVocabulary {
    pub fn case_folded() -> Self {
        Self {
            variants: HOSE_VARIANTS.iter().map(|v| v.to_lowercase()).collect(),
        }
    }

    pub fn new(fold_case: bool) -> Self {
        if fold_case {
            Self::case_folded()
        } else {
            Self::default()
        }
    }

    pub fn mentioned_in(&self, text: &str) -> bool {
        self.variants.iter().any(|variant| text.contains(variant.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct DateEvidenceExtractor {
    parser: DateParser,
    vocabulary: ExchangeVocabulary,
}

impl DateEvidenceExtractor {
    pub fn new(parser: DateParser, vocabulary: ExchangeVocabulary) -> Self {
        Self { parser, vocabulary }
    }

    pub fn vocabulary(&self) -> &ExchangeVocabulary {
        &self.vocabulary
    }

    /// Dates near an exchange mention, tagged listing and/or trading by the
    /// words around them. One date may yield both categories.
    pub fn evidence(&self, text: &str) -> Vec<DateEvidence> {
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();
        let mut found = Vec::new();

        for span in date_spans(&lowered) {
            let Some(date) = self.parser.parse(&span.fragment) else {
                continue;
            };
            let window = context_window(&chars, &span);
            if !self.vocabulary.mentioned_in(&window) {
                continue;
            }
            if window.contains(LISTING_MARKER) {
                found.push(DateEvidence {
                    date,
                    category: EvidenceCategory::Listing,
                });
            }
            if window.contains(TRADING_MARKER) {
                found.push(DateEvidence {
                    date,
                    category: EvidenceCategory::Trading,
                });
            }
        }

        found
    }

    pub fn extract(&self, text: &str) -> EvidenceSet {
        let mut set = EvidenceSet::default();
        for evidence in self.evidence(text) {
            set.push(evidence);
        }
        tracing::debug!(
            listing = set.listing.len(),
            trading = set.trading.len(),
            "extracted date evidence"
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn extractor() -> DateEvidenceExtractor {
        DateEvidenceExtractor::new(DateParser::new(2026), ExchangeVocabulary::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn listing_sentence_yields_listing_only() {
        let set = extractor().extract("Niêm yết tại HOSE ngày 01/01/2015");
        assert!(set.listing.contains(&date(2015, 1, 1)));
        assert!(set.trading.is_empty());
    }

    #[test]
    fn both_markers_put_date_in_both_sets() {
        let text = "Ngày 20/07/2006 cổ phiếu chính thức niêm yết và giao dịch trên HOSE.";
        let set = extractor().extract(text);
        assert!(set.listing.contains(&date(2006, 7, 20)));
        assert!(set.trading.contains(&date(2006, 7, 20)));
    }

    #[test]
    fn overlapping_patterns_report_duplicates() {
        // The full date and its bare year both match near the same markers.
        let set = extractor().extract("Niêm yết trên HOSE ngày 15/03/2010");
        assert_eq!(set.listing, vec![date(2010, 3, 15), date(2010, 1, 1)]);
    }

    #[test]
    fn dates_without_exchange_nearby_are_dropped() {
        let text = format!(
            "Năm 2001 niêm yết tại HNX.{} Sau đó chuyển sang HOSE.",
            " ".repeat(CONTEXT_AFTER)
        );
        let set = extractor().extract(&text);
        assert!(set.listing.is_empty());
        assert!(set.trading.is_empty());
    }

    #[test]
    fn unparseable_and_future_fragments_are_skipped() {
        let set = extractor().extract("Niêm yết HOSE dự kiến năm 2099.");
        assert!(set.listing.is_empty());

        // A month/year fragment never parses; only its bare year survives.
        let set = extractor().extract("Niêm yết HOSE tháng 06/2010.");
        assert_eq!(set.listing, vec![date(2010, 1, 1)]);
    }

    #[test]
    fn capitalized_variant_only_matches_when_folded() {
        let text = "sở giao dịch chứng khoán tp. hồ chí minh";
        assert!(!ExchangeVocabulary::default().mentioned_in(text));
        assert!(ExchangeVocabulary::case_folded().mentioned_in(text));
    }

    #[test]
    fn spans_use_char_offsets_and_include_year_prefix() {
        let spans = date_spans("thành lập năm 1999");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].fragment, "1999");
        assert_eq!(spans[0].start, 10);
        assert_eq!(spans[0].end, 18);
    }

    #[test]
    fn context_window_truncates_at_text_edges() {
        let text: Vec<char> = "ab 2010 cd".chars().collect();
        let span = MatchSpan {
            start: 3,
            end: 7,
            fragment: "2010".to_string(),
        };
        assert_eq!(context_window(&text, &span), "ab   cd");

        let long: Vec<char> = std::iter::repeat('x')
            .take(60)
            .chain("2010".chars())
            .chain(std::iter::repeat('y').take(300))
            .collect();
        let span = MatchSpan {
            start: 60,
            end: 64,
            fragment: "2010".to_string(),
        };
        let window = context_window(&long, &span);
        assert_eq!(window.chars().count(), CONTEXT_BEFORE + 1 + CONTEXT_AFTER);
    }
}
