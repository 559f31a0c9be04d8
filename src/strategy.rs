use std::str::FromStr;

use selector::ExpansionRecord;
use tokens::TokenCounter;

use WikiError;
use WikiErrorKind;
use WikiResult;

/// Separates inlined articles from each other and from the source text.
pub const DELIMITER: &'static str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStrategy {
    /// Expanded articles first, in expansion order, then the source article.
    Prepend,
}

impl FromStr for IncludeStrategy {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<IncludeStrategy> {
        match s {
            "prepend" => Ok(IncludeStrategy::Prepend),
            _ => Err(WikiErrorKind::UnknownIncludeStrategy(s.to_string()).into()),
        }
    }
}

impl IncludeStrategy {
    pub fn combine(&self, record: &ExpansionRecord) -> String {
        match *self {
            IncludeStrategy::Prepend => {
                let mut parts: Vec<&str> = record.expansions.iter().map(|e| e.text).collect();
                parts.push(record.source_text);
                parts.join(DELIMITER)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    pub text: String,
    pub n_tokens: usize,
    pub truncated: bool,
}

/// Combine a record and check the result against the threshold.
///
/// The selector budgets with per-article counts; a tokenizer whose counts are
/// not additive across the delimiter may still land over, in which case the
/// combined text is cut down to the threshold.
pub fn render(
    strategy: IncludeStrategy,
    record: &ExpansionRecord,
    counter: &dyn TokenCounter,
    threshold: usize,
) -> WikiResult<Formatted> {
    let text = strategy.combine(record);
    let n_tokens = counter.count(&text)?;
    if n_tokens <= threshold {
        return Ok(Formatted {
            text: text,
            n_tokens: n_tokens,
            truncated: record.truncated(),
        });
    }
    warn!(
        "{}: combined text has {} tokens, cutting to {}",
        record.source.title, n_tokens, threshold
    );
    let text = counter.truncate(&text, threshold)?.to_string();
    let n_tokens = counter.count(&text)?;
    Ok(Formatted {
        text: text,
        n_tokens: n_tokens,
        truncated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver::{RedirectPolicy, Resolver};
    use selector::tests::{abc_index, words};
    use selector::{Limits, OverflowPolicy, Selector};
    use tokens::WordTokenizer;

    fn render_a(threshold: usize) -> Formatted {
        let index = abc_index();
        let counter = WordTokenizer::new();
        let selector = Selector::new(
            Resolver::new(&index, RedirectPolicy::Follow),
            &counter,
            Limits {
                max_link_expansions: Some(2),
                num_tokens_threshold: threshold,
                overflow: OverflowPolicy::Truncate,
            },
        );
        let record = selector.select(index.get("A").unwrap()).unwrap();
        render(IncludeStrategy::Prepend, &record, &counter, threshold).unwrap()
    }

    #[test]
    fn prepend_puts_expansions_first() {
        let out = render_a(1000);
        let expected = format!("{}\n\n{}\n\n{}", words("b", 20), words("c", 30), words("a", 10));
        assert_eq!(out.text, expected);
        assert_eq!(out.n_tokens, 60);
        assert!(!out.truncated);
    }

    #[test]
    fn prepend_with_tight_budget() {
        let out = render_a(25);
        assert_eq!(out.text, format!("{}\n\n{}", words("b", 15), words("a", 10)));
        assert_eq!(out.n_tokens, 25);
        assert!(out.truncated);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_a(1000), render_a(1000));
    }

    /// Counts every delimiter as an extra token, so per-article budgeting
    /// alone would overshoot.
    struct Lumpy(WordTokenizer);

    impl TokenCounter for Lumpy {
        fn name(&self) -> &str {
            "lumpy"
        }

        fn count(&self, text: &str) -> WikiResult<usize> {
            Ok(self.0.count(text)? + text.matches(DELIMITER).count() * 2)
        }

        fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> WikiResult<&'a str> {
            let mut cut = self.0.truncate(text, max_tokens)?;
            while self.count(cut)? > max_tokens {
                cut = self.0.truncate(cut, self.0.count(cut)? - 1)?;
            }
            Ok(cut)
        }
    }

    #[test]
    fn final_count_is_enforced() {
        let index = abc_index();
        let counter = WordTokenizer::new();
        let selector = Selector::new(
            Resolver::new(&index, RedirectPolicy::Follow),
            &counter,
            Limits {
                max_link_expansions: Some(2),
                num_tokens_threshold: 60,
                overflow: OverflowPolicy::Truncate,
            },
        );
        let record = selector.select(index.get("A").unwrap()).unwrap();
        let lumpy = Lumpy(WordTokenizer::new());
        let out = render(IncludeStrategy::Prepend, &record, &lumpy, 60).unwrap();
        assert!(out.n_tokens <= 60);
        assert!(out.truncated);
    }

    #[test]
    fn only_prepend_is_known() {
        assert_eq!("prepend".parse::<IncludeStrategy>().unwrap(), IncludeStrategy::Prepend);
        let err = "append".parse::<IncludeStrategy>().unwrap_err();
        match *err.kind() {
            WikiErrorKind::UnknownIncludeStrategy(ref s) => assert_eq!(s, "append"),
            ref other => panic!("unexpected: {}", other),
        }
    }
}
