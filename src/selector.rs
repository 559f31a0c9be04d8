//! Picks which linked articles get inlined into a source article.

use std::collections::HashSet;
use std::str::FromStr;

use article::Article;
use resolver::{Resolution, Resolver};
use strategy::DELIMITER;
use tokens::TokenCounter;

use WikiError;
use WikiErrorKind;
use WikiResult;

/// What to do with a linked article that does not fit in the remaining budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Keep as much of it as fits, then stop expanding.
    Truncate,
    /// Leave it out and keep scanning the remaining links.
    Skip,
}

impl FromStr for OverflowPolicy {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<OverflowPolicy> {
        match s {
            "truncate" => Ok(OverflowPolicy::Truncate),
            "skip" => Ok(OverflowPolicy::Skip),
            _ => Err(WikiErrorKind::UnknownPolicy("overflow-policy".to_string(), s.to_string()).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Cap on distinct inlined articles; `None` means no cap.
    pub max_link_expansions: Option<usize>,
    pub num_tokens_threshold: usize,
    pub overflow: OverflowPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expansion<'a> {
    pub title: &'a str,
    /// Index of the link in the source article's link list.
    pub position: usize,
    pub text: &'a str,
    pub tokens: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionRecord<'a> {
    pub source: &'a Article,
    pub source_text: &'a str,
    pub source_truncated: bool,
    pub expansions: Vec<Expansion<'a>>,
    /// Running token count, delimiters included.
    pub tokens: usize,
}

impl<'a> ExpansionRecord<'a> {
    pub fn truncated(&self) -> bool {
        self.source_truncated || self.expansions.iter().any(|e| e.truncated)
    }
}

pub struct Selector<'a> {
    resolver: Resolver<'a>,
    counter: &'a dyn TokenCounter,
    limits: Limits,
}

impl<'a> Selector<'a> {
    pub fn new(resolver: Resolver<'a>, counter: &'a dyn TokenCounter, limits: Limits) -> Selector<'a> {
        Selector {
            resolver: resolver,
            counter: counter,
            limits: limits,
        }
    }

    /// Walk the source's links in document order and inline what fits.
    pub fn select(&self, source: &'a Article) -> WikiResult<ExpansionRecord<'a>> {
        let threshold = self.limits.num_tokens_threshold;
        let delimiter = self.counter.count(DELIMITER)?;

        let (source_text, source_truncated, mut tokens) = if source.num_tokens > threshold {
            let text = self.counter.truncate(&source.text, threshold)?;
            (text, true, self.counter.count(text)?)
        } else {
            (source.text.as_str(), false, source.num_tokens)
        };

        let mut used: HashSet<&str> = HashSet::new();
        used.insert(&source.title);
        let mut expansions = vec![];

        for (position, link) in source.links.iter().enumerate() {
            if self.limits.max_link_expansions.map_or(false, |max| expansions.len() >= max) {
                break;
            }
            let article = match self.resolver.resolve(link) {
                Resolution::Resolved(article) => article,
                Resolution::Unresolved(reason) => {
                    debug!("{}: link {:?} skipped, {}", source.title, link, reason);
                    continue;
                }
            };
            if !used.insert(&article.title) {
                continue;
            }
            let cost = article.num_tokens + delimiter;
            if tokens + cost <= threshold {
                tokens += cost;
                expansions.push(Expansion {
                    title: &article.title,
                    position: position,
                    text: &article.text,
                    tokens: article.num_tokens,
                    truncated: false,
                });
                continue;
            }
            match self.limits.overflow {
                OverflowPolicy::Skip => {
                    debug!("{}: {} skipped, {} tokens over budget", source.title, article.title, tokens + cost - threshold);
                }
                OverflowPolicy::Truncate => {
                    let remaining = threshold.saturating_sub(tokens);
                    if remaining > delimiter {
                        let text = self.counter.truncate(&article.text, remaining - delimiter)?;
                        let kept = self.counter.count(text)?;
                        if kept > 0 {
                            tokens += kept + delimiter;
                            expansions.push(Expansion {
                                title: &article.title,
                                position: position,
                                text: text,
                                tokens: kept,
                                truncated: true,
                            });
                        }
                    }
                    break;
                }
            }
        }

        Ok(ExpansionRecord {
            source: source,
            source_text: source_text,
            source_truncated: source_truncated,
            expansions: expansions,
            tokens: tokens,
        })
    }
}
