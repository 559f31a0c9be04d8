//! Turns every article of the link index into one dataset entry.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

use rayon;
use rayon::prelude::*;

use article::Article;
use files;
use index::LinkIndex;
use resolver::{RedirectPolicy, Resolver};
use selector::{Limits, Selector};
use strategy::{render, IncludeStrategy};
use tokens::TokenCounter;

use WikiError;
use WikiErrorExt;
use WikiErrorKind;
use WikiResult;

const CHUNK: usize = 1000;

/// What happens to an article whose expansion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave it out of the dataset.
    Skip,
    /// Emit its own text, truncated to the threshold, with no expansions.
    Unexpanded,
}

impl FromStr for FailurePolicy {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<FailurePolicy> {
        match s {
            "skip" => Ok(FailurePolicy::Skip),
            "unexpanded" => Ok(FailurePolicy::Unexpanded),
            _ => Err(WikiErrorKind::UnknownPolicy("failure-policy".to_string(), s.to_string()).into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub include_strategy: IncludeStrategy,
    pub limits: Limits,
    pub redirect_policy: RedirectPolicy,
    pub failure_policy: FailurePolicy,
    pub max_dataset_length: Option<usize>,
    pub ignore_short_samples: bool,
    pub workers: usize,
}

impl BuildOptions {
    pub fn default_workers() -> usize {
        1 + ::num_cpus::get()
    }
}

/// One line of `dataset.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub title: String,
    pub n_words: usize,
    pub n_tokens: usize,
    pub links_expanded: Vec<String>,
    pub n_links_expanded: usize,
    pub truncated: bool,
    pub expanded_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub titles: usize,
    pub samples: usize,
    pub failed: usize,
    pub dropped_short: usize,
    pub link_expansion_count: BTreeMap<String, usize>,
}

pub struct DatasetBuilder<'a> {
    index: &'a LinkIndex,
    counter: &'a dyn TokenCounter,
    options: BuildOptions,
}

enum Outcome {
    Sample(Sample),
    Fallback(Sample),
    Failed,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(index: &'a LinkIndex, counter: &'a dyn TokenCounter, options: BuildOptions) -> DatasetBuilder<'a> {
        DatasetBuilder {
            index: index,
            counter: counter,
            options: options,
        }
    }

    fn selector(&self) -> Selector<'a> {
        Selector::new(
            Resolver::new(self.index, self.options.redirect_policy),
            self.counter,
            self.options.limits,
        )
    }

    /// Expand a single article.
    pub fn expand(&self, article: &'a Article) -> WikiResult<Sample> {
        let threshold = self.options.limits.num_tokens_threshold;
        let record = self.selector().select(article)?;
        let formatted = render(self.options.include_strategy, &record, self.counter, threshold)?;
        Ok(Sample {
            title: article.title.clone(),
            n_words: formatted.text.split_whitespace().count(),
            n_tokens: formatted.n_tokens,
            links_expanded: record.expansions.iter().map(|e| e.title.to_string()).collect(),
            n_links_expanded: record.expansions.len(),
            truncated: formatted.truncated,
            expanded_text: formatted.text,
        })
    }

    fn unexpanded(&self, article: &Article) -> WikiResult<Sample> {
        let threshold = self.options.limits.num_tokens_threshold;
        let text = self.counter.truncate(&article.text, threshold)?;
        let n_tokens = self.counter.count(text)?;
        Ok(Sample {
            title: article.title.clone(),
            n_words: text.split_whitespace().count(),
            n_tokens: n_tokens,
            links_expanded: vec![],
            n_links_expanded: 0,
            truncated: text.len() < article.text.len(),
            expanded_text: text.to_string(),
        })
    }

    fn outcome(&self, title: &str) -> Outcome {
        let attempt = self.index.get(title).and_then(|article| self.expand(article));
        let err = match attempt {
            Ok(sample) => return Outcome::Sample(sample),
            Err(err) => err,
        };
        warn!("{}: expansion failed: {}", title, err);
        if self.options.failure_policy == FailurePolicy::Skip {
            return Outcome::Failed;
        }
        match self.index.get(title).and_then(|article| self.unexpanded(article)) {
            Ok(sample) => Outcome::Fallback(sample),
            Err(err) => {
                warn!("{}: dropped, {}", title, err);
                Outcome::Failed
            }
        }
    }

    fn full(&self, report: &BuildReport) -> bool {
        self.options.max_dataset_length.map_or(false, |max| report.samples >= max)
    }

    /// Expand every article, writing one JSON line per sample to `out`.
    ///
    /// Articles are handled in title order, a chunk at a time on the worker
    /// pool; each chunk is written in input order so the output does not
    /// depend on scheduling.
    pub fn build<W: Write>(&self, mut out: W) -> WikiResult<BuildReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()?;
        let titles = self.index.titles();
        let threshold = self.options.limits.num_tokens_threshold;
        let mut report = BuildReport {
            titles: titles.len(),
            ..BuildReport::default()
        };
        info!(
            "expanding {} articles on {} workers",
            titles.len(),
            self.options.workers
        );

        'chunks: for (i, chunk) in titles.chunks(CHUNK).enumerate() {
            if self.full(&report) {
                break;
            }
            let outcomes: Vec<Outcome> =
                pool.install(|| chunk.par_iter().map(|title| self.outcome(title)).collect());
            for outcome in outcomes {
                let sample = match outcome {
                    Outcome::Sample(sample) => sample,
                    Outcome::Fallback(sample) => {
                        report.failed += 1;
                        sample
                    }
                    Outcome::Failed => {
                        report.failed += 1;
                        continue;
                    }
                };
                if self.options.ignore_short_samples && sample.n_tokens < threshold {
                    report.dropped_short += 1;
                    continue;
                }
                for link in &sample.links_expanded {
                    *report.link_expansion_count.entry(link.clone()).or_insert(0) += 1;
                }
                ::serde_json::to_writer(&mut out, &sample)?;
                out.write_all(b"\n")?;
                report.samples += 1;
                if self.full(&report) {
                    break 'chunks;
                }
            }
            info!(
                "Processed {}/{} titles",
                i * CHUNK + chunk.len(),
                titles.len()
            );
        }
        out.flush()?;
        info!(
            "wrote {} samples ({} failed, {} too short)",
            report.samples, report.failed, report.dropped_short
        );
        Ok(report)
    }

    /// Build into `dir`: `dataset.jsonl` and `link_expansion_count.json`.
    pub fn build_to_dir(&self, dir: &Path) -> WikiResult<BuildReport> {
        files::ensure_dir(dir)?;
        let dataset = dir.join(files::DATASET);
        let out = fs::File::create(&dataset).chain_err(|| format!("creating {}", dataset.display()))?;
        let report = self.build(io::BufWriter::new(out))?;

        let counts = dir.join(files::LINK_EXPANSION_COUNT);
        let mut out = io::BufWriter::new(fs::File::create(&counts)?);
        ::serde_json::to_writer_pretty(&mut out, &report.link_expansion_count)?;
        out.flush()?;
        info!("dataset written to {}", dir.display());
        Ok(report)
    }
}
