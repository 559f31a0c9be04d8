//! Reshapes extractor records into the artifacts the dataset builder reads.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use serde::Serialize;

use article::ExtractedArticle;
use files;
use input;
use resolver::normalize_title;
use tokens::TokenCounter;

use WikiErrorExt;
use WikiErrorKind;
use WikiResult;

const PROGRESS_LOG_INTERVAL: usize = 10_000;

pub struct Processor<'a> {
    counter: &'a dyn TokenCounter,
    max_files: Option<usize>,
    title_to_text: BTreeMap<String, String>,
    title_to_links: BTreeMap<String, Vec<String>>,
    link_to_freq: BTreeMap<String, usize>,
    title_to_num_tokens: BTreeMap<String, usize>,
    original_title: BTreeMap<String, String>,
    redirects: BTreeMap<String, String>,
    titles_seen: HashSet<String>,
    articles_processed: usize,
}

impl<'a> Processor<'a> {
    pub fn new(counter: &'a dyn TokenCounter, max_files: Option<usize>) -> Processor<'a> {
        Processor {
            counter: counter,
            max_files: max_files,
            title_to_text: BTreeMap::new(),
            title_to_links: BTreeMap::new(),
            link_to_freq: BTreeMap::new(),
            title_to_num_tokens: BTreeMap::new(),
            original_title: BTreeMap::new(),
            redirects: BTreeMap::new(),
            titles_seen: HashSet::new(),
            articles_processed: 0,
        }
    }

    pub fn articles_processed(&self) -> usize {
        self.articles_processed
    }

    fn done(&self) -> bool {
        self.max_files.map_or(false, |max| self.articles_processed >= max)
    }

    /// Fold one record in. Records without text that are not redirects are
    /// ignored.
    pub fn add(&mut self, record: ExtractedArticle) -> WikiResult<()> {
        let title = record.title.trim().to_string();
        if title.is_empty() {
            return Ok(());
        }
        if let Some(target) = record.redirect() {
            self.claim(&title)?;
            self.redirects.insert(title, target.trim().to_string());
            return Ok(());
        }
        let text = match record.text() {
            Some(text) => text,
            None => return Ok(()),
        };
        self.claim(&title)?;
        let links = record.internal_links();
        for link in &links {
            *self.link_to_freq.entry(link.clone()).or_insert(0) += 1;
        }
        let num_tokens = self.counter
            .count(&text)
            .chain_err(|| format!("counting tokens of {}", title))?;
        self.original_title
            .entry(normalize_title(&title))
            .or_insert_with(|| title.clone());
        self.title_to_num_tokens.insert(title.clone(), num_tokens);
        self.title_to_links.insert(title.clone(), links);
        self.title_to_text.insert(title, text);
        self.articles_processed += 1;
        Ok(())
    }

    fn claim(&mut self, title: &str) -> WikiResult<()> {
        if !self.titles_seen.insert(title.to_string()) {
            bail!(WikiErrorKind::DuplicateTitle(title.to_string()));
        }
        Ok(())
    }

    pub fn process<I>(&mut self, records: I) -> WikiResult<()>
    where
        I: Iterator<Item = WikiResult<ExtractedArticle>>,
    {
        for (i, record) in records.enumerate() {
            if i % PROGRESS_LOG_INTERVAL == 0 {
                info!("Processed {} records", i);
            }
            self.add(record?)?;
            if self.done() {
                info!("reached --max-files after {} articles", self.articles_processed);
                break;
            }
        }
        info!(
            "Done processing {} articles, {} redirects",
            self.articles_processed,
            self.redirects.len()
        );
        Ok(())
    }

    pub fn save(&self, dir: &Path) -> WikiResult<()> {
        files::ensure_dir(dir)?;
        dump(&dir.join(files::TITLE_TO_TEXT), &self.title_to_text)?;
        dump(&dir.join(files::TITLE_TO_LINKS), &self.title_to_links)?;
        dump(&dir.join(files::LINK_TO_FREQ), &self.link_to_freq)?;
        dump(&dir.join(files::TITLE_TO_NUM_TOKENS), &self.title_to_num_tokens)?;
        dump(&dir.join(files::ORIGINAL_TITLE), &self.original_title)?;
        dump(&dir.join(files::REDIRECTS), &self.redirects)?;
        info!("saved artifacts to {}", dir.display());
        Ok(())
    }
}

fn dump<T: Serialize>(path: &Path, data: &T) -> WikiResult<()> {
    let file = fs::File::create(path).chain_err(|| format!("creating {}", path.display()))?;
    let mut out = io::BufWriter::new(file);
    ::serde_json::to_writer(&mut out, data)?;
    out.flush()?;
    Ok(())
}

/// Process every dump under `text_dir` into a new timestamped directory
/// below `save_dir`, returning that directory.
pub fn run(
    text_dir: &Path,
    save_dir: &Path,
    max_files: Option<usize>,
    counter: &dyn TokenCounter,
) -> WikiResult<PathBuf> {
    let dumps = input::dump_files(text_dir)?;
    if dumps.is_empty() {
        bail!("no extractor output (*.jsonl, *.jsonl.bz2, *.jsonl.gz) under {}", text_dir.display());
    }
    info!("reading {} files from {} with {} tokens", dumps.len(), text_dir.display(), counter.name());
    let mut processor = Processor::new(counter, max_files);
    processor.process(input::records(&dumps))?;
    let target = files::timestamped_dir(save_dir)?;
    processor.save(&target)?;
    Ok(target)
}
