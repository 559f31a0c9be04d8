//! The link index: every article by title, built once per run and only read
//! afterwards.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use rayon::prelude::*;
use serde::de::DeserializeOwned;

use article::{is_disambiguation, Article};
use files;
use resolver::normalize_title;
use tokens::TokenCounter;

use WikiErrorExt;
use WikiErrorKind;
use WikiResult;

#[derive(Debug, Default)]
pub struct LinkIndex {
    articles: HashMap<String, Article>,
    original_titles: HashMap<String, String>,
    redirects: HashMap<String, String>,
}

impl LinkIndex {
    /// Load the processor artifacts found in `dir`.
    ///
    /// Token counts are recomputed with `counter` so budgeting and final
    /// validation agree on the same scheme.
    pub fn load(dir: &Path, counter: &dyn TokenCounter) -> WikiResult<LinkIndex> {
        let texts: HashMap<String, String> = read_artifact(dir, files::TITLE_TO_TEXT)?;
        let links: HashMap<String, Vec<String>> = read_artifact(dir, files::TITLE_TO_LINKS)?;
        let redirects: HashMap<String, String> = read_optional_artifact(dir, files::REDIRECTS)?;
        let original: HashMap<String, String> = read_optional_artifact(dir, files::ORIGINAL_TITLE)?;
        info!(
            "loaded {} articles, {} link lists, {} redirects from {}",
            texts.len(),
            links.len(),
            redirects.len(),
            dir.display()
        );
        LinkIndex::from_parts(texts, links, redirects, original, counter)
    }

    pub fn from_parts(
        texts: HashMap<String, String>,
        mut links: HashMap<String, Vec<String>>,
        redirects: HashMap<String, String>,
        original: HashMap<String, String>,
        counter: &dyn TokenCounter,
    ) -> WikiResult<LinkIndex> {
        let pending: Vec<(String, String, Vec<String>)> = texts
            .into_iter()
            .map(|(title, text)| {
                let outbound = links.remove(&title).unwrap_or_else(|| {
                    debug!("no link list for {}", title);
                    vec![]
                });
                (title, text, outbound)
            })
            .collect();
        let articles: Vec<Article> = pending
            .into_par_iter()
            .map(|(title, text, outbound)| -> WikiResult<Article> {
                let num_tokens = counter
                    .count(&text)
                    .chain_err(|| format!("counting tokens of {}", title))?;
                let disambiguation = is_disambiguation(&title, &text);
                Ok(Article {
                    title: title,
                    text: text,
                    links: outbound,
                    num_tokens: num_tokens,
                    disambiguation: disambiguation,
                })
            })
            .collect::<WikiResult<_>>()?;

        let mut titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        titles.sort();
        let mut original_titles: HashMap<String, String> = original
            .into_iter()
            .map(|(k, v)| (normalize_title(&k), v))
            .collect();
        for title in titles {
            original_titles
                .entry(normalize_title(title))
                .or_insert_with(|| title.to_string());
        }
        let redirects = redirects
            .into_iter()
            .map(|(from, to)| (normalize_title(&from), to))
            .collect();

        Ok(LinkIndex {
            articles: articles.into_iter().map(|a| (a.title.clone(), a)).collect(),
            original_titles: original_titles,
            redirects: redirects,
        })
    }

    pub fn get(&self, title: &str) -> WikiResult<&Article> {
        self.articles
            .get(title)
            .ok_or_else(|| WikiErrorKind::MissingArticle(title.to_string()).into())
    }

    pub fn lookup(&self, title: &str) -> Option<&Article> {
        self.articles.get(title)
    }

    pub fn original_title(&self, normalized: &str) -> Option<&str> {
        self.original_titles.get(normalized).map(|s| s.as_str())
    }

    pub fn redirect(&self, title: &str) -> Option<&str> {
        self.redirects.get(&normalize_title(title)).map(|s| s.as_str())
    }

    /// All titles, sorted.
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.articles.keys().map(|t| t.as_str()).collect();
        titles.sort();
        titles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> WikiResult<T> {
    let path = dir.join(name);
    let file = match fs::File::open(&path) {
        Ok(file) => file,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            bail!(WikiErrorKind::MissingArtifact(path.display().to_string()))
        }
        Err(e) => return Err(e).chain_err(|| format!("opening {}", path.display())),
    };
    ::serde_json::from_reader(io::BufReader::new(file))
        .chain_err(|| format!("malformed artifact {}", path.display()))
}

fn read_optional_artifact<T: DeserializeOwned + Default>(dir: &Path, name: &str) -> WikiResult<T> {
    if dir.join(name).exists() {
        read_artifact(dir, name)
    } else {
        debug!("optional artifact {} absent", name);
        Ok(T::default())
    }
}
