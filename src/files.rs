use std::fs;
use std::path::{Path, PathBuf};

use WikiError;
use WikiErrorKind;
use WikiResult;

pub const TITLE_TO_TEXT: &'static str = "title_to_text.json";
pub const TITLE_TO_LINKS: &'static str = "title_to_links.json";
pub const LINK_TO_FREQ: &'static str = "link_to_freq.json";
pub const TITLE_TO_NUM_TOKENS: &'static str = "title_to_num_tokens.json";
pub const ORIGINAL_TITLE: &'static str = "original_title.json";
pub const REDIRECTS: &'static str = "redirects.json";
pub const DATASET: &'static str = "dataset.jsonl";
pub const LINK_EXPANSION_COUNT: &'static str = "link_expansion_count.json";

/// Directory name for a run started now, e.g. `2025-08-12-13-08-36`.
pub fn timestamp() -> WikiResult<String> {
    ::time::strftime("%Y-%m-%d-%H-%M-%S", &::time::now())
        .map_err(|e| WikiError::from(format!("formatting timestamp: {}", e)))
}

pub fn timestamped_dir(parent: &Path) -> WikiResult<PathBuf> {
    Ok(parent.join(timestamp()?))
}

/// Resolve the directory holding the processed artifacts.
///
/// `dir` may be the artifact directory itself or the parent the processor
/// writes its timestamped runs into; in that case the latest run wins.
pub fn processed_dir(dir: &Path) -> WikiResult<PathBuf> {
    if dir.join(TITLE_TO_TEXT).is_file() {
        return Ok(dir.to_path_buf());
    }
    if !dir.is_dir() {
        bail!(WikiErrorKind::NoProcessedData(dir.display().to_string()));
    }
    latest(dir)?.ok_or_else(|| WikiErrorKind::NoProcessedData(dir.display().to_string()).into())
}

/// Latest child directory of `dir` that contains a title_to_text artifact.
pub fn latest(dir: &Path) -> WikiResult<Option<PathBuf>> {
    let pattern = format!("{}/*/{}", escape(dir), TITLE_TO_TEXT);
    let mut runs = vec![];
    for entry in ::glob::glob(&pattern)? {
        let entry = entry?;
        if let Some(parent) = entry.parent() {
            runs.push(parent.to_path_buf());
        }
    }
    runs.sort();
    Ok(runs.pop())
}

pub fn ensure_dir(dir: &Path) -> WikiResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

fn escape(dir: &Path) -> String {
    ::glob::Pattern::escape(&dir.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate tempfile;

    #[test]
    fn latest_run_is_picked() {
        let root = tempfile::tempdir().unwrap();
        for run in &["2025-08-12-13-08-36", "2025-09-01-00-00-00", "2025-07-01-00-00-00"] {
            let dir = root.path().join(run);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(TITLE_TO_TEXT), "{}").unwrap();
        }
        fs::create_dir_all(root.path().join("2099-empty")).unwrap();
        let found = processed_dir(root.path()).unwrap();
        assert_eq!(found, root.path().join("2025-09-01-00-00-00"));
    }

    #[test]
    fn artifact_dir_is_used_as_is() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(TITLE_TO_TEXT), "{}").unwrap();
        assert_eq!(processed_dir(root.path()).unwrap(), root.path());
    }

    #[test]
    fn empty_dir_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let err = processed_dir(root.path()).unwrap_err();
        match *err.kind() {
            WikiErrorKind::NoProcessedData(_) => {}
            ref other => panic!("unexpected: {}", other),
        }
    }
}
