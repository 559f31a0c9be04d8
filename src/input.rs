use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;

use WikiErrorExt;
use WikiResult;

const EXTENSIONS: &'static [&'static str] = &["jsonl", "jsonl.bz2", "jsonl.gz"];

/// Extractor dumps under `dir`, in path order.
pub fn dump_files(dir: &Path) -> WikiResult<Vec<PathBuf>> {
    let mut files = vec![];
    for ext in EXTENSIONS {
        let pattern = format!("{}/**/*.{}", ::glob::Pattern::escape(&dir.to_string_lossy()), ext);
        for entry in ::glob::glob(&pattern)? {
            files.push(entry?);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Open a dump file, decompressing by extension.
pub fn open(path: &Path) -> WikiResult<Box<dyn Read + Send>> {
    let file = fs::File::open(path).chain_err(|| format!("opening {}", path.display()))?;
    let name = path.to_string_lossy();
    Ok(if name.ends_with(".bz2") {
        Box::new(MultiBzDecoder::new(file))
    } else if name.ends_with(".gz") {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    })
}

/// Records of every dump in `files`, one file after another.
///
/// Each file is split into lines on its own, so a file without a trailing
/// newline does not run into the next one.
pub fn records<T: DeserializeOwned>(files: &[PathBuf]) -> DumpRecords<T> {
    DumpRecords {
        files: files.to_vec().into_iter(),
        current: None,
    }
}

pub struct DumpRecords<T> {
    files: ::std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, JsonLines<io::BufReader<Box<dyn Read + Send>>, T>)>,
}

impl<T: DeserializeOwned> Iterator for DumpRecords<T> {
    type Item = WikiResult<T>;

    fn next(&mut self) -> Option<WikiResult<T>> {
        loop {
            if let Some((ref path, ref mut lines)) = self.current {
                if let Some(record) = lines.next() {
                    return Some(record.chain_err(|| format!("reading {}", path.display())));
                }
            }
            let path = self.files.next()?;
            match open(&path) {
                Ok(read) => self.current = Some((path, JsonLines::new(io::BufReader::new(read)))),
                Err(e) => {
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// One JSON document per non-blank line.
pub struct JsonLines<R: BufRead, T> {
    lines: io::Lines<R>,
    line: usize,
    _phantom: ::std::marker::PhantomData<T>,
}

impl<R: BufRead, T: DeserializeOwned> JsonLines<R, T> {
    pub fn new(read: R) -> JsonLines<R, T> {
        JsonLines {
            lines: read.lines(),
            line: 0,
            _phantom: ::std::marker::PhantomData,
        }
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonLines<R, T> {
    type Item = WikiResult<T>;

    fn next(&mut self) -> Option<WikiResult<T>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = self.line;
            return Some(
                ::serde_json::from_str(&line).chain_err(|| format!("malformed record at line {}", line_no)),
            );
        }
    }
}
