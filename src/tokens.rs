//! Token counting used for budgeting expansions.
//!
//! Every counter must be deterministic and monotonic: appending text never
//! lowers the count. The same counter instance is used for a whole run.

use std::str::FromStr;

use regex::Regex;

use WikiError;
use WikiErrorKind;
use WikiResult;

pub trait TokenCounter: Send + Sync {
    fn name(&self) -> &str;

    fn count(&self, text: &str) -> WikiResult<usize>;

    /// Longest prefix of `text` holding at most `max_tokens` tokens.
    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> WikiResult<&'a str>;
}

/// Splits on words and individual punctuation marks.
///
/// Counts are additive over whitespace joins, so `count(a + "\n\n" + b)` is
/// `count(a) + count(b)`.
pub struct WordTokenizer {
    re: Regex,
}

impl WordTokenizer {
    pub fn new() -> WordTokenizer {
        WordTokenizer {
            re: Regex::new(r"\w+|[^\w\s]").unwrap(),
        }
    }
}

impl Default for WordTokenizer {
    fn default() -> WordTokenizer {
        WordTokenizer::new()
    }
}

impl TokenCounter for WordTokenizer {
    fn name(&self) -> &str {
        "words"
    }

    fn count(&self, text: &str) -> WikiResult<usize> {
        Ok(self.re.find_iter(text).count())
    }

    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> WikiResult<&'a str> {
        if max_tokens == 0 {
            return Ok("");
        }
        Ok(match self.re.find_iter(text).nth(max_tokens - 1) {
            Some(m) => &text[..m.end()],
            None => text,
        })
    }
}

#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenizer {
    name: String,
    inner: ::tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenizer {
    pub fn from_file(path: &str) -> WikiResult<HfTokenizer> {
        let inner = ::tokenizers::Tokenizer::from_file(path)
            .map_err(|e| WikiErrorKind::Tokenizer(format!("loading {}: {}", path, e)))?;
        Ok(HfTokenizer {
            name: format!("hf:{}", path),
            inner: inner,
        })
    }

    fn encode(&self, text: &str) -> WikiResult<::tokenizers::Encoding> {
        self.inner
            .encode(text, false)
            .map_err(|e| WikiErrorKind::Tokenizer(e.to_string()).into())
    }
}

#[cfg(feature = "hf-tokenizer")]
impl TokenCounter for HfTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self, text: &str) -> WikiResult<usize> {
        Ok(self.encode(text)?.get_ids().len())
    }

    fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> WikiResult<&'a str> {
        if max_tokens == 0 {
            return Ok("");
        }
        let encoding = self.encode(text)?;
        let offsets = encoding.get_offsets();
        if offsets.len() <= max_tokens {
            return Ok(text);
        }
        let mut end = offsets[max_tokens - 1].1.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Ok(&text[..end])
    }
}

/// Which counter to build, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenizerSpec {
    Words,
    HuggingFace(String),
}

impl FromStr for TokenizerSpec {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<TokenizerSpec> {
        if s == "words" {
            Ok(TokenizerSpec::Words)
        } else if s.starts_with("hf:") && s.len() > 3 {
            Ok(TokenizerSpec::HuggingFace(s[3..].to_string()))
        } else {
            Err(WikiErrorKind::UnknownPolicy("tokenizer".to_string(), s.to_string()).into())
        }
    }
}

impl TokenizerSpec {
    pub fn build(&self) -> WikiResult<Box<dyn TokenCounter>> {
        match *self {
            TokenizerSpec::Words => Ok(Box::new(WordTokenizer::new())),
            TokenizerSpec::HuggingFace(ref path) => hf_tokenizer(path),
        }
    }
}

#[cfg(feature = "hf-tokenizer")]
fn hf_tokenizer(path: &str) -> WikiResult<Box<dyn TokenCounter>> {
    Ok(Box::new(HfTokenizer::from_file(path)?))
}

#[cfg(not(feature = "hf-tokenizer"))]
fn hf_tokenizer(path: &str) -> WikiResult<Box<dyn TokenCounter>> {
    bail!(WikiErrorKind::Tokenizer(format!(
        "{}: built without the hf-tokenizer feature",
        path
    )))
}
