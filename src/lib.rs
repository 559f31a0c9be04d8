extern crate glob;
extern crate bzip2;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate flate2;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate num_cpus;
extern crate rayon;
extern crate itertools;
extern crate time;

#[cfg(feature = "hf-tokenizer")]
extern crate tokenizers;

pub mod files;
pub mod input;
pub mod article;
pub mod tokens;
pub mod index;
pub mod resolver;
pub mod selector;
pub mod strategy;
pub mod builder;
pub mod processor;

error_chain! {
    types { WikiError, WikiErrorKind, WikiErrorExt, WikiResult; }
    foreign_links {
        Io(::std::io::Error);
        GlobPattern(::glob::PatternError);
        Glob(::glob::GlobError);
        Serde(::serde_json::Error);
        Pool(::rayon::ThreadPoolBuildError);
    }
    errors {
        MissingArtifact(path: String) {
            description("processed artifact is missing")
            display("missing processed artifact: {}", path)
        }
        NoProcessedData(dir: String) {
            description("no processed data found")
            display("no processed data found under {}", dir)
        }
        DuplicateTitle(title: String) {
            description("duplicate article title")
            display("duplicate title: {}", title)
        }
        UnknownIncludeStrategy(name: String) {
            description("unknown include strategy")
            display("invalid include strategy: {} (expected: prepend)", name)
        }
        UnknownPolicy(flag: String, name: String) {
            description("unknown policy value")
            display("invalid value for --{}: {}", flag, name)
        }
        Tokenizer(msg: String) {
            description("tokenizer failure")
            display("tokenizer: {}", msg)
        }
        MissingArticle(title: String) {
            description("article missing from the link index")
            display("article not in the link index: {}", title)
        }
    }
}
