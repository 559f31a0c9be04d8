extern crate wiki_expanded;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::path::Path;
use std::process;

use clap::{App, Arg, ArgMatches};

use wiki_expanded::processor;
use wiki_expanded::tokens::TokenizerSpec;
use wiki_expanded::{WikiErrorExt, WikiResult};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = App::new("process")
        .about("Process extracted articles into the artifacts build_dataset reads")
        .arg(Arg::with_name("text-dir")
            .long("text-dir")
            .takes_value(true)
            .default_value("data/raw/text")
            .help("Directory of extractor output (*.jsonl, optionally .bz2 or .gz)"))
        .arg(Arg::with_name("save-dir")
            .long("save-dir")
            .takes_value(true)
            .default_value("data/processed")
            .help("Artifacts go to a new timestamped directory below this one"))
        .arg(Arg::with_name("max-files")
            .long("max-files")
            .takes_value(true)
            .help("Maximum number of articles to process (default: all)"))
        .arg(Arg::with_name("tokenizer")
            .long("tokenizer")
            .takes_value(true)
            .default_value("words")
            .help("words, or hf:<tokenizer.json>"))
        .get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> WikiResult<()> {
    let max_files = match matches.value_of("max-files") {
        Some(v) => Some(v.parse::<usize>().chain_err(|| format!("--max-files: not a number: {}", v))?),
        None => None,
    };
    let counter = matches.value_of("tokenizer").unwrap_or("words").parse::<TokenizerSpec>()?.build()?;
    let text_dir = Path::new(matches.value_of("text-dir").unwrap_or("data/raw/text"));
    let save_dir = Path::new(matches.value_of("save-dir").unwrap_or("data/processed"));
    let target = processor::run(text_dir, save_dir, max_files, &*counter)?;
    info!("artifacts written to {}", target.display());
    Ok(())
}
