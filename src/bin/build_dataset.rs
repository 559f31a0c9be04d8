extern crate wiki_expanded;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process;

use clap::{App, Arg, ArgMatches};

use wiki_expanded::builder::{BuildOptions, DatasetBuilder, FailurePolicy};
use wiki_expanded::files;
use wiki_expanded::index::LinkIndex;
use wiki_expanded::resolver::RedirectPolicy;
use wiki_expanded::selector::{Limits, OverflowPolicy};
use wiki_expanded::strategy::IncludeStrategy;
use wiki_expanded::tokens::TokenizerSpec;
use wiki_expanded::{WikiErrorExt, WikiResult};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = App::new("build_dataset")
        .about("Build the expanded Wikipedia dataset")
        .arg(Arg::with_name("processed-dir")
            .long("processed-dir")
            .takes_value(true)
            .default_value("data/processed")
            .help("Processed artifacts, or the directory holding timestamped runs of them"))
        .arg(Arg::with_name("save-dir")
            .long("save-dir")
            .takes_value(true)
            .default_value("data/final")
            .help("The dataset goes to a new timestamped directory below this one"))
        .arg(Arg::with_name("output-dir")
            .long("output-dir")
            .takes_value(true)
            .help("Write the dataset exactly here, ignoring --save-dir"))
        .arg(Arg::with_name("num-tokens-threshold")
            .long("num-tokens-threshold")
            .takes_value(true)
            .default_value("10000")
            .help("Upper bound on the token count of one entry"))
        .arg(Arg::with_name("max-link-expansions")
            .long("max-link-expansions")
            .takes_value(true)
            .help("Upper bound on distinct articles inlined into one entry (default: no bound)"))
        .arg(Arg::with_name("include-strategy")
            .long("include-strategy")
            .takes_value(true)
            .default_value("prepend")
            .help("Where expanded text goes relative to the source text"))
        .arg(Arg::with_name("overflow-policy")
            .long("overflow-policy")
            .takes_value(true)
            .default_value("truncate")
            .help("truncate: cut the first article that does not fit and stop; skip: leave it out and keep scanning"))
        .arg(Arg::with_name("redirect-policy")
            .long("redirect-policy")
            .takes_value(true)
            .default_value("follow")
            .help("follow: links to redirects resolve to their target; unresolved: they are skipped"))
        .arg(Arg::with_name("failure-policy")
            .long("failure-policy")
            .takes_value(true)
            .default_value("unexpanded")
            .help("skip: drop articles whose expansion fails; unexpanded: emit them without expansions"))
        .arg(Arg::with_name("tokenizer")
            .long("tokenizer")
            .takes_value(true)
            .default_value("words")
            .help("words, or hf:<tokenizer.json>"))
        .arg(Arg::with_name("max-dataset-length")
            .long("max-dataset-length")
            .takes_value(true)
            .help("Maximum number of samples in the dataset (default: all)"))
        .arg(Arg::with_name("ignore-short-samples")
            .long("ignore-short-samples")
            .help("Drop samples with fewer tokens than the threshold"))
        .arg(Arg::with_name("workers")
            .long("workers")
            .takes_value(true)
            .help("Worker threads (default: one more than the CPU count)"))
        .get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        process::exit(1);
    }
}

fn number(matches: &ArgMatches, name: &str) -> WikiResult<Option<usize>> {
    match matches.value_of(name) {
        Some(v) => Ok(Some(v.parse::<usize>().chain_err(|| format!("--{}: not a number: {}", name, v))?)),
        None => Ok(None),
    }
}

fn options(matches: &ArgMatches) -> WikiResult<BuildOptions> {
    let threshold = number(matches, "num-tokens-threshold")?.unwrap_or(10_000);
    if threshold == 0 {
        return Err("--num-tokens-threshold must be positive".into());
    }
    let workers = number(matches, "workers")?.unwrap_or_else(BuildOptions::default_workers);
    Ok(BuildOptions {
        include_strategy: matches.value_of("include-strategy").unwrap_or("prepend").parse::<IncludeStrategy>()?,
        limits: Limits {
            max_link_expansions: number(matches, "max-link-expansions")?,
            num_tokens_threshold: threshold,
            overflow: matches.value_of("overflow-policy").unwrap_or("truncate").parse::<OverflowPolicy>()?,
        },
        redirect_policy: matches.value_of("redirect-policy").unwrap_or("follow").parse::<RedirectPolicy>()?,
        failure_policy: matches.value_of("failure-policy").unwrap_or("unexpanded").parse::<FailurePolicy>()?,
        max_dataset_length: number(matches, "max-dataset-length")?,
        ignore_short_samples: matches.is_present("ignore-short-samples"),
        workers: workers.max(1),
    })
}

fn run(matches: &ArgMatches) -> WikiResult<()> {
    let options = options(matches)?;
    let tokenizer = matches.value_of("tokenizer").unwrap_or("words").parse::<TokenizerSpec>()?;
    let counter = tokenizer.build()?;

    let processed = files::processed_dir(&PathBuf::from(matches.value_of("processed-dir").unwrap_or("data/processed")))?;
    let target = match matches.value_of("output-dir") {
        Some(dir) => PathBuf::from(dir),
        None => files::timestamped_dir(&PathBuf::from(matches.value_of("save-dir").unwrap_or("data/final")))?,
    };
    info!("{:?}", options);

    let index = LinkIndex::load(&processed, &*counter)?;
    let builder = DatasetBuilder::new(&index, &*counter, options);
    let report = builder.build_to_dir(&target)?;
    info!(
        "{} of {} titles written to {}",
        report.samples,
        report.titles,
        target.display()
    );
    Ok(())
}
