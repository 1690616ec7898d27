use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dde_scrape::TagRegistry;
use dde_yomitan::CompileOptions;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use dde_lexicon::banks::{write_conjugation_bank, write_frequency_bank, write_term_bank};
use dde_lexicon::run::{DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES};
use dde_lexicon::{DirectorySource, Pipeline, RunOptions, SkipList, Store, Throttle, read_key_list};

const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

#[derive(Parser)]
#[command(name = "dde", about = "Student dictionary lexicon pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract saved pages for every key into the record store.
    Extract {
        /// Key list, one lookup key per line.
        #[arg(long, env = "DDE_KEYS", default_value = "dde_keys.txt")]
        keys: PathBuf,
        /// Directory of saved `<key>.html` pages.
        #[arg(long, env = "DDE_PAGES_DIR", default_value = "pages")]
        pages: PathBuf,
        #[arg(long, env = "DDE_STORE", default_value = "term_bank_0.jsonl")]
        store: PathBuf,
        /// Keys that could not be processed; not attempted again.
        #[arg(long, env = "DDE_UNRESOLVED", default_value = "unfound_words.txt")]
        unresolved: PathBuf,
        /// Where `grammar_tags.csv`, `usage_tags.csv` and `geo_tags.csv` go.
        #[arg(long, env = "DDE_TAGS_DIR", default_value = ".")]
        tags_dir: PathBuf,
        #[arg(long, env = "DDE_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
        #[arg(long, env = "DDE_MAX_RETRIES")]
        max_retries: Option<String>,
        #[arg(long, env = "DDE_RATE_LIMIT_RPS")]
        rate_limit_rps: Option<String>,
        #[arg(long, env = "DDE_RATE_LIMIT_BURST")]
        rate_limit_burst: Option<String>,
    },
    /// Compile the record store into a term bank.
    Compile {
        #[arg(long, env = "DDE_STORE", default_value = "term_bank_0.jsonl")]
        store: PathBuf,
        #[arg(long, default_value = "term_bank_1.json")]
        output: PathBuf,
    },
    /// Build a frequency bank from a tab-separated lemma listing.
    Frequency {
        input: PathBuf,
        #[arg(long, default_value = "term_meta_bank_0.json")]
        output: PathBuf,
    },
    /// Render conjugation tables (`[{word, table}]`) into verb rows.
    Conjugation {
        input: PathBuf,
        #[arg(long, default_value = "term_bank_1.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Command::Extract {
            keys,
            pages,
            store,
            unresolved,
            tags_dir,
            base_url,
            max_retries,
            rate_limit_rps,
            rate_limit_burst,
        } => {
            let max_retries = positive_or(max_retries, DEFAULT_MAX_RETRIES);
            let rate_limit_rps = positive_or(rate_limit_rps, DEFAULT_RATE_LIMIT_RPS);
            let rate_limit_burst = positive_or(rate_limit_burst, DEFAULT_RATE_LIMIT_BURST);
            info!("reading pages from {}", pages.display());
            info!("fetch base url {base_url}, {max_retries} attempts per key");
            info!("rate limit: {rate_limit_rps} req/s (burst {rate_limit_burst})");

            let keys = read_key_list(&keys)?;
            let mut source = DirectorySource::new(pages);
            let mut pipeline = Pipeline {
                source: &mut source,
                throttle: Throttle::new(rate_limit_rps, rate_limit_burst),
                store: Store::open(&store)?,
                skip: SkipList::load(&unresolved)?,
                registry: TagRegistry::new(),
                options: RunOptions {
                    base_url,
                    max_retries,
                },
            };
            pipeline.run(&keys)?;
            pipeline.finish(&tags_dir)?;
        }
        Command::Compile { store, output } => {
            let rows = write_term_bank(&store, &output, &CompileOptions::default())?;
            info!("{rows} rows");
        }
        Command::Frequency { input, output } => {
            let rows = write_frequency_bank(&input, &output)?;
            info!("{rows} ranked lemmas");
        }
        Command::Conjugation { input, output } => {
            let rows = write_conjugation_bank(&input, &output)?;
            info!("{rows} conjugation tables");
        }
    }

    info!("done in {} ms", start.elapsed().as_millis());
    Ok(())
}

/// Parse a numeric setting; missing, malformed or zero values use `default`.
fn positive_or(raw: Option<String>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
