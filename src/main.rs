use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podmirror::{
    CatalogClient, LizhiClient, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, SqliteStore, SyncRequest, XimalayaClient, rebuild_feed, sync_show,
    validate_source_url,
};

// Emoji with fallback for terminals without Unicode support
static RADIO: Emoji<'_, '_> = Emoji("📻 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static PAGE: Emoji<'_, '_> = Emoji("📄 ", "[p] ");
static DISK: Emoji<'_, '_> = Emoji("💾 ", "[s] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");

/// Mirror audio shows from streaming platforms into RSS podcast feeds
#[derive(Parser, Debug)]
#[command(name = "podmirror")]
#[command(about = "Mirror audio shows from streaming platforms into RSS podcast feeds")]
#[command(version)]
struct Cli {
    /// SQLite database holding mirrored shows and episodes
    #[arg(long, global = true, default_value = "podcasts.db")]
    db: PathBuf,

    /// Directory the <show_id>.xml feeds are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror an album from ximalaya.com
    #[command(visible_alias = "xi")]
    Ximalaya(SourceArgs),

    /// Mirror a user channel from lizhi.fm
    #[command(visible_alias = "lz")]
    Lizhi(SourceArgs),

    /// Regenerate a show's feed from the database without touching the network
    Rebuild {
        /// ID of a show that has been synced before
        show_id: String,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Show page URL; its last path segment is the show ID
    #[arg(long)]
    url: String,

    /// Crawl the full history even if the show was synced before
    #[arg(long)]
    all: bool,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SyncStarting { provider, show_id } => {
                self.bar.set_message(format!(
                    "{SEARCH}Fetching {} show {}",
                    provider.to_string().bold(),
                    show_id.cyan()
                ));
            }

            ProgressEvent::PolicyDecided {
                show_title,
                known_show,
                fetch_all,
            } => {
                self.bar.println(format!(
                    "{HEADPHONES}{} • {}, {}",
                    show_title.bold().green(),
                    if known_show {
                        "known show".normal()
                    } else {
                        "new show".yellow()
                    },
                    if fetch_all {
                        "crawling full history".cyan()
                    } else {
                        "latest page only".cyan()
                    }
                ));
            }

            ProgressEvent::FetchingPage { page } => {
                self.bar
                    .set_message(format!("{PAGE}Fetching page {}", page.to_string().cyan()));
            }

            ProgressEvent::PageFetched {
                page,
                episode_count,
                total_pages,
            } => {
                let of_total = total_pages
                    .map(|total| format!("/{total}"))
                    .unwrap_or_default();
                self.bar.set_message(format!(
                    "{PAGE}Page {}{} • {} episodes",
                    page.to_string().cyan(),
                    of_total.cyan(),
                    episode_count.to_string().green()
                ));
            }

            ProgressEvent::PageSkipped { page, error } => {
                self.bar.println(format!(
                    "{WARNING}{} {} - {}",
                    "Skipped page".yellow(),
                    page.to_string().yellow(),
                    error.dimmed()
                ));
            }

            ProgressEvent::EpisodeFetched { episode_title } => {
                self.bar
                    .set_message(format!("{PAGE}{}", truncate_title(&episode_title, 50)));
            }

            ProgressEvent::Persisting { episode_count } => {
                self.bar.set_message(format!(
                    "{DISK}Saving {} episodes",
                    episode_count.to_string().cyan()
                ));
            }

            ProgressEvent::FeedWritten { path, item_count } => {
                self.bar.println(format!(
                    "{SUCCESS}Feed written: {} ({} items)",
                    path.display().to_string().cyan(),
                    item_count.to_string().green()
                ));
            }

            ProgressEvent::FeedFailed { error } => {
                self.bar
                    .println(format!("{FAILURE}{} {}", "Feed not written:".red(), error.red()));
            }

            ProgressEvent::SyncCompleted {
                episode_count,
                pages_fetched,
                pages_skipped,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} episodes from {} pages, {} skipped",
                    "Sync complete:".bold().green(),
                    episode_count.to_string().green().bold(),
                    pages_fetched.to_string().cyan(),
                    if pages_skipped > 0 {
                        pages_skipped.to_string().red().bold()
                    } else {
                        pages_skipped.to_string().green()
                    }
                );
            }
        }
    }
}

/// Shorten a title to `max_chars` characters, counting chars rather than bytes
fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("podmirror=info,warn"),
            1 => EnvFilter::new("podmirror=debug,info"),
            2 => EnvFilter::new("podmirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_sync(
    client: &dyn CatalogClient,
    store: &mut SqliteStore,
    args: SourceArgs,
    output_dir: &Path,
    reporter: SharedProgressReporter,
) -> Result<()> {
    validate_source_url(&args.url).map_err(anyhow::Error::msg)?;

    let request = SyncRequest {
        source_url: args.url,
        fetch_all: args.all,
        output_dir: output_dir.to_path_buf(),
    };

    let result = sync_show(client, store, &request, reporter)
        .await
        .with_context(|| format!("Failed to sync {}", request.source_url))?;

    if let Some(error) = result.feed_error {
        bail!("Show {} was synced but its feed was not written: {error}", result.show_id);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if !cli.quiet {
        println!(
            "\n{}{} {}\n",
            RADIO,
            "podmirror".bold().magenta(),
            "- Show Mirror".dimmed()
        );
    }

    let mut store = SqliteStore::open(&cli.db)
        .with_context(|| format!("Failed to open database {}", cli.db.display()))?;

    let reporter: SharedProgressReporter = if cli.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    match cli.command {
        Command::Ximalaya(args) => {
            let http = ReqwestClient::new().context("Failed to build HTTP client")?;
            let client = XimalayaClient::new(http);
            run_sync(&client, &mut store, args, &cli.output_dir, reporter).await?;
        }

        Command::Lizhi(args) => {
            let http = ReqwestClient::new().context("Failed to build HTTP client")?;
            let client = LizhiClient::new(http);
            run_sync(&client, &mut store, args, &cli.output_dir, reporter).await?;
        }

        Command::Rebuild { show_id } => {
            let output = rebuild_feed(&store, &show_id, &cli.output_dir)
                .with_context(|| format!("Failed to rebuild feed for {show_id}"))?;

            if !cli.quiet {
                println!(
                    "{SUCCESS}Feed written: {} ({} items)",
                    output.path.display().to_string().cyan(),
                    output.item_count.to_string().green()
                );
            }
        }
    }

    Ok(())
}
