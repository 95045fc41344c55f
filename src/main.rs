use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

use job_search_assist::commands::{self, ClearOutcome, Prompt};
use job_search_assist::{
    logging, ClickOutcome, Config, HideListStore, ObservationLoop, Page, SiteRegistry,
    SqliteValueStore,
};

#[derive(Parser)]
#[command(name = "jsa", version, about = "Hide companies you're not interested in across job boards")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite file holding the hide list (overrides config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Verbose logging, including the full list after every hide
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the persisted hide list
    Dump,
    /// Delete the hide list (asks for confirmation)
    Clear,
    /// Add a company to the hide list
    Hide { name: String },
    /// Remove every entry for a company
    Unhide { name: String },
    /// Run the hide controls over a captured page
    Apply(ApplyArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Page URL (selects the site adapter)
    #[arg(long)]
    url: String,

    /// Captured HTML
    #[arg(long)]
    html: PathBuf,

    /// Document title override
    #[arg(long)]
    title: Option<String>,

    /// `<selector>=<file>`: append the file's HTML under the first match,
    /// as the site would when scrolling
    #[arg(long = "append", value_parser = parse_fragment)]
    fragments: Vec<(String, PathBuf)>,

    /// Click the hide control of this company
    #[arg(long = "click")]
    clicks: Vec<String>,

    /// Write the resulting HTML here
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_fragment(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    // Selectors may contain `=`; file names in practice don't
    let (selector, file) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected <selector>=<file>, got `{arg}`"))?;
    if selector.is_empty() || file.is_empty() {
        return Err(format!("expected <selector>=<file>, got `{arg}`"));
    }
    Ok((selector.to_string(), PathBuf::from(file)))
}

/// Reads the confirmation from stdin; EOF counts as cancel
struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> job_search_assist::Result<Option<String>> {
        print!("{message}: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    config.debug |= cli.debug;
    logging::init(&config);

    let backend = SqliteValueStore::open(&config.database)
        .with_context(|| format!("Failed to open {}", config.database.display()))?;
    let store = HideListStore::new(backend, &config);

    match cli.command {
        Command::Dump => {
            println!("{}", commands::dump(&store)?);
        }
        Command::Clear => match commands::clear(&store, &config, &mut StdinPrompt)? {
            ClearOutcome::Cleared => {
                println!("🗑️  Hide list cleared. Reload open job board pages to show every company again.");
            }
            ClearOutcome::Aborted => println!("Aborted, nothing was deleted."),
        },
        Command::Hide { name } => {
            let entry = commands::hide(&store, &name)?;
            println!("🙈 Hidden {} at {}", entry.company_name, entry.hidden_at_iso());
        }
        Command::Unhide { name } => {
            let removed = commands::unhide(&store, &name)?;
            if removed == 0 {
                println!("{name} was not on the hide list");
            } else {
                println!("👀 Unhidden {name} ({removed} entries removed)");
            }
        }
        Command::Apply(args) => run_apply(args, store, &config).await?,
    }

    Ok(())
}

async fn run_apply(args: ApplyArgs, store: HideListStore<SqliteValueStore>, config: &Config) -> Result<()> {
    let html = fs::read_to_string(&args.html)
        .with_context(|| format!("Failed to read {}", args.html.display()))?;
    let mut page = Page::parse(args.url.as_str(), &html);
    if let Some(title) = &args.title {
        page.set_title(title);
    }

    let registry = SiteRegistry::new()?;
    let (observation, handle) = ObservationLoop::new(page, registry, store, config);
    let task = tokio::spawn(observation.run());

    for (selector, file) in args.fragments {
        let fragment = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        handle
            .mutate(move |page| match page.select_first(page.document(), &selector) {
                Ok(Some(parent)) => {
                    page.append_html(parent, &fragment);
                }
                Ok(None) => warn!(%selector, "no element to append to"),
                Err(err) => warn!(error = %err, "bad append selector"),
            })
            .await?;
    }

    for name in &args.clicks {
        match handle.hide_control(name).await? {
            Some(control) => {
                if handle.click(control).await? == ClickOutcome::Consumed {
                    println!("🙈 Hidden {name}");
                }
            }
            None => println!("⚠️  No hide control for {name} on this page"),
        }
    }

    handle.shutdown().await?;
    let summary = task.await.context("Observation loop panicked")?;

    println!("\n📊 {} passes", summary.passes.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (idx, report) in summary.passes.iter().enumerate() {
        println!("{:>3}. {}", idx + 1, report.summary());
        for failure in &report.failures {
            println!("     ⚠️  {}", failure.reason);
        }
    }

    if let Some(out) = &args.out {
        fs::write(out, summary.page.to_html())
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("\n✓ Wrote {}", out.display());
    }

    Ok(())
}
