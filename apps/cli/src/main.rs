//! savescout command line entry point.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use savescout_discovery::{Discovery, DiscoveryResult, TracingReporter};
use savescout_paths::{HostDirs, OsStrategy, TargetOs, native_target, strategy_for};
use savescout_wiki::Client;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "savescout")]
#[command(about = "Find where a game keeps its save files", long_about = None)]
#[command(version)]
struct Cli {
    /// Steam AppID or wiki page title
    game_id: String,

    /// Game executable, run under observation when no documented path is found
    #[arg(long)]
    exe: Option<PathBuf>,

    /// System to expand save templates for (windows, macos, linux)
    #[arg(long)]
    target: Option<TargetOs>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Never launch the game
    #[arg(long)]
    no_dynamic: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = config::Config::load().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(&cli, &config))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

async fn run(cli: &Cli, config: &config::Config) -> anyhow::Result<DiscoveryResult> {
    let client = Client::new(&config.user_agent, config.request_timeout())
        .context("building HTTP client")?
        .with_wiki_url(config.wiki_api_url.clone())
        .with_store_url(config.store_api_url.clone());

    let mut host = HostDirs::detect();
    for root in &config.extra_library_roots {
        if !host.steam_libraries.contains(root) {
            host.steam_libraries.push(root.clone());
        }
    }

    let target = cli.target.unwrap_or_else(native_target);
    let strategy: Arc<dyn OsStrategy> = Arc::from(strategy_for(target, host));
    tracing::info!(game_id = %cli.game_id, target = %target, "discovering save location");

    let discovery = Discovery::new(Arc::new(client), strategy)
        .with_observer_config(config.observer())
        .with_reporter(Arc::new(TracingReporter))
        .with_account_hint(config.account_hint.clone())
        .with_dynamic(!cli.no_dynamic);

    let result = discovery.discover(&cli.game_id, cli.exe.as_deref()).await?;
    Ok(result)
}

fn print_summary(result: &DiscoveryResult) {
    if let Some(title) = &result.game_title {
        println!("{title}");
    }
    println!("resolution: {}", result.resolution_strategy);

    for (os, templates) in result.candidates_by_os.iter() {
        for template in templates {
            println!("  [{os}] {template}");
        }
    }

    for path in &result.expanded_paths {
        let marker = if result.existing_paths.contains(path) {
            "*"
        } else {
            " "
        };
        println!("{marker} {path}");
    }

    for degradation in &result.degradations {
        println!("! {degradation}");
    }
}
