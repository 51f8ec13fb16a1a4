//! ruleweb main entry point

use anyhow::Context;
use clap::Parser;
use ruleweb_config::error::ConfigErrorSeverity;
use ruleweb_config::Config;
use ruleweb_core::{CoreResult, Dataset, RuleListController, WindowSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "ruleweb")]
#[command(author = "Ruleweb Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Browse and filter transaction rules", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Only list rules matching on this payee id
    #[arg(short, long)]
    payee: Option<String>,

    /// Case-insensitive text filter
    #[arg(short, long, default_value = "")]
    filter: String,

    /// Extra pages to load after the first one
    #[arg(long, default_value_t = 0)]
    pages: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let rt = Runtime::new()?;
    rt.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_found = args.config.exists();
    // The logger is configured from the file, so problems are held back until it is up
    let mut config_warning = None;
    let config = if config_found {
        match Config::load_async(&args.config).await {
            Ok(config) => config,
            Err(e) if e.severity() == ConfigErrorSeverity::Warning => {
                config_warning = Some(e.to_details());
                Config::default()
            }
            Err(e) => {
                eprintln!("{}", e.to_details());
                return Err(e).with_context(|| format!("loading {}", args.config.display()));
            }
        }
    } else {
        Config::default()
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
        .init();

    if !config_found {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }
    if let Some(details) = config_warning {
        log::warn!("Ignoring {}, using defaults: {}", args.config.display(), details);
    }

    list_rules(&config, &args).await.map_err(|e| {
        eprintln!("{}", e.to_details());
        anyhow::Error::new(e).context("listing rules")
    })
}

async fn list_rules(config: &Config, args: &Args) -> CoreResult<()> {
    let rules_path = config.rules_path();
    log::info!("Reading rules from {}", rules_path.display());
    let dataset = Dataset::load(&rules_path).await?;
    let (store, lookups) = dataset.into_parts();

    let mut controller = RuleListController::new(
        Arc::new(store),
        Arc::new(lookups),
        WindowSettings::from(&config.pagination),
    );

    controller.initialize(args.payee.as_deref()).await?;
    for _ in 0..args.pages {
        if !controller.has_more() {
            break;
        }
        controller.load_more()?;
    }
    controller.set_filter(&args.filter);

    let visible = controller.filtered_rules();
    for rule in &visible {
        println!("{}\t{}", rule.id, controller.render(rule).trim());
    }
    println!(
        "{} shown, {} loaded, {} total",
        visible.len(),
        controller.window().len(),
        controller.all_rules().len()
    );

    controller.unmount();
    Ok(())
}
