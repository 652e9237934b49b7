//! followup-engine CLI
//!
//! Filters follow-up and CRM task listings, shows date-range windows, and
//! edits the persisted cart.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use followup_engine::cli::cart::{CartArgs, run_cart};
use followup_engine::cli::filter::FilterArgs;
use followup_engine::cli::{BucketsArgs, Cli, Command};
use followup_engine::config::{Config, ConfigLoader};
use followup_engine::engine::FilterEngine;
use followup_engine::error::FollowUpError;
use followup_engine::format::{
    OutputFormat, buckets_json, format_buckets_markdown, format_list_markdown,
};
use followup_engine::ingest::{IngestMode, Ingestor};
use followup_engine::logging::{self, LogTarget};
use followup_engine::store::JsonFileStore;
use followup_engine::types::TaskKind;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = FollowUpError::from(e);
            match serde_json::to_string(&err) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit config path replaces the project and user tiers.
    // SAFETY: single-threaded at this point; nothing else reads the environment yet.
    if let Some(config_path) = &cli.config {
        unsafe {
            std::env::set_var("FOLLOWUP_CONFIG_PATH", config_path);
        }
    }
    let loader = ConfigLoader::load().map_err(|e| FollowUpError::config(format!("{:#}", e)))?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Using configuration");
    }
    let config = loader.into_config();

    match cli.command {
        Command::Filter(args) => run_filter(&config, args),
        Command::Buckets(args) => run_buckets(&config, args),
        Command::Cart(args) => run_cart_command(&config, args),
    }
}

fn run_filter(config: &Config, args: FilterArgs) -> Result<()> {
    let kind = args
        .kind
        .map(TaskKind::from)
        .unwrap_or(config.engine.default_kind);
    let mode = if args.strict {
        IngestMode::Strict
    } else {
        config.ingest.mode
    };
    let ingestor = Ingestor::new(mode);

    let list = if args.reads_stdin() {
        ingestor.read(kind, std::io::stdin().lock())?
    } else {
        let file = File::open(&args.input).map_err(|e| {
            FollowUpError::invalid_document(format!("Cannot open {}", args.input.display()))
                .with_details(e.to_string())
        })?;
        ingestor.read(kind, BufReader::new(file))?
    };

    let query = args.query()?;
    if args.strict {
        query.check(kind)?;
    }
    let now = args.now.unwrap_or_else(|| Local::now().fixed_offset());
    let engine = FilterEngine::new(config.engine.week_start);
    let outcome = engine.apply_list(&list, &query, &now);

    info!(
        kind = kind.as_str(),
        total = list.len(),
        matched = outcome.matched(),
        "Filtered task listing"
    );

    let format = args
        .format
        .map(OutputFormat::from)
        .unwrap_or(config.engine.default_format);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Markdown => print!("{}", format_list_markdown(&outcome, now.offset())),
    }
    Ok(())
}

fn run_buckets(config: &Config, args: BucketsArgs) -> Result<()> {
    let now = args.now.unwrap_or_else(|| Local::now().fixed_offset());
    let today = now.date_naive();
    let week_start = config.engine.week_start;

    let format = args
        .format
        .map(OutputFormat::from)
        .unwrap_or(config.engine.default_format);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&buckets_json(today, week_start))?
        ),
        OutputFormat::Markdown => print!("{}", format_buckets_markdown(today, week_start)),
    }
    Ok(())
}

fn run_cart_command(config: &Config, args: CartArgs) -> Result<()> {
    let store = JsonFileStore::in_dir(&config.storage.data_dir, "cart");
    debug!(path = %store.path().display(), "Cart store");
    let summary = run_cart(&store, args.action)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serializing cart")?
    );
    Ok(())
}
