//! TubeFilter CLI
//!
//! Runs the filter engine against fixture pages, checks settings records and
//! exports the wire types for the extension's TypeScript side.

mod check;

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use tf_core::bridge::{RefreshMessage, RefreshResponse};
use tf_core::dom::PageFixture;
use tf_core::settings::{SettingsPatch, SettingsRecord, TagInfo};
use tf_core::types::{ChannelFilterType, MatchType, Mode};
use tf_core::{highlight_spans, EngineConfig, Matcher};

#[derive(Parser)]
#[command(name = "tf-cli")]
#[command(about = "TubeFilter engine tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one filter pass over a fixture page and report each tile
    Check {
        /// Settings record (JSON)
        #[arg(short, long)]
        settings: String,

        /// Page fixture (JSON)
        #[arg(short, long)]
        page: String,

        /// Tiles per batch
        #[arg(long, default_value_t = tf_core::config::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print highlight markup for a piece of text
    Highlight {
        /// Keyword to highlight (repeatable)
        #[arg(short, long, required = true)]
        keyword: Vec<String>,

        text: String,
    },

    /// Validate a settings record
    Validate {
        /// Settings record (JSON)
        #[arg(short, long)]
        settings: String,
    },

    /// Write TypeScript declarations for the wire types
    ExportTypes {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        out: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            settings,
            page,
            batch_size,
            json,
            verbose,
        } => {
            init_logging(verbose);
            cmd_check(&settings, &page, batch_size, json)
        }
        Commands::Highlight { keyword, text } => {
            init_logging(false);
            cmd_highlight(&keyword, &text)
        }
        Commands::Validate { settings } => {
            init_logging(false);
            cmd_validate(&settings)
        }
        Commands::ExportTypes { out } => {
            init_logging(false);
            cmd_export_types(&out)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn read_settings(path: &str) -> Result<SettingsRecord, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    SettingsRecord::from_json(&content).map_err(|e| format!("'{}': {}", path, e))
}

fn cmd_check(settings: &str, page: &str, batch_size: usize, json: bool) -> Result<(), String> {
    let record = read_settings(settings)?;
    let content = fs::read_to_string(page).map_err(|e| format!("Failed to read '{}': {}", page, e))?;
    let fixture = PageFixture::from_json(&content).map_err(|e| format!("'{}': {}", page, e))?;

    let config = EngineConfig::default().with_batch_size(batch_size);
    let report = check::check_page(&record, &fixture, config);

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    if let Some(error) = &report.rules_error {
        println!("Rules unusable, page left visible: {}", error);
    }
    for tile in &report.tiles {
        let verdict = if tile.shown { "SHOW" } else { "HIDE" };
        println!("  {}  {} [{}]", verdict, tile.title, tile.channel);
        if let Some(markup) = &tile.highlighted {
            println!("        {}", markup);
        }
    }
    let shown = report.tiles.iter().filter(|t| t.shown).count();
    println!();
    println!("Tiles:    {} shown, {} hidden", shown, report.tiles.len() - shown);
    println!("Shelves:  {} hidden", report.shelves_hidden);
    println!("Batches:  {}", report.batches);

    Ok(())
}

fn cmd_highlight(keywords: &[String], text: &str) -> Result<(), String> {
    let class = EngineConfig::default().markers.highlight_class;
    println!("{}", highlight_spans(text, keywords, &class));
    Ok(())
}

fn cmd_validate(settings: &str) -> Result<(), String> {
    let record = read_settings(settings)?;
    let state = record.to_state();
    Matcher::new(&state).map_err(|e| format!("Invalid rules: {}", e))?;

    println!("Settings '{}' are valid", settings);
    println!("  Keywords:    {} ({} stored)", state.keywords.len(), record.keywords.len());
    println!("  Channels:    {} ({} stored)", state.channels.len(), record.channels.len());
    println!("  Mode:        {:?}", state.mode);
    println!("  Match type:  {:?}", state.match_type);
    println!("  Channels as: {:?}", state.channel_filter_type);
    println!("  Disabled:    {}", state.disabled);

    Ok(())
}

fn cmd_export_types(out: &str) -> Result<(), String> {
    let dir = Path::new(out);
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create '{}': {}", dir.display(), e))?;

    let export = |result: Result<(), ts_rs::ExportError>, name: &str| {
        result.map_err(|e| format!("Failed to export {}: {}", name, e))
    };
    export(Mode::export_all_to(dir), "Mode")?;
    export(MatchType::export_all_to(dir), "MatchType")?;
    export(ChannelFilterType::export_all_to(dir), "ChannelFilterType")?;
    export(TagInfo::export_all_to(dir), "TagInfo")?;
    export(SettingsRecord::export_all_to(dir), "SettingsRecord")?;
    export(SettingsPatch::export_all_to(dir), "SettingsPatch")?;
    export(RefreshMessage::export_all_to(dir), "RefreshMessage")?;
    export(RefreshResponse::export_all_to(dir), "RefreshResponse")?;

    println!("Exported TypeScript bindings to '{}'", dir.display());
    Ok(())
}
