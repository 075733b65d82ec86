//! Meridian CLI - offline spatial questions from the terminal.
//!
//! Usage:
//!   meridian ask "nearest clinic to Camp 8E"           # Full pipeline (needs llama-server)
//!   meridian dispatch '{"tool": "list_pois", ...}'     # Run a tool call directly
//!   meridian geocode "route from Camp 8 to Camp 8E"    # Show place matches
//!   meridian tools                                     # Tool schemas as JSON
//!   meridian locations                                 # Datasets under the data root
//!   meridian health                                    # Dataset and model status

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use meridian::config::CONFIG_FILE;
use meridian::{
    list_tools, DataDir, Dataset, Geocoder, Intent, LlamaServerModel, LoadedDataset, MeridianConfig, QueryPipeline,
    SpatialQueryEngine, ToolDispatcher,
};

#[derive(Parser)]
#[command(name = "meridian")]
#[command(version, about = "Meridian - offline spatial question answering", long_about = None)]
struct Cli {
    /// Config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Dataset snapshot, overriding the config
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Location slug under the data root, overriding the config
    #[arg(short, long, global = true)]
    location: Option<String>,

    /// Data root holding one directory per location
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question end to end through the model
    Ask {
        /// The question
        query: String,
    },

    /// Run one tool call without the model
    Dispatch {
        /// Tool call JSON: {"tool": ..., "arguments": {...}}
        intent: String,

        /// Original question, used to geocode missing coordinates
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Find known place names in text
    Geocode {
        text: String,
    },

    /// Print the tool schemas
    Tools,

    /// List datasets under the data root
    Locations,

    /// Check the dataset and the model endpoint
    Health,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meridian=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = MeridianConfig::load_or_default(&cli.config)?;

    match &cli.command {
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&list_tools())?);
            return Ok(());
        }
        Commands::Locations => {
            let data = DataDir::open(&cli.data_dir);
            let slugs = data.locations()?;
            if slugs.is_empty() {
                println!("No datasets under {}", data.root().display());
            }
            for slug in slugs {
                println!("{}", slug);
            }
            return Ok(());
        }
        _ => {}
    }

    let path = dataset_path(&cli, &config)?;
    let data = Dataset::load(&path)?.into_loaded(&config.walking)?;

    match cli.command {
        Commands::Ask { query } => {
            let model = LlamaServerModel::new(&config.model)?;
            let pipeline = QueryPipeline::new(model, dispatcher(data, config));
            let result = pipeline.ask(&query);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Dispatch { intent, query } => {
            let intent = Intent::from_json(&intent)?;
            let response = dispatcher(data, config).respond(&intent, &query);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Geocode { text } => {
            let annotated = Geocoder::new(data.places).annotate(&text);
            println!("{}", serde_json::to_string_pretty(&annotated)?);
        }

        Commands::Health => {
            println!("Dataset:  {} ({})", data.name, path.display());
            println!("Graph:    {}", data.graph.stats());
            println!("Places:   {}", data.places.len());
            println!("POIs:     {}", data.pois.len());
            for (category, count) in data.pois.counts() {
                println!("  {:<18} {}", category.as_str(), count);
            }

            let model = LlamaServerModel::new(&config.model)?;
            match model.health() {
                Ok(()) => println!("Model:    ok ({})", model.url()),
                Err(e) => println!("Model:    unavailable ({})", e),
            }
        }

        Commands::Tools | Commands::Locations => {}
    }

    Ok(())
}

fn dataset_path(cli: &Cli, config: &MeridianConfig) -> Result<PathBuf> {
    if let Some(path) = &cli.dataset {
        return Ok(path.clone());
    }
    if let Some(slug) = &cli.location {
        let data = DataDir::open(&cli.data_dir);
        return data
            .dataset_path(slug)
            .with_context(|| format!("no dataset for location '{}' under {}", slug, data.root().display()));
    }
    Ok(resolve_relative(&config.dataset.path, &cli.config))
}

/// Dataset paths in a config file are relative to that file.
fn resolve_relative(path: &Path, config_file: &Path) -> PathBuf {
    if path.is_absolute() || !config_file.exists() {
        return path.to_path_buf();
    }
    match config_file.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

fn dispatcher(
    data: LoadedDataset,
    config: MeridianConfig,
) -> ToolDispatcher<meridian::PoiStore, meridian::WalkGraph> {
    let engine = SpatialQueryEngine::new(data.pois, data.graph, Geocoder::new(data.places), config);
    ToolDispatcher::new(engine)
}
