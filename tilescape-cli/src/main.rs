//! Tilescape CLI - inspect and fetch map tile layers
//!
//! Layers come from `~/.tilescape/layers.ini` (or `--config`). Every command
//! prints human-readable text, or JSON with `--json`.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilescape::config::ConfigFile;
use tilescape::logging::init_logging;

use commands::common::GlobalOptions;
use commands::cover::CoverArgs;
use commands::url::TileArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilescape")]
#[command(version = tilescape::VERSION)]
#[command(about = "Inspect tiling schemes, tile URLs and coordinate systems of map layers", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tilescape/layers.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Area selection shared by `cover` and `fetch`.
#[derive(Debug, clap::Args)]
struct AreaArgs {
    /// Area as x1,y1,x2,y2 (default: the layer's coordinate system bounds)
    #[arg(long)]
    bbox: Option<String>,

    /// CRS of --bbox
    #[arg(long, default_value = "EPSG:4326")]
    crs: String,

    /// Camera zoom value
    #[arg(long, conflicts_with = "level", required_unless_present = "level")]
    zoom: Option<f64>,

    /// Level identifier to show (may be fractional)
    #[arg(long)]
    level: Option<f64>,
}

impl From<AreaArgs> for CoverArgs {
    fn from(args: AreaArgs) -> Self {
        CoverArgs {
            bbox: args.bbox,
            crs: args.crs,
            zoom: args.zoom,
            level: args.level,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List configured layers
    Layers,

    /// Show the zoom levels of a layer
    Levels {
        /// Layer name
        layer: String,
    },

    /// Resolve a coordinate system name
    Crs {
        /// CRS string, e.g. EPSG:2056 or urn:ogc:def:crs:OGC:1.3:CRS84
        crs: String,
    },

    /// Resolve the URL of one tile
    Url {
        /// Layer name
        layer: String,

        /// Level identifier
        #[arg(long)]
        level: i32,

        /// Tile column
        #[arg(long)]
        x: u32,

        /// Tile row
        #[arg(long)]
        y: u32,

        /// Time index for multi-time layers
        #[arg(long, default_value = "0")]
        t: u32,
    },

    /// List the tiles covering an area
    Cover {
        /// Layer name
        layer: String,

        #[command(flatten)]
        area: AreaArgs,
    },

    /// Download the tiles covering an area
    Fetch {
        /// Layer name
        layer: String,

        #[command(flatten)]
        area: AreaArgs,

        /// Output directory
        #[arg(long, short, default_value = "tiles")]
        output: PathBuf,

        /// Extra rounds for tiles that failed with a recoverable error
        #[arg(long, default_value = "2")]
        retries: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = GlobalOptions {
        config: cli.config,
        json: cli.json,
    };

    // A broken file is reported by the command itself.
    let config = options.load_config().unwrap_or_else(|_| ConfigFile::default());
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let _logging_guard = init_logging(&filter, config.logging.file.as_deref()).map_err(CliError::LoggingInit)?;
    tracing::debug!(config = %options.config_path().display(), "starting");

    match cli.command {
        Commands::Init { force } => commands::init::run(&options, force),
        Commands::Layers => commands::layers::run_layers(&options),
        Commands::Levels { layer } => commands::layers::run_levels(&options, &layer),
        Commands::Crs { crs } => commands::crs::run(&options, &crs),
        Commands::Url { layer, level, x, y, t } => {
            commands::url::run(&options, &layer, TileArgs { level, x, y, t })
        }
        Commands::Cover { layer, area } => commands::cover::run(&options, &layer, &area.into()),
        Commands::Fetch {
            layer,
            area,
            output,
            retries,
        } => commands::fetch::run(&options, &layer, &area.into(), &output, retries),
    }
}
