use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use webp_budget::imaging::{ImageBackend, RustBackend, SearchProfile};
use webp_budget::{batch, config, imaging, output};

#[derive(Parser)]
#[command(name = "webp-budget")]
#[command(about = "Compress images to WebP under a size budget")]
#[command(long_about = "\
Compress images to WebP under a size budget

Every input is decoded, scaled down so its longer edge fits the maximum
dimension, and re-encoded as lossy WebP. The encoder quality steps down
until the file fits the budget; with the refined profile the image is then
shrunk in 5% steps if quality alone was not enough. Files that still do not
fit are written anyway, using the smallest attempt, and flagged.

Inputs may be files or directories. Directories are walked recursively and
their sub-paths are kept under the output directory:

  uploads/                     out/
  ├── logo.png           →     ├── logo.webp
  └── menu/                    └── menu/
      └── burger.jpg     →         └── burger.webp

Settings come from config.toml in the current directory (or --config PATH),
overridden by command-line flags. Run 'webp-budget gen-config' for a
documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags that override `[compression]` settings.
#[derive(clap::Args, Clone)]
struct CompressionArgs {
    /// Size budget per image in KB
    #[arg(long)]
    target_kb: Option<u32>,

    /// Longer edge limit in pixels
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Quality search preset: refined or aggressive
    #[arg(long)]
    profile: Option<SearchProfile>,
}

#[derive(Subcommand)]
enum Command {
    /// Compress files or directories into WebP
    Compress {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "webp")]
        output: PathBuf,

        #[command(flatten)]
        compression: CompressionArgs,

        /// Disable the cache and re-encode every file
        #[arg(long)]
        no_cache: bool,
    },
    /// Show format and dimensions of an image without writing anything
    Inspect {
        input: PathBuf,

        /// Longer edge limit in pixels
        #[arg(long)]
        max_dimension: Option<u32>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compress {
            inputs,
            output: output_dir,
            compression,
            no_cache,
        } => {
            let mut tool_config = load_tool_config(cli.config.as_deref())?;
            apply_overrides(&mut tool_config.compression, &compression);
            tool_config.validate()?;
            init_thread_pool(&tool_config.processing);

            let batch_config = batch::BatchConfig {
                request: tool_config.compression.to_request(),
            };
            let target = batch_config.request.target;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event, target) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::compress_paths(
                &inputs,
                &output_dir,
                &batch_config,
                !no_cache,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;
            let result = result?;

            output::print_batch_summary(&result);
            let failed = result.failed();
            if failed > 0 {
                return Err(format!("{failed} file(s) could not be compressed").into());
            }
        }
        Command::Inspect {
            input,
            max_dimension,
        } => {
            let tool_config = load_tool_config(cli.config.as_deref())?;
            let max_dimension = max_dimension.unwrap_or(tool_config.compression.max_dimension);

            let bytes = std::fs::read(&input)?;
            let backend = RustBackend::new();
            let image = backend.decode(&bytes)?;
            let dimensions = backend.dimensions(&image);
            let clamped =
                imaging::clamp_to_max_dimension(dimensions.as_tuple(), max_dimension).into();

            output::print_inspect(&output::InspectReport {
                path: &input,
                format: imaging::detect_format(&bytes),
                size_bytes: bytes.len(),
                dimensions,
                clamped,
                max_dimension,
            });
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence.
///
/// Logs go to stderr so stdout carries only the per-file report.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "webp_budget=debug"
    } else {
        "webp_budget=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_tool_config(
    explicit: Option<&Path>,
) -> Result<config::ToolConfig, config::ConfigError> {
    match explicit {
        Some(path) if !path.exists() => Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        ))),
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

fn apply_overrides(compression: &mut config::CompressionConfig, args: &CompressionArgs) {
    if let Some(kb) = args.target_kb {
        compression.target_kb = kb;
    }
    if let Some(max) = args.max_dimension {
        compression.max_dimension = max;
    }
    if let Some(profile) = args.profile {
        compression.profile = profile;
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more workers than CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
