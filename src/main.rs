use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pnnquant::models::{AppConfig, QualityName, SettingsOverride};
use pnnquant::services::QuantizeService;

#[derive(Parser)]
#[command(name = "pnnquant")]
#[command(about = "Reduce PNG images to a small palette with PNN clustering")]
struct Cli {
    /// YAML config file (defaults to $PNNQUANT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize one PNG
    Quantize {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        opts: QuantizeArgs,
    },
    /// Quantize many PNGs concurrently
    Batch {
        /// Input PNG files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the quantized files
        #[arg(long)]
        out_dir: PathBuf,

        #[command(flatten)]
        opts: QuantizeArgs,
    },
    /// Print transparency and color facts about a PNG
    Inspect {
        /// Input PNG file
        input: PathBuf,

        /// Palette size used for the image-type hint
        #[arg(long)]
        colors: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct QuantizeArgs {
    /// Maximum palette size (2-65536)
    #[arg(short, long)]
    colors: Option<usize>,

    /// Disable error diffusion
    #[arg(long)]
    no_dither: bool,

    /// Clustering and matching quality
    #[arg(short, long, value_enum)]
    quality: Option<QualityName>,

    /// Alpha at or below which a pixel is treated as transparent
    #[arg(long)]
    alpha_threshold: Option<u8>,

    /// Named settings from the config file
    #[arg(short, long)]
    preset: Option<String>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Skip oxipng recompression
    #[arg(long)]
    no_optimize: bool,
}

impl QuantizeArgs {
    fn service(&self, config: &AppConfig) -> anyhow::Result<QuantizeService> {
        let settings = config.settings(self.preset.as_deref())?;
        let overrides = SettingsOverride {
            colors: self.colors,
            dither: self.no_dither.then_some(false),
            quality: self.quality,
            alpha_threshold: self.alpha_threshold,
        };
        Ok(QuantizeService::new(
            overrides.apply(settings),
            config.optimize && !self.no_optimize,
            config.max_pixels,
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pnnquant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config_path = cli
        .config
        .or_else(|| std::env::var("PNNQUANT_CONFIG").ok().map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref());

    match cli.command {
        Commands::Quantize {
            input,
            output,
            opts,
        } => run_quantize_command(&config, &input, &output, &opts),
        Commands::Batch {
            inputs,
            out_dir,
            opts,
        } => run_batch_command(&config, inputs, out_dir, &opts).await,
        Commands::Inspect {
            input,
            colors,
            json,
        } => run_inspect_command(&config, &input, colors, json),
    }
}

/// Quantize a single file
fn run_quantize_command(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    opts: &QuantizeArgs,
) -> anyhow::Result<()> {
    let service = opts.service(config)?;
    let report = service.quantize_file(input, output)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Quantized {} -> {} ({} colors, {}, {} bytes)",
            input.display(),
            output.display(),
            report.palette_len,
            report.route,
            report.bytes
        );
    }
    Ok(())
}

/// Quantize several files on blocking workers
async fn run_batch_command(
    config: &AppConfig,
    inputs: Vec<PathBuf>,
    out_dir: PathBuf,
    opts: &QuantizeArgs,
) -> anyhow::Result<()> {
    let service = Arc::new(opts.service(config)?);
    let outcomes = service.quantize_batch(inputs, out_dir).await?;
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            match (&outcome.report, &outcome.error) {
                (Some(report), _) => println!(
                    "  + {} ({} colors, {} bytes)",
                    outcome.input.display(),
                    report.palette_len,
                    report.bytes
                ),
                (None, Some(e)) => println!("  ! {}: {e}", outcome.input.display()),
                (None, None) => {}
            }
        }
        println!(
            "Quantized {} of {} files",
            outcomes.len() - failed,
            outcomes.len()
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed");
    }
    Ok(())
}

/// Print image facts
fn run_inspect_command(
    config: &AppConfig,
    input: &Path,
    colors: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let overrides = SettingsOverride {
        colors,
        ..Default::default()
    };
    let service = QuantizeService::new(
        overrides.apply(config.defaults.clone()),
        false,
        config.max_pixels,
    );
    let report = service.inspect_file(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", input.display());
        println!("  Size:              {}x{}", report.width, report.height);
        println!("  Transparency:      {}", yes_no(report.has_transparency));
        println!("  Semi-transparency: {}", yes_no(report.has_semi_transparency));
        println!("  Distinct colors:   {}", report.distinct_colors);
        println!(
            "  Image type:        {} (for {} colors)",
            report.image_type,
            service.settings().colors
        );
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
