use adpack::pipeline::{self, Context, Stage};
use adpack::types::Selection;
use adpack::{config, metadata, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Restrict `makesprites` to one variant and/or one size.
#[derive(clap::Args, Clone)]
struct SelectionArgs {
    /// Only this variant
    #[arg(short = 'v', long)]
    variant: Option<String>,

    /// Only this size (in every selected variant)
    #[arg(short = 's', long)]
    size: Option<String>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection {
            variant: args.variant,
            size: args.size,
        }
    }
}

#[derive(Parser)]
#[command(name = "adpack")]
#[command(about = "Build and package HTML5 ad creatives")]
#[command(long_about = "\
Build and package HTML5 ad creatives

Every <variant>/<size> folder becomes a self-contained bundle: global and
per-size assets merged, stylesheets and scripts concatenated and injected
into the template, metadata tokens substituted, then zipped for delivery.

Project structure:

  package.json                     # version, author, description, meta.client, meta.campaign
  config.toml                      # Optional, see 'adpack gen-config'
  src/
  ├── global/
  │   ├── assets/                  # Copied into every bundle
  │   ├── styles/*.css             # Prepended to every screen.css
  │   └── scripts/**/*.js          # Prepended to every scripts.min.js
  └── variants/
      └── susan/                   # Variant
          └── 300x250/             # Size: {{width}} = 300, {{height}} = 250
              ├── index.html       # Template with inject markers and {{tokens}}
              ├── *.css, *.js
              └── assets/
                  └── sprites/     # Packed by 'makesprites', never bundled

Outputs:

  dev/<variant>/<size>/            # build
  dist/<client> <campaign> <variant> <size> v<version>.zip

Set RUST_LOG=info (or debug) for diagnostics.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project descriptor (default: paths.descriptor from the config)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Empty the build and distribution folders
    Clean,
    /// Pack each size's assets/sprites/ into a sprite sheet and stylesheet
    Makesprites(SelectionArgs),
    /// Clean, then build every variant/size into dev/
    Build,
    /// Clean, build, then zip every built size into dist/
    Zip,
    /// Validate config, metadata and sources without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let (target, selection) = match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Check => {
            let ctx = load_context(&cli, Selection::all())?;
            println!("==> Checking {}", ctx.root.display());
            let report = pipeline::check(&ctx)?;
            output::print_check_output(&report);
            if !report.is_ok() {
                return Err(format!("{} problem(s) found", report.problems.len()).into());
            }
            return Ok(());
        }
        Command::Clean => (Stage::Clean, Selection::all()),
        Command::Makesprites(args) => (Stage::MakeSprites, Selection::from(args.clone())),
        Command::Build => (Stage::Build, Selection::all()),
        Command::Zip => (Stage::Zip, Selection::all()),
    };

    let ctx = load_context(&cli, selection)?;
    init_thread_pool(&ctx.config.processing);
    pipeline::run(&ctx, target, |_, report| {
        output::print_stage_output(report, &ctx.root);
    })?;
    println!("==> Done: {}", target);
    Ok(())
}

/// Structured diagnostics on stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load config and metadata once; every stage reads them from the context.
fn load_context(cli: &Cli, selection: Selection) -> Result<Context, Box<dyn std::error::Error>> {
    let config_path = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(format!("config file not found: {}", path.display()).into());
        }
        Some(path) => path.clone(),
        None => cli.root.join(config::CONFIG_FILENAME),
    };
    let config = config::load_config(&config_path)?;
    tracing::debug!(config = %config_path.display(), "configuration loaded");

    let descriptor = cli
        .project
        .clone()
        .unwrap_or_else(|| config.paths.resolve(&cli.root).descriptor);
    let metadata = metadata::load_metadata(&descriptor)?;
    tracing::info!(
        client = %metadata.meta.client,
        campaign = %metadata.meta.campaign,
        version = %metadata.version,
        "project loaded"
    );

    Ok(Context::new(&cli.root, config, metadata, selection))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
