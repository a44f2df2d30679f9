use clap::{Parser, Subcommand};
use docit::build::{self, BuildConfig, Overrides};
use docit::{config, output, template, watch};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docit")]
#[command(about = "Static site generator for project documentation")]
#[command(long_about = "\
Static site generator for project documentation

Every markdown file below the input directory becomes a page. A page's link
comes from its file name alone; directories only organise sources.

Content structure:

  docs/
  ├── config.toml            # Site config (optional)
  ├── page.html              # Page template (optional, see gen-template)
  ├── index.md               # → build/index.html          Home, /
  ├── guides/
  │   ├── install.md         # → build/install/index.html  Install, /install
  │   └── usage.md           # → build/usage/index.html    Usage, /usage
  └── reference/
      └── cli.md             # → build/cli/index.html      Cli, /cli

Every page shows the same navigation (Home first, then the other pages) and
a table of contents built from its own headings.

Run 'docit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(short, long, default_value = ".", global = true)]
    input: PathBuf,

    /// Output directory (removed and recreated on every build)
    #[arg(short, long, default_value = "./build", global = true)]
    output: PathBuf,

    /// Project title (overrides config.toml)
    #[arg(short, long, global = true)]
    title: Option<String>,

    /// Page template file (overrides config.toml)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Log pipeline progress
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site once
    Build,
    /// Parse the site and report pages and navigation without writing output
    Check {
        /// Print the parsed site as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the site, then rebuild whenever content, config or template changes
    Watch,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Print the built-in page template
    GenTemplate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose enables DEBUG, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.input)?;
            init_thread_pool(&site_config.processing);
            let build_config = resolve_build_config(&cli, &site_config);

            println!("==> Building {}", build_config.content_root.display());
            let report = build::build(&build_config)?;
            output::print_build_output(
                &report,
                &build_config.content_root,
                &build_config.output_root,
            );
        }
        Command::Check { json } => {
            let site_config = config::load_config(&cli.input)?;
            init_thread_pool(&site_config.processing);
            let build_config = resolve_build_config(&cli, &site_config);

            let site = build::check(&build_config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&site)?);
            } else {
                println!("==> Checking {}", build_config.content_root.display());
                output::print_check_output(&site, &build_config.content_root);
                println!("==> Content is valid");
            }
        }
        Command::Watch => {
            let site_config = config::load_config(&cli.input)?;
            init_thread_pool(&site_config.processing);
            let build_config = resolve_build_config(&cli, &site_config);
            let settle = Duration::from_millis(site_config.watch.debounce_ms);

            println!("==> Building {}", build_config.content_root.display());
            match build::build(&build_config) {
                Ok(report) => output::print_build_output(
                    &report,
                    &build_config.content_root,
                    &build_config.output_root,
                ),
                Err(e) => tracing::error!(error = %e, "build failed"),
            }

            println!(
                "==> Watching {} (Ctrl-C to stop)",
                build_config.content_root.display()
            );
            watch::watch(&build_config, &overrides(&cli), settle, |result| match result {
                Ok(report) => println!("{}", output::format_rebuild_line(&report)),
                Err(e) => tracing::error!(error = %e, "rebuild failed"),
            })?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::GenTemplate => {
            print!("{}", template::BUILTIN_TEMPLATE);
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Flags that take precedence over `config.toml`.
fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        title: cli.title.clone(),
        template: cli.template.clone(),
    }
}

fn resolve_build_config(cli: &Cli, site_config: &config::SiteConfig) -> BuildConfig {
    BuildConfig::resolve(&cli.input, &cli.output, site_config, &overrides(cli))
}
