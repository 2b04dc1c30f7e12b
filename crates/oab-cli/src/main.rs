mod sample;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{debug, info};

use oab_core::config::{self, CONFIG_FILE_NAME, OabConfig};
use oab_core::{Document, OpenApiVersion, Route, RouteBinder};

#[derive(Parser)]
#[command(name = "oab", about = "OpenAPI 2.0 / 3.x document builder", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bundled pet store API and print or write the document
    Sample {
        /// Config file (defaults to .oab.yaml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target version, overriding the config (2.0, 3.0, 3.1, 3.2)
        #[arg(short, long)]
        target: Option<String>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the route table handed to an external router
    Routes {
        /// Config file (defaults to .oab.yaml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new oab configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            config,
            target,
            format,
            output,
        } => cmd_sample(config, target, format, output),

        Commands::Routes { config } => cmd_routes(config),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oab", &mut io::stdout());
            Ok(())
        }
    }
}

/// Load the given config file, or `.oab.yaml` from the current directory.
/// A missing default file falls back to the built-in defaults.
fn load_config(path: Option<PathBuf>) -> Result<OabConfig> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    match config::load_config(&path)? {
        Some(cfg) => {
            debug!("loaded config from {}", path.display());
            Ok(cfg)
        }
        None if explicit => anyhow::bail!("config file {} not found", path.display()),
        None => Ok(OabConfig::default()),
    }
}

fn parse_target(target: &str) -> Result<OpenApiVersion> {
    OpenApiVersion::parse(target)
        .with_context(|| format!("unsupported OpenAPI version \"{target}\""))
}

fn render(doc: &Document, format: &OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(doc)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml_ng::to_string(doc)?,
    };
    Ok(rendered)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("  wrote {}", path.display());
    Ok(())
}

fn cmd_sample(
    config: Option<PathBuf>,
    target: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(target) = target.as_deref() {
        cfg.openapi = parse_target(target)?;
    }

    let builder = sample::petstore(&cfg);
    info!("building OpenAPI {} pet store", cfg.openapi);
    let doc = builder.build()?;
    let rendered = render(&doc, &format)?;

    match output {
        Some(path) => write_output(&path, &rendered)?,
        None => io::stdout()
            .write_all(rendered.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}

/// Prints each bound route as an aligned table row.
struct RouteTable<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> RouteBinder for RouteTable<W> {
    fn bind(&mut self, route: &Route) {
        if self.error.is_some() {
            return;
        }
        let id = route.operation_id.as_deref().unwrap_or("-");
        if let Err(e) = writeln!(
            self.out,
            "{:<8}{:<32}{id}",
            route.method.as_str(),
            route.path
        ) {
            self.error = Some(e);
        }
    }
}

fn cmd_routes(config: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(config)?;
    let builder = sample::petstore(&cfg);

    let mut table = RouteTable {
        out: io::stdout().lock(),
        error: None,
    };
    builder.bind_routes(&mut table);
    if let Some(e) = table.error {
        return Err(e).context("failed to write route table");
    }

    let webhooks = builder.routes().iter().filter(|r| r.webhook).count();
    if webhooks > 0 {
        eprintln!("({webhooks} webhook(s) not routed)");
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
