use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use o2s_core::config::{self, CONFIG_FILE_NAME, ProjectConfig};
use o2s_core::parse::{self, spec::OpenApiSpec};
use o2s_core::plan::{self, Plan};
use o2s_core::siege;

#[derive(Parser)]
#[command(
    name = "openapi2siege",
    about = "Convert an OpenAPI 3.x spec into Siege URL, cookie and config files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every operation and write the Siege files
    Generate {
        /// Path to the project config file
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Path to the OpenAPI spec file (YAML or JSON); overrides `spec` in the config
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Print the resolved requests and Siege configuration without writing anything
    Inspect {
        /// Path to the project config file
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Path to the OpenAPI spec file (YAML or JSON); overrides `spec` in the config
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new openapi2siege configuration
    Init {
        /// Overwrite an existing config file
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
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, spec } => cmd_generate(&config, spec),

        Commands::Inspect {
            config,
            spec,
            format,
        } => cmd_inspect(&config, spec, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "openapi2siege", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_project(config_path: &Path) -> Result<ProjectConfig> {
    match config::load_config(config_path)? {
        Some(cfg) => Ok(cfg),
        None => {
            log::warn!(
                "{} not found; using defaults. Run `openapi2siege init` to create one",
                config_path.display()
            );
            Ok(ProjectConfig::default())
        }
    }
}

fn load_spec(path: &Path) -> Result<OpenApiSpec> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str());
    parse::from_path_contents(ext, &content)
        .with_context(|| format!("failed to load spec {}", path.display()))
}

fn build_plan(config_path: &Path, spec: Option<PathBuf>) -> Result<(ProjectConfig, Plan)> {
    let cfg = load_project(config_path)?;
    let spec_path = spec.unwrap_or_else(|| PathBuf::from(&cfg.spec));
    let spec = load_spec(&spec_path)?;
    let plan = plan::plan(&spec, &cfg)
        .with_context(|| format!("failed to convert {}", spec_path.display()))?;
    Ok((cfg, plan))
}

fn cmd_generate(config_path: &Path, spec: Option<PathBuf>) -> Result<()> {
    let (cfg, plan) = build_plan(config_path, spec)?;

    let output = siege::render_outputs(&plan, &cfg.siege)?;
    siege::write_files(Path::new("."), &output.files)?;
    for file in &output.files {
        eprintln!("  wrote {}", file.path.display());
    }

    eprintln!("\nConversion complete! To use, run");
    for part in &output.partitions {
        match part.media_type {
            Some(ref media_type) => eprintln!(
                "\tsiege -R {} -T '{}'",
                part.config_path.display(),
                media_type
            ),
            None => eprintln!("\tsiege -R {}", part.config_path.display()),
        }
    }
    Ok(())
}

fn cmd_inspect(config_path: &Path, spec: Option<PathBuf>, format: InspectFormat) -> Result<()> {
    let (_, plan) = build_plan(config_path, spec)?;

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&plan)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&plan)?;
            println!("{}", json);
        }
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
