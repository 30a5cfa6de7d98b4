use clap::Parser;
use couple_chat_export::client::{self, HttpArchive};
use couple_chat_export::pipeline::{self, ExportOutcome};
use couple_chat_export::resolver::{Chooser, NoChooser, PromptChooser};
use couple_chat_export::utils::ExportConfig;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Export a one-on-one chat history from a local chatlog server.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Remark or nickname of the counterpart (partial names match).
    #[arg(short, long, value_name = "NAME")]
    partner: String,

    /// Directory to write the exports into.
    /// Defaults to ./couple_chat if not set in config.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Where chatlog keeps its decrypted data. Only used in the cleanup reminder.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the chatlog HTTP server.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/couple-chat-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Never prompt; fail if the name matches no contact.
    #[arg(long)]
    non_interactive: bool,

    /// Log every request.
    #[arg(short, long)]
    verbose: bool,

    /// Only print warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    output_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    base_url: Option<String>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("couple-chat-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".chatlog"))
        .unwrap_or_else(|| PathBuf::from("~/.chatlog"))
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve each setting (CLI > Config > Default)
    let output_dir = cli
        .output
        .or(file_cfg.output_dir)
        .unwrap_or_else(|| PathBuf::from("couple_chat"));
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(default_data_dir);
    let raw_url = cli
        .base_url
        .or(file_cfg.base_url)
        .unwrap_or_else(|| client::DEFAULT_BASE_URL.to_string());
    let base_url = client::parse_base_url(&raw_url)
        .wrap_err_with(|| format!("Invalid --base-url: {}", raw_url))?;

    // 3. Build the Export Config
    let config = ExportConfig {
        partner: cli.partner,
        output_dir,
        data_dir,
        base_url,
        quiet: cli.quiet,
    };

    // 4. Run the Business Logic
    let source = HttpArchive::new(config.base_url.clone())?;
    let mut chooser: Box<dyn Chooser> = if cli.non_interactive {
        Box::new(NoChooser)
    } else {
        Box::new(PromptChooser::stdio())
    };

    match pipeline::execute(&config, &source, chooser.as_mut())? {
        ExportOutcome::ContactNotFound => {
            eprintln!(
                "\nExport failed: no contact matches '{}'. Check the name or pick from the list.",
                config.partner
            );
        }
        ExportOutcome::NoMessages(partner) => {
            eprintln!("\nExport failed: no messages found for {}.", partner.name);
        }
        ExportOutcome::Exported(summary) => {
            eprintln!(
                "\nDone. Exported {} messages with {} to {}",
                summary.message_count,
                summary.partner.name,
                config.output_dir.display()
            );
            eprintln!(
                "Remember to delete the decrypted data under {} when you are finished.",
                config.data_dir.display()
            );
        }
    }

    Ok(())
}
