use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod api;
mod cmd;
mod config;
mod pool;
mod runner;
mod session;
mod utils;

use cmd::format::StyleOptions;
use cmd::{Dispatcher, OutputFormat};
use config::ProfileConfig;

/// Confluence CLI - command-line client for Confluence Cloud
///
/// Two front-ends over the same command set:
///   confluence-cli shell                          interactive prompt (the default)
///   confluence-cli run <command> ['{"k":"v"}']    one command, then exit
///   confluence-cli commands                       list every command
///
/// Global flags:
///   -v / -vv        Increase verbosity (diagnostics on stderr)
///   -q / --quiet    Errors only
///   --config PATH   Config file (else $CONFLUENCE_CONFIG, else
///                   ~/.config/confluence-cli/config.toml)
///   --profile NAME  Connection profile override
///   --format FMT    Output format override (json | toon)
///
/// Examples:
///   confluence-cli run list-spaces
///   confluence-cli run get-page '{"pageId":"12345"}' --format toon
///   confluence-cli run create-page '{"spaceKey":"DOCS","title":"T","body":"<p>hi</p>"}'
///   confluence-cli shell --profile staging
#[derive(Parser, Debug)]
#[command(
    name = "confluence-cli",
    version,
    author,
    about = "Command-line client for Confluence Cloud (spaces, pages, comments, attachments, users)",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Connection profile (overrides the config default and per-command args)
    #[arg(short = 'p', long = "profile", global = true, value_name = "NAME")]
    profile: Option<String>,

    /// Output format (overrides the config default and per-command args)
    #[arg(short = 'f', long = "format", global = true, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one command headlessly and exit
    Run {
        /// Command name, e.g. list-spaces
        command: String,
        /// Arguments as a JSON object, e.g. '{"spaceKey":"DOCS"}'
        args: Option<String>,
    },

    /// Start the interactive shell (the default with no subcommand)
    Shell,

    /// List every available command
    Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    // The registry listing needs no config or network.
    if let Some(Commands::Commands) = cli.command {
        println!("{}", session::commands_table(&StyleOptions::detect()));
        return Ok(());
    }

    let (config_path, config) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("hint: create a config file like:");
            eprintln!("{CONFIG_TEMPLATE}");
            std::process::exit(2);
        }
    };

    match cli.command {
        Some(Commands::Run { command, args }) => {
            let mut dispatcher = Dispatcher::with_http_pool(config);
            let code = runner::run_once(
                &mut dispatcher,
                &command,
                args.as_deref(),
                cli.profile.as_deref(),
                cli.format,
            )?;
            std::process::exit(code);
        }
        Some(Commands::Shell) | None => {
            let mut session = session::Session::new(config_path, config, cli.profile, cli.format);
            session.run()
        }
        Some(Commands::Commands) => unreachable!("handled above"),
    }
}

fn load_config(
    flag: Option<&std::path::Path>,
) -> Result<(PathBuf, Arc<ProfileConfig>), config::ConfigError> {
    let path = ProfileConfig::resolve_path(flag)?;
    let config = ProfileConfig::load(&path)?;
    Ok((path, Arc::new(config)))
}

const CONFIG_TEMPLATE: &str = r#"  # ~/.config/confluence-cli/config.toml
  default_profile = "cloud"

  [profiles.cloud]
  host = "https://your-site.atlassian.net"
  email = "you@example.com"
  api_token = "..."
"#;
