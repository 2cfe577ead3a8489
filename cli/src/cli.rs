//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Rolling deployments onto a sarge-managed host
#[derive(Parser)]
#[command(
    name = "sarge-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Deployer file
    #[arg(short, long, global = true, env = "SARGE_DEPLOY_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bind a context key for this run (repeatable)
    #[arg(short, long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_binding)]
    pub set: Vec<(String, String)>,

    /// Answer every prompt with its default
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty `NO_COLOR` counts)
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Log remote commands and lifecycle events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy an application (lists applications when none is given)
    Deploy(commands::deploy::DeployArgs),

    /// Open a shell inside an instance
    Shell(commands::shell::ShellArgs),

    /// Run a one-off command inside an instance and print its output
    Run(commands::run::RunArgs),

    /// Open the process supervisor's shell
    Supervisorctl,

    /// List live instances
    Status(commands::status::StatusArgs),

    /// Upload the shared application configuration
    Configure,
}

/// Parse a `KEY=VALUE` binding.
fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            config,
            set,
            yes,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags { no_color, quiet },
            behaviour: BehaviourFlags { yes },
            config,
            overrides: set,
        });

        match command {
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Shell(args) => commands::shell::run(&app, args).await,
            Command::Run(args) => commands::run::run(&app, args).await,
            Command::Supervisorctl => commands::supervisorctl::run(&app).await,
            Command::Status(args) => commands::status::run(&app, args).await,
            Command::Configure => commands::configure::run(&app).await,
        }
    }
}
