use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vaultwrap",
    version,
    about = "Inject Secret Server secrets into commands with masked output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command with secrets injected into its environment.
    Run(RunOpts),
    /// Resolve one secret end to end to test the connection.
    Check(CheckOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct RunOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Job name used for credential access control.
    #[arg(short, long)]
    pub job: Option<String>,
    /// Command and arguments to execute.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

#[derive(clap::Args)]
pub struct CheckOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Secret ID to fetch; defaults to the first configured secret.
    #[arg(short, long)]
    pub secret_id: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}
