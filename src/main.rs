use clap::Parser;
use tracing::{error, info};
use vaultwrap::cli::{Cli, Commands, ConfigAction};
use vaultwrap::config::{validate_config_object, Config};
use vaultwrap::logging;
use vaultwrap::vault::types::AccessContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            validate_config_object(&config)?;
            let ctx = opts
                .job
                .map(AccessContext::for_job)
                .unwrap_or_else(AccessContext::system);
            let code = vaultwrap::runner::run_command(&config, &ctx, &opts.command).await?;
            std::process::exit(code);
        }
        Commands::Check(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            match vaultwrap::runner::check_connection(&config, opts.secret_id.as_deref()).await {
                Ok(()) => println!("Connection successful."),
                Err(err) => {
                    error!("Connection test failed: {err}");
                    println!("Failed to establish connection: {err}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                let config = Config::load(opts.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config.redacted()?)?);
            }
            ConfigAction::Validate => {
                let config = Config::load(opts.config.as_deref())?;
                validate_config_object(&config)?;
                info!("Configuration is valid");
            }
            ConfigAction::Init => {
                Config::write_default(opts.config.as_deref().unwrap_or("vaultwrap.json5"))?;
                info!("Configuration file created");
            }
        },
        Commands::Version => {
            println!("vaultwrap {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
