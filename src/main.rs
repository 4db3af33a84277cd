use clap::Parser;

use keygate::cli::{Cli, Commands};
use keygate::config::{DEFAULT_CONFIG_PATH, get_config, init_config_from};
use keygate::runtime::modes::{run_cli, run_server};
use keygate::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_config_from(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    let config = get_config();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            // Keep the guard alive so buffered log lines are flushed on exit
            let _guard = init_logging(&config.logging);
            run_server(config).await
        }
        command => run_cli(command, &config),
    }
}
