//! ecs-deploy entry point.

use clap::Parser;

use ecs_deploy::cli::{commands, handle_error, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match commands::deploy::execute(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => handle_error(&err, cli.json),
    }
}
