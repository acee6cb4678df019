use clap::Parser;
use sip::api::{Cli, Command};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = sip::api::run_http_server(port).await {
                tracing::error!("server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Project(args) => match sip::api::run_project_command(&args) {
            Ok(output) => println!("{output}"),
            Err(msg) => {
                tracing::error!("{msg}");
                std::process::exit(1);
            }
        },
    }
}
