mod audio;
mod cli;
mod download;
mod dto;
mod error;
mod server;
mod transcript;
mod whisper;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::whisper::config::WhisperConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            language,
            threads,
        } => {
            let config = WhisperConfig {
                model_path: model,
                language,
                num_threads: threads,
                ..Default::default()
            };
            server::run_server(host, port, config).await?;
        }
        Commands::Download { model, output_dir } => {
            download::download_model(&model, Some(output_dir)).await?;
        }
    }

    Ok(())
}
