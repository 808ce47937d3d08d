use std::path::Path;

use anyhow::{Result, anyhow};
use futures_util::TryStreamExt;
use log::info;
use tokio::io::AsyncWriteExt;

const AVAILABLE_MODELS: &[&str] = &[
    "tiny",
    "tiny.en",
    "tiny-q5_1",
    "tiny.en-q5_1",
    "tiny-q8_0",
    "base",
    "base.en",
    "base-q5_1",
    "base.en-q5_1",
    "base-q8_0",
    "small",
    "small.en",
    "small-q5_1",
    "small.en-q5_1",
    "small-q8_0",
    "medium",
    "medium.en",
    "medium-q5_0",
    "medium.en-q5_0",
    "medium-q8_0",
    "large-v1",
    "large-v2",
    "large-v2-q5_0",
    "large-v2-q8_0",
    "large-v3",
    "large-v3-q5_0",
    "large-v3-turbo",
    "large-v3-turbo-q5_0",
    "large-v3-turbo-q8_0",
];

pub fn list_available_models() -> String {
    let mut output = String::from("Available models:\n");
    for model in AVAILABLE_MODELS {
        output.push_str("  ");
        output.push_str(model);
        output.push('\n');
    }
    output.push_str("(.en = english-only, -q* = quantized)\n");
    output
}

pub fn validate_model(model: &str) -> Result<()> {
    if AVAILABLE_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(anyhow!("unknown model '{}'\n{}", model, list_available_models()))
    }
}

/// Fetches a ggml whisper model from Hugging Face into `output_dir`
/// (default `models/`), streaming to disk. Skips the download when the file
/// is already present.
pub async fn download_model(model: &str, output_dir: Option<String>) -> Result<()> {
    validate_model(model)?;

    let dir = output_dir.unwrap_or_else(|| "models".to_string());
    let file_path = Path::new(&dir).join(format!("ggml-{model}.bin"));
    if file_path.exists() {
        println!("Model '{model}' already exists at {}", file_path.display());
        return Ok(());
    }

    tokio::fs::create_dir_all(&dir).await?;

    let url =
        format!("https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-{model}.bin");
    info!("Downloading '{model}' from {url}");
    println!("Downloading ggml model '{model}'...");

    let response = reqwest::get(&url)
        .await?
        .error_for_status()
        .map_err(|e| anyhow!("download of '{}' failed: {}", model, e))?;

    let tmp_path = file_path.with_extension("bin.partial");
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    tokio::fs::rename(&tmp_path, &file_path).await?;

    println!("Done. Model saved to {}", file_path.display());
    println!("Start the server with:");
    println!("  $ audio-scribe serve --model {}", file_path.display());

    Ok(())
}
