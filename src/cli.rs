use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "audio-scribe",
    about = "Audio Scribe - upload audio, get a transcript",
    long_about = "A small web app that transcribes uploaded audio files with a local whisper model and offers the transcript as plain text or JSON.",
    after_help = "EXAMPLES:\n    # Fetch the base multilingual model\n    audio-scribe download base\n\n    # Start the web app on the default address\n    audio-scribe serve\n\n    # Serve with a pinned language and a bigger model\n    audio-scribe serve --model models/ggml-small.bin --language pt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the transcription web app.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,

        /// Path to the ggml whisper model file.
        #[arg(long, default_value = "models/ggml-base.bin")]
        model: PathBuf,

        /// Transcription language (e.g. "en"); detected automatically when
        /// not given.
        #[arg(long)]
        language: Option<String>,

        #[arg(long, default_value = "4")]
        threads: i32,
    },
    /// Download a ggml whisper model from Hugging Face.
    Download {
        /// Model name, e.g. "base" or "small.en".
        model: String,

        /// Directory to store the model in.
        #[arg(long, default_value = "models")]
        output_dir: String,
    },
}
