mod app;
mod args;
mod config;
mod terminal_output;

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use textra_logging::init_logger;
use textra_understanding::{AudioProvider, LocalRecognizer};

use args::Invocation;
use config::Config;
use terminal_output::{note_error, note_success, supports_color};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    init_logger(&config.log_level, config.log_dir.as_deref());

    match try_main(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn try_main(config: Config) -> Result<()> {
    let parsed = match args::parse(std::env::args().skip(1))? {
        Invocation::Usage => {
            eprintln!("{}", args::usage_hint());
            return Ok(());
        }
        Invocation::Info(text) => {
            print!("{text}");
            return Ok(());
        }
        Invocation::Run(parsed) => parsed,
    };
    debug!(workers = ?config.workers, tesseract = %config.tesseract.display(), "Loaded configuration");

    let mut recognizer = LocalRecognizer::new(config.tesseract.clone());
    if let Some(key) = &config.openai_api_key {
        recognizer = recognizer.with_audio(AudioProvider::whisper(key));
        info!("Audio transcription via OpenAI Whisper");
    } else if let Some(key) = &config.deepgram_api_key {
        recognizer = recognizer.with_audio(AudioProvider::deepgram(key));
        info!("Audio transcription via Deepgram");
    }

    let echo = !parsed.silent && std::io::stdout().is_terminal();
    let written = app::run(parsed, Arc::new(recognizer), config.workers, std::io::stdout()).await?;

    if echo {
        let color = supports_color();
        let mut stdout = std::io::stdout();
        for path in &written {
            note_success(&mut stdout, &path.display().to_string(), color)?;
        }
    }
    Ok(())
}
