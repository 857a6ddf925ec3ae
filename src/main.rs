//! `insight-ocr`: read text off the screen (or image files) and print it as clean paragraphs.
//!
//! ```bash
//! # Drag out a region (or use capture_region from the config) and print its text
//! insight-ocr capture
//!
//! # OCR saved screenshots, one document per file
//! insight-ocr image shot1.png shot2.png
//!
//! # Run the reflow pipeline on an OCR word dump / on raw text
//! insight-ocr words words.json
//! pbpaste | insight-ocr text -
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use insight_ocr::config::{self, AppConfig, ConfigError};
use insight_ocr::reflow::{reflow_text, CleanedDocument, FilteredWord};
use insight_ocr::session::{
    CancelToken, CaptureSession, CleanupStrategy, SessionError, NO_CONTENT_MESSAGE,
};
use insight_ocr::system::{
    cleanup_with_fallback, CleanupError, FrameSource, ImageFileSource, RecognizedWord,
    RemoteTextGenerator, ScreenshotSource, TesseractEngine,
};

/// Screen OCR with paragraph reflow
#[derive(Parser, Debug)]
#[command(name = "insight-ocr")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (default: <config dir>/insight-ocr/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Clean up through the remote text service instead of the local pipeline
    #[arg(long, global = true)]
    remote: bool,

    /// Print the filtered, reading-ordered words as JSON to stderr
    #[arg(long, global = true)]
    show_words: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a screen region and print its text
    Capture,
    /// Recognize text in image files
    Image {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Reflow a JSON array of recognized words ("-" for stdin)
    Words { input: PathBuf },
    /// Reflow raw text ("-" for stdin)
    Text { input: PathBuf },
    /// Print the resolved configuration
    Config {
        /// Write the resolved configuration back to the config file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cleanup(#[from] CleanupError),
    #[error("Failed to read {path}: {source}")]
    Input { path: String, source: io::Error },
    #[error("Invalid word list: {0}")]
    Words(#[from] serde_json::Error),
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => config::load_config_from(path),
        None => Ok(config::load_config()),
    }
}

fn read_input(input: &Path) -> Result<String, CliError> {
    let to_err = |source| CliError::Input {
        path: input.display().to_string(),
        source,
    };
    if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(to_err)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).map_err(to_err)
    }
}

/// Builds the remote client and pings it. A down backend is only a warning: cleanup fails open.
async fn remote_generator(cfg: &AppConfig) -> Result<RemoteTextGenerator, CleanupError> {
    let generator = RemoteTextGenerator::new(&cfg.cleanup_url, cfg.cleanup_timeout)?;
    if generator.health_check().await {
        info!(url = %generator.base_url(), "Using remote text cleanup");
    } else {
        warn!(
            url = %generator.base_url(),
            "Cleanup service not reachable, text will be left as recognized"
        );
    }
    Ok(generator)
}

async fn cleanup_strategy(cfg: &AppConfig, remote: bool) -> Result<CleanupStrategy, CleanupError> {
    if remote {
        Ok(CleanupStrategy::Remote(Box::new(remote_generator(cfg).await?)))
    } else {
        Ok(CleanupStrategy::Local)
    }
}

fn print_document(document: &CleanedDocument) {
    if document.is_empty() {
        println!("{NO_CONTENT_MESSAGE}");
    } else {
        println!("{document}");
    }
}

fn print_words(words: &[FilteredWord]) {
    match serde_json::to_string_pretty(words) {
        Ok(json) => eprintln!("{json}"),
        Err(e) => warn!(error = %e, "Failed to serialize words"),
    }
}

/// Runs `frames` captures through a session and prints each document.
async fn run_session<S: FrameSource + 'static>(
    source: S,
    frames: usize,
    cfg: &AppConfig,
    remote: bool,
    show_words: bool,
) -> Result<(), CliError> {
    let cleanup = cleanup_strategy(cfg, remote).await?;
    let mut session = CaptureSession::new(source, cfg.reflow, cleanup, CancelToken::new());

    let tesseract = cfg.tesseract.clone();
    session
        .initialize(move || TesseractEngine::new(tesseract))
        .await?;

    for index in 0..frames {
        if index > 0 {
            println!();
        }
        let output = session.capture_and_read().await?;
        if show_words {
            print_words(&output.words);
        }
        print_document(&output.document);
    }
    session.shutdown();
    Ok(())
}

async fn run(args: Args, cfg: AppConfig) -> Result<(), CliError> {
    let remote = args.remote || cfg.text_cleanup_enabled;
    match args.command {
        Command::Capture => {
            run_session(
                ScreenshotSource::new(cfg.capture_region),
                1,
                &cfg,
                remote,
                args.show_words,
            )
            .await
        }
        Command::Image { paths } => {
            let source = ImageFileSource::new(paths, cfg.capture_region);
            let frames = source.remaining();
            run_session(source, frames, &cfg, remote, args.show_words).await
        }
        Command::Words { input } => {
            let words: Vec<RecognizedWord> = serde_json::from_str(&read_input(&input)?)?;
            debug!(count = words.len(), "Loaded recognized words");
            let output = cleanup_strategy(&cfg, remote)
                .await?
                .run(&words, &cfg.reflow)
                .await;
            if args.show_words {
                print_words(&output.words);
            }
            print_document(&output.document);
            Ok(())
        }
        Command::Text { input } => {
            let text = read_input(&input)?;
            let document = if remote {
                let generator = remote_generator(&cfg).await?;
                CleanedDocument::from_external(cleanup_with_fallback(&generator, &text).await)
            } else {
                reflow_text(&text, &cfg.reflow)
            };
            print_document(&document);
            Ok(())
        }
        Command::Config { write } => {
            println!("{}", cfg.to_json()?);
            if write {
                match args.config.as_deref() {
                    Some(path) => config::save_config_to(path, &cfg)?,
                    None => config::save_config(&cfg)?,
                }
                info!("Config written");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("insight-ocr: invalid config: {e}");
            return ExitCode::FAILURE;
        }
    };
    insight_ocr::init_logging(cfg.log_level);
    debug!(?cfg, "Configuration resolved");

    match run(args, cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "insight-ocr failed");
            eprintln!("insight-ocr: {e}");
            ExitCode::FAILURE
        }
    }
}
