use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legis::config::{Config, OcrDriver};
use legis::models::DocumentKind;
use legis::ocr::{clean_text, OcrProvider, RecognitionEngine, UploadPayload, UploadedFile};
use legis::processing::ScanTextExtractor;

#[derive(Parser)]
#[command(name = "legis")]
#[command(about = "Extract text from scanned legislative documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run OCR on an uploaded scan and print the cleaned text
    Extract {
        /// Image file, or a file holding a base64 payload with --base64
        input: PathBuf,

        /// Engine plan: auto (local, then OCR.space) or api (OCR.space only)
        #[arg(long)]
        driver: Option<OcrDriver>,

        /// Declared MIME type of the upload
        #[arg(long)]
        mime: Option<String>,

        /// Original file name as uploaded
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "original_scan")]
        kind: DocumentKind,

        /// Treat INPUT as a data URI or bare base64 text
        #[arg(long)]
        base64: bool,
    },
    /// Report engine availability and effective configuration
    Check,
    /// Strip the printer's imprint from a text file (or stdin)
    Clean { file: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "legis=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match args.command {
        Command::Extract {
            input,
            driver,
            mime,
            name,
            kind,
            base64,
        } => {
            let payload = if base64 {
                let data = std::fs::read_to_string(&input)
                    .with_context(|| format!("reading base64 payload {}", input.display()))?;
                UploadPayload {
                    image_base64: Some(data),
                    file_name: name,
                    mime_type: mime,
                    ..Default::default()
                }
            } else {
                UploadPayload::from_file(UploadedFile {
                    path: input,
                    original_name: name,
                    mime_type: mime,
                })
            };

            let source = payload.into_source(config.ocr.max_upload_bytes)?;
            let driver = driver.unwrap_or(config.ocr.driver);

            tracing::info!(driver = %driver, kind = %kind, mime = %source.mime_type(), "Extracting text");

            let extractor = ScanTextExtractor::new(OcrProvider::new(&config.ocr)?);
            match extractor.extract_for_upload(kind, &source, driver).await? {
                Some(scan) => match scan.text {
                    Some(text) => {
                        tracing::info!(words = scan.word_count, "Extraction complete");
                        println!("{text}");
                    }
                    None => tracing::warn!(file = %scan.file_name, "No text found in image"),
                },
                None => tracing::warn!("Upload is not an image scan, OCR skipped"),
            }
        }
        Command::Check => {
            let provider = OcrProvider::new(&config.ocr)?;
            let local = provider.local_engine();
            let remote = provider.remote_engine();

            println!("driver:     {}", config.ocr.driver);
            println!(
                "{:<11} {} ({})",
                format!("{}:", local.kind()),
                if local.is_available() { "available" } else { "unavailable" },
                local.availability_hint()
            );
            println!(
                "{:<11} {} ({})",
                format!("{}:", remote.kind()),
                if remote.is_available() { "available" } else { "unavailable" },
                remote.availability_hint()
            );
            println!("api key:    {}", config.ocr.masked_api_key());
            println!("languages:  {}", config.ocr.languages);
            println!(
                "timeouts:   local {}s, remote {}s",
                config.ocr.local_timeout_secs, config.ocr.timeout_secs
            );
            if config.ocr.uses_demo_key() {
                tracing::warn!("OCR_SPACE_KEY is not set - using the rate-limited public demo key");
            }
        }
        Command::Clean { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            print!("{}", clean_text(&text));
        }
    }

    Ok(())
}
