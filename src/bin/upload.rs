use clap::Parser;
use dotenvy::dotenv;
use image_uploader::config::UploaderConfig;
use image_uploader::infrastructure::storage;
use image_uploader::models::SelectedFile;
use image_uploader::services::notifier::LogHook;
use image_uploader::services::upload_widget::{UploadOutcome, UploadWidget};
use image_uploader::utils::object_key::KeyStrategy;
use image_uploader::utils::validation::validate_file_size;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Uploads one file to the configured bucket and prints its public URL.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to upload
    path: PathBuf,

    /// Object key strategy (original, timestamp, content-hash, uuid).
    /// Defaults to OBJECT_KEY_STRATEGY.
    #[arg(long)]
    key_strategy: Option<KeyStrategy>,

    /// Name to upload under instead of the file name on disk
    #[arg(long)]
    name: Option<String>,

    /// MIME type to declare instead of sniffing the file
    #[arg(long)]
    content_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload=info,image_uploader=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = UploaderConfig::from_env()?;
    let key_strategy = args.key_strategy.unwrap_or(config.key_strategy);

    let mut file = SelectedFile::from_path(&args.path, args.content_type.as_deref()).await?;
    if let Some(name) = args.name {
        file.name = name;
    }
    validate_file_size(file.size(), config.max_file_size)?;

    let storage_handle = storage::setup_storage(&config).await?;
    let widget = UploadWidget::new(storage_handle.store)
        .with_key_strategy(key_strategy)
        .with_hook(Arc::new(LogHook));

    let snapshot = widget.select_file(file).await;
    if snapshot.preview_url.is_some() {
        info!("🖼️  {} is an image", args.path.display());
    }

    match widget.upload().await {
        UploadOutcome::Succeeded { public_url, .. } => {
            println!("{}", public_url);
            Ok(ExitCode::SUCCESS)
        }
        UploadOutcome::Failed(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
        other => {
            error!("Upload did not run: {:?}", other);
            Ok(ExitCode::FAILURE)
        }
    }
}
