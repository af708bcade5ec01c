use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AppState, ClassifierClient, ImageFile, NoticeKind, PredictionOutcome,
    TrainingOutcome, UploadOutcome, UploadTaskState,
};
use shared::domain::ActiveTab;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Operator console for the image classification service")]
struct Cli {
    /// Overrides the configured service base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show service status and the class distribution.
    Status,
    /// Classify a single image.
    Predict { path: PathBuf },
    /// Upload labelled images for retraining.
    Upload {
        #[arg(long = "class")]
        class_label: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Start a retraining job.
    Train,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        settings = settings.with_base_url(api_url)?;
    }
    info!(base_url = %settings.base_url, "using classifier service");

    let client = ClassifierClient::new(&settings);
    let mut notices = client.store().subscribe_notices();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => match notice.kind {
                    NoticeKind::Interrupting => eprintln!("error: {}", notice.message),
                    NoticeKind::Inline => eprintln!("{}", notice.message),
                },
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    match cli.command {
        Command::Status => {
            client.select_tab(ActiveTab::Dashboard);
            client.status().refresh().await;
            print_dashboard(&client.state());
        }
        Command::Predict { path } => {
            client.select_tab(ActiveTab::Predict);
            let image = ImageFile::load(&path).await?;
            match client.inference().classify(&image).await? {
                PredictionOutcome::Classified(label) => println!("Predicted class: {label}"),
                PredictionOutcome::Unrecognized => println!("Predicted class: unrecognized"),
                PredictionOutcome::Failed(message) => println!("Prediction failed: {message}"),
            }
        }
        Command::Upload { class_label, paths } => {
            client.select_tab(ActiveTab::Retrain);
            let mut images = Vec::with_capacity(paths.len());
            for path in &paths {
                images.push(ImageFile::load(path).await?);
            }
            match client.retrain().upload_dataset(&class_label, images).await? {
                UploadOutcome::Uploaded { refresh } => {
                    refresh.await?;
                    println!("{}", upload_label(&client.state()));
                    print_dashboard(&client.state());
                }
                UploadOutcome::Failed(err) => println!("Upload failed: {err}"),
            }
        }
        Command::Train => {
            client.select_tab(ActiveTab::Retrain);
            match client.retrain().trigger_training().await {
                TrainingOutcome::Started(job) => println!(
                    "Retraining started: task {} at {}",
                    job.task_id,
                    job.triggered_at.to_rfc3339()
                ),
                TrainingOutcome::Failed(err) => println!("Retraining failed to start: {err}"),
            }
        }
    }

    Ok(())
}

fn print_dashboard(state: &AppState) {
    println!("[{}]", state.active_tab.title());
    println!("API status:   {}", state.status.status_label());
    println!(
        "Model:        {}",
        state.status.model_name.as_deref().unwrap_or("N/A")
    );
    println!("Classes:      {}", state.status.class_count_label());
    println!("Accuracy:     {}", state.status.accuracy_label());
    if let Some(summary) = &state.dataset_summary {
        let ready = if summary.ready_to_train { "yes" } else { "no" };
        println!(
            "Dataset:      {} images (ready to train: {ready})",
            summary.total_images
        );
    }
    if state.class_distribution.is_empty() {
        println!("No class distribution available.");
        return;
    }
    println!("Class distribution:");
    for entry in &state.class_distribution {
        println!("  {:<20} {}", entry.label, entry.count);
    }
}

fn upload_label(state: &AppState) -> &'static str {
    match state.upload_task {
        Some(UploadTaskState::Pending) => "Uploading...",
        Some(UploadTaskState::Success) => "Upload successful",
        Some(UploadTaskState::Failure) => "Upload failed",
        None => "",
    }
}
