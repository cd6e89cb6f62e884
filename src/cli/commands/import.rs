use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::services::mail::LogMailer;
use crate::upload::UploadService;

#[derive(Subcommand)]
pub enum ImportCommands {
    #[command(about = "Import faculty accounts from a workbook")]
    Faculty {
        #[arg(help = "Path to the .xlsx file")]
        path: PathBuf,
    },

    #[command(about = "Import student accounts from a workbook")]
    Students {
        #[arg(help = "Path to the .xlsx file")]
        path: PathBuf,
    },

    #[command(about = "Import subjects from a workbook")]
    Subjects {
        #[arg(help = "Path to the .xlsx file")]
        path: PathBuf,
    },
}

pub async fn handle(cmd: ImportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let path = match &cmd {
        ImportCommands::Faculty { path } | ImportCommands::Students { path } | ImportCommands::Subjects { path } => {
            path.clone()
        }
    };
    let bytes = tokio::fs::read(&path).await.with_context(|| format!("failed to read {}", path.display()))?;

    let db = connect().await?;
    let mailer = LogMailer::from_config();
    let uploads = UploadService::new(&db, &mailer);
    let summary = match cmd {
        ImportCommands::Faculty { .. } => uploads.faculty(&bytes).await,
        ImportCommands::Students { .. } => uploads.students(&bytes).await,
        ImportCommands::Subjects { .. } => uploads.subjects(&bytes).await,
    };
    db.close().await;
    let summary = summary?;

    output_success(
        &output_format,
        &format!("{} ({} created, {} skipped)", summary.message, summary.created_count, summary.skipped_count),
        Some(serde_json::to_value(&summary)?),
    )
}
