use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::services::auth::{AuthService, RegisterAdminRequest};

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an administrator account")]
    Create {
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Initial password (8-100 chars with upper, lower, digit and one of @$!%*?&)")]
        password: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { email, password } => {
            let db = connect().await?;
            let user = AuthService::new(&db).register_admin(&RegisterAdminRequest { email, password }).await?;
            db.close().await;
            output_success(
                &output_format,
                &format!("Created administrator {}", user.email),
                Some(json!({ "id": user.id, "email": user.email })),
            )
        }
    }
}
