use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AdminStore, ContractService, DurablePrefs, PrefsStore, RequestExecutor,
    SessionStore, UploadFile,
};
use shared::domain::Theme;

#[derive(Parser, Debug)]
#[command(about = "Console front end for the contract-management services")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and persist the session token.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the persisted session.
    Logout,
    /// Show the current user's profile.
    Profile,
    /// List users (admin).
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
    /// List contracts.
    Contracts {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Upload one contract file.
    Upload {
        path: std::path::PathBuf,
        #[arg(long, default_value = "general")]
        category: String,
    },
    /// Print a contract's extracted text, if the backend has any.
    Content { id: i64 },
    /// Get or set the theme preference.
    Theme {
        #[arg(value_parser = ["light", "dark"])]
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let args = Args::parse();
    let settings = load_settings();

    let prefs: Arc<dyn PrefsStore> = Arc::new(DurablePrefs::new(
        storage::Prefs::new(&settings.prefs_db)
            .await
            .context("failed to open preferences database")?,
    ));
    let session = SessionStore::new(
        RequestExecutor::new(&settings.user_service_url),
        prefs.clone(),
    );
    session.restore().await;

    match args.command {
        Command::Login { username, password } => {
            session.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            session.logout().await;
            println!("logged out");
        }
        Command::Profile => {
            session.load().await?;
            match session.snapshot().await.user {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => println!("not logged in"),
            }
        }
        Command::Users { page, page_size } => {
            let token = session.token().await;
            let admin = AdminStore::new(RequestExecutor::new(&settings.user_service_url));
            let users = admin
                .fetch_users(token.as_deref(), page, page_size, &[])
                .await?;
            println!("{} of {} users:", users.list.len(), users.total);
            for user in users.list {
                println!(
                    "  #{} {} ({})",
                    user.id,
                    user.username,
                    if user.is_admin() { "admin" } else { "user" }
                );
            }
        }
        Command::Contracts { page, size } => {
            let token = session.token().await;
            let contracts =
                ContractService::new(RequestExecutor::new(&settings.contract_service_url));
            let page = contracts
                .fetch_contracts(token.as_deref(), page, size, &[])
                .await?;
            println!("{} of {} contracts:", page.list.len(), page.total);
            for record in page.list {
                println!(
                    "  #{} {} [{}]",
                    record.id,
                    record.contract_name,
                    record.status().label()
                );
            }
        }
        Command::Upload { path, category } => {
            let token = session.token().await;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_string());
            let contracts =
                ContractService::new(RequestExecutor::new(&settings.contract_service_url));
            let record = contracts
                .upload_single(
                    token.as_deref(),
                    UploadFile {
                        filename,
                        bytes,
                        mime_type: None,
                    },
                    &category,
                )
                .await?;
            println!("uploaded contract #{}: {}", record.id, record.contract_name);
        }
        Command::Content { id } => {
            let token = session.token().await;
            let contracts =
                ContractService::new(RequestExecutor::new(&settings.contract_service_url));
            let content = contracts.get_contract_content(token.as_deref(), id).await;
            if content.is_empty() {
                println!("(no content available)");
            } else {
                println!("{content}");
            }
        }
        Command::Theme { value } => match value {
            Some(value) => {
                let theme = Theme::from_str_lossy(&value);
                prefs.set_theme(theme).await?;
                println!("theme set to {}", theme.as_str());
            }
            None => println!("{}", prefs.theme().await?.as_str()),
        },
    }

    Ok(())
}
