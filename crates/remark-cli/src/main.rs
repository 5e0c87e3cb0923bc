use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use remark_core::TaskStatus;
use remark_db::{Db, DbConfig};
use remark_media::{CommandToolkit, MediaConfig};
use remark_service::{CommentService, LocalCommentService, Upload};
use remark_store::{create_store, StoreConfig};

#[derive(Parser)]
#[command(
    name = "remark",
    about = "Maintenance commands for an existing task comment database",
    long_about = "Maintenance commands for an existing task comment database. \
                  Users, units, projects, tasks and comments are created by the \
                  application that owns the database; this tool only inspects and \
                  maintains them."
)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "REMARK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Directory holding comment attachments
    #[arg(long, env = "REMARK_ATTACHMENT_DIR")]
    attachment_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the task status table, or resolve a status name
    Statuses {
        /// Name to resolve, e.g. "ready to mark" or "Ready to Mark"
        name: Option<String>,
    },
    /// Print one comment as seen by a user
    Show {
        comment_id: i64,
        /// Viewing user
        #[arg(long)]
        viewer: i64,
    },
    /// Print every comment on a task as seen by a user
    List {
        task_id: i64,
        #[arg(long)]
        viewer: i64,
    },
    /// Convert and store a file as a comment's attachment
    Attach { comment_id: i64, file: PathBuf },
    /// Print the MIME type of a comment's attachment
    Mime { comment_id: i64 },
    /// Mark a comment read for a user
    MarkRead { user_id: i64, comment_id: i64 },
    /// Remove a user's read receipt
    MarkUnread { user_id: i64, comment_id: i64 },
    /// Delete a comment, its attachment and its receipts
    Delete { comment_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Statuses { name } = &cli.command {
        print_statuses(name.as_deref());
        return Ok(());
    }

    let db = Db::open(&DbConfig {
        sqlite_path: cli.db_path.clone(),
    })
    .context("open database")?;
    let store = create_store(&StoreConfig {
        local_data_dir: cli.attachment_dir.clone(),
    });
    let toolkit = Arc::new(CommandToolkit::new(MediaConfig::from_env()));
    let service = LocalCommentService::new(db, store, toolkit);

    match cli.command {
        Commands::Statuses { .. } => {}
        Commands::Show { comment_id, viewer } => {
            let view = service.serialize(comment_id, viewer).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::List { task_id, viewer } => {
            let views = service.serialize_task(task_id, viewer).await?;
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        Commands::Attach { comment_id, file } => {
            let upload = Upload::copy_from(&file)
                .with_context(|| format!("read {}", file.display()))?;
            if service.add_attachment(comment_id, upload).await? {
                let path = service.attachment_path(comment_id).await?;
                info!("attached {} to comment {comment_id}", file.display());
                if let Some(path) = path {
                    println!("{}", path.display());
                }
            } else {
                eprintln!("could not convert {}; comment unchanged", file.display());
                std::process::exit(1);
            }
        }
        Commands::Mime { comment_id } => match service.attachment_mime_type(comment_id).await? {
            Some(mime) => println!("{mime}"),
            None => eprintln!("comment {comment_id} has no attachment"),
        },
        Commands::MarkRead {
            user_id,
            comment_id,
        } => {
            service.mark_read(user_id, comment_id).await?;
            eprintln!("comment {comment_id} marked read for user {user_id}");
        }
        Commands::MarkUnread {
            user_id,
            comment_id,
        } => {
            service.mark_unread(user_id, comment_id).await?;
            eprintln!("comment {comment_id} marked unread for user {user_id}");
        }
        Commands::Delete { comment_id } => {
            service.delete_comment(comment_id).await?;
            eprintln!("deleted comment {comment_id}");
        }
    }

    Ok(())
}

fn print_statuses(name: Option<&str>) {
    match name {
        Some(name) => {
            let status = TaskStatus::status_for_name(name);
            println!("{} {} {}", status.id(), status.key(), status.display_name());
        }
        None => {
            println!("{:<4} {:<24} NAME", "ID", "KEY");
            for status in TaskStatus::ALL {
                println!("{:<4} {:<24} {}", status.id(), status.key(), status.display_name());
            }
        }
    }
}
