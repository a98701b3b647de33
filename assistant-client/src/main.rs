use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use assistant_client::models::{DocumentUpdate, UserUpdate};
use assistant_client::{AssistantClient, ClientConfig, ClientError};
use clap::{Parser, Subcommand};
use common_auth::{FilePart, SessionTerminated};
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Command-line client for the document assistant API", long_about = None)]
struct Options {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Login {
        username: String,
        #[arg(long, env = "ASSISTANT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in with it
    Register {
        username: String,
        #[arg(long, env = "ASSISTANT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the signed-in user's conversations
    Conversations,
    /// Print the messages of a conversation
    Messages { conversation_id: String },
    DeleteConversation { conversation_id: String },
    /// Ask the assistant a question
    Chat {
        message: String,
        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List documents, or rename / summarise one
    Documents {
        #[arg(long, requires = "document")]
        filename: Option<String>,
        #[arg(long, requires = "document")]
        summary: Option<String>,
        /// Document to edit
        #[arg(long)]
        document: Option<String>,
    },
    /// Upload files for ingestion
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Query an ingestion job once
    JobStatus { job_id: String },
    /// Usage statistics; `--mine` for the signed-in user only
    Stats {
        #[arg(long)]
        mine: bool,
    },
    /// List users of the tenant (admin)
    Users,
    CreateUser {
        username: String,
        #[arg(long, env = "ASSISTANT_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    UpdateUser {
        user_id: String,
        #[arg(long)]
        username: Option<String>,
        /// Replacement role set (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Flip ACTIVE/INACTIVE
        #[arg(long)]
        toggle_status: bool,
    },
    DeleteUser { user_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = Options::parse();
    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let client = AssistantClient::from_config(&config)?;
    let mut terminations = client.gateway().subscribe();

    let outcome = run(&client, opts.command).await;
    for event in drain_terminations(&mut terminations) {
        warn!(
            reason = ?event.reason,
            at = %event.at,
            "session ended; sign in again"
        );
    }

    outcome.map_err(|err| anyhow!(err.user_message()))
}

/// Collect every termination broadcast during the command. The process exits
/// right after, so nothing may be left queued.
fn drain_terminations(events: &mut Receiver<SessionTerminated>) -> Vec<SessionTerminated> {
    let mut drained = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "termination events dropped"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return drained,
        }
    }
}

async fn run(client: &AssistantClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { username, password } => {
            let session = client.auth.login(&username, &password).await?;
            info!(user = %session.username, "login succeeded");
        }
        Command::Register { username, password } => {
            let session = client.auth.register_and_login(&username, &password).await?;
            info!(user = %session.username, "account created");
        }
        Command::Logout => {
            if !client.auth.logout().await {
                info!("no stored session");
            }
        }
        Command::Whoami => {
            let session = client.auth.whoami().await?;
            print_json(&serde_json::json!({
                "userId": session.user_id,
                "username": session.username,
                "roles": session.roles,
            }))?;
        }
        Command::Conversations => {
            let session = client.auth.whoami().await?;
            print_json(&client.conversations.list(&session.user_id).await?)?;
        }
        Command::Messages { conversation_id } => {
            print_json(&client.conversations.messages(&conversation_id).await?)?;
        }
        Command::DeleteConversation { conversation_id } => {
            client.conversations.delete(&conversation_id).await?;
        }
        Command::Chat {
            message,
            conversation,
        } => {
            let reply = client.chat.send(&message, conversation.as_deref()).await?;
            println!("{}", reply.response);
            if let Some(id) = reply.conversation_id {
                info!(conversation = %id, "reply received");
            }
        }
        Command::Documents {
            filename,
            summary,
            document,
        } => match document {
            Some(id) => {
                let update = DocumentUpdate { filename, summary };
                print_json(&client.documents.update(&id, &update).await?)?;
            }
            None => print_json(&client.documents.list().await?)?,
        },
        Command::Upload { files } => {
            let mut parts = Vec::with_capacity(files.len());
            for path in &files {
                parts.push(read_file_part(path).await?);
            }
            print_json(&client.documents.ingest(parts).await?)?;
        }
        Command::JobStatus { job_id } => {
            print_json(&client.documents.status(&job_id).await?)?;
        }
        Command::Stats { mine } => {
            if mine {
                let session = client.auth.whoami().await?;
                print_json(&client.statistics.for_user(&session.user_id).await?)?;
            } else {
                print_json(&client.statistics.system().await?)?;
            }
        }
        Command::Users => print_json(&client.users.list().await?)?,
        Command::CreateUser { username, password } => {
            print_json(&client.users.create(&username, &password).await?)?;
        }
        Command::UpdateUser {
            user_id,
            username,
            roles,
            toggle_status,
        } => {
            let status = if toggle_status {
                Some(client.users.get(&user_id).await?.status.toggled())
            } else {
                None
            };
            let update = UserUpdate {
                username,
                roles: (!roles.is_empty()).then_some(roles),
                status,
            };
            print_json(&client.users.update(&user_id, &update).await?)?;
        }
        Command::DeleteUser { user_id } => client.users.delete(&user_id).await?,
    }
    Ok(())
}

async fn read_file_part(path: &Path) -> Result<FilePart, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ClientError::Invalid(format!("{}: {err}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ClientError::Invalid(format!("{} is not a file", path.display())))?;
    let part = FilePart::new(file_name, bytes);
    Ok(match content_type_for(path) {
        Some(content_type) => part.with_content_type(content_type),
        None => part,
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|err| ClientError::Decode(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_auth::TerminationReason;
    use tokio::sync::broadcast;

    #[test]
    fn drains_events_already_broadcast() {
        let (sender, mut events) = broadcast::channel(4);
        sender
            .send(SessionTerminated::now(TerminationReason::MissingRefreshToken))
            .unwrap();
        sender
            .send(SessionTerminated::now(TerminationReason::LoggedOut))
            .unwrap();

        let drained = drain_terminations(&mut events);
        let reasons: Vec<_> = drained.into_iter().map(|event| event.reason).collect();
        assert_eq!(
            reasons,
            vec![TerminationReason::MissingRefreshToken, TerminationReason::LoggedOut]
        );
        assert!(drain_terminations(&mut events).is_empty());
    }

    #[test]
    fn skips_over_lagged_events() {
        let (sender, mut events) = broadcast::channel(1);
        sender
            .send(SessionTerminated::now(TerminationReason::LoggedOut))
            .unwrap();
        sender
            .send(SessionTerminated::now(TerminationReason::RejectedAfterRefresh))
            .unwrap();

        let drained = drain_terminations(&mut events);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].reason, TerminationReason::RejectedAfterRefresh);
    }
}
