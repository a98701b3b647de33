pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod conversations;
pub mod documents;
pub mod error;
mod ids;
pub mod models;
pub mod statistics;
pub mod tenant_users;

pub use client::AssistantClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
