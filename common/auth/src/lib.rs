pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod request;
pub mod transport;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, TransportError};
pub use events::{SessionTerminated, TerminationReason};
pub use gateway::{Gateway, GatewayBuilder};
pub use request::{ApiRequest, ApiResponse, FilePart, RequestBody};
pub use transport::{ReqwestTransport, Transport};
