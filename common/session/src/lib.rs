pub mod credentials;
pub mod error;
pub mod file_store;
pub mod roles;
pub mod store;

pub use credentials::{
    PersistedSession, SessionCredentials, KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USERNAME,
    KEY_USER_ID,
};
pub use error::{SessionError, SessionResult};
pub use file_store::FileSessionStore;
pub use roles::{ROLE_ADMIN, ROLE_USER};
pub use store::{InMemorySessionStore, SessionStore};
