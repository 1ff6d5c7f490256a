//! Authenticated API client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that sit the two
//! stateful components a view drives:
//! - `SessionManager` owns the bearer token (register, login, logout, restore
//!   from a `TokenStore`).
//! - `TodoCollection` owns the item list, the new-item draft, and the single
//!   inline-edit slot, and re-fetches after every mutation.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Authentication headers are derived from the `Session` passed into each
//!   builder, never from process-wide state.
//! - A `Transport` performs the round trip; `UreqTransport` is the blocking
//!   default behind the `ureq` feature.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod store;
pub mod todos;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ClientError};
pub use http::{auth_headers, HttpMethod, HttpRequest, HttpResponse};
pub use session::{Session, SessionManager, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_KEY};
pub use todos::{TodoCollection, TITLE_REQUIRED};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    CreateTodo, Draft, EditBuffer, LoginRequest, RegisterRequest, Todo, TokenResponse, UpdateTodo,
};

/// Wire both components to the server and token file named by `config`.
#[cfg(feature = "ureq")]
pub fn connect(
    config: &ClientConfig,
) -> (
    SessionManager<UreqTransport, FileTokenStore>,
    TodoCollection<UreqTransport>,
) {
    let client = TodoClient::new(&config.base_url);
    let transport = UreqTransport::new(config.timeout);
    let store = FileTokenStore::new(&config.token_path);
    let session = SessionManager::restore(client.clone(), transport.clone(), store);
    (session, TodoCollection::new(client, transport))
}
