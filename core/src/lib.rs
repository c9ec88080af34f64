//! Authenticated API client core for the Kami business backend.
//!
//! # Overview
//! `ApiClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network. `AuthenticatedClient` sits on top: it owns
//! the persisted login token, attaches it to every call, executes the call
//! through a `Transport`, and clears the token when the server answers 401.
//!
//! # Design
//! - `ApiClient` is stateless; it holds only `base_url`.
//! - Each endpoint is split into `build_*` and `parse_*`, so the I/O boundary
//!   stays explicit and the builders are testable as plain data.
//! - Token storage and transport are injected (`TokenStore`, `Transport`)
//!   so tests run against in-memory doubles.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hooks;
pub mod http;
pub mod storage;
pub mod transport;
pub mod types;
pub mod validate;

#[cfg(test)]
mod testing;

pub use auth::{AuthenticatedClient, CredentialState};
pub use client::ApiClient;
pub use config::{default_token_path, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, ConfigError, StorageError, TransportError};
pub use fetch::{fetch_both, FetchState, TransactionForm};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    format_amount, CreateCustomer, CreateService, CreateTransaction, Credential, Customer,
    LineItem, LoginRequest, LoginResponse, Service, Transaction, UpdateCustomer, UpdateService,
};
