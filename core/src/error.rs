//! Error types for the Kami API client.
//!
//! # Design
//! Each failure class callers react to differently gets its own variant:
//! `Unauthorized` means the stored credential has already been cleared and the
//! user must log in again, `AuthRejected` means the login attempt itself was
//! refused, `NotFound` means the id has no match. Transport failures land in
//! `Network`; every other non-2xx response lands in `HttpError` with the raw
//! status and body.

use thiserror::Error;

/// Errors returned by `ApiClient` parse methods and `AuthenticatedClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing or blank. Raised before any request is built.
    #[error("missing required field: {0}")]
    Validation(&'static str),

    /// The login endpoint refused the supplied phone/password.
    #[error("login rejected: invalid credentials")]
    AuthRejected,

    /// An authenticated call was rejected with 401, or carried no token.
    #[error("unauthorized: please log in again")]
    Unauthorized,

    /// The server returned 404 for the requested resource.
    #[error("resource not found")]
    NotFound,

    /// The request never produced a response (connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The server returned a non-2xx status unrelated to auth or lookup.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The persisted credential could not be read or written.
    #[error("credential storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Failure executing an `HttpRequest` at the transport level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// Failure reading or writing a `TokenStore`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Client configuration that cannot produce a working client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL must start with http:// or https://: {0}")]
    BaseUrl(String),

    #[error("misspelled backend host in {0}; use kami-backend-5rs0")]
    MisspelledHost(String),

    #[error("timeout must be at least one second")]
    ZeroTimeout,
}
