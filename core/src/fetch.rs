//! Per-fetch screen state and combined fetches.
//!
//! # Design
//! A screen tracks each fetch as one `FetchState` value instead of separate
//! loading / error flags. `fetch_both` starts two requests without waiting
//! on each other and only yields data when both succeed, so a form is never
//! populated from half of its inputs. A started request is never abandoned:
//! a failure on one side waits for the other side to finish, so its 401
//! handling still runs.

use std::future::Future;

use tracing::warn;

use crate::auth::AuthenticatedClient;
use crate::error::ApiError;
use crate::storage::TokenStore;
use crate::transport::Transport;
use crate::types::{Customer, Service};

#[derive(Debug)]
pub enum FetchState<T> {
    Loading,
    Loaded(T),
    Failed(ApiError),
}

impl<T> FetchState<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => FetchState::Loaded(value),
            Err(e) => FetchState::Failed(e),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchState::Loaded(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            FetchState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Loading
    }
}

/// Drive both futures concurrently and wait for both to complete.
///
/// When both fail, the error from `a` is returned.
pub async fn fetch_both<A, B, FA, FB>(a: FA, b: FB) -> Result<(A, B), ApiError>
where
    FA: Future<Output = Result<A, ApiError>>,
    FB: Future<Output = Result<B, ApiError>>,
{
    let (a, b) = tokio::join!(a, b);
    Ok((a?, b?))
}

/// Everything the "add transaction" form needs before it can render.
#[derive(Debug, Clone)]
pub struct TransactionForm {
    pub customers: Vec<Customer>,
    pub services: Vec<Service>,
}

impl<T: Transport, S: TokenStore> AuthenticatedClient<T, S> {
    pub async fn load_transaction_form(&self) -> Result<TransactionForm, ApiError> {
        let (customers, services) = fetch_both(self.list_customers(), self.list_services())
            .await
            .inspect_err(|e| warn!(error = %e, "failed to load customers and services"))?;
        Ok(TransactionForm {
            customers,
            services,
        })
    }
}
