//! Authenticated access to the Kami API.
//!
//! # Design
//! `AuthenticatedClient` is the single path through which resource calls and
//! the login call travel. For each call it reads the persisted token, runs the
//! `attach_bearer` hook, hands the request to the `Transport`, and runs
//! `inspect_response` on the result. A 401 clears the stored token before the
//! error reaches the caller. Nothing here retries or redirects; re-prompting
//! for login is the caller's decision.
//!
//! Credential state machine: `Absent -> Active` on a successful login,
//! `Active -> Absent` on logout or on a 401.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::hooks::{attach_bearer, inspect_response, ResponseVerdict};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::storage::{TokenStore, TOKEN_KEY};
use crate::transport::Transport;
use crate::types::{
    CreateCustomer, CreateService, CreateTransaction, Credential, Customer, LoginRequest, Service,
    Transaction, UpdateCustomer, UpdateService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Absent,
    Active,
}

pub struct AuthenticatedClient<T, S> {
    api: ApiClient,
    transport: T,
    store: S,
    subject: Mutex<Option<String>>,
}

impl<T: Transport, S: TokenStore> AuthenticatedClient<T, S> {
    pub fn new(base_url: &str, transport: T, store: S) -> Self {
        Self {
            api: ApiClient::new(base_url),
            transport,
            store,
            subject: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The active credential, if any.
    pub fn credential(&self) -> Result<Option<Credential>, ApiError> {
        let token = self.store.get(TOKEN_KEY)?;
        Ok(token.map(|token| Credential {
            token,
            subject: self.subject.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }))
    }

    pub fn state(&self) -> Result<CredentialState, ApiError> {
        Ok(match self.store.get(TOKEN_KEY)? {
            Some(_) => CredentialState::Active,
            None => CredentialState::Absent,
        })
    }

    /// Exchange phone and password for a token and persist it.
    ///
    /// A rejected login leaves any existing credential in place.
    #[instrument(skip_all, fields(phone = %phone))]
    pub async fn login(&self, phone: &str, password: &str) -> Result<Credential, ApiError> {
        let input = LoginRequest {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        let mut request = self.api.build_login(&input)?;
        attach_bearer(&mut request, None);

        let response = self.transport.execute(request).await?;
        let login = self.api.parse_login(response).inspect_err(|e| {
            warn!(error = %e, "login failed");
        })?;

        self.store.set(TOKEN_KEY, &login.token)?;
        *self.subject.lock().unwrap_or_else(PoisonError::into_inner) = Some(phone.to_string());
        info!("logged in");
        Ok(Credential {
            token: login.token,
            subject: Some(phone.to_string()),
        })
    }

    /// Forget the stored credential. There is no remote session to revoke.
    #[instrument(skip_all)]
    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.remove(TOKEN_KEY)?;
        *self.subject.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("logged out");
        Ok(())
    }

    /// Send a prepared request with the current token attached.
    ///
    /// Statuses other than 401 come back as data for `ApiClient::parse_*`.
    /// A 401 clears the credential and yields `ApiError::Unauthorized`.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let token = self.store.get(TOKEN_KEY)?;
        attach_bearer(&mut request, token.as_deref());
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            authenticated = token.is_some(),
            "sending request"
        );

        let response = self.transport.execute(request).await?;
        match inspect_response(&response) {
            ResponseVerdict::Pass => Ok(response),
            ResponseVerdict::Unauthorized => {
                self.clear_credential();
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Untyped call against `path` (e.g. `/Customers`), relative to the base URL.
    ///
    /// Non-2xx responses become errors: 404 is `NotFound`, anything else
    /// `HttpError`.
    #[instrument(skip_all, fields(method = method.as_str(), path = %path))]
    pub async fn request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = HttpRequest {
            method,
            path: format!("{}{path}", self.api.base_url()),
            headers: Vec::new(),
            body: None,
        };
        if let Some(body) = body {
            let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
            request.set_header("content-type", "application/json".to_string());
            request.body = Some(body);
        }

        let response = self.execute(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        })
    }

    /// Active -> Absent. A no-op when no credential is stored.
    fn clear_credential(&self) {
        let present = match self.store.get(TOKEN_KEY) {
            Ok(token) => token.is_some(),
            Err(e) => {
                error!(error = %e, "could not read credential while handling 401");
                true
            }
        };
        if !present {
            return;
        }
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            error!(error = %e, "could not clear credential after 401");
            return;
        }
        *self.subject.lock().unwrap_or_else(PoisonError::into_inner) = None;
        warn!("server rejected the token; credential cleared");
    }

    // -- services --

    pub async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        let response = self.execute(self.api.build_list_services()).await?;
        self.api.parse_list_services(response)
    }

    #[instrument(skip(self))]
    pub async fn get_service(&self, id: &str) -> Result<Service, ApiError> {
        let response = self.execute(self.api.build_get_service(id)).await?;
        self.api.parse_get_service(response)
    }

    pub async fn create_service(&self, input: &CreateService) -> Result<Service, ApiError> {
        let request = self.api.build_create_service(input)?;
        let response = self.execute(request).await?;
        self.api.parse_create_service(response)
    }

    #[instrument(skip(self, input))]
    pub async fn update_service(&self, id: &str, input: &UpdateService) -> Result<Service, ApiError> {
        let request = self.api.build_update_service(id, input)?;
        let response = self.execute(request).await?;
        self.api.parse_update_service(response)
    }

    #[instrument(skip(self))]
    pub async fn delete_service(&self, id: &str) -> Result<(), ApiError> {
        let response = self.execute(self.api.build_delete_service(id)).await?;
        self.api.parse_delete_service(response)
    }

    // -- customers --

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        let response = self.execute(self.api.build_list_customers()).await?;
        self.api.parse_list_customers(response)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: &str) -> Result<Customer, ApiError> {
        let response = self.execute(self.api.build_get_customer(id)).await?;
        self.api.parse_get_customer(response)
    }

    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, ApiError> {
        let request = self.api.build_create_customer(input)?;
        let response = self.execute(request).await?;
        self.api.parse_create_customer(response)
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(&self, id: &str, input: &UpdateCustomer) -> Result<Customer, ApiError> {
        let request = self.api.build_update_customer(id, input)?;
        let response = self.execute(request).await?;
        self.api.parse_update_customer(response)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        let response = self.execute(self.api.build_delete_customer(id)).await?;
        self.api.parse_delete_customer(response)
    }

    // -- transactions --

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let response = self.execute(self.api.build_list_transactions()).await?;
        self.api.parse_list_transactions(response)
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, ApiError> {
        let response = self.execute(self.api.build_get_transaction(id)).await?;
        self.api.parse_get_transaction(response)
    }

    pub async fn create_transaction(&self, input: &CreateTransaction) -> Result<Transaction, ApiError> {
        let request = self.api.build_create_transaction(input)?;
        let response = self.execute(request).await?;
        self.api.parse_create_transaction(response)
    }

    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        let response = self.execute(self.api.build_delete_transaction(id)).await?;
        self.api.parse_delete_transaction(response)
    }
}
