//! Stateless HTTP request builder and response parser for the Kami API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Credentials are not its concern: `AuthenticatedClient` attaches the
//! bearer token to whatever `build_*` returns.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateCustomer, CreateService, CreateTransaction, Customer, LoginRequest, LoginResponse,
    Service, Transaction, UpdateCustomer, UpdateService,
};
use crate::validate;

const AUTH: &str = "/auth";
const SERVICES: &str = "/Services";
const CUSTOMERS: &str = "/Customers";
const TRANSACTIONS: &str = "/Transactions";

/// Synchronous, stateless client for the Kami API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    // -- auth --

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        validate::login(input)?;
        self.json_request(HttpMethod::Post, AUTH, input)
    }

    /// 400 and 401 from `/auth` both mean the phone/password pair was refused.
    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        if matches!(response.status, 400 | 401) {
            return Err(ApiError::AuthRejected);
        }
        check_status(&response, &[200, 201])?;
        decode(&response)
    }

    // -- services --

    pub fn build_list_services(&self) -> HttpRequest {
        self.request(HttpMethod::Get, SERVICES)
    }

    pub fn build_get_service(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{SERVICES}/{id}"))
    }

    pub fn build_create_service(&self, input: &CreateService) -> Result<HttpRequest, ApiError> {
        validate::create_service(input)?;
        self.json_request(HttpMethod::Post, SERVICES, input)
    }

    pub fn build_update_service(&self, id: &str, input: &UpdateService) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("{SERVICES}/{id}"), input)
    }

    pub fn build_delete_service(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("{SERVICES}/{id}"))
    }

    pub fn parse_list_services(&self, response: HttpResponse) -> Result<Vec<Service>, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_get_service(&self, response: HttpResponse) -> Result<Service, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_create_service(&self, response: HttpResponse) -> Result<Service, ApiError> {
        check_status(&response, &[200, 201])?;
        decode(&response)
    }

    pub fn parse_update_service(&self, response: HttpResponse) -> Result<Service, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_delete_service(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    // -- customers --

    pub fn build_list_customers(&self) -> HttpRequest {
        self.request(HttpMethod::Get, CUSTOMERS)
    }

    pub fn build_get_customer(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{CUSTOMERS}/{id}"))
    }

    pub fn build_create_customer(&self, input: &CreateCustomer) -> Result<HttpRequest, ApiError> {
        validate::create_customer(input)?;
        self.json_request(HttpMethod::Post, CUSTOMERS, input)
    }

    pub fn build_update_customer(&self, id: &str, input: &UpdateCustomer) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("{CUSTOMERS}/{id}"), input)
    }

    pub fn build_delete_customer(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("{CUSTOMERS}/{id}"))
    }

    pub fn parse_list_customers(&self, response: HttpResponse) -> Result<Vec<Customer>, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_get_customer(&self, response: HttpResponse) -> Result<Customer, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_create_customer(&self, response: HttpResponse) -> Result<Customer, ApiError> {
        check_status(&response, &[200, 201])?;
        decode(&response)
    }

    pub fn parse_update_customer(&self, response: HttpResponse) -> Result<Customer, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_delete_customer(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    // -- transactions --

    pub fn build_list_transactions(&self) -> HttpRequest {
        self.request(HttpMethod::Get, TRANSACTIONS)
    }

    pub fn build_get_transaction(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("{TRANSACTIONS}/{id}"))
    }

    pub fn build_create_transaction(&self, input: &CreateTransaction) -> Result<HttpRequest, ApiError> {
        validate::create_transaction(input)?;
        self.json_request(HttpMethod::Post, TRANSACTIONS, input)
    }

    pub fn build_delete_transaction(&self, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("{TRANSACTIONS}/{id}"))
    }

    pub fn parse_list_transactions(&self, response: HttpResponse) -> Result<Vec<Transaction>, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_get_transaction(&self, response: HttpResponse) -> Result<Transaction, ApiError> {
        check_status(&response, &[200])?;
        decode(&response)
    }

    pub fn parse_create_transaction(&self, response: HttpResponse) -> Result<Transaction, ApiError> {
        check_status(&response, &[200, 201])?;
        decode(&response)
    }

    pub fn parse_delete_transaction(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    match response.status {
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_login_produces_correct_request() {
        let input = LoginRequest {
            phone: "+15551234567".to_string(),
            password: "secret".to_string(),
        };
        let req = client().build_login(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/auth");
        assert!(req.header("authorization").is_none());
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["phone"], "+15551234567");
        assert_eq!(body["password"], "secret");
    }

    #[test]
    fn build_login_rejects_blank_password() {
        let input = LoginRequest {
            phone: "0373007856".to_string(),
            password: " ".to_string(),
        };
        let err = client().build_login(&input).unwrap_err();
        assert!(matches!(err, ApiError::Validation("password")));
    }

    #[test]
    fn parse_login_maps_rejection() {
        for status in [400, 401] {
            let err = client().parse_login(response(status, "")).unwrap_err();
            assert!(matches!(err, ApiError::AuthRejected), "status {status}");
        }
        let ok = client()
            .parse_login(response(200, r#"{"token":"abc","phone":"0373007856"}"#))
            .unwrap();
        assert_eq!(ok.token, "abc");
    }

    #[test]
    fn resource_paths_are_capitalized() {
        let c = client();
        assert_eq!(c.build_list_services().path, "http://localhost:3000/Services");
        assert_eq!(c.build_get_customer("c1").path, "http://localhost:3000/Customers/c1");
        assert_eq!(
            c.build_delete_transaction("t1").path,
            "http://localhost:3000/Transactions/t1"
        );
        assert_eq!(c.build_delete_transaction("t1").method, HttpMethod::Delete);
    }

    #[test]
    fn build_create_customer_produces_json_body() {
        let input = CreateCustomer {
            name: "An".to_string(),
            phone: "0901".to_string(),
            address: None,
        };
        let req = client().build_create_customer(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "An");
        assert!(body.get("address").is_none());
    }

    #[test]
    fn build_create_transaction_validates_before_building() {
        let input = CreateTransaction {
            customer_id: "c1".to_string(),
            services: Vec::new(),
        };
        let err = client().build_create_transaction(&input).unwrap_err();
        assert!(matches!(err, ApiError::Validation("services")));

        let input = CreateTransaction {
            customer_id: "c1".to_string(),
            services: vec![LineItem {
                name: "Wash".to_string(),
                price: 100,
                quantity: 2,
            }],
        };
        let req = client().build_create_transaction(&input).unwrap();
        assert_eq!(req.path, "http://localhost:3000/Transactions");
    }

    #[test]
    fn build_update_service_skips_absent_fields() {
        let input = UpdateService {
            price: Some(120000),
            ..UpdateService::default()
        };
        let req = client().build_update_service("s1", &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"price": 120000}));
    }

    #[test]
    fn parse_list_customers_success() {
        let body = r#"[{"_id":"c1","name":"An","phone":"0901"}]"#;
        let customers = client().parse_list_customers(response(200, body)).unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, "c1");
    }

    #[test]
    fn parse_get_service_not_found() {
        let err = client().parse_get_service(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_unauthorized() {
        let err = client().parse_list_transactions(response(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn parse_create_accepts_200_and_201() {
        let body = r#"{"_id":"s1","name":"Wash","price":40000}"#;
        assert!(client().parse_create_service(response(200, body)).is_ok());
        assert!(client().parse_create_service(response(201, body)).is_ok());
    }

    #[test]
    fn parse_create_wrong_status() {
        let err = client()
            .parse_create_customer(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_delete_accepts_200_and_204() {
        assert!(client().parse_delete_customer(response(204, "")).is_ok());
        assert!(client().parse_delete_service(response(200, "{}")).is_ok());
    }

    #[test]
    fn parse_bad_json() {
        let err = client().parse_list_services(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.build_list_customers().path, "http://localhost:3000/Customers");
    }
}
