//! Required-field checks run before a request is built.
//!
//! A field is missing when it is empty after trimming. Validation failures
//! never reach the transport.

use crate::error::ApiError;
use crate::types::{CreateCustomer, CreateService, CreateTransaction, LoginRequest};

fn required(value: &str, field: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(field));
    }
    Ok(())
}

pub fn login(input: &LoginRequest) -> Result<(), ApiError> {
    required(&input.phone, "phone")?;
    required(&input.password, "password")
}

pub fn create_customer(input: &CreateCustomer) -> Result<(), ApiError> {
    required(&input.name, "name")?;
    required(&input.phone, "phone")
}

pub fn create_service(input: &CreateService) -> Result<(), ApiError> {
    required(&input.name, "name")
}

pub fn create_transaction(input: &CreateTransaction) -> Result<(), ApiError> {
    required(&input.customer_id, "customerId")?;
    if input.services.is_empty() {
        return Err(ApiError::Validation("services"));
    }
    for item in &input.services {
        required(&item.name, "services.name")?;
        if item.quantity < 1 {
            return Err(ApiError::Validation("services.quantity"));
        }
    }
    Ok(())
}
