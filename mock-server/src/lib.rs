use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_PHONE: &str = "0373007856";
pub const DEFAULT_PASSWORD: &str = "123";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "createdBy")]
    pub created_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub services: Vec<LineItem>,
    pub discount: i64,
    pub date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Filled in on detail responses only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
pub struct Login {
    pub phone: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginReply {
    pub token: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct CreateService {
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateService {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransaction {
    pub customer_id: String,
    pub services: Vec<LineItem>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, String>,
    tokens: HashMap<String, String>,
    services: HashMap<String, Service>,
    customers: HashMap<String, Customer>,
    transactions: HashMap<String, Transaction>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with_user(DEFAULT_PHONE, DEFAULT_PASSWORD)
}

/// Router seeded with a single account.
pub fn app_with_user(phone: &str, password: &str) -> Router {
    router(seeded_db(phone, password))
}

pub fn seeded_db(phone: &str, password: &str) -> Db {
    let mut store = Store::default();
    store.users.insert(phone.to_string(), password.to_string());
    Arc::new(RwLock::new(store))
}

/// Router over a caller-held `Db`, so tests can reach into server state.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/auth", post(login))
        .route("/Services", get(list_services).post(create_service))
        .route(
            "/Services/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/Customers", get(list_customers).post(create_customer))
        .route(
            "/Customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/Transactions", get(list_transactions).post(create_transaction))
        .route("/Transactions/{id}", get(get_transaction).delete(delete_transaction))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, seeded_db(DEFAULT_PHONE, DEFAULT_PASSWORD)).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock backend listening");
    axum::serve(listener, router(db)).await
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Resolve the bearer token to the phone it was issued for.
fn authorize(store: &Store, headers: &HeaderMap) -> Result<String, StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    store.tokens.get(token).cloned().ok_or_else(|| {
        debug!("unknown token");
        StatusCode::UNAUTHORIZED
    })
}

/// Drop every issued token, as a server restart or revocation would.
pub async fn revoke_all(db: &Db) {
    db.write().await.tokens.clear();
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Result<Json<LoginReply>, StatusCode> {
    let mut store = db.write().await;
    match store.users.get(&input.phone) {
        Some(password) if *password == input.password => {}
        _ => return Err(StatusCode::UNAUTHORIZED),
    }
    let token = new_id();
    store.tokens.insert(token.clone(), input.phone.clone());
    Ok(Json(LoginReply {
        token,
        phone: input.phone,
    }))
}

// --- services ---

async fn list_services(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Service>>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.services.values().cloned().collect()))
}

async fn get_service(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Service>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store.services.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_service(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateService>,
) -> Result<(StatusCode, Json<Service>), StatusCode> {
    let mut store = db.write().await;
    let phone = authorize(&store, &headers)?;
    let service = Service {
        id: new_id(),
        name: input.name,
        price: input.price,
        description: input.description,
        created_by: phone,
    };
    store.services.insert(service.id.clone(), service.clone());
    Ok((StatusCode::CREATED, Json(service)))
}

async fn update_service(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateService>,
) -> Result<Json<Service>, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let service = store.services.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        service.name = name;
    }
    if let Some(price) = input.price {
        service.price = price;
    }
    if let Some(description) = input.description {
        service.description = Some(description);
    }
    Ok(Json(service.clone()))
}

async fn delete_service(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store.services.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

// --- customers ---

async fn list_customers(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Customer>>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.customers.values().cloned().collect()))
}

async fn get_customer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Customer>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let mut customer = store.customers.get(&id).cloned().ok_or(StatusCode::NOT_FOUND)?;
    customer.transactions = store
        .transactions
        .values()
        .filter(|t| t.customer_id == id)
        .cloned()
        .collect();
    Ok(Json(customer))
}

async fn create_customer(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>), StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let customer = Customer {
        id: new_id(),
        name: input.name,
        phone: input.phone,
        address: input.address,
        transactions: Vec::new(),
    };
    store.customers.insert(customer.id.clone(), customer.clone());
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateCustomer>,
) -> Result<Json<Customer>, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let customer = store.customers.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        customer.name = name;
    }
    if let Some(phone) = input.phone {
        customer.phone = phone;
    }
    if let Some(address) = input.address {
        customer.address = Some(address);
    }
    Ok(Json(customer.clone()))
}

async fn delete_customer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store.customers.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

// --- transactions ---

async fn list_transactions(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Transaction>>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.transactions.values().cloned().collect()))
}

async fn get_transaction(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store.transactions.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_transaction(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<Transaction>), StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let customer_name = store
        .customers
        .get(&input.customer_id)
        .map(|c| c.name.clone())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let transaction = Transaction {
        id: new_id(),
        customer_id: input.customer_id,
        customer_name,
        services: input.services,
        discount: 0,
        date: "2024-01-01T00:00:00.000Z".to_string(),
    };
    store.transactions.insert(transaction.id.clone(), transaction.clone());
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn delete_transaction(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .transactions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
