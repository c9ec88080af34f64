use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use kami_core::{
    default_token_path, format_amount, AuthenticatedClient, ClientConfig, CreateCustomer,
    CreateService, CreateTransaction, CredentialState, Customer, FetchState, FileTokenStore,
    LineItem, ReqwestTransport, Service, Transaction, UpdateCustomer, UpdateService,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

type Client = AuthenticatedClient<ReqwestTransport, FileTokenStore>;

/// Command-line front end for the Kami business backend.
#[derive(Parser, Debug)]
#[command(name = "kami", version)]
struct Cli {
    /// Backend origin
    #[arg(long, global = true, env = "KAMI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Session file holding the login token [default: ~/.kami/session.json]
    #[arg(long, global = true, env = "KAMI_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "KAMI_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token.
    Login {
        #[arg(long)]
        phone: String,
        /// Also read from KAMI_PASSWORD
        #[arg(long, env = "KAMI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session token.
    Logout,
    /// Show whether a session token is stored.
    Status,
    #[command(subcommand)]
    Services(ServiceCommand),
    #[command(subcommand)]
    Customers(CustomerCommand),
    #[command(subcommand)]
    Transactions(TransactionCommand),
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    List,
    Show { id: String },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: i64,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Args, Debug)]
struct CustomerFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

#[derive(Subcommand, Debug)]
enum CustomerCommand {
    List,
    Show { id: String },
    Create(CustomerFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: CustomerFields,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    List,
    Show { id: String },
    /// Record a sale. Items are SERVICE_ID or SERVICE_ID:QUANTITY.
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(
        base_url = %config.base_url,
        token_path = %config.token_path.display(),
        "configuration loaded"
    );
    let transport = ReqwestTransport::new(config.timeout()).context("building HTTP client")?;
    let client = AuthenticatedClient::new(
        &config.base_url,
        transport,
        FileTokenStore::new(&config.token_path),
    );

    let result = run(&client, cli.command).await;
    if let Err(e) = &result {
        if matches!(
            e.downcast_ref::<kami_core::ApiError>(),
            Some(kami_core::ApiError::Unauthorized)
        ) {
            eprintln!("Session expired. Run `kami login` again.");
        }
    }
    result
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let config = ClientConfig {
        base_url: cli.base_url.clone(),
        token_path: cli.token_path.clone().unwrap_or_else(default_token_path),
        timeout_secs: cli.timeout,
    };
    config.validate()?;
    Ok(config)
}

async fn run(client: &Client, command: Command) -> Result<()> {
    match command {
        Command::Login { phone, password } => {
            client.login(&phone, &password).await?;
            println!("Logged in as {phone}");
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
        Command::Status => match client.state()? {
            CredentialState::Active => println!("Logged in"),
            CredentialState::Absent => println!("Not logged in"),
        },
        Command::Services(cmd) => services(client, cmd).await?,
        Command::Customers(cmd) => customers(client, cmd).await?,
        Command::Transactions(cmd) => transactions(client, cmd).await?,
    }
    Ok(())
}

async fn services(client: &Client, cmd: ServiceCommand) -> Result<()> {
    match cmd {
        ServiceCommand::List => {
            for service in client.list_services().await? {
                println!("{:<26} {:<30} {:>14}", service.id, service.name, format_amount(service.price));
            }
        }
        ServiceCommand::Show { id } => print_service(&client.get_service(&id).await?),
        ServiceCommand::Create {
            name,
            price,
            description,
        } => {
            let service = client
                .create_service(&CreateService {
                    name,
                    price,
                    description,
                })
                .await?;
            print_service(&service);
        }
        ServiceCommand::Update {
            id,
            name,
            price,
            description,
        } => {
            let service = client
                .update_service(
                    &id,
                    &UpdateService {
                        name,
                        price,
                        description,
                    },
                )
                .await?;
            print_service(&service);
        }
        ServiceCommand::Delete { id } => {
            client.delete_service(&id).await?;
            println!("Deleted service {id}");
        }
    }
    Ok(())
}

async fn customers(client: &Client, cmd: CustomerCommand) -> Result<()> {
    match cmd {
        CustomerCommand::List => {
            for customer in client.list_customers().await? {
                println!("{:<26} {:<30} {}", customer.id, customer.name, customer.phone);
            }
        }
        CustomerCommand::Show { id } => print_customer(&client.get_customer(&id).await?),
        CustomerCommand::Create(fields) => {
            let input = CreateCustomer {
                name: fields.name.unwrap_or_default(),
                phone: fields.phone.unwrap_or_default(),
                address: fields.address,
            };
            print_customer(&client.create_customer(&input).await?);
        }
        CustomerCommand::Update { id, fields } => {
            let input = UpdateCustomer {
                name: fields.name,
                phone: fields.phone,
                address: fields.address,
            };
            print_customer(&client.update_customer(&id, &input).await?);
        }
        CustomerCommand::Delete { id } => {
            client.delete_customer(&id).await?;
            println!("Deleted customer {id}");
        }
    }
    Ok(())
}

async fn transactions(client: &Client, cmd: TransactionCommand) -> Result<()> {
    match cmd {
        TransactionCommand::List => {
            for tx in client.list_transactions().await? {
                let services = tx.services.len();
                println!(
                    "{:<26} {:<24} {} service{} {:>14}",
                    tx.id,
                    tx.customer_name.as_deref().unwrap_or("-"),
                    services,
                    if services == 1 { "" } else { "s" },
                    format_amount(tx.total()),
                );
            }
        }
        TransactionCommand::Show { id } => print_transaction(&client.get_transaction(&id).await?),
        TransactionCommand::Create { customer, items } => {
            let form = match FetchState::from_result(client.load_transaction_form().await) {
                FetchState::Loaded(form) => form,
                FetchState::Failed(e) => return Err(e.into()),
                FetchState::Loading => bail!("customers and services are still loading"),
            };
            if !form.customers.iter().any(|c| c.id == customer) {
                bail!("unknown customer {customer}");
            }
            let services = items
                .iter()
                .map(|item| line_item(item, &form.services))
                .collect::<Result<Vec<_>>>()?;
            let input = CreateTransaction {
                customer_id: customer,
                services,
            };
            print_transaction(&client.create_transaction(&input).await?);
        }
        TransactionCommand::Delete { id } => {
            client.delete_transaction(&id).await?;
            println!("Cancelled transaction {id}");
        }
    }
    Ok(())
}

/// Resolve `SERVICE_ID[:QUANTITY]` against the catalog, pricing at today's rate.
fn line_item(spec: &str, catalog: &[Service]) -> Result<LineItem> {
    let (id, quantity) = match spec.split_once(':') {
        Some((id, qty)) => (id, qty.parse().with_context(|| format!("bad quantity in {spec}"))?),
        None => (spec, 1),
    };
    let service = catalog
        .iter()
        .find(|s| s.id == id)
        .with_context(|| format!("unknown service {id}"))?;
    Ok(LineItem {
        name: service.name.clone(),
        price: service.price,
        quantity,
    })
}

fn print_service(service: &Service) {
    println!("Service:     {}", service.name);
    println!("Price:       {}", format_amount(service.price));
    println!(
        "Description: {}",
        service.description.as_deref().unwrap_or("No description")
    );
    if let Some(creator) = &service.created_by {
        println!("Creator:     {creator}");
    }
}

fn print_customer(customer: &Customer) {
    println!("Name:        {}", customer.name);
    println!("Phone:       {}", customer.phone);
    if let Some(address) = &customer.address {
        println!("Address:     {address}");
    }
    println!("Total spent: {}", format_amount(customer.total_spent()));
    for tx in &customer.transactions {
        println!("  {} {}", tx.id, tx.date.as_deref().unwrap_or(""));
        for item in &tx.services {
            println!("    - {} x{}  {}", item.name, item.quantity, format_amount(item.line_total()));
        }
    }
}

fn print_transaction(tx: &Transaction) {
    println!("Transaction: {}", tx.id);
    println!("Customer:    {}", tx.customer_name.as_deref().unwrap_or("-"));
    if let Some(date) = &tx.date {
        println!("Date:        {date}");
    }
    for item in &tx.services {
        println!("  {:<28} x{:<4} {:>14}", item.name, item.quantity, format_amount(item.price));
    }
    println!("Subtotal:    {}", format_amount(tx.subtotal()));
    println!("Discount:    {}", format_amount(tx.discount.unwrap_or(0)));
    println!("Total:       {}", format_amount(tx.total()));
}
