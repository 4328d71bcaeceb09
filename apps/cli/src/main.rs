//! # Stockroom Command-Line Entry Point
//!
//! Parses arguments, wires a backend and runs one command.
//!
//! ## Command Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stockroom [--config PATH] [--memory] [--json] [-v] <command>           │
//! │                                                                         │
//! │  inventory list | add | update <id> | delete <id>     (/inventory)     │
//! │  sales list | products | record | reconcile <id>      (/sales)         │
//! │  register | login | logout                            (/register ...)  │
//! │  config show | init                                                     │
//! │                                                                         │
//! │  Protected commands run the route guard first; a signed-out user gets   │
//! │  [UNAUTHENTICATED] and the login hint.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load config (defaults → file → environment)
//! 3. Connect to the backend, or seed the in-memory demo
//! 4. Restore the session and check the route guard
//! 5. Run the command, print the result, map errors to the exit code

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use stockroom_cli::commands::{auth, inventory, sale};
use stockroom_cli::error::{ApiError, ErrorCode};
use stockroom_cli::routes::{self, Route};
use stockroom_cli::{init_tracing, render, App};
use stockroom_core::{InventoryForm, SaleForm};
use stockroom_store::StoreConfig;

#[derive(Debug, Parser)]
#[command(name = "stockroom", version, about = "Inventory and sales for a small shop")]
struct Cli {
    /// Config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a seeded in-memory backend instead of the hosted one
    #[arg(long, global = true)]
    memory: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage inventory items
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Record and list sales
    #[command(subcommand)]
    Sales(SalesCommand),

    /// Create an account
    Register(Credentials),

    /// Sign in
    Login(Credentials),

    /// Sign out
    Logout,

    /// Show or write the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum InventoryCommand {
    /// List every item
    List,
    /// Add an item
    Add(ItemFields),
    /// Change the given fields of an item
    Update {
        id: i64,
        #[command(flatten)]
        fields: ItemFields,
    },
    /// Delete an item
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum SalesCommand {
    /// List sales, newest first
    List,
    /// Products available for sale
    Products,
    /// Record a sale and decrement stock
    Record {
        /// Product id
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
    },
    /// Apply the stock decrement of a partially recorded sale
    Reconcile { sale_id: i64 },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a config file with default values
    Init,
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Debug, Args)]
struct ItemFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    quantity: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    cost: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
}

impl From<ItemFields> for InventoryForm {
    fn from(fields: ItemFields) -> Self {
        InventoryForm {
            product_name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            cost: fields.cost,
            supplier_id: fields.supplier,
        }
    }
}

impl Command {
    /// The view this command belongs to, if it is guarded.
    fn route(&self) -> Option<Route> {
        match self {
            Command::Inventory(_) => Some(Route::Inventory),
            Command::Sales(_) => Some(Route::Sales),
            Command::Register(_) => Some(Route::Register),
            Command::Login(_) => Some(Route::Login),
            Command::Logout | Command::Config(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ApiError> {
    let config = StoreConfig::load(cli.config.clone())?;

    if let Command::Config(action) = cli.command {
        return run_config(action, &config, cli.config, cli.json);
    }

    let app = if cli.memory {
        let signed_in = !matches!(cli.command, Command::Register(_) | Command::Login(_));
        let mut app = App::demo(signed_in).await?;
        app.store = app.store.with_settings(config.sales.clone());
        app
    } else {
        App::connect(&config, stockroom_cli::state::SessionState::default_path()).await?
    };

    if let Some(route) = cli.command.route() {
        if route.is_protected() {
            routes::require(route, &app.session.state())?;
        }
    }

    let out = Output { json: cli.json };
    match cli.command {
        Command::Inventory(action) => run_inventory(action, &app, out).await,
        Command::Sales(action) => run_sales(action, &app, out).await,
        Command::Register(c) => {
            let registration = auth::register(&app.session, &c.email, &c.password).await?;
            out.print(&registration, |r| match r {
                auth::Registration::SignedIn { user } => format!(
                    "Registered and signed in as {}.",
                    user.email.as_deref().unwrap_or(&user.id)
                ),
                auth::Registration::AwaitingConfirmation { message } => message.clone(),
            })
        }
        Command::Login(c) => {
            let session = auth::login(&app.session, &c.email, &c.password).await?;
            out.print(&session.user, |user| {
                format!("Signed in as {}.", user.email.as_deref().unwrap_or(&user.id))
            })
        }
        Command::Logout => {
            auth::logout(&app.session).await?;
            out.print(&(), |_| "Signed out.".to_string())
        }
        Command::Config(_) => Ok(()),
    }
}

async fn run_inventory(action: InventoryCommand, app: &App, out: Output) -> Result<(), ApiError> {
    match action {
        InventoryCommand::List => {
            let items = inventory::list_items(&app.store).await?;
            out.print(&items, |items| render::inventory_table(items))
        }
        InventoryCommand::Add(fields) => {
            let item = inventory::add_item(&app.store, &app.view, &fields.into()).await?;
            out.print(&item, |item| {
                format!("Added #{} {}.", item.id, item.product_name)
            })
        }
        InventoryCommand::Update { id, fields } => {
            let item = inventory::update_item(&app.store, &app.view, id, &fields.into()).await?;
            out.print(&item, |item| render::inventory_table(std::slice::from_ref(item)))
        }
        InventoryCommand::Delete { id } => {
            inventory::delete_item(&app.store, &app.view, id).await?;
            out.print(&id, |id| format!("Deleted #{}.", id))
        }
    }
}

async fn run_sales(action: SalesCommand, app: &App, out: Output) -> Result<(), ApiError> {
    match action {
        SalesCommand::List => {
            let lines = sale::list_sales(&app.store, &app.view).await?;
            out.print(&lines, |lines| render::sales_table(lines))
        }
        SalesCommand::Products => {
            let options = app.view.refresh(app.store.inventory()).await?;
            out.print(&options, |options| render::product_options(options))
        }
        SalesCommand::Record { product, quantity } => {
            let form = SaleForm {
                product_id: product,
                quantity,
            };
            match sale::record_sale_form(&app.store, &app.view, &form).await {
                Ok(recorded) => out.print(&recorded, |r| {
                    format!(
                        "Sale #{} added: {} x {} = {}.",
                        r.sale.id,
                        r.sale.quantity,
                        r.sale.price,
                        r.sale.total()
                    )
                }),
                Err(e) => {
                    if let Some(sale) = e.recorded_sale() {
                        eprintln!(
                            "Sale #{} was saved. Run `stockroom sales reconcile {}` to apply the stock change.",
                            sale.id, sale.id
                        );
                    }
                    Err(e.into())
                }
            }
        }
        SalesCommand::Reconcile { sale_id } => {
            let item = sale::reconcile_by_id(&app.store, &app.view, sale_id).await?;
            out.print(&item, |item| {
                format!("{} now has {} in stock.", item.product_name, item.quantity)
            })
        }
    }
}

fn run_config(
    action: ConfigCommand,
    config: &StoreConfig,
    path: Option<PathBuf>,
    json: bool,
) -> Result<(), ApiError> {
    match action {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            if !shown.backend.anon_key.is_empty() {
                shown.backend.anon_key = "********".to_string();
            }
            let text = if json {
                serde_json::to_string_pretty(&shown).map_err(encode_error)?
            } else {
                toml::to_string_pretty(&shown).map_err(encode_error)?
            };
            println!("{}", text.trim_end());
            Ok(())
        }
        ConfigCommand::Init => {
            let target = path.or_else(StoreConfig::default_config_path);
            StoreConfig::default().save(target.clone())?;
            if let Some(target) = target {
                println!("Wrote {}.", target.display());
            }
            Ok(())
        }
    }
}

fn encode_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::new(ErrorCode::Config, format!("Failed to encode output: {}", e))
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn print<T: Serialize>(self, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), ApiError> {
        let rendered = if self.json {
            serde_json::to_string_pretty(value).map_err(encode_error)?
        } else {
            text(value)
        };
        println!("{}", rendered);
        Ok(())
    }
}
