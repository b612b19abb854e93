//! `h10cm`: command-line client for the H10CM production tracker.
//!
//! Manages contexts, browses projects and units, and runs the batch
//! actions (step updates, shipping, unit creation) plus the pending-orders
//! cart against an H10CM backend.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use h10cm_tracking::model::StepStatus;
use h10cm_tracking::Bucket;
use tracing_subscriber::EnvFilter;

use commands::cart::NewLine;
use commands::{Output, Session};

/// H10CM CLI tool.
#[derive(Parser, Debug)]
#[command(name = "h10cm", about = "H10CM production tracking client")]
struct Cli {
    /// Path to client config file (default: ~/.h10cm/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts (backend + identity).
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Projects and their dashboard figures.
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// A project's production steps.
    Steps {
        #[command(subcommand)]
        action: StepAction,
    },

    /// Tracked units and batch actions on them.
    Units {
        #[command(subcommand)]
        action: UnitAction,
    },

    /// Inventory items and stock levels.
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },

    /// Local pending-orders cart.
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },

    /// Check server status.
    Status,

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create a new context (or replace one with the same name).
    Create {
        /// Context name.
        name: String,
        /// Backend base URL, e.g. http://localhost:3000/api.
        #[arg(long)]
        server: String,
        /// Bearer token.
        #[arg(long)]
        token: Option<String>,
        /// Name recorded on completed steps and stock transactions.
        #[arg(long)]
        user: Option<String>,
        /// Local state directory (default: ~/.h10cm/<name>).
        #[arg(long)]
        data_dir: Option<String>,
        /// Extra settings, e.g. --set max-in-flight=4.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        settings: Vec<String>,
    },
    /// List all contexts.
    List,
    /// Switch the current context.
    Use { name: String },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ProjectAction {
    /// List projects, most active first.
    List,
    /// Show one project.
    Show { project: String },
    /// Change a project's status (Active, Planning, On Hold, ...).
    SetStatus { project: String, status: String },
    /// Step-progress figures for a project.
    Stats { project: String },
}

#[derive(Subcommand, Debug)]
enum StepAction {
    /// List a project's steps in order.
    List { project: String },
    /// Add a step.
    Add {
        project: String,
        name: String,
        /// Position; defaults to after the last step.
        #[arg(long)]
        order: Option<i32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Edit a step (by id or name).
    Edit {
        project: String,
        step: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        order: Option<i32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a step (by id or name).
    Delete { project: String, step: String },
}

#[derive(Subcommand, Debug)]
enum UnitAction {
    /// List units grouped into in-progress / completed / shipped.
    List {
        project: String,
        /// Only this bucket.
        #[arg(long)]
        bucket: Option<Bucket>,
    },
    /// Show one unit (by id or serial) with its step statuses.
    Show { project: String, unit: String },
    /// Create units with consecutive serial numbers.
    Add {
        project: String,
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: usize,
        /// First unit serial (default: next free for the project type).
        #[arg(long)]
        start: Option<String>,
        /// First PCB serial.
        #[arg(long)]
        pcb_start: Option<String>,
    },
    /// Set one step's status on the selected units.
    Apply {
        project: String,
        /// Step id or name.
        #[arg(long)]
        step: String,
        /// Not Started, In Progress, Complete or N/A.
        #[arg(long)]
        status: StepStatus,
        /// Units (ids or serials); default: every in-progress unit.
        units: Vec<String>,
        /// Leave these units out.
        #[arg(long)]
        exclude: Vec<String>,
        /// Refuse to move a step backwards.
        #[arg(long)]
        forward_only: bool,
    },
    /// Mark units shipped; default: every completed unit.
    Ship {
        project: String,
        units: Vec<String>,
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Set or clear custom attributes on a unit.
    SetAttr {
        project: String,
        unit: String,
        /// NAME=VALUE pairs.
        values: Vec<String>,
        /// Attribute names to clear.
        #[arg(long)]
        clear: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum InventoryAction {
    /// List inventory items.
    List,
    /// Post a stock change (positive adds, negative removes).
    Adjust {
        item: String,
        #[arg(allow_hyphen_values = true)]
        change: i64,
        /// Adjustment, Receipt, Consumption, ...
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Items at or below their reorder point.
    Low,
}

#[derive(Subcommand, Debug)]
enum CartAction {
    /// Add a reorder (--item) or a new part (--new NAME).
    Add {
        /// Inventory item id to reorder.
        #[arg(long, conflicts_with = "new", required_unless_present = "new")]
        item: Option<String>,
        /// Name of a part not yet in inventory.
        #[arg(long)]
        new: Option<String>,
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,
        #[arg(long, default_value = "pcs")]
        unit: String,
        #[arg(long)]
        part_number: Option<String>,
        /// Estimated cost per unit.
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show cart contents and totals.
    List,
    /// Remove a line, or change its quantity with --quantity.
    Remove {
        id: String,
        #[arg(long)]
        quantity: Option<u32>,
    },
    /// Empty the cart.
    Clear,
    /// Submit all lines as orders.
    Submit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output: Output = cli.output.parse().map_err(anyhow::Error::msg)?;

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Create {
                name,
                server,
                token,
                user,
                data_dir,
                settings,
            } => {
                let ctx = config::Context {
                    name,
                    server,
                    token: token.unwrap_or_default(),
                    user: user.unwrap_or_default(),
                    data_dir: data_dir.unwrap_or_default(),
                    settings: settings
                        .into_iter()
                        .map(|s| format!("--{}", s.trim_start_matches('-')))
                        .collect(),
                };
                commands::context::create(ctx, &config_path)?;
            }
            ContextAction::List => commands::context::list(&config_path)?,
            ContextAction::Use { name } => commands::context::use_context(&name, &config_path)?,
            ContextAction::Delete { name } => commands::context::delete(&name, &config_path)?,
        },

        Commands::Projects { action } => {
            let session = Session::load(&config_path)?;
            match action {
                ProjectAction::List => commands::projects::list(&session, output).await?,
                ProjectAction::Show { project } => commands::projects::show(&session, &project, output).await?,
                ProjectAction::SetStatus { project, status } => {
                    commands::projects::set_status(&session, &project, &status).await?
                }
                ProjectAction::Stats { project } => commands::projects::stats(&session, &project, output).await?,
            }
        }

        Commands::Steps { action } => {
            let session = Session::load(&config_path)?;
            match action {
                StepAction::List { project } => commands::steps::list(&session, &project, output).await?,
                StepAction::Add {
                    project,
                    name,
                    order,
                    description,
                } => commands::steps::add(&session, &project, &name, order, description).await?,
                StepAction::Edit {
                    project,
                    step,
                    name,
                    order,
                    description,
                } => commands::steps::edit(&session, &project, &step, name, order, description).await?,
                StepAction::Delete { project, step } => commands::steps::delete(&session, &project, &step).await?,
            }
        }

        Commands::Units { action } => {
            let session = Session::load(&config_path)?;
            match action {
                UnitAction::List { project, bucket } => {
                    commands::units::list(&session, &project, bucket, output).await?
                }
                UnitAction::Show { project, unit } => commands::units::show(&session, &project, &unit, output).await?,
                UnitAction::Add {
                    project,
                    quantity,
                    start,
                    pcb_start,
                } => commands::units::add(&session, &project, quantity, start, pcb_start, output).await?,
                UnitAction::Apply {
                    project,
                    step,
                    status,
                    units,
                    exclude,
                    forward_only,
                } => {
                    commands::units::apply(&session, &project, &step, status, &units, &exclude, forward_only, output)
                        .await?
                }
                UnitAction::Ship { project, units, exclude } => {
                    commands::units::ship(&session, &project, &units, &exclude, output).await?
                }
                UnitAction::SetAttr {
                    project,
                    unit,
                    values,
                    clear,
                } => commands::units::set_attr(&session, &project, &unit, &values, &clear).await?,
            }
        }

        Commands::Inventory { action } => {
            let session = Session::load(&config_path)?;
            match action {
                InventoryAction::List => commands::inventory::list(&session, output).await?,
                InventoryAction::Adjust {
                    item,
                    change,
                    kind,
                    notes,
                } => commands::inventory::adjust(&session, &item, change, kind, notes).await?,
                InventoryAction::Low => commands::inventory::low(&session, output).await?,
            }
        }

        Commands::Cart { action } => {
            let session = Session::load(&config_path)?;
            match action {
                CartAction::Add {
                    item,
                    new,
                    quantity,
                    unit,
                    part_number,
                    cost,
                    supplier,
                    notes,
                } => {
                    let line = match (item, new) {
                        (Some(item_id), _) => NewLine::Reorder { item_id },
                        (None, Some(name)) => NewLine::Part {
                            name,
                            unit_of_measure: unit,
                            part_number,
                            cost,
                            supplier,
                        },
                        (None, None) => anyhow::bail!("Provide --item <id> or --new <name>."),
                    };
                    commands::cart::add(&session, line, quantity, notes).await?;
                }
                CartAction::List => commands::cart::list(&session, output)?,
                CartAction::Remove { id, quantity } => commands::cart::remove(&session, &id, quantity)?,
                CartAction::Clear => commands::cart::clear(&session)?,
                CartAction::Submit => commands::cart::submit(&session, output).await?,
            }
        }

        Commands::Status => {
            let session = Session::load(&config_path)?;
            commands::status::status(&session, output).await?;
        }

        Commands::Version => {
            println!("h10cm cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
