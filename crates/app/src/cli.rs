use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engine::{CaseStatus, LedgerCategory};

#[derive(Parser, Debug)]
#[command(name = "credit_ledger")]
#[command(about = "Operate the tenant credit ledger and case lifecycle")]
pub struct Cli {
    /// Config file path without extension (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Override the SQLite database path.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Override the log level.
    #[arg(long, global = true)]
    pub level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the current balance.
    Balance,
    /// Add credits to the balance.
    Allocate { quantity: i64 },
    /// Remove credits from the balance.
    Revoke { quantity: i64 },
    /// List ledger entries with their running balance.
    History(HistoryArgs),
    Case(Case),
    User(User),
    Unit(Unit),
    /// List a user's notifications and mark them read.
    Notifications(NotificationsArgs),
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(long, value_parser = parse_category)]
    pub category: Vec<LedgerCategory>,
    #[arg(long)]
    pub employee_id: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    /// Oldest first.
    #[arg(long)]
    pub asc: bool,
    #[arg(long)]
    pub page: Option<u64>,
    #[arg(long, default_value_t = 20)]
    pub limit: u64,
    /// Write CSV instead of a table.
    #[arg(long)]
    pub csv: bool,
    /// Write to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct Case {
    #[command(subcommand)]
    pub command: CaseCommand,
}

#[derive(Subcommand, Debug)]
pub enum CaseCommand {
    /// Register a case for a unit, debiting one credit.
    Create {
        #[arg(long)]
        unit: String,
        /// Employee id of the owner.
        #[arg(long)]
        owner: String,
    },
    /// Reject a case and refund its credit.
    Cancel {
        #[arg(long)]
        id: i32,
        /// Employee id of the requesting user; omit for a system cancellation.
        #[arg(long)]
        requestor: Option<String>,
    },
    /// Move the case of a unit to a new status.
    Status {
        #[arg(long)]
        unit: String,
        #[arg(long, value_parser = parse_status)]
        status: CaseStatus,
        #[arg(long)]
        requestor: Option<String>,
    },
    Show {
        #[arg(long)]
        unit: String,
    },
}

#[derive(Args, Debug)]
pub struct User {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        /// Flag the user as the house account.
        #[arg(long)]
        house: bool,
    },
}

#[derive(Args, Debug)]
pub struct Unit {
    #[command(subcommand)]
    pub command: UnitCommand,
}

#[derive(Subcommand, Debug)]
pub enum UnitCommand {
    Add {
        #[arg(long)]
        key: String,
        /// Opaque JSON payload forwarded downstream.
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long)]
        file: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct NotificationsArgs {
    #[arg(long)]
    pub employee_id: String,
    #[arg(long, default_value_t = 0)]
    pub page: u64,
    #[arg(long, default_value_t = 20)]
    pub limit: u64,
}

fn parse_category(value: &str) -> Result<LedgerCategory, String> {
    LedgerCategory::try_from(value.trim().to_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_status(value: &str) -> Result<CaseStatus, String> {
    value.parse::<CaseStatus>().map_err(|err| err.to_string())
}
