//! CLI interface for Parkgate

pub mod commands;
mod output;

pub use output::*;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parkgate")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Sign in to the parking marketplace and manage your lots", long_about = None)]
pub struct Cli {
    /// Path to parkgate.toml (defaults to searching upward from the current directory)
    #[arg(short, long, global = true, env = "PARKGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new parkgate.toml configuration file
    Init,

    /// Log in with your phone number and a one-time password
    Login {
        /// Phone number the OTP is sent to
        #[arg(short, long)]
        phone: String,

        /// OTP received by SMS (prompted for when omitted)
        #[arg(short, long)]
        otp: Option<String>,
    },

    /// Log out and clear the local session
    Logout {
        /// Only forget the local session; the backend is not contacted
        #[arg(long)]
        local: bool,
    },

    /// Show the current user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check what the route guard decides for a path
    Check {
        /// App path, e.g. /parking/42
        path: String,
    },

    /// List the route table
    Routes,

    /// Manage your parking lots
    Parking {
        #[command(subcommand)]
        action: ParkingAction,
    },

    /// Subscription plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
}

#[derive(Subcommand)]
pub enum ParkingAction {
    /// List your parking lots
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one parking lot
    Show {
        /// Parking lot id
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Add a parking lot
    Add(ParkingFields),

    /// Update a parking lot; omitted fields keep their current value
    Update {
        /// Parking lot id
        id: String,

        #[command(flatten)]
        fields: ParkingUpdateFields,
    },
}

#[derive(Args)]
pub struct ParkingFields {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub city: String,

    /// Hourly price
    #[arg(long)]
    pub price: String,

    #[arg(long)]
    pub pin_code: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Comma-separated feature list
    #[arg(long, default_value = "")]
    pub features: String,
}

#[derive(Args)]
pub struct ParkingUpdateFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    #[arg(long)]
    pub pin_code: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub features: Option<String>,
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// Quote a number of slots on the current plan
    Quote {
        /// Number of slots
        #[arg(short, long, default_value_t = crate::plan::DEFAULT_SLOTS)]
        slots: u32,
    },

    /// Subscribe a parking lot to the current plan
    Subscribe {
        /// Parking lot id
        parking_id: String,

        /// Number of slots
        #[arg(short, long, default_value_t = crate::plan::DEFAULT_SLOTS)]
        slots: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
