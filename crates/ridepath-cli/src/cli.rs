//! Command-line arguments

use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use ridepath_core::{Coordinates, RideType};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ridepath", version, about = "Driver route tools for the ride backend")]
pub(crate) struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "RIDEPATH_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Backend base URL, overrides config and environment
    #[arg(long, global = true)]
    pub(crate) api_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub(crate) log_json: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show start and destination cities with the ETA between them
    RouteCities {
        /// Ignore the cached ETA
        #[arg(long)]
        refresh: bool,
    },

    /// List today's optimized stops
    Today(PositionArgs),

    /// Mark the current stop as completed
    Complete {
        #[command(flatten)]
        position: PositionArgs,

        /// Notes attached to the attendance record
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Print the maps link for the current stop
    Navigate(PositionArgs),

    /// Search cities by name
    Search {
        /// At least two characters
        query: String,
    },

    /// Save the route through the given cities, in travel order
    Setup {
        /// City name, repeat for each waypoint
        #[arg(long = "city", required = true)]
        cities: Vec<String>,

        #[arg(long, default_value = "school")]
        ride_type: RideType,

        /// Usual start time, HH:MM
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,

        /// Usual end time, HH:MM
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
    },

    /// Show conversations, or the messages of one
    Chats {
        /// Conversation to open
        #[arg(long)]
        conversation: Option<i64>,

        /// Keep polling for this many seconds
        #[arg(long, default_value_t = 0)]
        watch: u64,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub(crate) struct PositionArgs {
    /// Current latitude
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub(crate) lat: Option<f64>,

    /// Current longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub(crate) lng: Option<f64>,
}

impl PositionArgs {
    pub(crate) fn coordinates(self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM: {e}"))
}
