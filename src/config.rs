use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Upper bounds applied to incoming instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_rooms: usize,
    pub max_groups: usize,
    pub max_slots: usize,
    pub max_capacity: u32,
    pub max_group_size: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rooms: 200,
            max_groups: 200,
            max_slots: 50,
            max_capacity: 1000,
            max_group_size: 1000,
        }
    }
}

/// Command line / environment configuration of the service.
#[derive(Debug, Clone, Parser)]
#[command(name = "room_assigner", version, about = "Assigns groups to rooms and timeslots with a MILP model")]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "ROOM_ASSIGNER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Wall-clock bound for a single solve, in seconds.
    #[arg(long, env = "ROOM_ASSIGNER_SOLVE_TIMEOUT", default_value_t = 30)]
    pub solve_timeout_secs: u64,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Forward HiGHS console output.
    #[arg(long)]
    pub solver_log: bool,

    /// Slots used when a request supplies none.
    #[arg(long = "default-slot", default_values_t = vec!["T1".to_string()])]
    pub default_slots: Vec<String>,

    #[arg(long, default_value_t = 200)]
    pub max_rooms: usize,

    #[arg(long, default_value_t = 200)]
    pub max_groups: usize,

    #[arg(long, default_value_t = 50)]
    pub max_slots: usize,

    #[arg(long, default_value_t = 1000)]
    pub max_capacity: u32,

    #[arg(long, default_value_t = 1000)]
    pub max_group_size: u32,
}

impl Config {
    pub fn limits(&self) -> Limits {
        Limits {
            max_rooms: self.max_rooms,
            max_groups: self.max_groups,
            max_slots: self.max_slots,
            max_capacity: self.max_capacity,
            max_group_size: self.max_group_size,
        }
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_secs(self.solve_timeout_secs)
    }
}
