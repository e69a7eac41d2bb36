use std::net::SocketAddr;

use clap::Parser;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Consistency of balance and history reads against in-flight mutations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReadConsistency {
    /// Reads bypass the per-user lock
    ///
    /// A read racing a mutation of the same user may return the value from before that
    /// mutation.
    #[default]
    Relaxed,
    /// Reads wait on the per-user lock, so they never overlap a mutation of that user
    ///
    /// Handles are never evicted, so every user read this way keeps one for the life of the
    /// process, including users that are only ever read.
    Linearizable,
}

#[derive(Clone, Debug, Parser)]
#[command(about = "In-memory point ledger", version = env!("CARGO_PKG_VERSION"))]
pub struct Config {
    #[arg(
        long,
        env = "POINT_LEDGER_LISTEN",
        default_value = DEFAULT_LISTEN,
        help = "Address the HTTP server binds to"
    )]
    pub listen: SocketAddr,

    #[arg(
        long,
        env = "POINT_LEDGER_READ_CONSISTENCY",
        value_enum,
        default_value_t = ReadConsistency::Relaxed,
        help = "Whether balance and history reads take the per-user lock"
    )]
    pub read_consistency: ReadConsistency,
}
