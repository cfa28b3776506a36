use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relink")]
#[command(version = "0.1.0")]
#[command(about = "Serial link watchdog with automatic reconnection", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the watchdog against a scripted link (dry run, no real device)
    Simulate {
        /// Comma-separated status script, e.g. "offline,offline,offline,operational".
        /// The last status repeats once the script is exhausted.
        #[arg(long, default_value = "offline,offline,offline,operational")]
        statuses: String,

        /// Port the scripted link reports ("auto" or a device path)
        #[arg(long, default_value = "auto")]
        port: String,

        /// Baud rate the scripted link reports
        #[arg(long, default_value = "115200")]
        baud: u32,

        /// Pretend the named port is missing from the simulated host
        #[arg(long)]
        port_absent: bool,

        /// Settle delay in seconds before polling begins
        #[arg(long, default_value = "0")]
        initial_delay: i64,

        /// Seconds between status polls
        #[arg(long, default_value = "1")]
        poll_period: i64,

        /// Consecutive offline indications before a reconnect attempt
        #[arg(long, default_value = "3")]
        offline_threshold: i64,

        /// Seconds to run before stopping
        #[arg(long, default_value = "15")]
        run_for: u64,
    },
    /// Print the effective (sanitized) configuration as JSON
    Config,
}
