//! Command line interface for the `wirebridge` demonstration node.
//!
//! The binary joins two proxies over the in-memory loopback and sends a
//! message between them, which is enough to watch splitting, reassembly and
//! diagnostics at work.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Command line arguments for the `wirebridge` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wirebridge",
    version,
    about = "Bridge application messages onto a peer-to-peer frame transport"
)]
pub struct Cli {
    /// Payload size of the demonstration message in bytes.
    #[arg(long, default_value_t = 3 * 1024 * 1024)]
    pub payload_size: usize,

    /// Encoded size above which messages are split.
    #[arg(long, default_value_t = 1024 * 1024)]
    pub split_threshold: usize,

    /// Number of messages to send.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Diagnostics verbosity; above 2 audits every message, above 10 traces
    /// every frame.
    #[arg(short, long, default_value_t = 0)]
    pub debug_level: u8,

    /// File the audit log appends to.
    #[arg(long, default_value = "message_log.csv")]
    pub audit_log: PathBuf,

    /// Network to stamp on frames: main, test or local.
    #[arg(long, default_value = "local")]
    pub network: String,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn defaults_send_one_split_message() {
        let cli = Cli::parse_from(["wirebridge"]);
        assert_eq!(cli.count, 1);
        assert!(cli.payload_size > cli.split_threshold);
        assert_eq!(cli.network, "local");
        assert!(cli.metrics_addr.is_none());
    }

    #[test]
    fn parses_debug_and_metrics_options() {
        let cli = Cli::parse_from([
            "wirebridge",
            "--debug-level",
            "3",
            "--metrics-addr",
            "127.0.0.1:9000",
            "-n",
            "4",
        ]);
        assert_eq!(cli.debug_level, 3);
        assert_eq!(cli.count, 4);
        assert_eq!(
            cli.metrics_addr.map(|addr| addr.port()),
            Some(9000)
        );
    }
}
