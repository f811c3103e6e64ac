//! tuplebox-cli - Command-line interface for tuplebox
//!
//! Runs one request per invocation and prints the reply.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tuplebox_client::{Client, ConnectionConfig};

#[derive(Parser)]
#[command(name = "tuplebox-cli")]
#[command(about = "Command-line interface for the tuplebox tuple store")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, env = "TUPLEBOX_SERVER", default_value = "127.0.0.1:33013")]
    server: String,

    /// Namespace for data commands
    #[arg(short, long, env = "TUPLEBOX_NAMESPACE", default_value_t = 0)]
    namespace: u32,

    /// Fail instead of reconnecting when the connection drops
    #[arg(long)]
    no_reconnect: bool,

    /// Request timeout in milliseconds (0 disables timeouts)
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Print replies as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Values are sent as 32-bit integers when they parse as one, otherwise as
/// raw strings.
#[derive(Subcommand)]
enum Commands {
    /// Ping the server
    Ping,

    /// Insert (or replace) a tuple
    Insert {
        /// Field values, in order
        #[arg(required = true)]
        values: Vec<String>,

        /// Ask the server to send the stored tuple back
        #[arg(long)]
        return_tuple: bool,

        /// Fail if a tuple with the same key already exists
        #[arg(long, conflicts_with = "replace")]
        add: bool,

        /// Fail unless a tuple with the same key already exists
        #[arg(long)]
        replace: bool,
    },

    /// Select tuples by key
    Select {
        /// Keys to look up
        #[arg(required = true)]
        keys: Vec<String>,

        /// Index number
        #[arg(long, default_value_t = 0)]
        index: u32,

        /// Number of matches to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Maximum number of tuples returned
        #[arg(long, default_value_t = u32::MAX)]
        limit: u32,
    },

    /// Delete the tuple stored under a key
    Delete {
        /// Primary key
        key: String,
    },

    /// Update fields of the tuple stored under a key
    Update {
        /// Primary key
        key: String,

        /// Operations such as `2=y`, `3+1`, `3^255`
        #[arg(required = true)]
        ops: Vec<String>,

        /// Ask the server to send the updated tuple back
        #[arg(long)]
        return_tuple: bool,
    },

    /// Call a stored procedure
    Call {
        /// Procedure name
        name: String,

        /// Arguments, in order
        args: Vec<String>,
    },
}

impl Cli {
    fn connection_config(&self) -> ConnectionConfig {
        let config = ConnectionConfig::new(self.server.clone()).with_reconnect(!self.no_reconnect);
        if self.timeout_ms == 0 {
            config.without_timeouts()
        } else {
            config.with_request_timeout(Duration::from_millis(self.timeout_ms))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut client = Client::new(cli.connection_config()).with_namespace(cli.namespace);

    client.connect().await.map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    match commands::execute(&mut client, cli.command, cli.json).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            client.close().await;
            std::process::exit(1);
        }
    }

    client.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_select() {
        let cli = Cli::try_parse_from([
            "tuplebox-cli",
            "--namespace",
            "3",
            "select",
            "1",
            "2",
            "--limit",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.namespace, 3);
        match cli.command {
            Commands::Select {
                keys,
                index,
                offset,
                limit,
            } => {
                assert_eq!(keys, vec!["1", "2"]);
                assert_eq!(index, 0);
                assert_eq!(offset, 0);
                assert_eq!(limit, 10);
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_insert_add_conflicts_with_replace() {
        let parsed = Cli::try_parse_from(["tuplebox-cli", "insert", "1", "--add", "--replace"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["tuplebox-cli", "insert", "1", "x", "--replace"]).unwrap();
        match cli.command {
            Commands::Insert {
                values,
                add,
                replace,
                ..
            } => {
                assert_eq!(values, vec!["1", "x"]);
                assert!(!add);
                assert!(replace);
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn test_parse_call() {
        let cli = Cli::try_parse_from(["tuplebox-cli", "call", "echo", "1", "a"]).unwrap();
        match cli.command {
            Commands::Call { name, args } => {
                assert_eq!(name, "echo");
                assert_eq!(args, vec!["1", "a"]);
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_update_requires_ops() {
        assert!(Cli::try_parse_from(["tuplebox-cli", "update", "1"]).is_err());
    }

    #[test]
    fn test_connection_config_flags() {
        let cli = Cli::try_parse_from([
            "tuplebox-cli",
            "--server",
            "10.0.0.1:3301",
            "--no-reconnect",
            "--timeout-ms",
            "0",
            "ping",
        ])
        .unwrap();
        let config = cli.connection_config();
        assert_eq!(config.addr, "10.0.0.1:3301");
        assert!(!config.reconnect);
        assert!(config.request_timeout.is_none());
        assert!(config.connect_timeout.is_none());
    }
}
