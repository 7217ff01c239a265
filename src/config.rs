//! Command-line and environment configuration.

use crate::database::Database;
use crate::sync::DEFAULT_CLIENT_BUFFER;
use clap::builder::TypedValueParser;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Shared real-time notepad server.
#[derive(Debug, Clone, Parser)]
#[command(name = "syncpad", version, about)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "SYNCPAD_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// SQLite file holding the notepad [default: <data dir>/syncpad/notes.db]
    #[arg(long, env = "SYNCPAD_DB")]
    pub db: Option<PathBuf>,

    /// Keep the notepad in memory only; nothing survives a restart.
    #[arg(long, env = "SYNCPAD_EPHEMERAL", conflicts_with = "db")]
    pub ephemeral: bool,

    /// HTML page served at `/`.
    #[arg(long, env = "SYNCPAD_INDEX", default_value = "static/index.html")]
    pub index: PathBuf,

    /// Updates queued per client before a slow client is disconnected.
    #[arg(
        long,
        env = "SYNCPAD_CLIENT_BUFFER",
        default_value_t = DEFAULT_CLIENT_BUFFER,
        value_parser = clap::value_parser!(u32).range(1..).map(|n| n as usize)
    )]
    pub client_buffer: usize,
}

impl Config {
    /// Database path, falling back to the per-user data directory.
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(Database::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["syncpad"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.index, PathBuf::from("static/index.html"));
        assert_eq!(config.client_buffer, DEFAULT_CLIENT_BUFFER);
        assert!(!config.ephemeral);
        assert!(config.db_path().ends_with("syncpad/notes.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "syncpad",
            "--bind",
            "0.0.0.0:8080",
            "--db",
            "/tmp/pad.db",
            "--client-buffer",
            "4",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/pad.db"));
        assert_eq!(config.client_buffer, 4);
    }

    #[test]
    fn test_client_buffer_accepts_one() {
        let config = Config::try_parse_from(["syncpad", "--client-buffer", "1"]).unwrap();
        assert_eq!(config.client_buffer, 1);
        assert!(Config::try_parse_from(["syncpad", "--client-buffer", "-3"]).is_err());
    }

    #[test]
    fn test_rejects_zero_buffer_and_conflicting_store() {
        assert!(Config::try_parse_from(["syncpad", "--client-buffer", "0"]).is_err());
        assert!(Config::try_parse_from(["syncpad", "--ephemeral", "--db", "x.db"]).is_err());
    }
}
