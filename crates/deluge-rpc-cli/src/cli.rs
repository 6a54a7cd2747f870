use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use deluge_rpc_client::QueueDirection;

/// Top-level CLI struct for the binary.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Web UI root URL. Overrides DELUGE_URL.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Web UI password. Overrides DELUGE_PASSWORD.
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Daemon host id to attach to. Overrides DELUGE_HOST_ID.
    #[arg(long, global = true)]
    pub host_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List every torrent with the labels in use.
    List,

    /// Show one torrent.
    Show {
        /// Torrent id (info hash).
        id: String,
    },

    /// Add a torrent from a .torrent file or base64 content.
    Add {
        /// Path to a .torrent file, or its base64 content.
        torrent: String,

        /// Add the torrent paused.
        #[arg(long, default_value_t = false)]
        paused: bool,

        /// Directory to download into.
        #[arg(long)]
        download_location: Option<PathBuf>,
    },

    /// Add a torrent from a magnet URI.
    Magnet {
        /// Magnet URI.
        uri: String,

        /// Add the torrent paused.
        #[arg(long, default_value_t = false)]
        paused: bool,
    },

    /// Remove a torrent.
    Remove {
        /// Torrent id.
        id: String,

        /// Also delete the downloaded data.
        #[arg(long, default_value_t = false)]
        delete_data: bool,
    },

    /// Pause a torrent.
    Pause {
        /// Torrent id.
        id: String,
    },

    /// Resume a torrent.
    Resume {
        /// Torrent id.
        id: String,
    },

    /// Recheck a torrent's downloaded data.
    Recheck {
        /// Torrent id.
        id: String,
    },

    /// Move a torrent in the download queue.
    Queue {
        /// Torrent id.
        id: String,

        /// Where to move it.
        direction: QueueMove,
    },

    /// Set per-torrent speed limits in KiB/s, -1 for unlimited.
    Limit {
        /// Torrent id.
        id: String,

        /// Download limit.
        #[arg(long, allow_negative_numbers = true)]
        download: Option<f64>,

        /// Upload limit.
        #[arg(long, allow_negative_numbers = true)]
        upload: Option<f64>,
    },

    /// Assign a label to a torrent, creating the label if needed.
    Label {
        /// Torrent id.
        id: String,

        /// Label name. Empty clears the label.
        label: String,
    },

    /// Print the daemon configuration.
    Config,

    /// Set one daemon configuration key.
    SetConfig {
        /// Configuration key.
        key: String,

        /// JSON value, e.g. `200`, `true` or `"/downloads"`.
        value: String,
    },

    /// List enabled and available plugins.
    Plugins,

    /// List the RPC methods the Web UI exposes.
    Methods,

    /// Log in with the configured password, then end the session.
    Logout,
}

/// CLI representation of a queue move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum QueueMove {
    Top,
    Up,
    Down,
    Bottom,
}

impl From<QueueMove> for QueueDirection {
    fn from(value: QueueMove) -> Self {
        match value {
            QueueMove::Top => Self::Top,
            QueueMove::Up => Self::Up,
            QueueMove::Down => Self::Down,
            QueueMove::Bottom => Self::Bottom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "deluge-rpc",
            "remove",
            "abc",
            "--delete-data",
            "--url",
            "http://seedbox:8112/",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://seedbox:8112/"));
        match cli.command {
            Command::Remove { id, delete_data } => {
                assert_eq!(id, "abc");
                assert!(delete_data);
            }
            other => panic!("Expected Remove, got {other:?}"),
        }
    }

    #[test]
    fn queue_direction() {
        let cli = Cli::try_parse_from(["deluge-rpc", "queue", "abc", "top"]).unwrap();
        match cli.command {
            Command::Queue { direction, .. } => {
                assert_eq!(QueueDirection::from(direction), QueueDirection::Top)
            }
            other => panic!("Expected Queue, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["deluge-rpc", "queue", "abc", "sideways"]).is_err());
    }

    #[test]
    fn unlimited_speed() {
        let cli =
            Cli::try_parse_from(["deluge-rpc", "limit", "abc", "--download", "-1"]).unwrap();
        match cli.command {
            Command::Limit {
                download, upload, ..
            } => {
                assert_eq!(download, Some(-1.0));
                assert_eq!(upload, None);
            }
            other => panic!("Expected Limit, got {other:?}"),
        }
    }
}
