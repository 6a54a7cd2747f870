//! # Deluge Web UI command line client
//!
//! ## Usage
//!
//! ```sh,ignore
//! DELUGE_URL=http://localhost:8112/ cargo run --release --bin deluge-rpc -- list
//! ```

mod cli;

use clap::Parser;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use deluge_rpc_client::{
    AddTorrentOptions, ClientConfig, DaemonConfig, DelugeClient, TorrentOptions,
};
use deluge_rpc_types::TorrentClient;

use crate::cli::{Cli, Command};

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the client configuration from the environment, overridden by CLI flags.
fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.url {
        config = ClientConfig {
            base_url: ClientConfig::new(url)?.base_url,
            ..config
        };
    }
    if let Some(password) = &cli.password {
        config = config.with_password(password.clone());
    }
    if let Some(host_id) = &cli.host_id {
        config = config.with_host_id(host_id.clone());
    }
    Ok(config)
}

/// Runs one subcommand and returns what should be printed.
async fn run(client: &DelugeClient, command: Command) -> Result<Value, Box<dyn std::error::Error>> {
    let output = match command {
        Command::List => serde_json::to_value(client.all_data().await?)?,
        Command::Show { id } => serde_json::to_value(client.torrent(&id).await?)?,
        Command::Add {
            torrent,
            paused,
            download_location,
        } => {
            let options = AddTorrentOptions {
                add_paused: paused.then_some(true),
                download_location: download_location.map(|path| path.display().to_string()),
                ..Default::default()
            };
            let id = client.add_torrent(torrent, &options).await?;
            info!("Added torrent {id:?}");
            json!({ "id": id })
        }
        Command::Magnet { uri, paused } => {
            let options = AddTorrentOptions {
                add_paused: paused.then_some(true),
                ..Default::default()
            };
            let id = client.add_torrent_magnet(&uri, &options).await?;
            info!("Added magnet {id:?}");
            json!({ "id": id })
        }
        Command::Remove { id, delete_data } => {
            json!({ "removed": client.remove(&id, delete_data).await? })
        }
        Command::Pause { id } => {
            client.pause(&id).await?;
            json!({ "paused": id })
        }
        Command::Resume { id } => {
            client.resume(&id).await?;
            json!({ "resumed": id })
        }
        Command::Recheck { id } => {
            client.verify_torrent(&id).await?;
            json!({ "rechecking": id })
        }
        Command::Queue { id, direction } => {
            client.queue(&id, direction.into()).await?;
            json!({ "queued": id })
        }
        Command::Limit {
            id,
            download,
            upload,
        } => {
            let options = TorrentOptions {
                max_download_speed: download,
                max_upload_speed: upload,
                ..Default::default()
            };
            client.set_torrent_options(&id, &options).await?;
            json!({ "limited": id, "download": download, "upload": upload })
        }
        Command::Label { id, label } => {
            if !label.is_empty() && !client.get_labels().await?.contains(&label) {
                client.add_label(&label).await?;
            }
            client.set_torrent_label(&id, &label).await?;
            json!({ "labelled": id, "label": label })
        }
        Command::Config => Value::Object(client.get_config().await?),
        Command::SetConfig { key, value } => {
            let value: Value = serde_json::from_str(&value)?;
            let mut update = DaemonConfig::new();
            update.insert(key, value);
            client.set_config(&update).await?;
            Value::Object(update)
        }
        Command::Plugins => {
            let plugins = client.get_plugins().await?;
            json!({
                "enabled": plugins.enabled_plugins,
                "available": plugins.available_plugins,
            })
        }
        Command::Methods => json!(client.list_methods().await?),
        Command::Logout => {
            client.login(None).await?;
            json!({ "logged_out": client.logout().await? })
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!("Using {config:?}");

    let client = DelugeClient::try_new(config)?;
    let output = run(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
