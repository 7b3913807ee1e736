//! roomlog - command line access to room message logs.
//!
//! Usage:
//!   roomlog <config.toml> ping
//!   roomlog <config.toml> append <room> <sender> <text>
//!   roomlog <config.toml> fetch <room> <start> <end> [--reverse]

use anyhow::{Context, bail};
use roomlog::{Config, Message, RoomLog};
use tracing::{error, info};

const USAGE: &str = "usage: roomlog <config.toml> ping | append <room> <sender> <text> | fetch <room> <start> <end> [--reverse]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((config_path, command)) = args.split_first() else {
        bail!(USAGE);
    };

    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    roomlog::telemetry::init(&config.log);

    info!(
        backend = config.store.backend.as_str(),
        identity = config.store.member_identity.as_str(),
        "Opening room log"
    );
    let log = RoomLog::open(&config.store).await.map_err(|e| {
        error!(code = e.error_code(), error = %e, "Failed to open store");
        e
    })?;

    match command {
        [cmd] if cmd == "ping" => {
            log.ping().await?;
            println!("PONG");
        }
        [cmd, room, sender, text] if cmd == "append" => {
            let message = Message::now(sender.as_str(), text.as_str());
            log.append(room, &message).await?;
            println!("{}", serde_json::to_string(&message)?);
        }
        [cmd, room, start, end, rest @ ..] if cmd == "fetch" => {
            let reverse = match rest {
                [] => false,
                [flag] if flag == "--reverse" => true,
                _ => bail!(USAGE),
            };
            let start: i64 = start.parse().context("start must be an integer")?;
            let end: i64 = end.parse().context("end must be an integer")?;
            for message in log.fetch_range(room, start, end, reverse).await? {
                println!("{}", serde_json::to_string(&message)?);
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
