// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `inverter-bot` binary.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use inverter_bot::{Bridge, Command, Config};

/// Relay inverter telemetry from an MQTT broker to a Telegram chat.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long, env = "INVERTER_BOT_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Inverter bot failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> inverter_bot::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let chat_id = config.chat_id()?;

    let chat = config.telegram.client_config().into_client()?;
    let me = chat.get_me().await?;
    tracing::debug!(
        id = me.id,
        name = %me.first_name,
        username = me.username.as_deref().unwrap_or_default(),
        "Hello, I am your inverter bot"
    );

    if let Err(e) = chat.set_my_commands(&Command::menu()).await {
        tracing::warn!(error = %e, "Failed to register the command menu");
    }

    let (subscriber, payloads) = config.mqtt.subscriber().build().await?;

    Bridge::new(chat, chat_id, me.username)
        .run(payloads, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    if let Err(e) = subscriber.disconnect().await {
        tracing::warn!(error = %e, "Failed to disconnect from the broker");
    }
    Ok(())
}
