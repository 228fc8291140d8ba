// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

mod args;
mod command;
mod settings;

pub(crate) use command::Command;

use clap::Parser;
use oracle_client::{Error, OracleClient};
use tracing::{debug, Level};

use crate::args::OracleArgs;
use crate::settings::LogFormat;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = exec().await {
        eprintln!("{err:#}");
        // surface the raw terminal response for inspection
        if let Some(Error::TransactionFailed(response)) =
            err.downcast_ref::<Error>()
        {
            eprintln!("{}", serde_json::to_string_pretty(&response.raw)?);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn exec() -> anyhow::Result<()> {
    // parse user args
    let mut args = OracleArgs::parse();

    // generate a subscriber with the desired log level
    let level: Level = (&args.log_level).into();
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    // set the subscriber as global
    match args.log_type {
        LogFormat::Json => {
            let subscriber = subscriber.json().flatten_event(true).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Plain => {
            let subscriber = subscriber.with_ansi(false).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Coloured => {
            let subscriber = subscriber.finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    };

    let output = if args.command.is_offline() {
        args.command.run_offline()?
    } else {
        let config = settings::oracle_config(&mut args)?;
        debug!(
            network = %config.network,
            contract = %config.contract_id,
            "connecting"
        );
        let client = OracleClient::from_config(&config)?;

        // abort the pending wait on ctrl-c
        let cancel = client.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        args.command.run(&client).await?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
