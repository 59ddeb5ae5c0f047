//! `sunat` - submit electronic receipts to SUNAT and fetch their CDR

mod cli;
mod logging;
mod report;
mod spinner;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use sunat_domain::SunatError;
use sunat_infra::ReceiptPipeline;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::{Cli, Commands, ReceiptCommand};
use crate::spinner::Spinner;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => debug!("No .env file found"),
        Err(err) => warn!(error = %err, "Could not load .env file"),
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            err.downcast_ref::<SunatError>().map_or(report::EXIT_FAILURE, report::failure_code)
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config = sunat_infra::config::load(cli.config.clone(), cli.overrides())
        .context("invalid configuration")?;
    debug!(endpoints = ?config.endpoints, poll = ?config.poll, "Configuration loaded");

    let pipeline = ReceiptPipeline::from_config(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let Commands::Comprobante { command } = cli.command;
    match command {
        ReceiptCommand::Enviar { path } => {
            let submission = pipeline.send(&path, &cancel).await?;
            println!("Ticket: {}", submission.ticket);
            Ok(report::EXIT_ACCEPTED)
        }
        ReceiptCommand::Obtener { ticket, dirs } => {
            let ticket = sunat_domain::Ticket::new(ticket);
            let outcome = pipeline.fetch(&ticket, &dirs.output, &cancel).await?;

            report::report(&outcome, &dirs.errors, ticket.as_str(), &mut io::stdout(), &mut io::stderr())
        }
        ReceiptCommand::Procesar { path, dirs, .. } => {
            let spinner = Spinner::start("Waiting for SUNAT");
            let result = pipeline.process(&path, &dirs.output, &cancel).await;
            spinner.stop().await;

            report::report(
                &result?,
                &dirs.errors,
                &report::source_stem(&path),
                &mut io::stdout(),
                &mut io::stderr(),
            )
        }
    }
}
