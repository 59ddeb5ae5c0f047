//! Command tree
//!
//! ```text
//! sunat [global flags] comprobante enviar   <path>
//! sunat [global flags] comprobante obtener  <ticket> [-o dir] [-e dir]
//! sunat [global flags] comprobante procesar <path>   [-o dir] [-e dir] [--timeout s] [--interval ms] [--max-attempts n]
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use sunat_domain::RawConfig;

#[derive(Debug, Parser)]
#[command(name = "sunat", version, about = "Submit electronic receipts to SUNAT and fetch their CDR")]
pub struct Cli {
    /// Config file (JSON or TOML); searched for in the working and home directories when omitted
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// RUC followed by the SOL user
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// SOL password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    #[arg(long, global = true)]
    pub client_id: Option<String>,

    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    /// Security API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub auth_url: Option<String>,

    /// CPE API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Electronic receipts
    Comprobante {
        #[command(subcommand)]
        command: ReceiptCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReceiptCommand {
    /// Pack and submit a receipt, printing its ticket
    Enviar {
        /// Receipt XML
        path: PathBuf,
    },

    /// Query a ticket once and save its CDR
    Obtener {
        ticket: String,

        #[command(flatten)]
        dirs: OutputArgs,
    },

    /// Submit a receipt and wait for its CDR
    Procesar {
        /// Receipt XML
        path: PathBuf,

        #[command(flatten)]
        dirs: OutputArgs,

        #[command(flatten)]
        poll: PollArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Folder for the CDR
    #[arg(short, long = "output-folder", value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Folder for rejection error files
    #[arg(short, long = "error-folder", value_name = "DIR", default_value = ".")]
    pub errors: PathBuf,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PollArgs {
    /// Seconds to wait for the ticket to resolve
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Milliseconds between status queries
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Give up after this many status queries
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,
}

impl Cli {
    /// Configuration layer made of the flags that were actually given.
    pub fn overrides(&self) -> RawConfig {
        let poll = match &self.command {
            Commands::Comprobante { command: ReceiptCommand::Procesar { poll, .. } } => poll.clone(),
            Commands::Comprobante { .. } => PollArgs::default(),
        };

        RawConfig {
            user: self.user.clone(),
            password: self.password.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_base_url: self.auth_url.clone(),
            base_url: self.base_url.clone(),
            poll_timeout_secs: poll.timeout,
            poll_interval_ms: poll.interval,
            poll_max_attempts: poll.max_attempts,
            request_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sunat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn procesar_defaults_to_the_working_directory() {
        let cli = parse(&["comprobante", "procesar", "F0001-1.xml"]);

        match cli.command {
            Commands::Comprobante { command: ReceiptCommand::Procesar { path, dirs, poll } } => {
                assert_eq!(path, PathBuf::from("F0001-1.xml"));
                assert_eq!(dirs.output, PathBuf::from("."));
                assert_eq!(dirs.errors, PathBuf::from("."));
                assert_eq!(poll.timeout, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = parse(&[
            "comprobante",
            "obtener",
            "T-999",
            "-o",
            "cdr",
            "--error-folder",
            "errores",
            "-u",
            "20123456789MODDATOS",
            "-vv",
        ]);

        assert_eq!(cli.user.as_deref(), Some("20123456789MODDATOS"));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Comprobante { command: ReceiptCommand::Obtener { ticket, dirs } } => {
                assert_eq!(ticket, "T-999");
                assert_eq!(dirs.output, PathBuf::from("cdr"));
                assert_eq!(dirs.errors, PathBuf::from("errores"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn overrides_carry_only_given_flags() {
        let cli = parse(&[
            "--client-id",
            "abc",
            "--base-url",
            "http://localhost:9000",
            "comprobante",
            "procesar",
            "F0001-1.xml",
            "--timeout",
            "30",
            "--max-attempts",
            "5",
        ]);

        let raw = cli.overrides();
        assert_eq!(raw.client_id.as_deref(), Some("abc"));
        assert_eq!(raw.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(raw.poll_timeout_secs, Some(30));
        assert_eq!(raw.poll_interval_ms, None);
        assert_eq!(raw.poll_max_attempts, Some(5));
        assert_eq!(raw.user, None);
        assert_eq!(raw.password, None);
    }

    #[test]
    fn poll_flags_belong_to_procesar_only() {
        let result = Cli::try_parse_from(["sunat", "comprobante", "enviar", "a.xml", "--timeout", "3"]);
        assert!(result.is_err());
    }
}
