//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::ClientConfig;
use crate::core::{Operator, Query};
use crate::error::{CommandError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// rengu: query and edit a Rengu object store.
///
/// Query results are streamed: identifiers are printed as soon as each
/// document arrives.
#[derive(Parser, Debug)]
#[command(name = "rengu")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the store.
    #[arg(short, long, env = "RENGU_URL", global = true)]
    pub url: Option<String>,

    /// Overall request timeout in seconds (unlimited by default).
    #[arg(long, env = "RENGU_TIMEOUT", value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, ndjson).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query and print matching identifiers.
    #[command(alias = "q")]
    Query {
        /// Filter terms.
        #[arg(required = true)]
        terms: Vec<String>,

        /// Index of the first result.
        #[arg(long)]
        start: Option<usize>,

        /// Maximum number of results.
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Operator joining the terms (and, or).
        #[arg(long)]
        op: Option<String>,

        /// Print the full objects instead of identifiers.
        #[arg(short = 'd', long)]
        with_data: bool,
    },

    /// Save a JSON object and print its identifier.
    Save {
        /// File containing the object (reads stdin if omitted).
        file: Option<PathBuf>,
    },

    /// Delete an object by identifier.
    #[command(alias = "rm")]
    Delete {
        /// Object identifier.
        id: String,
    },
}

impl Cli {
    /// Builds the client configuration from the global options.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL was given.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| CommandError::MissingArgument("--url (or RENGU_URL)".to_string()))?;
        let mut config = ClientConfig::new(url);
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Builds a [`Query`] from the `query` subcommand's arguments.
///
/// # Errors
///
/// Returns an error for an unknown operator.
pub fn build_query(
    terms: &[String],
    start: Option<usize>,
    count: Option<usize>,
    op: Option<&str>,
) -> Result<Query> {
    let mut query = Query::new(terms.iter().cloned());
    if let Some(start) = start {
        query = query.with_start(start);
    }
    if let Some(count) = count {
        query = query.with_count(count);
    }
    if let Some(op) = op {
        query = query.with_default_operator(op.parse::<Operator>()?);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with_url(url: Option<&str>) -> Cli {
        Cli {
            url: url.map(String::from),
            timeout: Some(5),
            verbose: false,
            format: "text".to_string(),
            command: Commands::Delete {
                id: "x".to_string(),
            },
        }
    }

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::try_parse_from([
            "rengu", "--url", "http://localhost", "query", "tao", "te", "-n", "5", "--op", "or",
        ])
        .unwrap();
        match cli.command {
            Commands::Query {
                terms, count, op, ..
            } => {
                assert_eq!(terms, vec!["tao", "te"]);
                assert_eq!(count, Some(5));
                assert_eq!(op.as_deref(), Some("or"));
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_query_requires_terms() {
        assert!(Cli::try_parse_from(["rengu", "query"]).is_err());
    }

    #[test]
    fn test_client_config() {
        let config = cli_with_url(Some("http://localhost/db")).client_config().unwrap();
        assert_eq!(config.base_url, "http://localhost/db");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_client_config_requires_url() {
        let err = cli_with_url(None).client_config().unwrap_err();
        assert!(err.to_string().contains("RENGU_URL"));
    }

    #[test]
    fn test_build_query() {
        let terms = vec!["a".to_string()];
        let query = build_query(&terms, Some(1), None, Some("&")).unwrap();
        assert_eq!(query.start(), Some(1));
        assert_eq!(query.default_operator(), Some(Operator::And));

        assert!(build_query(&terms, None, None, Some("nand")).is_err());
    }
}
