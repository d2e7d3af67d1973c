//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Query results are
//! written as they arrive unless the output format needs the full set.

use crate::cli::output::{
    OutputFormat, QueryItem, format_deleted, format_query_item, format_query_results,
    format_saved,
};
use crate::cli::parser::{Cli, Commands, build_query};
use crate::core::Query;
use crate::error::{CommandError, Result};
use crate::store::StoreClient;
use crate::transport::Transport;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::Path;
use uuid::Uuid;

/// Tracing target for CLI commands.
pub const TRACING_TARGET: &str = "rengu_store::cli::commands";

/// Executes the CLI command against the configured HTTP store.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
#[cfg(feature = "http")]
pub fn execute<W: Write + ?Sized>(cli: &Cli, out: &mut W) -> Result<()> {
    let client = StoreClient::connect(cli.client_config()?)?;
    run(cli, &client, out)
}

/// Runs the CLI command with an existing client.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run<T: Transport, W: Write + ?Sized>(
    cli: &Cli,
    client: &StoreClient<T>,
    out: &mut W,
) -> Result<()> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Query {
            terms,
            start,
            count,
            op,
            with_data,
        } => {
            let query = build_query(terms, *start, *count, op.as_deref())?;
            cmd_query(client, query, *with_data, format, out)
        }
        Commands::Save { file } => cmd_save(client, file.as_deref(), format, out),
        Commands::Delete { id } => cmd_delete(client, id, format, out),
    }
}

// ==================== Helpers ====================

/// Writes `text` to `out`. Returns `false` if the reader went away.
fn emit<W: Write + ?Sized>(out: &mut W, text: &str) -> Result<bool> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read_object(file: Option<&Path>) -> Result<Value> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            CommandError::ExecutionFailed(format!("failed to read {}: {e}", path.display()))
        })?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    parse_object(&text)
}

fn parse_object(text: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(CommandError::InvalidArgument("expected a JSON object".to_string()).into());
    }
    Ok(value)
}

// ==================== Command Implementations ====================

fn cmd_query<T: Transport, W: Write + ?Sized>(
    client: &StoreClient<T>,
    query: Query,
    with_data: bool,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let results = client.query(query);
    let mut collected: Vec<(Uuid, Option<Value>)> = Vec::new();

    for id in &results {
        let id = id?;
        let object = if with_data { client.get(&id) } else { None };

        if format.is_streaming() {
            let item = QueryItem {
                id,
                object: object.as_ref(),
            };
            if !emit(out, &format_query_item(&item, format))? {
                tracing::debug!(target: TRACING_TARGET, "output closed, stopping query");
                return Ok(());
            }
        } else {
            collected.push((id, object));
        }
    }

    if !format.is_streaming() {
        let items: Vec<QueryItem<'_>> = collected
            .iter()
            .map(|(id, object)| QueryItem {
                id: *id,
                object: object.as_ref(),
            })
            .collect();
        emit(out, &format_query_results(&items, format))?;
    }

    tracing::debug!(
        target: TRACING_TARGET,
        query = %results,
        cached = client.cached_len(),
        "query finished"
    );
    Ok(())
}

fn cmd_save<T: Transport, W: Write + ?Sized>(
    client: &StoreClient<T>,
    file: Option<&Path>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let object = read_object(file)?;
    let id = client.save(&object)?;
    emit(out, &format_saved(id, format))?;
    Ok(())
}

fn cmd_delete<T: Transport, W: Write + ?Sized>(
    client: &StoreClient<T>,
    id: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let id = Uuid::try_parse(id)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid ID {id:?}: {e}")))?;
    let deleted = client.delete(id)?;
    emit(out, &format_deleted(id, deleted, format))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocumentError, Error};
    use crate::transport::MemoryTransport;
    use clap::Parser;
    use serde_json::json;
    use tempfile::NamedTempFile;

    const A: &str = "a4f1e0c2-1b2c-4d3e-8f40-5a6b7c8d9e0f";
    const B: &str = "b2e2a0c4-5d6e-4f70-9a1b-2c3d4e5f6a7b";

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["rengu", "--url", "http://localhost"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn client() -> StoreClient<MemoryTransport> {
        let transport =
            MemoryTransport::with_objects([json!({"ID": A, "v": 1}), json!({"ID": B, "v": 2})])
                .unwrap()
                .with_chunk_size(5);
        StoreClient::new(transport)
    }

    fn run_to_string(args: &[&str], client: &StoreClient<MemoryTransport>) -> Result<String> {
        let mut out = Vec::new();
        run(&cli(args), client, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    /// Writer that reports a closed pipe after `limit` writes.
    struct ClosedPipe {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            self.limit -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cmd_query_text() {
        let client = client();
        let output = run_to_string(&["query", "v"], &client).unwrap();
        assert_eq!(output, format!("{A}\n{B}\n"));
        assert_eq!(client.cached_len(), 2);

        let sent = client.transport().queries();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].terms(), ["v".to_string()]);
    }

    #[test]
    fn test_cmd_query_with_options() {
        let client = client();
        run_to_string(&["query", "a", "b", "--start", "3", "-n", "2", "--op", "or"], &client)
            .unwrap();
        let sent = &client.transport().queries()[0];
        assert_eq!(sent.start(), Some(3));
        assert_eq!(sent.count(), Some(2));
    }

    #[test]
    fn test_cmd_query_with_data_ndjson() {
        let client = client();
        let output = run_to_string(&["--format", "ndjson", "query", "v", "-d"], &client).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![json!({"ID": A, "v": 1}), json!({"ID": B, "v": 2})]);
    }

    #[test]
    fn test_cmd_query_json() {
        let client = client();
        let output = run_to_string(&["--format", "json", "query", "v"], &client).unwrap();
        let ids: Vec<String> = serde_json::from_str(&output).unwrap();
        assert_eq!(ids, vec![A.to_string(), B.to_string()]);
    }

    #[test]
    fn test_cmd_query_stops_on_malformed_document() {
        let body = format!(r#"{{"ID":"{A}"}} {{"v":2}}"#);
        let client = StoreClient::new(MemoryTransport::new().with_body(body));
        let mut out = Vec::new();
        let err = run(&cli(&["query", "v"]), &client, &mut out).unwrap_err();

        assert!(matches!(err, Error::Document(DocumentError::MissingId { .. })));
        assert_eq!(String::from_utf8(out).unwrap(), format!("{A}\n"));
    }

    #[test]
    fn test_cmd_query_broken_pipe() {
        let client = client();
        let mut out = ClosedPipe {
            written: Vec::new(),
            limit: 1,
        };
        assert!(run(&cli(&["query", "v"]), &client, &mut out).is_ok());
        assert_eq!(String::from_utf8(out.written).unwrap(), format!("{A}\n"));
    }

    #[test]
    fn test_cmd_query_invalid_operator() {
        let client = client();
        let result = run_to_string(&["query", "v", "--op", "xor"], &client);
        assert!(matches!(result, Err(Error::Command(_))));
        assert!(client.transport().queries().is_empty());
    }

    #[test]
    fn test_cmd_save_from_file() {
        let client = StoreClient::new(MemoryTransport::new());
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "Zhuangzi"}}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let output = run_to_string(&["save", path], &client).unwrap();
        assert!(output.starts_with("Saved "));
        assert_eq!(client.transport().len(), 1);
    }

    #[test]
    fn test_cmd_save_rejects_non_object() {
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("{").is_err());
        assert!(parse_object(r#"{"a": 1}"#).is_ok());
    }

    #[test]
    fn test_cmd_save_missing_file() {
        let client = StoreClient::new(MemoryTransport::new());
        let result = run_to_string(&["save", "/nonexistent/object.json"], &client);
        assert!(matches!(result, Err(Error::Command(CommandError::ExecutionFailed(_)))));
    }

    #[test]
    fn test_cmd_delete() {
        let client = client();
        let output = run_to_string(&["delete", A], &client).unwrap();
        assert_eq!(output, format!("Deleted {A}\n"));
        assert_eq!(client.transport().len(), 1);

        let output = run_to_string(&["delete", A], &client).unwrap();
        assert!(output.starts_with("Not deleted"));
    }

    #[test]
    fn test_cmd_delete_invalid_id() {
        let client = client();
        let result = run_to_string(&["delete", "not-a-uuid"], &client);
        assert!(matches!(result, Err(Error::Command(CommandError::InvalidArgument(_)))));
    }
}
