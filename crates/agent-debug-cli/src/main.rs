//! `agent-debug`: watch agent and workflow debug streams from a terminal.

mod config;
mod output;
mod replay;

use std::path::PathBuf;

use agent_debug_stream::prelude::*;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::config::ConnectionArgs;
use crate::output::Printer;

/// Stream and decode agent debug runs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print each emission in its wire form, one per line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an authenticated agent debug run
    Debug {
        /// Question sent to the agent
        #[arg(short, long)]
        question: String,

        /// Agent flavor: single, workflow, or supervisor
        #[arg(long = "type", default_value = "single")]
        agent_type: AgentType,

        /// Conversation thread id (a fresh one is generated when omitted)
        #[arg(long)]
        thread_id: Option<String>,

        /// JSON object of user inputs
        #[arg(long, value_parser = parse_json)]
        user_inputs: Option<serde_json::Value>,

        /// JSON object of extra run data
        #[arg(long, value_parser = parse_json)]
        data: Option<serde_json::Value>,

        /// Session token (overrides AGENT_ADMIN_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Workspace id (overrides AGENT_ADMIN_WORKSPACE_ID)
        #[arg(long)]
        workspace_id: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Start a public agent run authenticated by an API key
    Run {
        /// API key sent as a bearer credential
        #[arg(long)]
        api_key: String,

        /// JSON request body
        #[arg(long, value_parser = parse_json)]
        data: serde_json::Value,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Decode a captured stream file offline
    Replay {
        /// Path to the captured response body
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Bytes fed to the decoder per read
        #[arg(long, default_value_t = 4096)]
        chunk_size: usize,
    },
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    config::load_env();
    agent_debug_stream::observability::init_observability();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("agent-debug: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new(cli.json);

    let stream = match cli.command {
        Commands::Debug {
            question,
            agent_type,
            thread_id,
            user_inputs,
            data,
            token,
            workspace_id,
            connection,
        } => {
            let mut request = DebugAgentRequest::new(agent_type, question);
            if let Some(thread_id) = thread_id {
                request = request.thread_id(thread_id);
            }
            if let Some(user_inputs) = user_inputs {
                request = request.user_inputs(user_inputs);
            }
            if let Some(data) = data {
                request = request.data(data);
            }
            let client = DebugClient::new(connection.client_config()?)?;
            let auth = config::auth_context(token, workspace_id);
            client.debug_agent(&request, &auth).await?
        }
        Commands::Run {
            api_key,
            data,
            connection,
        } => {
            let client = DebugClient::new(connection.client_config()?)?;
            client.run_agent_public(data, &api_key).await?
        }
        Commands::Replay { file, chunk_size } => {
            let session = replay::open_replay(&file, chunk_size).await?;
            DebugStream::spawn(session, ClientConfig::default().stream_buffer_capacity)
        }
    };

    drive(stream, printer).await
}

/// Prints every event until the stream ends. Ctrl-C aborts the session.
async fn drive(mut stream: DebugStream, printer: Printer) -> Result<()> {
    let abort = stream.abort_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::Message(emission) => println!("{}", printer.render(&emission)?),
            StreamEvent::Completed(summary) => info!(
                session_id = %summary.session_id,
                emissions = summary.stats.emissions(),
                malformed = summary.stats.malformed,
                "stream completed"
            ),
            StreamEvent::Error(err) => {
                warn!(session_id = %stream.session_id(), error = %err, "stream failed");
            }
        }
    }
    ctrl_c.abort();

    match stream.finish().await? {
        SessionOutcome::Completed(_) => Ok(()),
        SessionOutcome::Cancelled(summary) => {
            warn!(session_id = %summary.session_id, "stream aborted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn debug_subcommand_parses_type_and_json_flags() {
        let cli = Cli::try_parse_from([
            "agent-debug",
            "--json",
            "debug",
            "--question",
            "why?",
            "--type",
            "workflow",
            "--user-inputs",
            "{\"lang\":\"fr\"}",
        ])
        .expect("parse");
        assert!(cli.json);
        let Commands::Debug {
            agent_type,
            user_inputs,
            ..
        } = cli.command
        else {
            panic!("expected debug subcommand");
        };
        assert_eq!(agent_type, AgentType::Workflow);
        assert_eq!(user_inputs, Some(serde_json::json!({"lang": "fr"})));
    }

    #[test]
    fn unknown_agent_type_and_bad_json_are_rejected() {
        assert!(
            Cli::try_parse_from(["agent-debug", "debug", "-q", "x", "--type", "swarm"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["agent-debug", "run", "--api-key", "k", "--data", "{oops"])
                .is_err()
        );
    }

    #[tokio::test]
    async fn drive_completes_a_replayed_stream() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> =
            vec![Ok(&b"hello\n"[..]), Ok(&b"data: [DONE]\n"[..])];
        let session = StreamSession::from_stream(futures::stream::iter(chunks));
        let stream = DebugStream::spawn(session, 4);
        drive(stream, Printer::new(false)).await.expect("drive");
    }

    #[tokio::test]
    async fn drive_fails_on_read_error() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> =
            vec![Ok(&b"partial"[..]), Err(std::io::Error::other("reset"))];
        let session = StreamSession::from_stream(futures::stream::iter(chunks));
        let err = drive(DebugStream::spawn(session, 4), Printer::new(false))
            .await
            .err()
            .expect("read error");
        assert!(err.to_string().contains("reset"));
    }
}
