use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use canvas_relay::client::HostClient;
use canvas_relay::error::AppError;
use canvas_relay::protocol::{Message, Response};
use canvas_relay::registry::schema;
use canvas_relay::settings::{self, HostSettings};
use canvas_relay::{logging, paths};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "canvas-cli", about = "Drive a running canvas host", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding settings.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Channel name of the host to connect to
    #[arg(long, global = true)]
    name: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one canonical command, e.g. `send shape:rectangle '{"x":0,"y":0}'`
    Send {
        #[arg(value_name = "TYPE")]
        kind: String,
        /// JSON payload
        payload: Option<String>,
    },
    /// Run a list of ops as one transaction
    Batch {
        /// JSON array of ops
        ops: Option<String>,
        /// Read the ops array from a file instead
        #[arg(long, conflicts_with = "ops")]
        file: Option<PathBuf>,
    },
    /// Print the document and history state
    State,
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// List every target and op the batch interface accepts
    Ops,
}

impl Commands {
    fn message(self) -> Result<Message, String> {
        match self {
            Commands::Send { kind, payload } => {
                let payload = payload.as_deref().map_or(Ok(Value::Null), parse_json)?;
                Ok(Message::new(kind, payload))
            }
            Commands::Batch { ops, file } => {
                let text = match (ops, file) {
                    (Some(ops), _) => ops,
                    (None, Some(file)) => std::fs::read_to_string(&file)
                        .map_err(|e| format!("cannot read {}: {e}", file.display()))?,
                    (None, None) => return Err("batch needs an ops array or --file".into()),
                };
                Ok(Message::batch(parse_json(&text)?))
            }
            Commands::State => Ok(Message::new("canvas:get-state", Value::Null)),
            Commands::Undo => Ok(Message::new("history:undo", Value::Null)),
            Commands::Redo => Ok(Message::new("history:redo", Value::Null)),
            Commands::Ops => Err("ops is answered locally".into()),
        }
    }
}

fn parse_json(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))
}

fn load_settings(cli: &Cli) -> Result<HostSettings, String> {
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let mut settings = settings::load_settings(&config_dir)
        .map_err(|e| format!("failed to load settings from {}: {e}", config_dir.display()))?;
    if let Some(name) = &cli.name {
        settings.channel_name.clone_from(name);
    }
    if let Some(timeout) = cli.timeout_ms {
        settings.request_timeout_ms = timeout;
    }
    Ok(settings)
}

async fn send(settings: &HostSettings, message: Message) -> Result<Response, AppError> {
    let client = HostClient::connect(
        &settings.channel_name,
        Duration::from_millis(settings.connect_timeout_ms),
    )
    .await?
    .with_request_timeout(Duration::from_millis(settings.request_timeout_ms));
    client.send(message).await
}

// ── Entry point ──────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Ops) {
        print!("{}", schema::describe());
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.log_filter);

    let message = match cli.command.message() {
        Ok(message) => message,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Transport failures never reach the host, so they are reported in the
    // same `{success, error}` shape here.
    let response = send(&settings, message)
        .await
        .unwrap_or_else(Response::err);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
