use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use canvas_relay::error::AppError;
use canvas_relay::services::LocalServices;
use canvas_relay::settings::{self, HostSettings};
use canvas_relay::state::HostState;
use canvas_relay::transport::Listener;
use canvas_relay::{logging, paths, server};

#[derive(Parser)]
#[command(name = "canvas-host", about = "Canvas document host", version)]
struct Args {
    /// Directory holding settings.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Channel name clients connect to
    #[arg(long)]
    name: Option<String>,

    /// Maximum number of undo steps
    #[arg(long)]
    history_limit: Option<usize>,
}

impl Args {
    fn apply(&self, settings: &mut HostSettings) {
        if let Some(name) = &self.name {
            settings.channel_name.clone_from(name);
        }
        if let Some(limit) = self.history_limit {
            settings.history_limit = limit;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config_dir = args.config_dir.clone().unwrap_or_else(paths::default_config_dir);

    let (mut settings, created) = match settings::load_or_init_settings(&config_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: failed to load settings from {}: {e}", config_dir.display());
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut settings);
    logging::init(&settings.log_filter);
    if created {
        info!(event = "settings_created", path = %paths::settings_path(&config_dir).display());
    }

    match run(&settings, &config_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(event = "host_failed", error = %e);
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &HostSettings, config_dir: &std::path::Path) -> Result<(), AppError> {
    let data_dir = settings.data_dir(config_dir);
    let services = Arc::new(LocalServices::new(&data_dir));
    let state = HostState::new(services, settings.history_limit);
    let listener = Listener::bind(settings.socket_path())?;
    info!(
        event = "host_started",
        channel = %settings.channel_name,
        data_dir = %data_dir.display(),
        history_limit = settings.history_limit,
    );

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(event = "interrupt_received");
        }
        let _ = stop.send(true);
    });

    server::serve(listener, state, shutdown).await;
    Ok(())
}
