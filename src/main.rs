//! ExtSim - in-process extension platform simulator.
//!
//! Arms a simulator from a `manifest.json`, drives a scripted scenario
//! against the platform surface, and prints the inspection dumps.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use extsim_config::{ConfigLoader, ManifestLoader, SimulatorConfig};
use extsim_core::{Simulator, SimulatorSettings, StorageChangeEvent, TabUpdatedEvent};
use extsim_protocols::{CreateTabProps, JsonMap, NotificationOptions, Tab};

/// ExtSim CLI.
#[derive(Parser)]
#[command(name = "extsim")]
#[command(about = "In-process extension platform simulator")]
#[command(version)]
struct Cli {
    /// Log directory (file logging is disabled when unset)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arm a simulator, run the demo scenario, and print inspection dumps
    Run {
        /// Path to manifest.json
        #[arg(long, default_value = "manifest.json")]
        manifest: PathBuf,

        /// Optional settings file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also run one intercepted fetch against this URL
        #[arg(long)]
        fetch: Option<String>,

        /// Pretty-print the JSON dumps
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a manifest and print a summary
    Manifest {
        /// Path to manifest.json
        #[arg(long, default_value = "manifest.json")]
        path: PathBuf,
    },
}

/// Initialize tracing with console output and an optional rolling file.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("extsim")
                .filename_suffix("log")
                .max_log_files(7)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the writer guard alive for the program duration.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            registry
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Run {
            manifest,
            config,
            fetch,
            pretty,
        } => run_scenario(&manifest, config.as_deref(), fetch, pretty).await,
        Commands::Manifest { path } => summarize_manifest(&path),
    }
}

fn obj(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

/// Arm a simulator and exercise every namespace once.
async fn run_scenario(
    manifest_path: &Path,
    config_path: Option<&Path>,
    fetch_url: Option<String>,
    pretty: bool,
) -> anyhow::Result<()> {
    info!("ExtSim v{}", env!("CARGO_PKG_VERSION"));

    let loaded = ManifestLoader::load(manifest_path)?;
    info!(
        name = %loaded.manifest.name,
        version = %loaded.manifest.version,
        "manifest loaded"
    );

    let config = match config_path {
        Some(path) => ConfigLoader::load(path)?,
        None => SimulatorConfig::default(),
    };
    let settings = SimulatorSettings {
        settle_delay_ms: config.simulator.settle_delay_ms,
        current_window_id: config.simulator.current_window_id,
        extension_id: config.simulator.extension_id.clone(),
        traffic_capacity: config.traffic.capacity,
        diagnostics_capacity: config.diagnostics.capacity,
    };

    let sim = Simulator::builder(loaded.raw)
        .settings(settings)
        .wall_clock()
        .build();
    let ctx = sim.context();
    let platform = sim.platform();

    // Storage: first write, a no-op rewrite, then a partial overwrite. The
    // listener logs each change set; the rewrite must stay silent.
    let storage = platform.storage();
    storage
        .on_changed()
        .add_listener(|(changes, area): &StorageChangeEvent| {
            info!(
                area = %area,
                keys = ?changes.keys().collect::<Vec<_>>(),
                "storage changed"
            );
        });
    storage.local().set(obj(json!({"theme": "dark", "count": 1})));
    storage.local().set(obj(json!({"theme": "dark", "count": 1})));
    storage.local().set(obj(json!({"theme": "light", "count": 1})));

    // Tabs: create one and let it settle to complete.
    platform.tabs().on_created().add_listener(|tab: &Tab| {
        info!(id = tab.id, url = %tab.url, "tab created");
    });
    platform
        .tabs()
        .on_updated()
        .add_listener(|(id, changes, _): &TabUpdatedEvent| {
            if let Some(status) = changes.status {
                info!(id = *id, status = %status, "tab settled");
            }
        });
    platform.tabs().create(
        CreateTabProps::default()
            .with_url("https://example.com/dashboard")
            .with_active(true),
    );

    // Runtime: one listener echoes, the caller logs the collected response.
    let runtime = platform.runtime();
    runtime.add_message_listener(|message, sender, respond| {
        info!(from = %sender.url, "message received");
        respond.respond(json!({ "pong": message.clone() }));
        false
    });
    runtime.send_message_then(json!({"ping": 1}), |response| {
        info!(?response, "runtime response");
    });

    // Notifications: create one and simulate the user clicking it.
    let notifications = platform.notifications();
    notifications.on_clicked().add_listener(|id: &String| {
        info!(id = %id, "notification clicked");
    });
    let notif_id = notifications.create(
        Some("deploy-done".into()),
        NotificationOptions::basic("Deploy finished", "All checks green"),
    );
    sim.inspector().simulate_notification_click(&notif_id);

    if let Some(url) = fetch_url {
        match ctx.fetch().fetch(&url).await {
            Ok(response) => info!(status = response.status, "fetch completed"),
            Err(error) => warn!(%error, "fetch failed"),
        }
    }

    ctx.settle().await;

    let inspector = sim.inspector();
    let dump = json!({
        "tabs": inspector.tabs(),
        "storage": inspector.storage(),
        "notifications": inspector.notifications(),
        "permissions": inspector.permissions(),
        "traffic": inspector.traffic(),
        "diagnostics": inspector.diagnostics(),
    });
    println!("{}", render(&dump, pretty)?);

    Ok(())
}

/// Validate a manifest file and print its summary.
fn summarize_manifest(path: &Path) -> anyhow::Result<()> {
    let loaded = ManifestLoader::load(path)?;
    let manifest = &loaded.manifest;

    println!("name:             {}", manifest.name);
    println!("version:          {}", manifest.version);
    println!("manifest_version: {}", manifest.manifest_version);
    if !manifest.description.is_empty() {
        println!("description:      {}", manifest.description);
    }
    if !manifest.permissions.is_empty() {
        println!("permissions:      {}", manifest.permissions.join(", "));
    }
    if !manifest.host_permissions.is_empty() {
        println!("host_permissions: {}", manifest.host_permissions.join(", "));
    }
    if let Some(worker) = manifest
        .background
        .as_ref()
        .and_then(|b| b.service_worker.as_deref())
    {
        println!("service_worker:   {worker}");
    }

    info!("manifest OK");
    Ok(())
}

fn render(value: &Value, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
