// # netmond - Network Status Monitor Daemon
//
// The netmond daemon is a thin integration layer:
// 1. Parse command-line flags
// 2. Discover the client identifier (MAC) if none was supplied
// 3. Wire the ICMP prober, the HTTP speed sampler and the InfluxDB sink
//    into the core engine
// 4. Run the engine
//
// All monitoring logic lives in netmon-core.
//
// ## Example
//
// ```bash
// netmond --db-host http://influx.lan:8086 --db-name netmon \
//         --db-user netmon --db-pass netmon \
//         --traceroute "192.168.50.1|38.147.245.129|1.1.1.1" \
//         --interval 5 --speedtest 60
// ```

mod client_id;

use anyhow::{Result, bail};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use netmon_core::{DatabaseConfig, LocalCheck, MonitorConfig, MonitorEngine, RemoteCheck};
use netmon_probe_icmp::IcmpProber;
use netmon_sink_influx::InfluxSink;
use netmon_speed_http::HttpSpeedSampler;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<MonExitCode> for ExitCode {
    fn from(code: MonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "netmond", version, about = "Network status monitor", long_about = None)]
struct Cli {
    /// Ordered hop list from `traceroute`; internet counts as up only when
    /// every hop answers. Format: "IP|IP|IP"
    #[arg(long, conflicts_with = "remote")]
    traceroute: Option<String>,

    /// Address of a server or router on the local network for the LAN check
    #[arg(long)]
    local: Option<String>,

    /// Address of a single remote server for the internet check
    #[arg(long)]
    remote: Option<String>,

    /// InfluxDB endpoint for publishing measurements; omit to run without
    /// publishing
    #[arg(long)]
    db_host: Option<String>,

    /// InfluxDB database name
    #[arg(long, default_value = "netmon")]
    db_name: String,

    /// InfluxDB username
    #[arg(long, default_value = "netmon")]
    db_user: String,

    /// InfluxDB password
    #[arg(long, default_value = "netmon")]
    db_pass: String,

    /// Minutes between connectivity checks
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Minutes between speed tests
    #[arg(long, default_value_t = 60)]
    speedtest: u64,

    /// Client identifier override (MAC address)
    #[arg(long)]
    mac: Option<String>,

    /// Perform one check cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Split a "IP|IP|IP" hop list, dropping empty segments
fn parse_traceroute(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .collect()
}

/// Build the monitor configuration from parsed flags
///
/// The client identifier must already be resolved; everything else comes
/// straight from the flag surface.
fn build_config(cli: &Cli, client_id: String) -> Result<MonitorConfig> {
    let mut config = MonitorConfig::new(client_id);

    if let Some(local) = &cli.local {
        config.local_check = LocalCheck::Address(local.clone());
    }

    config.remote_check = match (&cli.traceroute, &cli.remote) {
        (Some(_), Some(_)) => {
            // clap already rejects this; kept for direct construction paths
            bail!("select either --traceroute or --remote, not both");
        }
        (Some(raw), None) => {
            let hops = parse_traceroute(raw);
            if hops.is_empty() {
                bail!("--traceroute must list at least one hop");
            }
            RemoteCheck::Traceroute(hops)
        }
        (None, Some(remote)) => RemoteCheck::Address(remote.clone()),
        (None, None) => RemoteCheck::DefaultResolvers,
    };

    config.database = cli.db_host.as_ref().map(|host| DatabaseConfig {
        host: host.clone(),
        name: cli.db_name.clone(),
        user: cli.db_user.clone(),
        password: cli.db_pass.clone(),
    });

    config.connection_interval = Duration::from_secs(cli.interval * 60);
    config.speed_interval = Duration::from_secs(cli.speedtest * 60);
    config.one_shot = cli.once;

    config.validate().map_err(anyhow::Error::from)?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("invalid log level '{other}' (trace, debug, info, warn, error)");
            return MonExitCode::ConfigError.into();
        }
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {e}");
        return MonExitCode::ConfigError.into();
    }

    info!("starting network status monitor");

    // Resolve the client identifier before anything else; a host we cannot
    // identify publishes garbage
    let client_id = match &cli.mac {
        Some(mac) => mac.clone(),
        None => match client_id::discover() {
            Ok(mac) => mac,
            Err(e) => {
                error!("failed to determine client identifier: {e}");
                return MonExitCode::ConfigError.into();
            }
        },
    };
    info!("client identifier: {client_id}");

    let config = match build_config(&cli, client_id) {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            return MonExitCode::ConfigError.into();
        }
    };

    if config.database.is_none() {
        warn!("no database host configured: measurements will not be published");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return MonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => MonExitCode::CleanShutdown,
            Err(e) => {
                error!("daemon error: {e}");
                MonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the concrete components into the engine and run it
async fn run_daemon(config: MonitorConfig) -> Result<()> {
    let sink = match &config.database {
        Some(db) => Some(Box::new(InfluxSink::new(&db.host, &db.user, &db.password)?)
            as Box<dyn netmon_core::MetricsSink>),
        None => None,
    };

    let sampler = HttpSpeedSampler::new()?;

    let (mut engine, mut event_rx) = MonitorEngine::new(
        Box::new(IcmpProber::new()),
        Box::new(sampler),
        sink,
        config,
    )?;

    // Keep the event channel drained; events are already logged by the
    // engine, so debug level is enough here
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "engine event");
        }
    });

    engine.run().await?;
    info!("monitor stopped");
    Ok(())
}
