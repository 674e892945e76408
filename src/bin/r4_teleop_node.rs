//! Live R4 teleoperation node
//!
//! Connects to the remote command source, runs the control loop on a fixed
//! tick and takes operator input from stdin:
//!
//! ```bash
//! r4_teleop_node --config r4.toml --set margin=60 --set period_ms=20
//! ```

use anyhow::{Context, Result};
use r4_core::operator::{dispatch, OperatorEvent, Sensitivity};
use r4_core::{CameraPose, CommandChannel, ControlLoop, PoseStateStore, R4Config, R4Core};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

const TELEMETRY_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("r4_core=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(&args)?;
    info!(
        "Workspace {}x{} mm, margin {} mm, tick {} ms",
        config.workspace.half_width * 2.0,
        config.workspace.half_height * 2.0,
        config.workspace.margin,
        config.tick.period_ms
    );

    let channel = match CommandChannel::connect(config.channel.address.as_str()).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!(
                "No command source at {} ({}), running operator-only",
                config.channel.address, e
            );
            CommandChannel::detached()
        }
    };

    let store = Arc::new(PoseStateStore::default());
    let control = ControlLoop::from_config(&config, Arc::new(channel), Arc::clone(&store))?;

    let mut core = R4Core::new();
    core.register(control);
    core.init()?;

    let telemetry = tokio::spawn(observe(Arc::clone(&store)));
    let sensitivity = Sensitivity::from_config(&config.sensitivity);

    let mut ticker = interval(Duration::from_millis(config.tick.period_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f64();
                last_tick = now;
                if let Some(control) = core.control_loop_mut() {
                    control.tick(dt);
                }
            }
            line = console.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match line.parse::<OperatorEvent>() {
                        Ok(event) => {
                            let keep_running = match core.control_loop_mut() {
                                Some(control) => dispatch(event, &sensitivity, control),
                                None => false,
                            };
                            if !keep_running {
                                break;
                            }
                        }
                        Err(reason) => warn!("Ignoring operator input: {}", reason),
                    },
                    Ok(None) => {
                        info!("Console closed; waiting for Ctrl-C");
                        console_open = false;
                    }
                    Err(e) => {
                        warn!("Console read failed: {}", e);
                        console_open = false;
                    }
                }
            }
            _ = &mut interrupted => {
                info!("Interrupted");
                break;
            }
        }
    }

    telemetry.abort();
    if let Some(control) = core.control_loop_mut() {
        info!(
            "Stopping after {} ticks, wheels at {:?}",
            control.ticks(),
            control.wheel_state()
        );
    }
    core.shutdown()?;
    info!("Final state {:?}", store.read());
    Ok(())
}

/// `--config <path>` or `r4.toml` if present, then each `--set key=value`
fn load_config(args: &[String]) -> Result<R4Config> {
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1));

    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            R4Config::load(Path::new(path))?
        }
        None if Path::new("r4.toml").exists() => {
            info!("Loading configuration from r4.toml");
            R4Config::load(Path::new("r4.toml"))?
        }
        None => {
            info!("Using default configuration");
            R4Config::default()
        }
    };

    let mut overrides = HashMap::new();
    for pair in args.windows(2).filter(|w| w[0] == "--set") {
        let (key, value) = pair[1]
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", pair[1]))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("Invalid value for {}", key))?;
        overrides.insert(key.to_string(), value);
    }
    if !overrides.is_empty() {
        config.configure(&overrides)?;
    }

    Ok(config)
}

/// Log the published state once a second
async fn observe(store: Arc<PoseStateStore>) {
    let mut ticker = interval(TELEMETRY_PERIOD);
    loop {
        ticker.tick().await;
        let snapshot = store.read();
        let camera = CameraPose::from_snapshot(&snapshot);
        match serde_json::to_string(&snapshot) {
            Ok(json) => info!(
                "telemetry {} camera=({:.1}, {:.1}, {:.1}) yaw={:.1} pitch={:.1}",
                json,
                camera.position.x,
                camera.position.y,
                camera.position.z,
                camera.yaw,
                camera.pitch
            ),
            Err(e) => warn!("Failed to encode telemetry: {}", e),
        }
    }
}
