use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use trickle_core::{logging, Config};
use trickle_mesh::{
    event_queue, CountersSnapshot, RandomSource, SeededRandom, SignalCounters, ThreadRandom,
    TracingObserver, TrickleNode, TrickleParams, TrickleSnapshot,
};
use trickle_radio::UdpRadio;

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

#[derive(Debug, Serialize)]
struct NodeReport<'a> {
    node_id: &'a str,
    state: TrickleSnapshot,
    signals: CountersSnapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let config_path = parse_config_path(&args)?;
    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    logging::init_from_config(&config.logging);

    let params = TrickleParams::from_config(&config.trickle)?;
    let (events, queue) = event_queue();

    let radio = UdpRadio::bind(&config.radio, events.clone()).await?;
    let receiver = radio.spawn_receiver();

    let random: Box<dyn RandomSource + Send> = match config.trickle.rng_seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };

    let counters = Arc::new(SignalCounters::new());
    let mut node = TrickleNode::new(
        params,
        config.trickle.initial_value,
        radio,
        random,
        events,
        queue,
    );
    node.add_observer(Arc::new(TracingObserver::new(config.node.node_id.clone())));
    node.add_observer(counters.clone());

    info!(
        node_id = %config.node.node_id,
        policy = ?params.policy(),
        "Starting trickle node"
    );

    let final_state = node
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;
    receiver.abort();

    let report = NodeReport {
        node_id: &config.node.node_id,
        state: final_state,
        signals: counters.snapshot(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn parse_config_path(args: &[String]) -> Result<PathBuf> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(PathBuf::from(path));
            }
            bail!("--config was provided without a path");
        }
    }

    bail!("missing required --config <path> argument")
}
