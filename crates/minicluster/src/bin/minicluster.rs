use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use minicluster::{
    Conf, MiniCluster, ProbeSettings, TopologyBuilder, TopologyLoader, telemetry,
};

#[derive(Parser, Debug)]
#[command(
    name = "minicluster",
    version,
    author,
    about = "Run an embedded test topology until Ctrl-C"
)]
struct Args {
    /// Topology file (JSON or YAML); flags below are applied on top
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Serve sessions over HTTP instead of the binary transport
    #[arg(long)]
    http: bool,

    /// Start a remote metadata service
    #[arg(long)]
    remote_metastore: bool,

    /// Start the simulated filesystem and compute clusters
    #[arg(long)]
    simulated_compute: bool,

    /// Root directory for the workspace
    #[arg(long)]
    temp_root: Option<PathBuf>,

    /// Configuration override as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Give up if the front end is not ready within this many seconds
    #[arg(long)]
    startup_timeout_secs: Option<u64>,

    /// Leave the workspace on disk after shutdown
    #[arg(long)]
    keep_workspace: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid override '{s}', expected KEY=VALUE")),
    }
}

fn topology_builder(args: &Args) -> Result<TopologyBuilder, Box<dyn std::error::Error>> {
    let mut builder = match &args.topology {
        Some(path) => TopologyLoader::from_path(path)?.into_builder(),
        None => TopologyBuilder::new(),
    };
    if args.http {
        builder = builder.with_http_transport();
    }
    if args.remote_metastore {
        builder = builder.use_remote_metadata_service();
    }
    if args.simulated_compute {
        builder = builder.use_simulated_compute(true);
    }
    if let Some(temp_root) = &args.temp_root {
        builder = builder.with_temp_root(temp_root);
    }
    if let Some(secs) = args.startup_timeout_secs {
        let defaults = ProbeSettings::default();
        builder =
            builder.with_probe_settings(ProbeSettings::new(defaults.interval, Duration::from_secs(secs)));
    }
    Ok(builder)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let args = Args::parse();
    let topology = topology_builder(&args)?.build()?;
    let overrides: Conf = args.overrides.iter().cloned().collect();

    let mut cluster = MiniCluster::new(topology)?;
    if let Err(e) = cluster.start(&overrides).await {
        cluster.stop().await;
        if !args.keep_workspace {
            cluster.cleanup_workspace();
        }
        return Err(e.into());
    }

    println!("{}", cluster.base_endpoint()?);
    if let Some(metastore) = cluster.metastore() {
        tracing::info!(uri = %metastore.uri(), "Metadata service running");
    }
    tracing::info!(base_dir = %cluster.base_dir().display(), "Topology ready; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    let report = cluster.stop().await;
    for warning in &report.warnings {
        tracing::warn!(%warning, "Teardown warning");
    }
    if !args.keep_workspace {
        cluster.cleanup_workspace();
    }
    Ok(())
}
