//! beacond – wires the BeaconSource reconciler into a controller loop.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::Api,
    runtime::{
        controller::{Action, Controller},
        watcher,
    },
    Client, CustomResourceExt,
};
use tracing::{debug, info, warn};

use beacon_core::{BeaconSource, EventType};
use beacon_reconciler::{
    ClusterSinkResolver, KubeDeploymentStore, KubeEventTypeStore, KubeNotifier, KubeSourceStore,
    ReconcileError, Reconciler,
};

#[derive(Parser, Debug)]
#[command(name = "beacond", version, about = "Beacon event-source operator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controller against the current kube context
    Run {
        /// Container image for the emitter deployments
        #[arg(long = "emitter-image", env = "BEACON_EMITTER_IMAGE")]
        emitter_image: String,
        /// Prometheus exporter listen address, e.g. 0.0.0.0:9090
        #[arg(long = "metrics-addr", env = "BEACON_METRICS_ADDR")]
        metrics_addr: Option<String>,
    },
    /// Print the CRD manifests to stdout
    Crds,
}

fn init_tracing() {
    let env = std::env::var("BEACON_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn init_metrics(addr: Option<&str>) {
    if let Some(addr) = addr {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            warn!(addr = %addr, "invalid metrics address; expected host:port");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Crds => {
            println!("{}", serde_yaml::to_string(&BeaconSource::crd())?);
            println!("---");
            println!("{}", serde_yaml::to_string(&EventType::crd())?);
        }
        Commands::Run {
            emitter_image,
            metrics_addr,
        } => {
            init_metrics(metrics_addr.as_deref());
            let client = Client::try_default().await?;
            let reconciler = Arc::new(Reconciler::new(
                emitter_image,
                Arc::new(KubeSourceStore::new(client.clone())),
                Arc::new(KubeDeploymentStore::new(client.clone())),
                Arc::new(KubeEventTypeStore::new(client.clone())),
                Arc::new(ClusterSinkResolver::new(client.clone())),
                Arc::new(KubeNotifier::new(client.clone())),
            ));

            let sources: Api<BeaconSource> = Api::all(client.clone());
            let deployments: Api<Deployment> = Api::all(client.clone());
            let event_types: Api<EventType> = Api::all(client.clone());

            info!("beacon source controller starting");
            Controller::new(sources, watcher::Config::default())
                .owns(deployments, watcher::Config::default())
                .owns(event_types, watcher::Config::default())
                .run(reconcile, error_policy, reconciler)
                .for_each(|result| async move {
                    match result {
                        Ok(obj) => debug!(object = ?obj, "reconciled"),
                        Err(e) => warn!(error = %e, "reconcile failed"),
                    }
                })
                .await;
        }
    }
    Ok(())
}

async fn reconcile(
    source: Arc<BeaconSource>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcileError> {
    let namespace = source.metadata.namespace.clone().unwrap_or_default();
    let name = source.metadata.name.clone().unwrap_or_default();
    ctx.reconcile(&namespace, &name).await?;
    // Periodic resync catches availability changes a watch might miss.
    Ok(Action::requeue(Duration::from_secs(300)))
}

fn error_policy(source: Arc<BeaconSource>, error: &ReconcileError, _ctx: Arc<Reconciler>) -> Action {
    let name = source.metadata.name.clone().unwrap_or_default();
    warn!(name = %name, error = %error, "reconcile error");
    if error.is_terminal() {
        // Misconfiguration will not fix itself; back off hard.
        Action::requeue(Duration::from_secs(300))
    } else {
        Action::requeue(Duration::from_secs(30))
    }
}
