use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use safepath::{
    config::AppConfig,
    create_router,
    database::PgIncidentStore,
    incidents::{InMemoryIncidentStore, IncidentStore},
    orchestrator::RouteOrchestrator,
    provider::MapboxPathProvider,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Safety-aware walking route service")]
struct Args {
    /// Address to listen on, overrides BIND_ADDR
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// JSON file of incident reports, overrides INCIDENTS_JSON
    #[arg(long)]
    incidents: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safepath=debug,tower_http=info,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.incidents.is_some() {
        config.incidents_path = args.incidents;
    }

    let incidents = open_incident_store(&config).await?;

    let paths = MapboxPathProvider::new(
        config.mapbox_base_url.clone(),
        config.mapbox_api_key.clone(),
        config.upstream_timeout,
    )?;
    if !paths.is_configured() {
        tracing::warn!("MAPBOX_API_KEY is not set, route requests will fail with 502");
    }

    let orchestrator = RouteOrchestrator::new(incidents, Arc::new(paths), config.upstream_timeout);
    let app = create_router(AppState {
        orchestrator: Arc::new(orchestrator),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("starting safepath on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_incident_store(
    config: &AppConfig,
) -> Result<Arc<dyn IncidentStore>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.database_url {
        let store = PgIncidentStore::connect(url).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    if let Some(path) = &config.incidents_path {
        let store = InMemoryIncidentStore::from_file(path)?;
        tracing::info!("loaded {} incident(s) from {}", store.len(), path.display());
        return Ok(Arc::new(store));
    }

    tracing::warn!("no DATABASE_URL or INCIDENTS_JSON, serving without incident data");
    Ok(Arc::new(InMemoryIncidentStore::default()))
}
