use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_routing::config::{database::DatabaseConfig, EnvironmentConfig};
use fleet_routing::create_app;
use fleet_routing::database::{Database, MemoryDatabase, PgDatabase};
use fleet_routing::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚌 Fleet Routing - API de rutas y pathways");
    info!("==========================================");

    let config = EnvironmentConfig::from_env()?;

    // Inicializar base de datos
    let db: Arc<dyn Database> = match &config.database_url {
        Some(url) => {
            let database = PgDatabase::connect(&DatabaseConfig::new(url.clone()))
                .await
                .map_err(|e| anyhow::anyhow!("Error de base de datos: {}", e))?;
            database
                .run_migrations()
                .await
                .context("Error ejecutando migraciones")?;
            info!("✅ Migraciones aplicadas");
            Arc::new(database)
        }
        None => {
            warn!("⚠️ DATABASE_URL no definido, usando almacenamiento en memoria (los datos no persisten)");
            Arc::new(MemoryDatabase::new())
        }
    };
    info!("🗄️ Backend de datos: {}", db.backend_name());

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;
    let app = create_app(AppState::new(db, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("📍 /api/nodes - CRUD de nodos, get-nodes[/paginated]");
    info!("🛣️ /api/pathways - CRUD de pathways, opciones, casetas y tramos activos");
    info!("🚌 /api/routes - CRUD de rutas y composición de tramos (/:id/legs)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
