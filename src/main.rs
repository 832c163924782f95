mod config;
mod db;
mod error;
mod identifier;
mod pdf;
mod qr;
mod registration;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use config::StorageBackend;
use storage::{AssetStore, LocalAssetStore, S3AssetStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noc_registry=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    let assets: Arc<dyn AssetStore> = match &config.storage {
        StorageBackend::Local => {
            crate::storage::ensure_dirs(&config.upload_folder)?;
            tracing::info!("Storing assets under {}", config.upload_folder.display());
            Arc::new(LocalAssetStore::new(config.upload_folder.clone()))
        }
        StorageBackend::S3 {
            bucket,
            region,
            public_url,
        } => {
            tracing::info!("Storing assets in s3://{} ({})", bucket, region);
            Arc::new(
                S3AssetStore::from_env(bucket.clone(), region.clone(), public_url.clone()).await,
            )
        }
    };

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(pool.as_ref()).await?;
    let records: Arc<dyn db::RecordStore> = Arc::new(db::PgRecordStore::new(pool.clone()));

    let renderer = pdf::PdfRenderer::new(config.font_dir.clone());
    if !renderer.has_fonts() {
        tracing::warn!("No fonts found for certificate rendering; registrations will fail until FONT_DIR is set");
    }

    let pipeline =
        registration::RegistrationPipeline::new(records.clone(), assets.clone(), Arc::new(renderer));

    let state = Arc::new(state::AppState {
        config: config.clone(),
        records,
        assets,
        pipeline,
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "NOC registry listening on http://{} ({:?} registration)",
        addr,
        config.registration_mode
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
