use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use crop_predict::config::{Cli, Config};
use crop_predict::inference::model_loader::{load_model, ModelRequirements};
use crop_predict::server::predict_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "crop_predict=debug,tower_http=debug"
    } else {
        "crop_predict=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("crop-predict v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);
    let config = Arc::new(config);

    info!(
        model = %config.model.model_path.display(),
        n_features = config.model.n_features,
        top_k = config.model.top_k,
        "Configuration loaded"
    );

    // Load the model once; a bad artifact stops startup here.
    let model = load_model(
        &config.model.model_path,
        ModelRequirements {
            n_features: config.model.n_features,
            min_classes: config.model.top_k,
        },
    )?;

    // Build application state.
    let state = Arc::new(AppState::new(model, config.clone())?);

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
