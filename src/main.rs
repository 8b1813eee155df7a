use charge_mock::{App, ConfigBuilder};

#[tokio::main]
async fn main() {
    let config = match ConfigBuilder::new().from_env().build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    charge_mock::init_tracing_with_config(&config);

    tracing::info!(
        backend = ?config.store.backend,
        sweeper = config.sweeper.enabled,
        reconfirm = ?config.charges.reconfirm,
        "Starting charge mock"
    );

    let app = match App::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize charge store");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.serve().await {
        tracing::error!(error = %e, "Server exited with an error");
        std::process::exit(1);
    }
}
