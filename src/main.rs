use log::{error, info, LevelFilter};
use log4rs_dynamic_filters::DynamicLevelFilter;
use thiserror::Error;

/// Where the logging configuration lives, relative to the working directory.
const LOG_CONFIG: &str = "log4rs.yaml";

/// Failures that stop the server from coming up at all.
#[derive(Debug, Error)]
enum LaunchError {
    #[error("Server failed: {0}")]
    Rocket(#[from] rocket::Error),
}

async fn serve() -> Result<(), LaunchError> {
    info!("Starting polls-backend {}", env!("CARGO_PKG_VERSION"));
    let rocket = polls_backend::build().ignite().await?;
    // Silence Rocket's own logging once ignited.
    DynamicLevelFilter::set("rocket", LevelFilter::Off);
    rocket.launch().await?;
    Ok(())
}

#[rocket::main]
async fn main() {
    log4rs::init_file(LOG_CONFIG, log4rs_dynamic_filters::default_deserializers())
        .expect("Failed to initialise logging");

    if let Err(err) = serve().await {
        error!("{err}");
        error!("Critical failure, shutting down");
        std::process::exit(1)
    }
}
