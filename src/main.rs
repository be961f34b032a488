use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use warp::Filter;

use macro_dashboard_series::config::Settings;
use macro_dashboard_series::context::AppContext;
use macro_dashboard_series::routes;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env()?;

    // Bind to 0.0.0.0 so the service is reachable inside containers
    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    info!("Will bind to: {}", addr);

    let ctx = Arc::new(AppContext::new(settings)?);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(ctx).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
