#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::net::SocketAddr;

use actix_web::{App, HttpServer, web};
use tracing::info;

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;
use statuswatch::app::Services;
use statuswatch::config::Config;

const CONFIG_ENV: &str = "STATUSWATCH_CONFIG";

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_config(env::var(CONFIG_ENV).ok())?.with_env_overrides();
    let services = Services::build(&config, false)?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, services).await
}

async fn run_server(addr: SocketAddr, services: Services) -> Result<(), AppError> {
    let (scheduler, handle) = services.scheduler().spawn();
    let data = web::Data::new(services);

    info!(%addr, "Starting HTTP server");
    let served = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await;

    info!("HTTP server stopped, stopping scheduler...");
    handle.stop();
    if let Err(e) = scheduler.await {
        tracing::warn!(error = %e, "scheduler task ended abnormally");
    }

    served?;
    Ok(())
}
