use actix_web::{HttpResponse, post, web};
use tracing::info;

use crate::error::ApiError;
use statuswatch::app::Services;

/// Run a pass right now and return its report.
/// Safe to call while a scheduled pass is running.
#[post("/check")]
pub async fn check_route(services: web::Data<Services>) -> Result<HttpResponse, ApiError> {
    info!("On-demand check pass requested");
    let report = services.orchestrator.run_registry_pass(services.registry.as_ref()).await?;
    Ok(HttpResponse::Ok().json(report))
}
