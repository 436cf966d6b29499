use actix_web::{HttpResponse, Responder, get, web};

use statuswatch::app::Services;

/// Stored status of every target, keyed by name
#[get("/status")]
pub async fn status_route(services: web::Data<Services>) -> impl Responder {
    let snapshot = services.store.read_all().await;
    HttpResponse::Ok().json(snapshot)
}
