mod check;
mod health;
mod status;

macros_utils::routes! {
    route health::health_route,
    route status::status_route,
    route check::check_route,
}
