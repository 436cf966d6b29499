//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Generates a `routes` function registering every listed actix service.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route status::status_route,
/// }
///
/// App::new().configure(routes);
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $service:path),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $( cfg.service($service); )*
        }
    };
}
