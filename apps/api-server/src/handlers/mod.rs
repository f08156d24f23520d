//! HTTP handlers and route configuration.

mod auth;
mod health;
mod rpc;

use actix_web::web;

use crate::pages;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/rpc", web::post().to(rpc::dispatch_batch)),
    )
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/signin", web::post().to(auth::signin))
            .route("/signout", web::post().to(auth::signout)),
    )
    .service(
        web::scope("/admin")
            .route("", web::get().to(pages::admin::dashboard))
            .route("/article", web::get().to(pages::admin::articles))
            .route("/project", web::get().to(pages::admin::projects)),
    )
    .route("/", web::get().to(pages::home::landing))
    .route("/signin", web::get().to(pages::auth::signin_page))
    .route("/signout", web::get().to(pages::auth::signout_page));
}
