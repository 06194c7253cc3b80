//! Route configuration
//!
//! Centralized route setup; each domain manages its own routes in a
//! `configure` submodule. Public routes sit directly on the scope,
//! authenticated routes inside a nested scope wrapped with the JWT
//! middleware.

use crate::handlers;
use crate::middleware::JwtAuthMiddleware;
use actix_web::{web, HttpResponse};

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler)).service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health::health_check))
            .route(
                "/health/ready",
                web::get().to(handlers::health::readiness_check),
            )
            .configure(routes::auth::configure)
            .configure(routes::users::configure)
            .configure(routes::posts::configure),
    );
}

/// Metrics handler
async fn metrics_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(crate::metrics::gather_metrics())
}

// Sub-modules for each domain
mod routes {
    use super::*;

    pub mod auth {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/auth")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route(
                        "/activate/{token}",
                        web::get().to(handlers::auth::activate),
                    )
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/refresh", web::post().to(handlers::auth::refresh))
                    .route(
                        "/password/forgot",
                        web::post().to(handlers::password_reset::forgot_password),
                    )
                    .route(
                        "/password/reset",
                        web::post().to(handlers::password_reset::reset_password),
                    )
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .route("/logout", web::post().to(handlers::auth::logout))
                            .route(
                                "/password/change",
                                web::post().to(handlers::auth::change_password),
                            ),
                    ),
            );
        }
    }

    pub mod users {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/users")
                    .wrap(JwtAuthMiddleware)
                    .route("/{id}", web::get().to(handlers::users::get_user))
                    .route("/{id}", web::put().to(handlers::users::update_user)),
            );
        }
    }

    pub mod posts {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/posts")
                    .route("", web::get().to(handlers::posts::list_posts))
                    .route("/{id}", web::get().to(handlers::posts::get_post))
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .route("", web::post().to(handlers::posts::create_post))
                            .route("/images", web::post().to(handlers::posts::upload_image))
                            .route("/{id}", web::put().to(handlers::posts::update_post))
                            .route("/{id}", web::delete().to(handlers::posts::delete_post)),
                    ),
            );
        }
    }
}
