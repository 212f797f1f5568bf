use actix_web::web;

pub mod health;
pub mod sessions;

/// Register every route. `main.rs` and the HTTP tests share this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Sessions: /api/sessions/**
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));
}
