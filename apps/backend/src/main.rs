use std::time::Duration;

use actix_web::{web, App, HttpServer};
use huddle::config::db::DbKind;
use huddle::config::engine::EngineConfig;
use huddle::infra::state::build_state;
use huddle::middleware::cors::cors_middleware;
use huddle::middleware::request_trace::RequestTrace;
use huddle::middleware::structured_logger::StructuredLogger;
use huddle::middleware::trace_span::TraceSpan;
use huddle::routes;
use tracing::{error, info};

mod telemetry;

const HUB_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let host = std::env::var("HUDDLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("HUDDLE_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
    {
        Ok(port) => port,
        Err(_) => {
            error!("HUDDLE_PORT must be a valid port number");
            std::process::exit(1);
        }
    };

    let (db_kind, engine) = match (DbKind::from_env(), EngineConfig::from_env()) {
        (Ok(kind), Ok(engine)) => (kind, engine),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app_state = match build_state()
        .with_db(db_kind)
        .with_engine(engine)
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };
    info!(?db_kind, engine = ?app_state.engine, "database connected and migrated");

    let hub = app_state.hub.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(HUB_PRUNE_INTERVAL);
        loop {
            tick.tick().await;
            hub.prune();
        }
    });

    let data = web::Data::new(app_state);
    info!(%host, port, "starting huddle");

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
