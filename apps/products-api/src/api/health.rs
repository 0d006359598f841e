//! Readiness endpoint; liveness comes from `axum_helpers::health_router`

use axum::{extract::State, routing::get, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};
use database::mongodb::check_health;
use mongodb::Database;

async fn ready(State(db): State<Database>) -> impl axum::response::IntoResponse {
    let mongo_ping: HealthCheckFuture = Box::pin(async move {
        let status = check_health(&db).await;
        if status.healthy {
            Ok(())
        } else {
            Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("mongodb", mongo_ping)]).await
}

pub fn router(db: Database) -> Router {
    Router::new().route("/ready", get(ready)).with_state(db)
}
