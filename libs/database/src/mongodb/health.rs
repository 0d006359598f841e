use mongodb::{Database, bson::doc};
use std::time::Instant;

/// Result of a readiness probe against MongoDB
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Driver error when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Ping the database and time the round trip.
pub async fn check_health(db: &Database) -> HealthStatus {
    let started = Instant::now();
    let result = db.run_command(doc! { "ping": 1 }).await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "MongoDB health check failed");
            HealthStatus {
                healthy: false,
                message: Some(e.to_string()),
                response_time_ms,
            }
        }
    }
}
