use mongodb::{Client, bson::doc, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryPolicy, retry_with_backoff};

/// Connect using a [`MongoConfig`] and verify the connection with a `ping`.
pub async fn connect_from_config(config: &MongoConfig) -> DatabaseResult<Client> {
    info!(url = %config.redacted_url(), "Connecting to MongoDB");

    let mut options = ClientOptions::parse(&config.url).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    options.app_name = config.app_name.clone();

    let client = Client::with_options(options)?;

    client
        .database(config.database())
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!(database = %config.database(), "Connected to MongoDB");
    Ok(client)
}

/// [`connect_from_config`] with exponential backoff, for startup when the
/// database may still be coming up.
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    policy: Option<RetryPolicy>,
) -> DatabaseResult<Client> {
    let policy = policy.unwrap_or_default();
    retry_with_backoff("mongodb connect", &policy, || connect_from_config(config)).await
}
