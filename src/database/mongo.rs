use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{doc, Document};
use mongodb::options::{AggregateOptions, ClientOptions, Credential, FindOptions as DriverFindOptions};
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::store::{DocumentStore, DocumentStream, FindOptions, StoreError};
use crate::config::DatabaseConfig;

/// MongoDB-backed store. Natural order on these collections is insertion order.
#[derive(Clone)]
pub struct MongoStore {
    database: Database,
    max_time: Option<Duration>,
}

impl MongoStore {
    /// Connect and ping once so an unreachable server fails startup.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if config.name.is_empty() {
            return Err(StoreError::Config("database name cannot be empty".to_string()));
        }

        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(config.app_name.clone());
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        if let Some(username) = &config.username {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(config.password.clone())
                    .source(config.name.clone())
                    .build(),
            );
        }

        let client = Client::with_options(options)?;
        let store = Self {
            database: client.database(&config.name),
            max_time: config.max_query_time_ms.map(Duration::from_millis),
        };

        store
            .ping()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{} did not answer ping: {}", config.uri, e)))?;
        info!("Connected to database: {}", config.name);
        Ok(store)
    }
}

/// Natural order is insertion order, so newest-first is a reverse natural sort.
fn driver_find_options(options: FindOptions, max_time: Option<Duration>) -> DriverFindOptions {
    DriverFindOptions::builder()
        .sort(options.newest_first.then(|| doc! { "$natural": -1 }))
        .limit(options.limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX)))
        .max_time(max_time)
        .build()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<DocumentStream, StoreError> {
        debug!("find on {}: {} ({:?})", collection, filter, options);

        let driver_options = driver_find_options(options, self.max_time);
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(filter, driver_options)
            .await?;

        Ok(cursor.map_err(StoreError::from).boxed())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<DocumentStream, StoreError> {
        debug!("aggregate on {} with {} stages", collection, pipeline.len());

        let driver_options = AggregateOptions::builder().max_time(self.max_time).build();
        let cursor = self
            .database
            .collection::<Document>(collection)
            .aggregate(pipeline, driver_options)
            .await?;

        Ok(cursor.map_err(StoreError::from).boxed())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_sorts_reverse_natural_and_limits() {
        let driver = driver_find_options(FindOptions::newest(3), None);
        assert_eq!(driver.sort, Some(doc! { "$natural": -1 }));
        assert_eq!(driver.limit, Some(3));
        assert_eq!(driver.max_time, None);
    }

    #[test]
    fn default_find_has_no_sort_or_limit() {
        let driver = driver_find_options(FindOptions::default(), Some(Duration::from_millis(1500)));
        assert_eq!(driver.sort, None);
        assert_eq!(driver.limit, None);
        assert_eq!(driver.max_time, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn oversized_limit_saturates() {
        let driver = driver_find_options(FindOptions::newest(u64::MAX), None);
        assert_eq!(driver.limit, Some(i64::MAX));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let config = DatabaseConfig {
            uri: "mongodb://127.0.0.1:1".to_string(),
            username: None,
            password: None,
            name: "datalake".to_string(),
            app_name: "datalake-gateway-test".to_string(),
            connect_timeout_secs: 1,
            max_query_time_ms: None,
        };
        let result = MongoStore::connect(&config).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
