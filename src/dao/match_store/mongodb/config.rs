use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Parsed client options plus the database name the store operates on.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the tournament collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI, defaulting the database name when omitted.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("matchflow").to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
