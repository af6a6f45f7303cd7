use crate::cli::database::mongodb::MongoDBCliArgs;
use crate::ReconcilerError;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub connection_url: String,
    pub database_name: String,
}

impl TryFrom<MongoDBCliArgs> for MongoConfig {
    type Error = ReconcilerError;
    fn try_from(args: MongoDBCliArgs) -> Result<Self, Self::Error> {
        let connection_url = args
            .mongodb_connection_url
            .ok_or_else(|| ReconcilerError::ConfigError("MongoDB connection url is required".to_string()))?;
        let database_name = args
            .mongodb_database_name
            .ok_or_else(|| ReconcilerError::ConfigError("MongoDB database name is required".to_string()))?;
        Ok(Self { connection_url, database_name })
    }
}
