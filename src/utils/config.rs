use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::Result;

/// Configuration shared by the seed and migration tools
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_region")]
    pub aws_region: String,
    /// Override endpoint for DynamoDB Local / LocalStack
    #[serde(default)]
    pub dynamodb_endpoint: Option<String>,
    #[serde(default = "default_table_name")]
    pub dynamodb_table_name: String,
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,
    #[serde(default = "default_postgres_db")]
    pub postgres_db: String,
    #[serde(default = "default_postgres_credential")]
    pub postgres_user: String,
    #[serde(default = "default_postgres_credential")]
    pub postgres_password: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_table_name() -> String {
    "lunari-users-dev".to_string()
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_db() -> String {
    "lunari_users".to_string()
}

fn default_postgres_credential() -> String {
    "postgres".to_string()
}

impl Config {
    /// Load config from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::default())
    }

    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut loaded: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        if loaded
            .dynamodb_endpoint
            .as_deref()
            .is_some_and(|endpoint| endpoint.trim().is_empty())
        {
            loaded.dynamodb_endpoint = None;
        }

        Ok(loaded)
    }

    /// Table name used by the seed tool for an environment
    pub fn seed_table_name(env: &str) -> String {
        format!("lunari-users-{env}")
    }

    pub fn postgres_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.postgres_host)
            .port(self.postgres_port)
            .database(&self.postgres_db)
            .username(&self.postgres_user)
            .password(&self.postgres_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn load(toml: &str) -> Config {
        Config::from_source(File::from_str(toml, FileFormat::Toml)).expect("config loads")
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = load("");

        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.dynamodb_table_name, "lunari-users-dev");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.postgres_host, "localhost");
        assert_eq!(config.postgres_port, 5432);
        assert_eq!(config.postgres_db, "lunari_users");
        assert_eq!(config.postgres_user, "postgres");
        assert_eq!(config.postgres_password, "postgres");
    }

    #[test]
    fn test_overrides_and_blank_endpoint() {
        let config = load(
            r#"
            aws_region = "sa-east-1"
            dynamodb_endpoint = "  "
            dynamodb_table_name = "lunari-users-prod"
            postgres_port = 6543
            "#,
        );

        assert_eq!(config.aws_region, "sa-east-1");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.dynamodb_table_name, "lunari-users-prod");
        assert_eq!(config.postgres_port, 6543);
    }

    #[test]
    fn test_local_endpoint_is_kept() {
        let config = load(r#"dynamodb_endpoint = "http://localhost:8000""#);
        assert_eq!(config.dynamodb_endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_seed_table_name() {
        assert_eq!(Config::seed_table_name("dev"), "lunari-users-dev");
        assert_eq!(Config::seed_table_name("prod"), "lunari-users-prod");
    }
}
