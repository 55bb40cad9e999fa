use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const READY_MESSAGE: &str = "database system is ready to accept connections";
const PORT: u16 = 5432;

#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "giftcode".to_string(), setter(into))]
    database: String,
    #[builder(default = "giftcode".to_string(), setter(into))]
    username: String,
    #[builder(default = "giftcode".to_string(), setter(into))]
    password: String,
    /// Image tag of the official `postgres` image.
    #[builder(default = "16-alpine".to_string(), setter(into))]
    tag: String,
}

/// A Postgres container that lives as long as this value.
pub struct PostgresServer {
    container: ContainerAsync<GenericImage>,
    config: PostgresConfig,
}

impl PostgresServer {
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        // The init pass logs readiness on stderr; the restarted server logs it again on stdout.
        let container = GenericImage::new("postgres", config.tag.as_str())
            .with_exposed_port(PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE))
            .with_wait_for(WaitFor::message_on_stdout(READY_MESSAGE))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    /// Starts a server with the default credentials.
    pub async fn start() -> Result<Self> {
        Self::new(PostgresConfig::builder().build()).await
    }

    /// Connection string reachable from the test process.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(PORT).await?;
        let PostgresConfig {
            database,
            username,
            password,
            ..
        } = &self.config;
        Ok(format!(
            "postgres://{username}:{password}@{host}:{port}/{database}"
        ))
    }
}
