use crate::{Endpoint, Result};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = String::from("snaplink"), setter(into))]
    pub database: String,
    #[builder(default = String::from("snaplink"), setter(into))]
    pub user: String,
    #[builder(default = String::from("snaplink"), setter(into))]
    pub password: String,
    #[builder(default = String::from("8.4"), setter(into))]
    pub image_tag: String,
    /// MySQL initialises its data directory on first boot, which is slow on
    /// cold CI runners.
    #[builder(default = Duration::from_secs(180))]
    pub startup_timeout: Duration,
}

/// A throwaway MySQL server with an empty database owned by
/// [`MysqlConfig::user`].
pub struct MySqlServer {
    _container: ContainerAsync<GenericImage>,
    endpoint: Endpoint,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        // the first "ready" line comes from the init server, which does not
        // listen on TCP; callers retry their first connection
        let container = GenericImage::new("mysql", &config.image_tag)
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", &config.database)
            .with_env_var("MYSQL_USER", &config.user)
            .with_env_var("MYSQL_PASSWORD", &config.password)
            .with_env_var("MYSQL_RANDOM_ROOT_PASSWORD", "yes")
            .with_startup_timeout(config.startup_timeout)
            .start()
            .await?;
        let endpoint = Endpoint::resolve(&container, MYSQL_PORT).await?;

        Ok(Self {
            _container: container,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// sqlx connection string for the test database.
    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.user,
            self.config.password,
            self.endpoint.host,
            self.endpoint.port,
            self.config.database
        )
    }
}
