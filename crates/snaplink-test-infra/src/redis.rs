use crate::{Endpoint, Result};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const REDIS_PORT: u16 = 6379;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisConfig {
    #[builder(default = String::from("8.6.0"), setter(into))]
    pub image_tag: String,
    /// Extra `redis-server` arguments, e.g. `["--maxmemory", "8mb"]`.
    #[builder(default)]
    pub args: Vec<String>,
}

/// A throwaway standalone Redis server.
pub struct RedisServer {
    _container: ContainerAsync<GenericImage>,
    endpoint: Endpoint,
}

impl RedisServer {
    pub async fn start(config: RedisConfig) -> Result<Self> {
        let mut cmd = vec!["redis-server".to_string()];
        cmd.extend(config.args);

        let container = GenericImage::new("redis", &config.image_tag)
            .with_exposed_port(REDIS_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .with_cmd(cmd)
            .start()
            .await?;
        let endpoint = Endpoint::resolve(&container, REDIS_PORT).await?;

        Ok(Self {
            _container: container,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Client URL, e.g. `redis://127.0.0.1:32768`.
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.endpoint.host, self.endpoint.port)
    }
}
