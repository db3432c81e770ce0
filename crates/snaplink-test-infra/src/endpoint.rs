use crate::Result;
use testcontainers::{ContainerAsync, Image};

/// Host and mapped port of a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Looks up where `container_port` is published on the host.
    ///
    /// `localhost` is pinned to `127.0.0.1` so clients do not try `::1`
    /// first, which the port mapping may not cover.
    pub async fn resolve<I: Image>(
        container: &ContainerAsync<I>,
        container_port: u16,
    ) -> Result<Self> {
        let host = match container.get_host().await?.to_string().as_str() {
            "localhost" => "127.0.0.1".to_string(),
            other => other.to_string(),
        };
        let port = container.get_host_port_ipv4(container_port).await?;

        Ok(Self { host, port })
    }
}
