//! Upstream Weather Underground forwarder.
//!
//! Re-sends the station's query string to the Weather Underground ingestion
//! host. The host is resolved against pinned public nameservers instead of
//! the system resolver; the request goes to the resolved IP with the real
//! host name in the `Host` header.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use reqwest::header::HOST;
use reqwest::Client;
use tracing::{debug, warn};
use wxbridge_core::{ForwardSettings, StationParams};

use crate::error::{PublishError, PublishResult};

/// Upload path, fixed by station firmware.
pub const UPDATE_PATH: &str = "/weatherstation/updateweatherstation.php";

const DNS_PORT: u16 = 53;
const HTTP_PORT: u16 = 80;

/// Resolves a host name to one address.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> PublishResult<IpAddr>;
}

/// Resolver that queries fixed public nameservers.
pub struct PublicDnsResolver {
    resolver: TokioAsyncResolver,
}

impl PublicDnsResolver {
    pub fn new(nameservers: &[String]) -> PublishResult<Self> {
        let ips = nameservers
            .iter()
            .map(|ns| {
                ns.trim()
                    .parse::<IpAddr>()
                    .map_err(|_| PublishError::Dns(format!("bad nameserver {}", ns)))
            })
            .collect::<PublishResult<Vec<_>>>()?;
        if ips.is_empty() {
            return Err(PublishError::Dns("no nameservers configured".to_string()));
        }

        let group = NameServerConfigGroup::from_ips_clear(&ips, DNS_PORT, true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let resolver = TokioAsyncResolver::tokio(config, ResolverOpts::default());
        Ok(Self { resolver })
    }
}

#[async_trait]
impl HostResolver for PublicDnsResolver {
    async fn resolve(&self, host: &str) -> PublishResult<IpAddr> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| PublishError::Dns(e.to_string()))?;
        lookup
            .iter()
            .next()
            .ok_or_else(|| PublishError::Dns(format!("no address for {}", host)))
    }
}

/// Resolver that always answers with the same address.
#[derive(Debug, Clone, Copy)]
pub struct StaticResolver(pub IpAddr);

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, _host: &str) -> PublishResult<IpAddr> {
        Ok(self.0)
    }
}

/// Forwards raw uploads to Weather Underground.
pub struct UpstreamForwarder {
    client: Client,
    resolver: Arc<dyn HostResolver>,
    settings: ForwardSettings,
    port: u16,
}

impl UpstreamForwarder {
    /// Forwarder using the configured public nameservers.
    pub fn new(settings: ForwardSettings) -> PublishResult<Self> {
        let resolver = Arc::new(PublicDnsResolver::new(&settings.nameservers)?);
        Self::with_resolver(settings, resolver)
    }

    pub fn with_resolver(
        settings: ForwardSettings,
        resolver: Arc<dyn HostResolver>,
    ) -> PublishResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            resolver,
            settings,
            port: HTTP_PORT,
        })
    }

    /// Override the upstream port (80 by default).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }

    /// Query parameters as they will be sent upstream.
    pub fn upstream_params(&self, params: &StationParams) -> StationParams {
        params.with_credentials(
            self.settings.station_id.as_deref(),
            self.settings.station_key.as_deref(),
        )
    }

    /// Resolve and send. Bounded by the configured timeout.
    pub async fn forward(&self, params: &StationParams) -> PublishResult<()> {
        tokio::time::timeout(self.timeout(), self.send(params))
            .await
            .map_err(|_| PublishError::Timeout(self.timeout()))?
    }

    /// Forward and log any failure. Never fails.
    pub async fn forward_logged(&self, params: &StationParams) {
        match self.forward(params).await {
            Ok(()) => debug!(host = %self.settings.host, "Forwarded upload"),
            Err(e) => {
                warn!(
                    host = %self.settings.host,
                    error = %e,
                    "Failed to forward to Weather Underground"
                );
            }
        }
    }

    async fn send(&self, params: &StationParams) -> PublishResult<()> {
        let host = &self.settings.host;
        let ip = self.resolver.resolve(host).await?;
        let url = format!("http://{}{}", SocketAddr::new(ip, self.port), UPDATE_PATH);

        let response = self
            .client
            .get(&url)
            .query(self.upstream_params(params).pairs())
            .header(HOST, host.as_str())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(())
    }
}
