use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default timeout for a gateway search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default multicast address for SSDP.
pub const DEFAULT_BROADCAST_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(239, 255, 255, 250)), 1900);
/// Description attached to mappings unless another one is given.
pub const DEFAULT_DESCRIPTION: &str = "UPnP Port Mapping";

/// Gateway search configuration
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Bind address for UDP socket (defaults to all `0.0.0.0`)
    pub bind_addr: SocketAddr,
    /// Broadcast address for discovery packets (defaults to `239.255.255.250:1900`)
    pub broadcast_address: SocketAddr,
    /// Timeout for the whole search (defaults to 3 seconds), `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            broadcast_address: DEFAULT_BROADCAST_ADDRESS,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// HTTP configuration shared by the description fetch and the SOAP request.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Connect and read timeout. `None` keeps the transport defaults.
    pub timeout: Option<Duration>,
}

impl HttpOptions {
    pub(crate) fn apply<B>(&self, request: attohttpc::RequestBuilder<B>) -> attohttpc::RequestBuilder<B> {
        match self.timeout {
            Some(t) => request.connect_timeout(t).read_timeout(t),
            None => request,
        }
    }
}

/// Port mapping configuration
#[derive(Debug, Clone)]
pub struct MappingOptions {
    /// Value of `NewPortMappingDescription`
    pub description: String,
    /// Lease duration in seconds, 0 is permanent
    pub lease_duration: u32,
    /// Address sent as `NewInternalClient`. When `None` the local address
    /// routed toward the gateway is used.
    pub internal_client: Option<Ipv4Addr>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            lease_duration: 0,
            internal_client: None,
        }
    }
}

/// Everything `PortOpener` needs for one run.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub search: SearchOptions,
    /// Used for both the description fetch and the SOAP request.
    pub http: HttpOptions,
    pub mapping: MappingOptions,
}
