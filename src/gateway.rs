use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs, UdpSocket};

use url::{Host, Url};

use crate::common::{messages, HttpOptions, MappingOptions};
use crate::errors::MappingFailure;
use crate::soap;

/// Represents the protocols available for port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortMappingProtocol {
    /// TCP protocol
    TCP,
    /// UDP protocol
    UDP,
}

impl fmt::Display for PortMappingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                PortMappingProtocol::TCP => "TCP",
                PortMappingProtocol::UDP => "UDP",
            }
        )
    }
}

/// The arguments of one `AddPortMapping` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMappingRequest {
    pub external_port: u16,
    pub internal_port: u16,
    pub protocol: PortMappingProtocol,
    /// Host the gateway forwards the traffic to.
    pub internal_client: Ipv4Addr,
    pub enabled: bool,
    pub description: String,
    /// In seconds, 0 is permanent.
    pub lease_duration: u32,
}

impl PortMappingRequest {
    /// A permanent, enabled TCP mapping of `port` on the gateway to the same port on `internal_client`.
    pub fn tcp(port: u16, internal_client: Ipv4Addr, description: &str) -> PortMappingRequest {
        PortMappingRequest {
            external_port: port,
            internal_port: port,
            protocol: PortMappingProtocol::TCP,
            internal_client,
            enabled: true,
            description: description.to_string(),
            lease_duration: 0,
        }
    }
}

/// Outcome of a port mapping request. Only the HTTP status is inspected.
pub type PortMappingResult = Result<(), MappingFailure>;

/// This structure represents a gateway found by the search functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gateway {
    /// Url of the device description the gateway advertised
    pub location: Url,
    /// Control url of the WANIPConnection service, as written in the description
    pub control_url: String,
}

impl Gateway {
    /// The url SOAP requests are posted to.
    ///
    /// A path is resolved against the location, so it lands on the host that answered the search.
    pub fn control_endpoint(&self) -> Result<Url, url::ParseError> {
        self.location.join(&self.control_url)
    }

    /// The local IPv4 address the OS would use to reach this gateway.
    pub fn local_addr(&self) -> io::Result<Ipv4Addr> {
        let host = match self.location.host() {
            Some(Host::Ipv4(addr)) => IpAddr::V4(addr),
            Some(Host::Domain(domain)) => (domain, 0)
                .to_socket_addrs()?
                .map(|a| a.ip())
                .find(IpAddr::is_ipv4)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "gateway host has no IPv4 address"))?,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "gateway location has no IPv4 host",
                ))
            }
        };
        let port = self.location.port_or_known_default().unwrap_or(80);
        local_ipv4_towards(host, port)
    }

    /// Add a port mapping.
    ///
    /// Sends a single `AddPortMapping` request. A 200 answer means the mapping
    /// was accepted, the response body is not looked at.
    pub fn add_port(&self, request: &PortMappingRequest, options: &HttpOptions) -> PortMappingResult {
        let endpoint = self.control_endpoint()?;
        let body = messages::format_add_port_mapping_message(request);
        debug!(
            "requesting {} mapping of port {} to {}:{} from: {}",
            request.protocol, request.external_port, request.internal_client, request.internal_port, endpoint
        );

        match soap::send(
            endpoint.as_str(),
            soap::Action::new(messages::ADD_PORT_MAPPING_HEADER),
            &body,
            options,
        )? {
            200 => Ok(()),
            status => Err(MappingFailure::NonSuccessStatus(status)),
        }
    }

    /// Forward TCP `port` on the gateway to the same port on this host.
    pub fn add_same_port(&self, port: u16, options: &MappingOptions, http: &HttpOptions) -> PortMappingResult {
        let internal_client = match options.internal_client {
            Some(addr) => addr,
            None => self.local_addr().map_err(MappingFailure::LocalAddress)?,
        };
        let mut request = PortMappingRequest::tcp(port, internal_client, &options.description);
        request.lease_duration = options.lease_duration;
        self.add_port(&request, http)
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.control_endpoint() {
            Ok(url) => write!(f, "{}", url),
            Err(_) => write!(f, "{} ({})", self.location, self.control_url),
        }
    }
}

// Connecting a UDP socket sends nothing, it only picks the route.
pub(crate) fn local_ipv4_towards(host: IpAddr, port: u16) -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((host, port))?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(addr) => Ok(addr),
        IpAddr::V6(addr) => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no IPv4 route to gateway, got {}", addr),
        )),
    }
}

#[cfg(test)]
fn gateway(location: &str, control_url: &str) -> Gateway {
    Gateway {
        location: Url::parse(location).unwrap(),
        control_url: control_url.to_string(),
    }
}

#[test]
fn test_control_endpoint_from_path() {
    let gw = gateway("http://192.168.1.1:5000/desc.xml", "/ctl/IPConn");
    assert_eq!(gw.control_endpoint().unwrap().as_str(), "http://192.168.1.1:5000/ctl/IPConn");
}

#[test]
fn test_control_endpoint_from_relative_path() {
    let gw = gateway("http://192.168.1.1:5000/rootDesc.xml", "ctl/IPConn");
    assert_eq!(gw.control_endpoint().unwrap().as_str(), "http://192.168.1.1:5000/ctl/IPConn");
}

#[test]
fn test_control_endpoint_absolute() {
    let gw = gateway("http://192.168.1.1:5000/desc.xml", "http://192.168.1.1:49000/upnp/control/WANIPConn1");
    assert_eq!(
        gw.control_endpoint().unwrap().as_str(),
        "http://192.168.1.1:49000/upnp/control/WANIPConn1"
    );
}

#[test]
fn test_display() {
    let gw = gateway("http://192.168.1.1:5000/desc.xml", "/ctl/IPConn");
    assert_eq!(gw.to_string(), "http://192.168.1.1:5000/ctl/IPConn");
}

#[test]
fn test_local_addr_towards_loopback() {
    let gw = gateway("http://127.0.0.1:5000/desc.xml", "/ctl/IPConn");
    assert_eq!(gw.local_addr().unwrap(), Ipv4Addr::LOCALHOST);
}

#[test]
fn test_tcp_request() {
    let request = PortMappingRequest::tcp(1234, Ipv4Addr::new(10, 0, 0, 2), "label");
    assert_eq!(request.external_port, 1234);
    assert_eq!(request.internal_port, 1234);
    assert_eq!(request.protocol, PortMappingProtocol::TCP);
    assert!(request.enabled);
    assert_eq!(request.lease_duration, 0);
}

#[test]
fn test_unjoinable_control_url() {
    let gw = gateway("http://192.168.1.1:5000/desc.xml", "http://[");
    let request = PortMappingRequest::tcp(1234, Ipv4Addr::new(10, 0, 0, 2), "label");
    match gw.add_port(&request, &HttpOptions::default()) {
        Err(MappingFailure::InvalidControlUrl(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_ipv6_location_has_no_local_address() {
    let gw = gateway("http://[::1]:5000/desc.xml", "/ctl/IPConn");
    match gw.add_same_port(1234, &MappingOptions::default(), &HttpOptions::default()) {
        Err(MappingFailure::LocalAddress(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
        other => panic!("unexpected result: {:?}", other),
    }
}
