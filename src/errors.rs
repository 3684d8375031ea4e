use std::error;
use std::fmt;
use std::io;

/// Errors that can occur when sending an HTTP request to the gateway.
#[derive(Debug)]
pub enum RequestError {
    /// attohttpc error
    HttpError(attohttpc::Error),
    /// The gateway answered with a status outside of 2xx.
    Status(u16),
}

/// Errors returned by `search::discover`
#[derive(Debug)]
pub enum DiscoveryFailure {
    /// No reply with a `LOCATION` header arrived before the timeout.
    Timeout,
    /// A reply carried a `LOCATION` header that is not a usable http url.
    MalformedResponse(String),
    /// The socket could not be set up or used.
    IoError(io::Error),
}

/// Errors returned by `description::fetch_control_url`
#[derive(Debug)]
pub enum FetchFailure {
    /// The description document could not be retrieved.
    ConnectionError(RequestError),
    /// The description document is not well formed XML.
    InvalidDocument(xmltree::ParseError),
    /// The description document lists no WANIPConnection service.
    ServiceNotFound,
}

/// Errors returned by `Gateway::add_port` and `Gateway::add_same_port`
#[derive(Debug)]
pub enum MappingFailure {
    /// The SOAP request could not be delivered.
    ConnectionError(RequestError),
    /// The gateway answered the SOAP request with a status other than 200.
    NonSuccessStatus(u16),
    /// The control url can not be resolved against the location url.
    InvalidControlUrl(url::ParseError),
    /// The local address toward the gateway could not be determined.
    LocalAddress(io::Error),
}

/// Errors returned by `PortOpener::try_open`, tagged with the failing stage.
#[derive(Debug)]
pub enum OpenPortError {
    /// Gateway discovery failed.
    Discovery(DiscoveryFailure),
    /// Fetching the device description failed.
    Fetch(FetchFailure),
    /// The port mapping request failed.
    Mapping(MappingFailure),
}

impl From<attohttpc::Error> for RequestError {
    fn from(err: attohttpc::Error) -> RequestError {
        RequestError::HttpError(err)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RequestError::HttpError(ref e) => write!(f, "HTTP error {}", e),
            RequestError::Status(code) => write!(f, "HTTP status {}", code),
        }
    }
}

impl error::Error for RequestError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            RequestError::HttpError(ref e) => Some(e),
            RequestError::Status(..) => None,
        }
    }
}

impl From<io::Error> for DiscoveryFailure {
    fn from(err: io::Error) -> DiscoveryFailure {
        match err.kind() {
            // set_read_timeout reports an expired receive as WouldBlock on unix, TimedOut on windows
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => DiscoveryFailure::Timeout,
            _ => DiscoveryFailure::IoError(err),
        }
    }
}

impl fmt::Display for DiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DiscoveryFailure::Timeout => write!(f, "UPnP discovery timed out"),
            DiscoveryFailure::MalformedResponse(ref location) => {
                write!(f, "Malformed LOCATION header in discovery reply: {:?}", location)
            }
            DiscoveryFailure::IoError(ref e) => write!(f, "IO error: {}", e),
        }
    }
}

impl error::Error for DiscoveryFailure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DiscoveryFailure::Timeout => None,
            DiscoveryFailure::MalformedResponse(..) => None,
            DiscoveryFailure::IoError(ref e) => Some(e),
        }
    }
}

impl From<RequestError> for FetchFailure {
    fn from(err: RequestError) -> FetchFailure {
        FetchFailure::ConnectionError(err)
    }
}

impl From<attohttpc::Error> for FetchFailure {
    fn from(err: attohttpc::Error) -> FetchFailure {
        FetchFailure::ConnectionError(RequestError::HttpError(err))
    }
}

impl From<xmltree::ParseError> for FetchFailure {
    fn from(err: xmltree::ParseError) -> FetchFailure {
        FetchFailure::InvalidDocument(err)
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FetchFailure::ConnectionError(ref e) => write!(f, "Could not fetch device description: {}", e),
            FetchFailure::InvalidDocument(ref e) => write!(f, "Invalid device description: {}", e),
            FetchFailure::ServiceNotFound => write!(f, "Could not find WANIPConnection service"),
        }
    }
}

impl error::Error for FetchFailure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            FetchFailure::ConnectionError(ref e) => Some(e),
            FetchFailure::InvalidDocument(ref e) => Some(e),
            FetchFailure::ServiceNotFound => None,
        }
    }
}

impl From<RequestError> for MappingFailure {
    fn from(err: RequestError) -> MappingFailure {
        match err {
            RequestError::Status(code) => MappingFailure::NonSuccessStatus(code),
            e => MappingFailure::ConnectionError(e),
        }
    }
}

impl From<attohttpc::Error> for MappingFailure {
    fn from(err: attohttpc::Error) -> MappingFailure {
        MappingFailure::ConnectionError(RequestError::HttpError(err))
    }
}

impl From<url::ParseError> for MappingFailure {
    fn from(err: url::ParseError) -> MappingFailure {
        MappingFailure::InvalidControlUrl(err)
    }
}

impl fmt::Display for MappingFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MappingFailure::ConnectionError(ref e) => write!(f, "Could not send AddPortMapping: {}", e),
            MappingFailure::NonSuccessStatus(code) => write!(f, "Status: {}", code),
            MappingFailure::InvalidControlUrl(ref e) => write!(f, "Invalid control url: {}", e),
            MappingFailure::LocalAddress(ref e) => write!(f, "Could not determine local address: {}", e),
        }
    }
}

impl error::Error for MappingFailure {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            MappingFailure::ConnectionError(ref e) => Some(e),
            MappingFailure::NonSuccessStatus(..) => None,
            MappingFailure::InvalidControlUrl(ref e) => Some(e),
            MappingFailure::LocalAddress(ref e) => Some(e),
        }
    }
}

impl From<DiscoveryFailure> for OpenPortError {
    fn from(err: DiscoveryFailure) -> OpenPortError {
        OpenPortError::Discovery(err)
    }
}

impl From<FetchFailure> for OpenPortError {
    fn from(err: FetchFailure) -> OpenPortError {
        OpenPortError::Fetch(err)
    }
}

impl From<MappingFailure> for OpenPortError {
    fn from(err: MappingFailure) -> OpenPortError {
        OpenPortError::Mapping(err)
    }
}

impl fmt::Display for OpenPortError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OpenPortError::Discovery(ref e) => write!(f, "Discovery failed. {}", e),
            OpenPortError::Fetch(ref e) => write!(f, "Description fetch failed. {}", e),
            OpenPortError::Mapping(ref e) => write!(f, "Port mapping failed. {}", e),
        }
    }
}

impl error::Error for OpenPortError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            OpenPortError::Discovery(ref e) => Some(e),
            OpenPortError::Fetch(ref e) => Some(e),
            OpenPortError::Mapping(ref e) => Some(e),
        }
    }
}

#[test]
fn test_status_maps_to_non_success() {
    match MappingFailure::from(RequestError::Status(403)) {
        MappingFailure::NonSuccessStatus(403) => {}
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_receive_timeout_maps_to_timeout() {
    let would_block = io::Error::new(io::ErrorKind::WouldBlock, "resource temporarily unavailable");
    assert!(matches!(DiscoveryFailure::from(would_block), DiscoveryFailure::Timeout));
    let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
    assert!(matches!(DiscoveryFailure::from(refused), DiscoveryFailure::IoError(_)));
}

#[test]
fn test_open_port_error_names_stage() {
    let err = OpenPortError::from(FetchFailure::ServiceNotFound);
    assert_eq!(
        err.to_string(),
        "Description fetch failed. Could not find WANIPConnection service"
    );
}
