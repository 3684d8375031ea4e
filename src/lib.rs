//! A small UPnP Internet Gateway Device client.
//!
//! It finds the router with an SSDP search, reads its device description to
//! locate the WANIPConnection control url and asks it, with a SOAP
//! `AddPortMapping` request, to forward a TCP port to this host.
//!
//! ```no_run
//! if upnp_open::open_upnp_port(1234) {
//!     println!("port 1234 is forwarded");
//! }
//! ```
//!
//! Use `PortOpener` to change the timeouts, the mapping description, or to
//! get the failing stage back as an `OpenPortError`.

#[macro_use]
extern crate log;

// data structures
pub use self::gateway::{Gateway, PortMappingProtocol, PortMappingRequest, PortMappingResult};

// errors
pub use self::errors::{DiscoveryFailure, FetchFailure, MappingFailure, OpenPortError, RequestError};

// configuration
pub use self::common::{HttpOptions, MappingOptions, OpenOptions, SearchOptions};

// the three stages
pub use self::description::{fetch_control_url, get_gateway};
pub use self::search::discover;

// the whole sequence
pub use self::open::{open_upnp_port, Event, LogReporter, PortOpener, Reporter};

// local fallback
pub use self::nat::{open_nat_port, open_nat_port_with_timeout};

mod common;
mod description;
mod errors;
mod gateway;
mod nat;
mod open;
mod search;
mod soap;
