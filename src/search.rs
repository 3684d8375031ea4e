use std::net::UdpSocket;
use std::str;
use std::time::{Duration, Instant};

use url::Url;

use crate::common::{messages, parsing, SearchOptions};
use crate::errors::DiscoveryFailure;

const MAX_RESPONSE_SIZE: usize = 8192;

/// Find the location of a gateway's device description on the local network.
///
/// A single M-SEARCH is sent to `options.broadcast_address`; the first reply
/// carrying a `LOCATION` header wins. Replies without that header are ignored.
/// The timeout bounds the whole wait, not each datagram.
///
/// The header value is returned as a parsed `Url`, so it comes back in
/// normalised form (lowercase scheme, default port dropped) rather than byte
/// for byte as the gateway sent it.
pub fn discover(options: &SearchOptions) -> Result<Url, DiscoveryFailure> {
    let socket = UdpSocket::bind(options.bind_addr)?;
    socket.set_broadcast(true)?;

    socket.send_to(messages::SEARCH_REQUEST.as_bytes(), options.broadcast_address)?;
    debug!(
        "sent discovery request to: {} on interface: {:?}",
        options.broadcast_address,
        socket.local_addr()
    );

    let deadline = options.timeout.map(|t| Instant::now() + t);
    let mut buf = [0u8; MAX_RESPONSE_SIZE];
    loop {
        socket.set_read_timeout(remaining(deadline)?)?;
        let (read, from) = socket.recv_from(&mut buf)?;

        let text = match str::from_utf8(&buf[..read]) {
            Ok(text) => text,
            Err(_) => {
                debug!("ignoring non utf-8 reply from: {}", from);
                continue;
            }
        };
        match parsing::parse_search_result(text)? {
            Some(location) => {
                debug!("received location {} from: {}", location, from);
                return Ok(location);
            }
            None => debug!("ignoring reply without location from: {}", from),
        }
    }
}

// Time left before the deadline. `set_read_timeout` rejects a zero duration.
fn remaining(deadline: Option<Instant>) -> Result<Option<Duration>, DiscoveryFailure> {
    match deadline {
        None => Ok(None),
        Some(deadline) => {
            let now = Instant::now();
            if now >= deadline {
                return Err(DiscoveryFailure::Timeout);
            }
            Ok(Some(deadline - now))
        }
    }
}

#[test]
fn test_remaining_without_deadline() {
    assert_eq!(remaining(None).unwrap(), None);
}

#[test]
fn test_remaining_after_deadline() {
    let past = Instant::now() - Duration::from_millis(10);
    assert!(matches!(remaining(Some(past)), Err(DiscoveryFailure::Timeout)));
}

#[test]
fn test_remaining_before_deadline() {
    let future = Instant::now() + Duration::from_secs(60);
    let left = remaining(Some(future)).unwrap().unwrap();
    assert!(left > Duration::from_secs(59));
}
