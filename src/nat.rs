//! Best-effort local fallback for when no UPnP gateway answers.
//!
//! This does not talk to the router at all. It binds the port locally and
//! broadcasts a test packet on the LAN, which is only useful as a diagnostic.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use crate::common::options::DEFAULT_BROADCAST_ADDRESS;
use crate::gateway::local_ipv4_towards;

const TEST_MESSAGE: &[u8] = b"Port opening test";
const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Bind UDP `port_number` locally and broadcast a test packet from it.
///
/// Waits up to 5 seconds for a reply, getting none is expected.
pub fn open_nat_port(port_number: u16) -> bool {
    open_nat_port_with_timeout(port_number, DEFAULT_REPLY_TIMEOUT)
}

/// Same as `open_nat_port` with a custom reply timeout.
pub fn open_nat_port_with_timeout(port_number: u16, reply_timeout: Duration) -> bool {
    info!("Attempting to open local port {}", port_number);
    let target = SocketAddrV4::new(Ipv4Addr::BROADCAST, port_number);
    match broadcast_from(port_number, target, reply_timeout) {
        Ok(_) => {
            info!("Successfully opened local port {}", port_number);
            true
        }
        Err(e) => {
            error!("Error in local port opening: {}", e);
            false
        }
    }
}

// Returns who answered, if anyone did. A port of 0 in `target` means the bound port.
fn broadcast_from(port_number: u16, target: SocketAddrV4, reply_timeout: Duration) -> io::Result<Option<SocketAddr>> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port_number))?;
    let port = socket.local_addr()?.port();
    // The default route is the one SSDP traffic would take.
    let local_ip = match local_ipv4_towards(DEFAULT_BROADCAST_ADDRESS.ip(), DEFAULT_BROADCAST_ADDRESS.port()) {
        Ok(ip) => ip,
        Err(e) => {
            debug!("no route to resolve the local address: {}", e);
            Ipv4Addr::UNSPECIFIED
        }
    };
    info!("Bound to local address: {}:{}", local_ip, port);

    let target = match target.port() {
        0 => SocketAddrV4::new(*target.ip(), port),
        _ => target,
    };
    socket.set_broadcast(true)?;
    socket.send_to(TEST_MESSAGE, target)?;
    info!("Sent broadcast packet from {}:{} to {}", local_ip, port, target);

    socket.set_read_timeout(Some(reply_timeout))?;
    let mut buf = [0u8; 1024];
    loop {
        match socket.recv_from(&mut buf) {
            // Our own broadcast can come back to us.
            Ok((_, from)) if from.port() == port && is_own_address(from.ip(), local_ip) => continue,
            Ok((n, from)) => {
                info!("Received response from {}: {:?}", from, String::from_utf8_lossy(&buf[..n]));
                return Ok(Some(from));
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                info!("No response received (expected)");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }
}

fn is_own_address(ip: IpAddr, local_ip: Ipv4Addr) -> bool {
    match ip {
        IpAddr::V4(ip) => ip == local_ip || ip.is_loopback(),
        IpAddr::V6(_) => false,
    }
}

#[test]
fn test_port_in_use_fails() {
    let taken = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
    let port = taken.local_addr().unwrap().port();
    assert!(!open_nat_port_with_timeout(port, Duration::from_millis(50)));
}

#[test]
fn test_broadcast_reports_responder() {
    let responder = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let responder_addr = match responder.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(_) => unreachable!(),
    };
    let echo = std::thread::spawn(move || {
        let mut buf = [0u8; 64];
        let (n, from) = responder.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], TEST_MESSAGE);
        responder.send_to(b"pong", from).unwrap();
    });

    let from = broadcast_from(0, responder_addr, Duration::from_secs(2)).unwrap();
    assert_eq!(from, Some(SocketAddr::V4(responder_addr)));
    echo.join().unwrap();
}

#[test]
fn test_broadcast_without_reply_succeeds() {
    let silent = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let silent_addr = match silent.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(_) => unreachable!(),
    };

    assert_eq!(broadcast_from(0, silent_addr, Duration::from_millis(100)).unwrap(), None);
}
