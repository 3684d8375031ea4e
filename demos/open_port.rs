//! Forward a TCP port on the local gateway to this machine.
//!
//! Falls back to the local broadcast test when no gateway accepts the mapping.
//!
//! Example: cargo run --example open_port -- 1234

use std::env;

use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

fn main() {
    let port = match env::args().nth(1).map(|p| p.parse::<u16>()) {
        Some(Ok(port)) => port,
        _ => {
            println!("Expected a port number (cargo run --example open_port -- <port>)");
            return;
        }
    };

    let _ = SimpleLogger::init(LevelFilter::Info, LogConfig::default());

    if upnp_open::open_upnp_port(port) {
        println!("UPnP port opening result: Success");
        return;
    }
    println!("UPnP port opening result: Failure");

    let nat_result = upnp_open::open_nat_port(port);
    println!("NAT port opening result: {}", if nat_result { "Success" } else { "Failure" });
}
