use std::io;

use url::Url;
use xmltree::{Element, XMLNode};

use crate::errors::{DiscoveryFailure, FetchFailure};

/// Namespace of UPnP device description documents.
pub const DEVICE_NAMESPACE: &str = "urn:schemas-upnp-org:device-1-0";

// Suffix of the service type we are looking for.
const WAN_IP_CONNECTION: &str = "WANIPConnection";

/// Find the value of the `LOCATION` header in an SSDP reply.
///
/// The header name is matched case-insensitively and the value runs up to
/// the end of its line, with surrounding whitespace removed.
pub fn find_location_header(text: &str) -> Option<&str> {
    for line in text.lines() {
        if let Some(colon) = line.find(':') {
            if line[..colon].trim().eq_ignore_ascii_case("location") {
                return Some(line[colon + 1..].trim());
            }
        }
    }
    None
}

// Parse the location value of a search result. The returned url is in
// normalised form, e.g. a default port is dropped and a bare host gains `/`.
pub fn parse_location(value: &str) -> Result<Url, DiscoveryFailure> {
    let malformed = || DiscoveryFailure::MalformedResponse(value.to_string());
    let url = Url::parse(value).map_err(|_| malformed())?;
    if url.scheme() != "http" || url.host_str().is_none() {
        return Err(malformed());
    }
    Ok(url)
}

/// Parse a search result.
///
/// `Ok(None)` means the datagram carries no `LOCATION` header and should be ignored.
pub fn parse_search_result(text: &str) -> Result<Option<Url>, DiscoveryFailure> {
    match find_location_header(text) {
        Some(value) => parse_location(value).map(Some),
        None => Ok(None),
    }
}

/// Extract the control url of the first WANIPConnection service in a device description.
pub fn parse_control_url<R>(resp: R) -> Result<String, FetchFailure>
where
    R: io::Read,
{
    let root = Element::parse(resp)?;
    let mut services = Vec::new();
    collect_services(&root, &mut services);

    for service in services {
        let matches = child_text(service, "serviceType")
            .map(|t| is_wan_ip_connection(&t))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        match child_text(service, "controlURL") {
            Some(control_url) => return Ok(control_url),
            None => debug!("skipping WANIPConnection service without a control url"),
        }
    }
    Err(FetchFailure::ServiceNotFound)
}

fn in_device_namespace(element: &Element) -> bool {
    element.namespace.as_deref().map_or(true, |ns| ns == DEVICE_NAMESPACE)
}

// Depth first, so services come out in document order.
fn collect_services<'a>(element: &'a Element, services: &mut Vec<&'a Element>) {
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        if child.name == "service" && in_device_namespace(child) {
            services.push(child);
        }
        collect_services(child, services);
    }
}

fn child_text(element: &Element, name: &str) -> Option<String> {
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .find(|e| e.name == name && in_device_namespace(e))
        .and_then(|e| e.get_text())
        .map(|t| t.into_owned())
}

fn is_wan_ip_connection(service_type: &str) -> bool {
    let service_type = service_type.trim();
    if service_type.ends_with(WAN_IP_CONNECTION) {
        return true;
    }
    // urn:schemas-upnp-org:service:WANIPConnection:1
    match service_type.rfind(':') {
        Some(colon) => {
            let version = &service_type[colon + 1..];
            !version.is_empty()
                && version.chars().all(|c| c.is_ascii_digit())
                && service_type[..colon].ends_with(WAN_IP_CONNECTION)
        }
        None => false,
    }
}

#[test]
fn test_find_location_header_strips_crlf() {
    let text = "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=120\r\nLOCATION: http://192.168.1.1:5000/desc.xml\r\nST: upnp:rootdevice\r\n\r\n";
    assert_eq!(find_location_header(text), Some("http://192.168.1.1:5000/desc.xml"));
}

#[test]
fn test_find_location_header_case_insensitivity() {
    assert!(find_location_header("location:http://0.0.0.0:0/control_url").is_some());
    assert!(find_location_header("LOCATION:http://0.0.0.0:0/control_url").is_some());
    assert!(find_location_header("Location: http://0.0.0.0:0/control_url").is_some());
}

#[test]
fn test_find_location_header_missing() {
    assert_eq!(find_location_header("content-type:http://0.0.0.0:0/control_url"), None);
    assert_eq!(find_location_header("NOTIFY * HTTP/1.1\r\nNT: upnp:rootdevice\r\n\r\n"), None);
}

#[test]
fn test_parse_search_result_ok() {
    let result = parse_search_result("HTTP/1.1 200 OK\r\nLOCATION: http://192.168.1.1:5000/desc.xml\r\n\r\n")
        .unwrap()
        .unwrap();
    assert_eq!(result.as_str(), "http://192.168.1.1:5000/desc.xml");
    assert_eq!(result.host_str(), Some("192.168.1.1"));
    assert_eq!(result.port(), Some(5000));
    assert_eq!(result.path(), "/desc.xml");
}

#[test]
fn test_parse_location_normalises() {
    let reply = "HTTP/1.1 200 OK\r\nLOCATION: HTTP://192.168.1.1:80\r\n\r\n";
    assert_eq!(find_location_header(reply), Some("HTTP://192.168.1.1:80"));
    let url = parse_location("HTTP://192.168.1.1:80").unwrap();
    assert_eq!(url.as_str(), "http://192.168.1.1/");
    assert_eq!(url.port_or_known_default(), Some(80));
}

#[test]
fn test_parse_search_result_without_location() {
    assert!(parse_search_result("HTTP/1.1 200 OK\r\nST: upnp:rootdevice\r\n\r\n")
        .unwrap()
        .is_none());
}

#[test]
fn test_parse_search_result_malformed() {
    match parse_search_result("HTTP/1.1 200 OK\r\nLOCATION: not a url\r\n\r\n") {
        Err(DiscoveryFailure::MalformedResponse(value)) => assert_eq!(value, "not a url"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(parse_search_result("LOCATION:\r\n").is_err());
    assert!(parse_search_result("LOCATION: ftp://192.168.1.1/desc.xml\r\n").is_err());
}

#[test]
fn test_is_wan_ip_connection() {
    assert!(is_wan_ip_connection("urn:schemas-upnp-org:service:WANIPConnection"));
    assert!(is_wan_ip_connection("urn:schemas-upnp-org:service:WANIPConnection:1"));
    assert!(is_wan_ip_connection("urn:schemas-upnp-org:service:WANIPConnection:2"));
    assert!(!is_wan_ip_connection("urn:schemas-upnp-org:service:WANPPPConnection:1"));
    assert!(!is_wan_ip_connection("urn:schemas-upnp-org:service:Layer3Forwarding:1"));
    assert!(!is_wan_ip_connection("urn:schemas-upnp-org:service:WANIPConnection:"));
}

#[test]
fn test_parse_single_service() {
    let text = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
   <device>
      <serviceList>
         <service>
            <serviceType>urn:schemas-upnp-org:service:WANIPConnection</serviceType>
            <controlURL>/ctl/IPConn</controlURL>
         </service>
      </serviceList>
   </device>
</root>"#;

    assert_eq!(parse_control_url(text.as_bytes()).unwrap(), "/ctl/IPConn");
}

#[test]
fn test_parse_first_match_wins() {
    let text = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
   <device>
      <serviceList>
         <service>
            <serviceType>urn:schemas-upnp-org:service:WANPPPConnection:1</serviceType>
            <controlURL>/ctl/PPPConn</controlURL>
         </service>
         <service>
            <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
            <controlURL>http://10.0.0.1:49000/upnp/control/WANIPConn1</controlURL>
         </service>
         <service>
            <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
            <controlURL>/second</controlURL>
         </service>
      </serviceList>
   </device>
</root>"#;

    assert_eq!(
        parse_control_url(text.as_bytes()).unwrap(),
        "http://10.0.0.1:49000/upnp/control/WANIPConn1"
    );
}

#[test]
fn test_parse_skips_service_without_control_url() {
    let text = r#"<root xmlns="urn:schemas-upnp-org:device-1-0"><device><serviceList>
<service><serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType></service>
<service><serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType><controlURL>/ctl/IPConn</controlURL></service>
</serviceList></device></root>"#;

    assert_eq!(parse_control_url(text.as_bytes()).unwrap(), "/ctl/IPConn");
}

#[test]
fn test_parse_ignores_foreign_namespace() {
    let text = r#"<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:x="urn:example:other"><device><serviceList>
<x:service><x:serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</x:serviceType><x:controlURL>/wrong</x:controlURL></x:service>
</serviceList></device></root>"#;

    match parse_control_url(text.as_bytes()) {
        Err(FetchFailure::ServiceNotFound) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_no_matching_service() {
    let text = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
   <device>
      <serviceList>
         <service>
            <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
            <controlURL>/ctl/L3F</controlURL>
         </service>
      </serviceList>
   </device>
</root>"#;

    match parse_control_url(text.as_bytes()) {
        Err(FetchFailure::ServiceNotFound) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_invalid_document() {
    match parse_control_url("<html><body>404".as_bytes()) {
        Err(FetchFailure::InvalidDocument(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_device1() {
    let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
   <specVersion>
      <major>1</major>
      <minor>0</minor>
   </specVersion>
   <device>
      <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
      <friendlyName></friendlyName>
      <serviceList>
         <service>
            <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
            <serviceId>urn:upnp-org:serviceId:Layer3Forwarding1</serviceId>
            <controlURL>/ctl/L3F</controlURL>
            <eventSubURL>/evt/L3F</eventSubURL>
            <SCPDURL>/L3F.xml</SCPDURL>
         </service>
      </serviceList>
      <deviceList>
         <device>
            <deviceType>urn:schemas-upnp-org:device:WANDevice:1</deviceType>
            <serviceList>
               <service>
                  <serviceType>urn:schemas-upnp-org:service:WANCommonInterfaceConfig:1</serviceType>
                  <serviceId>urn:upnp-org:serviceId:WANCommonIFC1</serviceId>
                  <controlURL>/ctl/CmnIfCfg</controlURL>
                  <eventSubURL>/evt/CmnIfCfg</eventSubURL>
                  <SCPDURL>/WANCfg.xml</SCPDURL>
               </service>
            </serviceList>
            <deviceList>
               <device>
                  <deviceType>urn:schemas-upnp-org:device:WANConnectionDevice:1</deviceType>
                  <serviceList>
                     <service>
                        <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
                        <serviceId>urn:upnp-org:serviceId:WANIPConn1</serviceId>
                        <controlURL>/ctl/IPConn</controlURL>
                        <eventSubURL>/evt/IPConn</eventSubURL>
                        <SCPDURL>/WANIPCn.xml</SCPDURL>
                     </service>
                  </serviceList>
               </device>
            </deviceList>
         </device>
      </deviceList>
      <presentationURL>http://192.168.0.1/</presentationURL>
   </device>
</root>"#;

    assert_eq!(parse_control_url(text.as_bytes()).unwrap(), "/ctl/IPConn");
}
