use crate::PortMappingRequest;

// Content of the request.
pub const SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r
HOST:239.255.255.250:1900\r
ST:upnp:rootdevice\r
MX:2\r
MAN:\"ssdp:discover\"\r
\r\n";

pub const ADD_PORT_MAPPING_HEADER: &str = r#""urn:schemas-upnp-org:service:WANIPConnection:1#AddPortMapping""#;

pub const SOAP_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

pub fn format_add_port_mapping_message(request: &PortMappingRequest) -> String {
    format!(
        "<?xml version=\"1.0\"?>
<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">
<s:Body>
    <u:AddPortMapping xmlns:u=\"urn:schemas-upnp-org:service:WANIPConnection:1\">
        <NewRemoteHost></NewRemoteHost>
        <NewExternalPort>{}</NewExternalPort>
        <NewProtocol>{}</NewProtocol>
        <NewInternalPort>{}</NewInternalPort>
        <NewInternalClient>{}</NewInternalClient>
        <NewEnabled>{}</NewEnabled>
        <NewPortMappingDescription>{}</NewPortMappingDescription>
        <NewLeaseDuration>{}</NewLeaseDuration>
    </u:AddPortMapping>
</s:Body>
</s:Envelope>",
        request.external_port,
        request.protocol,
        request.internal_port,
        request.internal_client,
        if request.enabled { 1 } else { 0 },
        escape(&request.description),
        request.lease_duration,
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[test]
fn test_search_request_fields() {
    assert!(SEARCH_REQUEST.starts_with("M-SEARCH * HTTP/1.1\r\n"));
    assert!(SEARCH_REQUEST.contains("ST:upnp:rootdevice\r\n"));
    assert!(SEARCH_REQUEST.contains("MX:2\r\n"));
    assert!(SEARCH_REQUEST.contains("MAN:\"ssdp:discover\"\r\n"));
    assert!(SEARCH_REQUEST.ends_with("\r\n\r\n"));
}

#[test]
fn test_format_add_port_mapping_message() {
    use std::net::Ipv4Addr;

    let request = PortMappingRequest::tcp(1234, Ipv4Addr::new(192, 168, 1, 20), "UPnP Port Mapping");
    let body = format_add_port_mapping_message(&request);

    let xml = xmltree::Element::parse(body.as_bytes()).unwrap();
    let action = xml
        .get_child("Body")
        .and_then(|b| b.get_child("AddPortMapping"))
        .unwrap();
    assert_eq!(
        action.namespace.as_deref(),
        Some("urn:schemas-upnp-org:service:WANIPConnection:1")
    );
    let field = |name: &str| action.get_child(name).and_then(|e| e.get_text()).map(|t| t.into_owned());
    assert_eq!(field("NewRemoteHost"), None);
    assert_eq!(field("NewExternalPort").as_deref(), Some("1234"));
    assert_eq!(field("NewInternalPort").as_deref(), Some("1234"));
    assert_eq!(field("NewProtocol").as_deref(), Some("TCP"));
    assert_eq!(field("NewInternalClient").as_deref(), Some("192.168.1.20"));
    assert_eq!(field("NewEnabled").as_deref(), Some("1"));
    assert_eq!(field("NewPortMappingDescription").as_deref(), Some("UPnP Port Mapping"));
    assert_eq!(field("NewLeaseDuration").as_deref(), Some("0"));
}

#[test]
fn test_description_is_escaped() {
    use std::net::Ipv4Addr;

    let request = PortMappingRequest::tcp(80, Ipv4Addr::LOCALHOST, "a<b & c>");
    let body = format_add_port_mapping_message(&request);
    assert!(body.contains("<NewPortMappingDescription>a&lt;b &amp; c&gt;</NewPortMappingDescription>"));
}

#[test]
fn test_udp_protocol_field() {
    use crate::PortMappingProtocol;
    use std::net::Ipv4Addr;

    let mut request = PortMappingRequest::tcp(5353, Ipv4Addr::new(192, 168, 1, 20), "dns");
    request.protocol = PortMappingProtocol::UDP;
    let body = format_add_port_mapping_message(&request);
    assert!(body.contains("<NewProtocol>UDP</NewProtocol>"));
}
