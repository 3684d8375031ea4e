use url::Url;

use crate::common::{parsing, HttpOptions};
use crate::errors::{FetchFailure, RequestError};
use crate::Gateway;

/// Retrieve the device description at `location` and return the control url
/// of its WANIPConnection service, exactly as advertised.
pub fn fetch_control_url(location: &Url, options: &HttpOptions) -> Result<String, FetchFailure> {
    debug!("requesting device description from: {}", location);

    let resp = options.apply(attohttpc::get(location.as_str())).send()?;
    if !resp.is_success() {
        return Err(RequestError::Status(resp.status().as_u16()).into());
    }
    let body = resp.bytes()?;

    parsing::parse_control_url(&body[..])
}

/// Build a `Gateway` from a discovered description location.
pub fn get_gateway(location: Url, options: &HttpOptions) -> Result<Gateway, FetchFailure> {
    let control_url = fetch_control_url(&location, options)?;
    Ok(Gateway { location, control_url })
}
