use crate::common::messages::SOAP_CONTENT_TYPE;
use crate::common::HttpOptions;
use crate::errors::RequestError;

#[derive(Clone, Debug)]
pub struct Action(String);

impl Action {
    pub fn new(action: &str) -> Action {
        Action(action.into())
    }
}

const HEADER_NAME: &str = "SOAPAction";

/// Post a SOAP envelope and return the response status.
///
/// Only transport failures are errors here, the caller decides what a status means.
pub fn send(url: &str, action: Action, body: &str, options: &HttpOptions) -> Result<u16, RequestError> {
    let request = attohttpc::post(url)
        .header(HEADER_NAME, action.0)
        .header("Content-Type", SOAP_CONTENT_TYPE)
        .header("Connection", "close");
    let resp = options.apply(request).text(body).send()?;
    Ok(resp.status().as_u16())
}
