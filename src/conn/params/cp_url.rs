use super::connect_params::{ConnectParams, PortMode};
use crate::{SecsError, SecsResult};

const SCHEME_ACTIVE: &str = "hsms";
const SCHEME_PASSIVE: &str = "hsms-passive";

pub(crate) fn from_url(url: &url::Url) -> SecsResult<ConnectParams> {
    let mode = match url.scheme() {
        SCHEME_ACTIVE => PortMode::Active,
        SCHEME_PASSIVE => PortMode::Passive,
        scheme => {
            return Err(SecsError::UsageDetailed(format!(
                "unsupported URL scheme \"{scheme}\" (expected \"{SCHEME_ACTIVE}\" or \
                 \"{SCHEME_PASSIVE}\")"
            )));
        }
    };
    let host = url
        .host_str()
        .ok_or(SecsError::Usage("URL is missing the host"))?
        .to_owned();
    let port = url
        .port()
        .ok_or(SecsError::Usage("URL is missing the port"))?;

    let mut device_id = 0_u16;
    let mut session_id = None;
    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            "device_id" => device_id = parse_id(&name, &value)?,
            "session_id" => session_id = Some(parse_id(&name, &value)?),
            _ => {
                return Err(SecsError::UsageDetailed(format!(
                    "unsupported URL parameter \"{name}\""
                )));
            }
        }
    }

    Ok(ConnectParams::new(
        mode,
        host,
        port,
        device_id,
        session_id.unwrap_or(device_id),
    ))
}

fn parse_id(name: &str, value: &str) -> SecsResult<u16> {
    value
        .parse()
        .map_err(|_| SecsError::UsageDetailed(format!("URL parameter \"{name}\" is not a u16")))
}

pub(crate) fn format_as_url(params: &ConnectParams) -> String {
    let scheme = match params.mode() {
        PortMode::Active => SCHEME_ACTIVE,
        PortMode::Passive => SCHEME_PASSIVE,
    };
    let mut url = format!(
        "{scheme}://{}:{}?device_id={}",
        params.host(),
        params.port(),
        params.device_id()
    );
    if params.session_id() != params.device_id() {
        url.push_str(&format!("&session_id={}", params.session_id()));
    }
    url
}
