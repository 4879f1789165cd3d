//! Connection parameters
use super::cp_url::format_as_url;
use crate::{ConnectParamsBuilder, SecsError, SecsResult};

/// Whether the port initiates the TCP connection or accepts it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PortMode {
    /// Connect out to the peer (typically the host side).
    Active,
    /// Bind and accept the peer's connection (typically the equipment side).
    Passive,
}

/// An immutable struct with all information necessary to open a new
/// connection to a peer entity.
///
/// # Instantiating a `ConnectParams` using the `ConnectParamsBuilder`
///
/// ```rust
/// use hsmsconnect::ConnectParams;
/// let params = ConnectParams::builder()
///     .hostname("equipment-07.fab2")
///     .port(5000)
///     .device_id(17)
///     .build()
///     .unwrap();
/// ```
///
/// # Instantiating a `ConnectParams` from a URL
///
/// Scheme `hsms` opens an active connection, `hsms-passive` listens:
///
/// ```rust
/// use hsmsconnect::IntoConnectParams;
/// let params = "hsms://equipment-07.fab2:5000?device_id=17"
///     .into_connect_params()
///     .unwrap();
/// ```
///
/// Recognized query parameters are `device_id` and `session_id`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectParams {
    mode: PortMode,
    host: String,
    port: u16,
    device_id: u16,
    session_id: u16,
}

impl ConnectParams {
    pub(crate) fn new(
        mode: PortMode,
        host: String,
        port: u16,
        device_id: u16,
        session_id: u16,
    ) -> Self {
        Self {
            mode,
            host,
            port,
            device_id,
            session_id,
        }
    }

    /// Returns a builder.
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::new()
    }

    /// The connection mode.
    pub fn mode(&self) -> PortMode {
        self.mode
    }

    /// The host name or address (to connect to, or to bind on).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The TCP port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The socket address in `host:port` form.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The device id of the equipment behind this port.
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// The session id used in select/deselect transactions.
    pub fn session_id(&self) -> u16 {
        self.session_id
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", format_as_url(self))
    }
}

/// A trait implemented by types that can be converted into
/// [`ConnectParams`].
pub trait IntoConnectParams {
    /// Converts the value into [`ConnectParams`].
    fn into_connect_params(self) -> SecsResult<ConnectParams>;
}

impl IntoConnectParams for ConnectParams {
    fn into_connect_params(self) -> SecsResult<ConnectParams> {
        Ok(self)
    }
}

impl IntoConnectParams for &str {
    fn into_connect_params(self) -> SecsResult<ConnectParams> {
        let url = url::Url::parse(self)
            .map_err(|e| SecsError::UsageDetailed(format!("malformed URL: {e}")))?;
        url.into_connect_params()
    }
}

impl IntoConnectParams for String {
    fn into_connect_params(self) -> SecsResult<ConnectParams> {
        self.as_str().into_connect_params()
    }
}

impl IntoConnectParams for url::Url {
    fn into_connect_params(self) -> SecsResult<ConnectParams> {
        super::cp_url::from_url(&self)
    }
}
