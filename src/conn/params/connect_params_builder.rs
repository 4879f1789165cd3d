use super::connect_params::{ConnectParams, PortMode};
use crate::{SecsError, SecsResult};

/// A builder for [`ConnectParams`].
///
/// ```rust
/// use hsmsconnect::{ConnectParamsBuilder, PortMode};
/// let params = ConnectParamsBuilder::new()
///     .mode(PortMode::Passive)
///     .hostname("0.0.0.0")
///     .port(5000)
///     .device_id(17)
///     .session_id(17)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConnectParamsBuilder {
    mode: Option<PortMode>,
    hostname: Option<String>,
    port: Option<u16>,
    device_id: u16,
    session_id: Option<u16>,
}

impl ConnectParamsBuilder {
    /// Creates a new builder; mode defaults to active, device id to 0, and
    /// session id to the device id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection mode.
    pub fn mode(&mut self, mode: PortMode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the host name or address.
    pub fn hostname<H: AsRef<str>>(&mut self, hostname: H) -> &mut Self {
        self.hostname = Some(hostname.as_ref().to_owned());
        self
    }

    /// Sets the TCP port number.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Sets the device id.
    pub fn device_id(&mut self, device_id: u16) -> &mut Self {
        self.device_id = device_id;
        self
    }

    /// Sets the session id; defaults to the device id.
    pub fn session_id(&mut self, session_id: u16) -> &mut Self {
        self.session_id = Some(session_id);
        self
    }

    /// Constructs the `ConnectParams`.
    pub fn build(&self) -> SecsResult<ConnectParams> {
        let host = self
            .hostname
            .clone()
            .ok_or(SecsError::Usage("hostname is missing"))?;
        let port = self.port.ok_or(SecsError::Usage("port is missing"))?;
        Ok(ConnectParams::new(
            self.mode.unwrap_or(PortMode::Active),
            host,
            port,
            self.device_id,
            self.session_id.unwrap_or(self.device_id),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::ConnectParamsBuilder;
    use crate::{IntoConnectParams, PortMode};

    #[test]
    fn test_connect_params_builder() {
        {
            let params = ConnectParamsBuilder::new()
                .hostname("abcd123")
                .port(5000)
                .device_id(3)
                .build()
                .unwrap();
            assert_eq!(params.mode(), PortMode::Active);
            assert_eq!("abcd123:5000", params.addr());
            assert_eq!(3, params.device_id());
            assert_eq!(3, params.session_id());
        }
        {
            let mut builder = ConnectParamsBuilder::new();
            builder
                .mode(PortMode::Passive)
                .hostname("0.0.0.0")
                .port(0)
                .device_id(1)
                .session_id(7);
            let params = builder.build().unwrap();
            assert_eq!(params.mode(), PortMode::Passive);
            assert_eq!(7, params.session_id());
        }
        {
            assert!(ConnectParamsBuilder::new().port(5000).build().is_err());
            assert!(ConnectParamsBuilder::new().hostname("x").build().is_err());
        }
    }

    #[test]
    fn test_from_url() {
        let params = "hsms://equip1:5000?device_id=17"
            .into_connect_params()
            .unwrap();
        assert_eq!(params.mode(), PortMode::Active);
        assert_eq!("equip1:5000", params.addr());
        assert_eq!(17, params.device_id());
        assert_eq!(17, params.session_id());

        let params = "hsms-passive://0.0.0.0:5000?device_id=1&session_id=2"
            .into_connect_params()
            .unwrap();
        assert_eq!(params.mode(), PortMode::Passive);
        assert_eq!(2, params.session_id());

        assert!("http://equip1:5000".into_connect_params().is_err());
        assert!("hsms://equip1".into_connect_params().is_err());
        assert!("hsms://equip1:5000?frobnicate=1"
            .into_connect_params()
            .is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let url = "hsms://equip1:5000?device_id=17";
        let params = url.into_connect_params().unwrap();
        assert_eq!(params.to_string(), url);
    }
}
