/// Connection state of a port, as observable by the application.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PortConnectionState {
    /// Constructed, never taken online.
    #[default]
    Initial,
    /// Taken offline, or never brought up.
    OutOfService,
    /// No TCP connection; a passive port is accepting.
    NotConnected,
    /// TCP connection up, session not selected.
    NotSelected,
    /// Active port is opening the TCP connection.
    Connecting,
    /// Select request sent, waiting for the response.
    Selecting,
    /// Session established; data messages flow.
    Selected,
    /// Graceful deselect in progress.
    Deselecting,
    /// Connection lost or refused; reconnect may be pending.
    Failed,
}

impl PortConnectionState {
    /// True in the only state that admits data-message sends.
    pub fn is_selected(self) -> bool {
        self == Self::Selected
    }

    /// True while a TCP connection exists.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::NotSelected | Self::Selecting | Self::Selected | Self::Deselecting
        )
    }
}

impl std::fmt::Display for PortConnectionState {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                Self::Initial => "Initial",
                Self::OutOfService => "OutOfService",
                Self::NotConnected => "NotConnected",
                Self::NotSelected => "NotSelected",
                Self::Connecting => "Connecting",
                Self::Selecting => "Selecting",
                Self::Selected => "Selected",
                Self::Deselecting => "Deselecting",
                Self::Failed => "Failed",
            }
        )
    }
}
