use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavioral knobs of one port: the HSMS timers, the reconnect policy, and
/// the flow-control limits.
///
/// All values have conventional defaults; embedding applications usually
/// tweak one or two of them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PortConfiguration {
    keep_alive_period: Option<Duration>,
    host_name_lookup_time_limit: Duration,
    connect_time_limit: Duration,
    disconnect_time_limit: Duration,
    deselect_time_limit: Duration,
    auto_reconnect_holdoff: Option<Duration>,
    t3_reply_timeout: Duration,
    t5_connect_separation: Duration,
    t6_control_transaction: Duration,
    t7_not_selected: Duration,
    t8_inter_char: Duration,
    idle_linktest_interval: Duration,
    maximum_mesg_body_size: usize,
    maximum_send_queue_size: usize,
    max_concurrent_posted_sends: usize,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            keep_alive_period: None,
            host_name_lookup_time_limit: Self::DEFAULT_HOST_NAME_LOOKUP_TIME_LIMIT,
            connect_time_limit: Self::DEFAULT_CONNECT_TIME_LIMIT,
            disconnect_time_limit: Self::DEFAULT_DISCONNECT_TIME_LIMIT,
            deselect_time_limit: Self::DEFAULT_DESELECT_TIME_LIMIT,
            auto_reconnect_holdoff: None,
            t3_reply_timeout: Self::DEFAULT_T3_REPLY_TIMEOUT,
            t5_connect_separation: Self::DEFAULT_T5_CONNECT_SEPARATION,
            t6_control_transaction: Self::DEFAULT_T6_CONTROL_TRANSACTION,
            t7_not_selected: Self::DEFAULT_T7_NOT_SELECTED,
            t8_inter_char: Self::DEFAULT_T8_INTER_CHAR,
            idle_linktest_interval: Self::DEFAULT_IDLE_LINKTEST_INTERVAL,
            maximum_mesg_body_size: Self::DEFAULT_MAXIMUM_MESG_BODY_SIZE,
            maximum_send_queue_size: Self::DEFAULT_MAXIMUM_SEND_QUEUE_SIZE,
            max_concurrent_posted_sends: Self::DEFAULT_MAX_CONCURRENT_POSTED_SENDS,
        }
    }
}

impl PortConfiguration {
    /// Default bound for resolving a host name.
    pub const DEFAULT_HOST_NAME_LOOKUP_TIME_LIMIT: Duration = Duration::from_secs(5);
    /// Default bound for establishing the TCP connection.
    pub const DEFAULT_CONNECT_TIME_LIMIT: Duration = Duration::from_secs(5);
    /// Default bound for tearing the TCP connection down.
    pub const DEFAULT_DISCONNECT_TIME_LIMIT: Duration = Duration::from_secs(2);
    /// Default bound for the graceful deselect preceding a disconnect.
    pub const DEFAULT_DESELECT_TIME_LIMIT: Duration = Duration::from_secs(2);
    /// Default T3, the reply timeout of a pending send.
    pub const DEFAULT_T3_REPLY_TIMEOUT: Duration = Duration::from_secs(45);
    /// Default T5, the separation between successive connect attempts.
    pub const DEFAULT_T5_CONNECT_SEPARATION: Duration = Duration::from_secs(10);
    /// Default T6, the control transaction timeout.
    pub const DEFAULT_T6_CONTROL_TRANSACTION: Duration = Duration::from_secs(5);
    /// Default T7, how long a passive connection may stay unselected.
    pub const DEFAULT_T7_NOT_SELECTED: Duration = Duration::from_secs(10);
    /// Default T8, the inter-character timeout within one frame.
    pub const DEFAULT_T8_INTER_CHAR: Duration = Duration::from_secs(5);
    /// Default idle interval after which a linktest is originated.
    pub const DEFAULT_IDLE_LINKTEST_INTERVAL: Duration = Duration::from_secs(10);
    /// Default cap on the body of a single data message.
    pub const DEFAULT_MAXIMUM_MESG_BODY_SIZE: usize = 1024 * 1024;
    /// Default cap on the pending-send table.
    pub const DEFAULT_MAXIMUM_SEND_QUEUE_SIZE: usize = 256;
    /// Default cap on writes handed to the socket per service pass.
    pub const DEFAULT_MAX_CONCURRENT_POSTED_SENDS: usize = 20;

    /// Returns the TCP keep-alive period, if one is configured.
    ///
    /// Plain std sockets expose no portable keep-alive switch; the idle-line
    /// linktest covers liveness probing. The option is recognized and kept
    /// for configuration compatibility.
    pub fn keep_alive_period(&self) -> Option<Duration> {
        self.keep_alive_period
    }
    /// Sets the TCP keep-alive period.
    pub fn set_keep_alive_period(&mut self, period: Option<Duration>) {
        self.keep_alive_period = period;
    }
    /// Builder-method for the TCP keep-alive period.
    #[must_use]
    pub fn with_keep_alive_period(mut self, period: Option<Duration>) -> Self {
        self.keep_alive_period = period;
        self
    }

    /// Returns the host name lookup bound.
    pub fn host_name_lookup_time_limit(&self) -> Duration {
        self.host_name_lookup_time_limit
    }
    /// Sets the host name lookup bound.
    pub fn set_host_name_lookup_time_limit(&mut self, limit: Duration) {
        self.host_name_lookup_time_limit = limit;
    }
    /// Builder-method for the host name lookup bound.
    #[must_use]
    pub fn with_host_name_lookup_time_limit(mut self, limit: Duration) -> Self {
        self.host_name_lookup_time_limit = limit;
        self
    }

    /// Returns the connect bound.
    pub fn connect_time_limit(&self) -> Duration {
        self.connect_time_limit
    }
    /// Sets the connect bound.
    pub fn set_connect_time_limit(&mut self, limit: Duration) {
        self.connect_time_limit = limit;
    }
    /// Builder-method for the connect bound.
    #[must_use]
    pub fn with_connect_time_limit(mut self, limit: Duration) -> Self {
        self.connect_time_limit = limit;
        self
    }

    /// Returns the disconnect bound.
    pub fn disconnect_time_limit(&self) -> Duration {
        self.disconnect_time_limit
    }
    /// Sets the disconnect bound.
    pub fn set_disconnect_time_limit(&mut self, limit: Duration) {
        self.disconnect_time_limit = limit;
    }
    /// Builder-method for the disconnect bound.
    #[must_use]
    pub fn with_disconnect_time_limit(mut self, limit: Duration) -> Self {
        self.disconnect_time_limit = limit;
        self
    }

    /// Returns the graceful-deselect bound.
    pub fn deselect_time_limit(&self) -> Duration {
        self.deselect_time_limit
    }
    /// Sets the graceful-deselect bound.
    pub fn set_deselect_time_limit(&mut self, limit: Duration) {
        self.deselect_time_limit = limit;
    }
    /// Builder-method for the graceful-deselect bound.
    #[must_use]
    pub fn with_deselect_time_limit(mut self, limit: Duration) -> Self {
        self.deselect_time_limit = limit;
        self
    }

    /// Returns the reconnect holdoff; `None` disables automatic reconnects.
    pub fn auto_reconnect_holdoff(&self) -> Option<Duration> {
        self.auto_reconnect_holdoff
    }
    /// Sets the reconnect holdoff.
    pub fn set_auto_reconnect_holdoff(&mut self, holdoff: Option<Duration>) {
        self.auto_reconnect_holdoff = holdoff;
    }
    /// Builder-method for the reconnect holdoff.
    #[must_use]
    pub fn with_auto_reconnect_holdoff(mut self, holdoff: Option<Duration>) -> Self {
        self.auto_reconnect_holdoff = holdoff;
        self
    }

    /// Returns T3, the reply timeout.
    pub fn t3_reply_timeout(&self) -> Duration {
        self.t3_reply_timeout
    }
    /// Sets T3, the reply timeout.
    pub fn set_t3_reply_timeout(&mut self, timeout: Duration) {
        self.t3_reply_timeout = timeout;
    }
    /// Builder-method for T3, the reply timeout.
    #[must_use]
    pub fn with_t3_reply_timeout(mut self, timeout: Duration) -> Self {
        self.t3_reply_timeout = timeout;
        self
    }

    /// Returns T5, the connect separation.
    pub fn t5_connect_separation(&self) -> Duration {
        self.t5_connect_separation
    }
    /// Sets T5, the connect separation.
    pub fn set_t5_connect_separation(&mut self, separation: Duration) {
        self.t5_connect_separation = separation;
    }
    /// Builder-method for T5, the connect separation.
    #[must_use]
    pub fn with_t5_connect_separation(mut self, separation: Duration) -> Self {
        self.t5_connect_separation = separation;
        self
    }

    /// Returns T6, the control transaction timeout.
    pub fn t6_control_transaction(&self) -> Duration {
        self.t6_control_transaction
    }
    /// Sets T6, the control transaction timeout.
    pub fn set_t6_control_transaction(&mut self, timeout: Duration) {
        self.t6_control_transaction = timeout;
    }
    /// Builder-method for T6, the control transaction timeout.
    #[must_use]
    pub fn with_t6_control_transaction(mut self, timeout: Duration) -> Self {
        self.t6_control_transaction = timeout;
        self
    }

    /// Returns T7, the not-selected timeout.
    pub fn t7_not_selected(&self) -> Duration {
        self.t7_not_selected
    }
    /// Sets T7, the not-selected timeout.
    pub fn set_t7_not_selected(&mut self, timeout: Duration) {
        self.t7_not_selected = timeout;
    }
    /// Builder-method for T7, the not-selected timeout.
    #[must_use]
    pub fn with_t7_not_selected(mut self, timeout: Duration) -> Self {
        self.t7_not_selected = timeout;
        self
    }

    /// Returns T8, the inter-character timeout.
    pub fn t8_inter_char(&self) -> Duration {
        self.t8_inter_char
    }
    /// Sets T8, the inter-character timeout.
    pub fn set_t8_inter_char(&mut self, timeout: Duration) {
        self.t8_inter_char = timeout;
    }
    /// Builder-method for T8, the inter-character timeout.
    #[must_use]
    pub fn with_t8_inter_char(mut self, timeout: Duration) -> Self {
        self.t8_inter_char = timeout;
        self
    }

    /// Returns the idle-line linktest interval.
    pub fn idle_linktest_interval(&self) -> Duration {
        self.idle_linktest_interval
    }
    /// Sets the idle-line linktest interval.
    pub fn set_idle_linktest_interval(&mut self, interval: Duration) {
        self.idle_linktest_interval = interval;
    }
    /// Builder-method for the idle-line linktest interval.
    #[must_use]
    pub fn with_idle_linktest_interval(mut self, interval: Duration) -> Self {
        self.idle_linktest_interval = interval;
        self
    }

    /// Returns the cap on the body of a single data message.
    pub fn maximum_mesg_body_size(&self) -> usize {
        self.maximum_mesg_body_size
    }
    /// Sets the cap on the body of a single data message.
    pub fn set_maximum_mesg_body_size(&mut self, size: usize) {
        self.maximum_mesg_body_size = size;
    }
    /// Builder-method for the cap on the body of a single data message.
    #[must_use]
    pub fn with_maximum_mesg_body_size(mut self, size: usize) -> Self {
        self.maximum_mesg_body_size = size;
        self
    }

    /// Returns the cap on the pending-send table.
    pub fn maximum_send_queue_size(&self) -> usize {
        self.maximum_send_queue_size
    }
    /// Sets the cap on the pending-send table.
    pub fn set_maximum_send_queue_size(&mut self, size: usize) {
        self.maximum_send_queue_size = size;
    }
    /// Builder-method for the cap on the pending-send table.
    #[must_use]
    pub fn with_maximum_send_queue_size(mut self, size: usize) -> Self {
        self.maximum_send_queue_size = size;
        self
    }

    /// Returns the per-service-pass write cap.
    pub fn max_concurrent_posted_sends(&self) -> usize {
        self.max_concurrent_posted_sends
    }
    /// Sets the per-service-pass write cap.
    pub fn set_max_concurrent_posted_sends(&mut self, count: usize) {
        self.max_concurrent_posted_sends = count;
    }
    /// Builder-method for the per-service-pass write cap.
    #[must_use]
    pub fn with_max_concurrent_posted_sends(mut self, count: usize) -> Self {
        self.max_concurrent_posted_sends = count;
        self
    }
}

#[cfg(test)]
mod test {
    use super::PortConfiguration;
    use std::time::Duration;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = PortConfiguration::default();
        assert_eq!(config.t3_reply_timeout(), Duration::from_secs(45));
        assert_eq!(config.t5_connect_separation(), Duration::from_secs(10));
        assert_eq!(config.t6_control_transaction(), Duration::from_secs(5));
        assert_eq!(config.t7_not_selected(), Duration::from_secs(10));
        assert_eq!(config.t8_inter_char(), Duration::from_secs(5));
        assert_eq!(config.idle_linktest_interval(), Duration::from_secs(10));
        assert_eq!(config.maximum_mesg_body_size(), 1024 * 1024);
        assert_eq!(config.maximum_send_queue_size(), 256);
        assert_eq!(config.max_concurrent_posted_sends(), 20);
        assert!(config.auto_reconnect_holdoff().is_none());
    }

    #[test]
    fn builder_methods_chain() {
        let config = PortConfiguration::default()
            .with_t3_reply_timeout(Duration::from_millis(300))
            .with_auto_reconnect_holdoff(Some(Duration::from_millis(50)));
        assert_eq!(config.t3_reply_timeout(), Duration::from_millis(300));
        assert_eq!(
            config.auto_reconnect_holdoff(),
            Some(Duration::from_millis(50))
        );
    }
}
