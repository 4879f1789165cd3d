use crate::{
    conn::{IntoConnectParams, PortConfiguration, SecsPort},
    manager::handler_table::{HandlerTable, MessageHandler},
    protocol::{DataMessage, SecsValue, StreamFunction},
    SecsError, SecsResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

lazy_static! {
    static ref PROCESS_DEFAULT: Arc<MessageManager> = MessageManager::new();
}

/// The process-wide message coordinator.
///
/// Owns the ports, allocates the globally unique system-bytes and DATAID
/// sequences, and routes received primary messages to registered
/// stream/function handlers.
///
/// A manager is an explicitly owned object; create one at startup and pass
/// it around. Where a process-wide instance is more convenient,
/// [`process_default`](Self::process_default) returns a shared one.
#[derive(Debug)]
pub struct MessageManager {
    // handed to every port so that engines can reach back without keeping
    // the manager alive
    self_weak: Weak<MessageManager>,
    registry: Mutex<PortRegistry>,
    handlers: Mutex<HandlerTable>,
    high_rate: Mutex<HashSet<(u8, u8)>>,
    system_bytes: AtomicU32,
    data_id: AtomicU32,
}

#[derive(Debug, Default)]
struct PortRegistry {
    ports: Vec<SecsPort>,
    default_index: Option<usize>,
}

// Inline reply, deferred reply, or nobody home.
#[derive(Debug)]
pub(crate) enum DispatchOutcome {
    Reply(SecsValue),
    NoReply,
    NoHandler,
    HandlerFailed,
}

impl MessageManager {
    /// Creates a new manager with no ports and empty handler tables.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Self {
            self_weak: self_weak.clone(),
            registry: Mutex::new(PortRegistry::default()),
            handlers: Mutex::new(HandlerTable::new()),
            high_rate: Mutex::new(HashSet::new()),
            system_bytes: AtomicU32::new(0),
            data_id: AtomicU32::new(0),
        })
    }

    /// The optional process-wide default instance.
    pub fn process_default() -> Arc<MessageManager> {
        Arc::clone(&PROCESS_DEFAULT)
    }

    /// Creates and registers a port.
    ///
    /// `port_num`s are handed out sequentially starting at 1. A duplicate
    /// name, or a second port with `make_default`, is refused. `config`
    /// defaults to [`PortConfiguration::default`].
    pub fn create_port<P: IntoConnectParams>(
        &self,
        name: &str,
        params: P,
        config: Option<PortConfiguration>,
        make_default: bool,
    ) -> SecsResult<SecsPort> {
        let params = params.into_connect_params()?;
        let mut registry = self.registry.lock()?;
        if registry.ports.iter().any(|port| port.name() == name) {
            return Err(SecsError::UsageDetailed(format!(
                "a port named \"{name}\" already exists"
            )));
        }
        if make_default && registry.default_index.is_some() {
            return Err(SecsError::Usage("a default port is already designated"));
        }

        let port_num = registry.ports.len() + 1;
        let port = SecsPort::new(
            name.to_owned(),
            port_num,
            params,
            config.unwrap_or_default(),
            self.self_weak.clone(),
        );
        if make_default {
            registry.default_index = Some(registry.ports.len());
        }
        registry.ports.push(port.clone());
        info!(
            "port \"{name}\" (#{port_num}) registered for {}",
            port.connect_params()
        );
        Ok(port)
    }

    /// Looks a port up by name.
    pub fn port(&self, name: &str) -> Option<SecsPort> {
        self.registry
            .lock()
            .ok()?
            .ports
            .iter()
            .find(|port| port.name() == name)
            .cloned()
    }

    /// All ports, in creation order.
    pub fn ports(&self) -> Vec<SecsPort> {
        self.registry
            .lock()
            .map(|registry| registry.ports.clone())
            .unwrap_or_default()
    }

    /// The designated default port, or the first-created one if none was
    /// designated.
    pub fn default_port(&self) -> Option<SecsPort> {
        let registry = self.registry.lock().ok()?;
        let index = registry.default_index.unwrap_or(0);
        registry.ports.get(index).cloned()
    }

    /// Brings every port online, concurrently. All ports get their chance;
    /// the first failure is returned.
    pub fn start_ports_if_needed(&self) -> SecsResult<()> {
        let ports = self.ports();
        let mut first_error = None;
        std::thread::scope(|scope| {
            let starters: Vec<_> = ports
                .iter()
                .map(|port| scope.spawn(move || (port.name().to_owned(), port.go_online())))
                .collect();
            for starter in starters {
                match starter.join() {
                    Ok((_, Ok(()))) => {}
                    Ok((name, Err(e))) => {
                        warn!("port \"{name}\" failed to start: {e}");
                        first_error.get_or_insert(e);
                    }
                    Err(_) => {
                        first_error.get_or_insert(SecsError::Usage("port start panicked"));
                    }
                }
            }
        });
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Takes every port offline, concurrently. All ports get their chance;
    /// the first failure is returned.
    pub fn stop_ports_if_needed(&self, graceful: bool) -> SecsResult<()> {
        let ports = self.ports();
        let mut first_error = None;
        std::thread::scope(|scope| {
            let stoppers: Vec<_> = ports
                .iter()
                .map(|port| scope.spawn(move || (port.name().to_owned(), port.go_offline(graceful))))
                .collect();
            for stopper in stoppers {
                match stopper.join() {
                    Ok((_, Ok(()))) => {}
                    Ok((name, Err(e))) => {
                        warn!("port \"{name}\" failed to stop: {e}");
                        first_error.get_or_insert(e);
                    }
                    Err(_) => {
                        first_error.get_or_insert(SecsError::Usage("port stop panicked"));
                    }
                }
            }
        });
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The next system-bytes value: strictly monotonic, never zero, unique
    /// across all ports of this manager.
    pub fn next_system_bytes(&self) -> u32 {
        next_nonzero(&self.system_bytes)
    }

    /// The next DATAID value, with the same uniqueness rule.
    pub fn next_data_id(&self) -> u32 {
        next_nonzero(&self.data_id)
    }

    /// Registers the handler for one stream/function. A later registration
    /// for the same key replaces the earlier one.
    pub fn register_handler<H>(&self, sf: StreamFunction, handler: H) -> SecsResult<()>
    where
        H: Fn(&DataMessage) -> Option<SecsValue> + Send + Sync + 'static,
    {
        let replaced = self.handlers.lock()?.insert(sf, Arc::new(handler));
        debug!(
            "handler registered for {sf}{}",
            if replaced { " (replacing an earlier one)" } else { "" }
        );
        Ok(())
    }

    /// Registers the whole-stream fallback handler, consulted when no exact
    /// stream/function handler matches. The fallback answers primaries with
    /// and without the W bit, so it occupies both key variants.
    pub fn register_stream_handler<H>(&self, stream: u8, handler: H) -> SecsResult<()>
    where
        H: Fn(&DataMessage) -> Option<SecsValue> + Send + Sync + 'static,
    {
        let handler: Arc<MessageHandler> = Arc::new(handler);
        let mut table = self.handlers.lock()?;
        table.insert(StreamFunction::new(stream, 0, false), Arc::clone(&handler));
        table.insert(StreamFunction::new(stream, 0, true), handler);
        debug!("stream fallback handler registered for S{stream}");
        Ok(())
    }

    /// Marks a stream/function as high-rate: the engines log its traffic at
    /// trace instead of debug.
    pub fn mark_high_rate(&self, sf: StreamFunction) -> SecsResult<()> {
        self.high_rate.lock()?.insert((sf.stream, sf.function));
        Ok(())
    }

    pub(crate) fn is_high_rate(&self, stream: u8, function: u8) -> bool {
        self.high_rate
            .lock()
            .map(|set| set.contains(&(stream, function)))
            .unwrap_or(false)
    }

    // Runs the handler for a received primary on the calling engine thread.
    // A panic is contained here; the connection stays up.
    pub(crate) fn dispatch(&self, message: &DataMessage) -> DispatchOutcome {
        let header = message.header();
        let handler: Option<Arc<MessageHandler>> = self
            .handlers
            .lock()
            .map(|table| table.lookup(header.stream, header.function, header.w_bit))
            .unwrap_or(None);
        let Some(handler) = handler else {
            debug!("no handler registered for {}", message.sf());
            return DispatchOutcome::NoHandler;
        };

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (handler.as_ref())(message)
        })) {
            Ok(Some(value)) => DispatchOutcome::Reply(value),
            Ok(None) => DispatchOutcome::NoReply,
            Err(_) => {
                warn!("handler for {} panicked; replying with abort", message.sf());
                DispatchOutcome::HandlerFailed
            }
        }
    }
}

fn next_nonzero(counter: &AtomicU32) -> u32 {
    loop {
        let value = counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if value != 0 {
            return value;
        }
    }
}

#[cfg(test)]
mod test {
    use super::MessageManager;
    use crate::{PortMode, SecsValue, StreamFunction};
    use std::collections::HashSet;

    #[test]
    fn counters_are_unique_and_skip_zero() {
        let manager = MessageManager::new();
        let mut all: Vec<u32> = std::thread::scope(|scope| {
            let allocators: Vec<_> = (0..8)
                .map(|_| {
                    let manager = &manager;
                    scope.spawn(move || {
                        (0..250)
                            .map(|_| manager.next_system_bytes())
                            .collect::<Vec<u32>>()
                    })
                })
                .collect();
            allocators
                .into_iter()
                .flat_map(|a| a.join().unwrap())
                .collect()
        });
        all.sort_unstable();
        let distinct: HashSet<u32> = all.iter().copied().collect();
        assert_eq!(distinct.len(), all.len());
        assert!(!distinct.contains(&0));
        assert_ne!(manager.next_data_id(), 0);
    }

    #[test]
    fn registry_refuses_duplicates() {
        let manager = MessageManager::new();
        let port = manager
            .create_port("eq1", "hsms://e1:5000?device_id=1", None, true)
            .unwrap();
        assert_eq!(port.port_num(), 1);
        assert_eq!(port.connect_params().mode(), PortMode::Active);

        assert!(manager
            .create_port("eq1", "hsms://e1:5001?device_id=1", None, false)
            .is_err());
        assert!(manager
            .create_port("eq2", "hsms://e2:5000?device_id=2", None, true)
            .is_err());

        let second = manager
            .create_port("eq2", "hsms://e2:5000?device_id=2", None, false)
            .unwrap();
        assert_eq!(second.port_num(), 2);
        assert_eq!(manager.default_port().unwrap().name(), "eq1");
    }

    #[test]
    fn first_port_is_the_implicit_default() {
        let manager = MessageManager::new();
        assert!(manager.default_port().is_none());
        manager
            .create_port("a", "hsms://a:5000", None, false)
            .unwrap();
        manager
            .create_port("b", "hsms://b:5000", None, false)
            .unwrap();
        assert_eq!(manager.default_port().unwrap().name(), "a");
    }

    #[test]
    fn dispatch_contains_handler_panics() {
        let manager = MessageManager::new();
        manager
            .register_handler(StreamFunction::new(2, 41, true), |_msg| {
                panic!("handler bug")
            })
            .unwrap();
        let message = crate::DataMessage::builder()
            .stream(2)
            .function(41)
            .wants_reply(true)
            .build()
            .unwrap();
        assert!(matches!(
            manager.dispatch(&message),
            super::DispatchOutcome::HandlerFailed
        ));
    }

    #[test]
    fn stream_fallback_serves_both_w_variants() {
        let manager = MessageManager::new();
        manager
            .register_stream_handler(6, |_msg| Some(SecsValue::U1(0)))
            .unwrap();
        for wants_reply in [true, false] {
            let message = crate::DataMessage::builder()
                .stream(6)
                .function(11)
                .wants_reply(wants_reply)
                .build()
                .unwrap();
            assert!(matches!(
                manager.dispatch(&message),
                super::DispatchOutcome::Reply(_)
            ));
        }

        // an exact registration matches its own W variant only
        manager
            .register_handler(StreamFunction::new(1, 13, true), |_msg| {
                Some(SecsValue::U1(1))
            })
            .unwrap();
        let without_w = crate::DataMessage::builder()
            .stream(1)
            .function(13)
            .wants_reply(false)
            .build()
            .unwrap();
        assert!(matches!(
            manager.dispatch(&without_w),
            super::DispatchOutcome::NoHandler
        ));
    }

    #[test]
    fn high_rate_set() {
        let manager = MessageManager::new();
        assert!(!manager.is_high_rate(6, 1));
        manager
            .mark_high_rate(StreamFunction::new(6, 1, false))
            .unwrap();
        assert!(manager.is_high_rate(6, 1));
    }
}
