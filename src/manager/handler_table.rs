use crate::protocol::{DataMessage, SecsValue, StreamFunction};
use std::sync::Arc;
use vec_map::VecMap;

/// A received-primary handler.
///
/// Returning `Some(value)` makes the port send the function + 1 reply with
/// that body right away; returning `None` leaves replying (if any was
/// expected) to the application, typically via
/// [`SecsPort::send_reply`](crate::SecsPort::send_reply).
pub type MessageHandler = dyn Fn(&DataMessage) -> Option<SecsValue> + Send + Sync;

// Handlers keyed by the low 15 bits of the stream, the W variant bit, and
// the 8 function bits.
pub(crate) struct HandlerTable {
    handlers: VecMap<Arc<MessageHandler>>,
}

fn key(stream: u8, function: u8, wants_reply: bool) -> usize {
    (usize::from(stream) << 9) | (usize::from(wants_reply) << 8) | usize::from(function)
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            handlers: VecMap::new(),
        }
    }

    /// Registers under the exact stream/function/W key; returns true if an
    /// earlier registration was replaced.
    pub fn insert(&mut self, sf: StreamFunction, handler: Arc<MessageHandler>) -> bool {
        self.handlers
            .insert(key(sf.stream, sf.function, sf.wants_reply), handler)
            .is_some()
    }

    /// Resolves the handler for a received primary: the exact
    /// stream/function registration first, then the whole-stream fallback
    /// registered under function 0, else none. The message's own W bit
    /// selects the key variant at both tiers; a handler registered for
    /// `S1F13W` does not answer an `S1F13` that expects no reply.
    pub fn lookup(
        &self,
        stream: u8,
        function: u8,
        wants_reply: bool,
    ) -> Option<Arc<MessageHandler>> {
        [key(stream, function, wants_reply), key(stream, 0, wants_reply)]
            .iter()
            .find_map(|k| self.handlers.get(*k).map(Arc::clone))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("HandlerTable")
            .field("registered", &self.handlers.len())
            .finish()
    }
}
