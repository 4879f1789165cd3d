use crate::{
    protocol::{DataMessage, StreamFunction},
    SecsError, SecsResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Terminal result of one posted send: the reply for W sends, `None` for
/// sends that expect none, or the error that ended the transaction.
pub(crate) type SendOutcome = SecsResult<Option<DataMessage>>;

// One posted request awaiting its reply.
pub(crate) struct PendingSend {
    pub sf: StreamFunction,
    pub posted_at: Instant,
    pub deadline: Instant,
    pub completion: oneshot::Sender<SendOutcome>,
}

// Outstanding requests keyed by system bytes. Owned by the engine thread;
// the shared counter lets the application side run its queue-full admission
// check without taking a lock on the table.
pub(crate) struct PendingSendTable {
    entries: HashMap<u32, PendingSend>,
    posted_count: Arc<AtomicUsize>,
}

impl PendingSendTable {
    pub fn new(posted_count: Arc<AtomicUsize>) -> Self {
        Self {
            entries: HashMap::new(),
            posted_count,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, system_bytes: u32, entry: PendingSend) {
        trace!(
            "pending send {} recorded under system bytes {system_bytes}",
            entry.sf
        );
        self.entries.insert(system_bytes, entry);
    }

    /// Completes the matching entry; false if no entry matches.
    pub fn complete(&mut self, system_bytes: u32, outcome: SendOutcome) -> bool {
        match self.entries.remove(&system_bytes) {
            Some(entry) => {
                trace!(
                    "pending send {} completed after {} ms",
                    entry.sf,
                    Instant::now().duration_since(entry.posted_at).as_millis()
                );
                self.posted_count.fetch_sub(1, Ordering::Relaxed);
                // the caller may have dropped its reply handle
                entry.completion.send(outcome).ok();
                true
            }
            None => false,
        }
    }

    /// Times out every entry whose T3 deadline has passed.
    pub fn expire_due(&mut self, now: Instant) {
        let due: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(system_bytes, _)| *system_bytes)
            .collect();
        for system_bytes in due {
            warn!("pending send {system_bytes} timed out waiting for its reply");
            self.complete(system_bytes, Err(SecsError::ReplyTimeout));
        }
    }

    /// Cancels every entry; used on connection loss and port close.
    pub fn cancel_all(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        debug!("canceling {} pending sends", self.entries.len());
        let all: Vec<u32> = self.entries.keys().copied().collect();
        for system_bytes in all {
            self.complete(system_bytes, Err(SecsError::Canceled));
        }
    }
}

#[cfg(test)]
mod test {
    use super::{PendingSend, PendingSendTable};
    use crate::protocol::StreamFunction;
    use crate::SecsError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn entry(deadline: Instant) -> (PendingSend, oneshot::Receiver<super::SendOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            PendingSend {
                sf: StreamFunction::new(1, 13, true),
                posted_at: Instant::now(),
                deadline,
                completion: tx,
            },
            rx,
        )
    }

    #[test]
    fn complete_removes_and_notifies() {
        let count = Arc::new(AtomicUsize::new(1));
        let mut table = PendingSendTable::new(Arc::clone(&count));
        let (pending, rx) = entry(Instant::now() + Duration::from_secs(1));
        table.insert(7, pending);

        assert!(table.complete(7, Ok(None)));
        assert!(!table.complete(7, Ok(None)));
        assert_eq!(count.load(Ordering::Relaxed), 0);
        assert!(matches!(rx.recv(), Ok(Ok(None))));
    }

    #[test]
    fn expiry_and_cancel_produce_their_errors() {
        let count = Arc::new(AtomicUsize::new(2));
        let mut table = PendingSendTable::new(Arc::clone(&count));
        let (expired, rx_expired) = entry(Instant::now() - Duration::from_millis(1));
        let (live, rx_live) = entry(Instant::now() + Duration::from_secs(60));
        table.insert(1, expired);
        table.insert(2, live);

        table.expire_due(Instant::now());
        assert!(matches!(rx_expired.recv(), Ok(Err(SecsError::ReplyTimeout))));
        assert_eq!(table.len(), 1);

        table.cancel_all();
        assert!(matches!(rx_live.recv(), Ok(Err(SecsError::Canceled))));
        assert_eq!(table.len(), 0);
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }
}
