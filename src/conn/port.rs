use crate::{
    conn::{
        pending::SendOutcome,
        session_core::{EngineCommand, OutboundSend, PortShared, SessionCore},
        ConnectParams, PortConfiguration, PortConnectionState, PortMode,
    },
    manager::MessageManager,
    protocol::{DataMessage, SecsValue},
    SecsError, SecsResult, SendRejectReason,
};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// A port: one HSMS-SS connection endpoint owned by a
/// [`MessageManager`](crate::MessageManager).
///
/// The handle is cheap to clone and safe to use from any thread; the actual
/// I/O runs on the port's own session engine thread.
///
/// ```rust,no_run
/// use hsmsconnect::{DataMessage, MessageManager, SecsResult, SecsValue, StreamFunction};
/// # fn main() -> SecsResult<()> {
/// let manager = MessageManager::new();
/// let port = manager.create_port("host-link", "hsms://equip1:5000?device_id=17", None, true)?;
/// port.go_online()?;
/// let reply = port.transact(DataMessage::data(
///     StreamFunction::new(1, 13, true),
///     &SecsValue::List(vec![]),
/// )?)?;
/// println!("S1F14: {}", reply.value()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SecsPort {
    core: Arc<PortCore>,
}

#[derive(Debug)]
pub(crate) struct PortCore {
    name: String,
    port_num: usize,
    params: ConnectParams,
    config: PortConfiguration,
    manager: Weak<MessageManager>,
    shared: Arc<PortShared>,
    engine: Mutex<EngineHandle>,
}

#[derive(Debug, Default)]
struct EngineHandle {
    commands: Option<Sender<EngineCommand>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SecsPort {
    pub(crate) fn new(
        name: String,
        port_num: usize,
        params: ConnectParams,
        config: PortConfiguration,
        manager: Weak<MessageManager>,
    ) -> Self {
        Self {
            core: Arc::new(PortCore {
                name,
                port_num,
                params,
                config,
                manager,
                shared: Arc::new(PortShared::new()),
                engine: Mutex::new(EngineHandle::default()),
            }),
        }
    }

    /// The port's name, unique within its manager.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The port's 1-based sequence number within its manager.
    pub fn port_num(&self) -> usize {
        self.core.port_num
    }

    /// The configured connection parameters.
    pub fn connect_params(&self) -> &ConnectParams {
        &self.core.params
    }

    /// The port's configuration.
    pub fn configuration(&self) -> &PortConfiguration {
        &self.core.config
    }

    /// The current connection state.
    pub fn connection_state(&self) -> PortConnectionState {
        self.core.shared.state()
    }

    /// The bound local address of a passive port, once it is listening.
    /// Useful when the configured port number is 0 (ephemeral).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.core.shared.local_addr()
    }

    /// Brings the port online.
    ///
    /// An active port connects and performs the select handshake; the call
    /// returns once the session is selected, bounded by
    /// `ConnectTimeLimit + T6`. A passive port returns as soon as it is
    /// accepting connections. Calling this on a port that is already online
    /// is a no-op.
    pub fn go_online(&self) -> SecsResult<()> {
        {
            let mut engine = self.core.engine.lock()?;
            let running = engine
                .thread
                .as_ref()
                .is_some_and(|thread| !thread.is_finished());
            if !running {
                let (tx, rx) = channel();
                let session_core = SessionCore::new(
                    self.core.name.clone(),
                    self.core.params.clone(),
                    self.core.config.clone(),
                    self.core.manager.clone(),
                    Arc::clone(&self.core.shared),
                    rx,
                );
                let thread = std::thread::Builder::new()
                    .name(format!("secs-port-{}", self.core.name))
                    .spawn(move || session_core.run())?;
                engine.commands = Some(tx);
                engine.thread = Some(thread);
            }
        }

        match self.core.params.mode() {
            PortMode::Active => {
                let limit = self.core.config.connect_time_limit()
                    + self.core.config.t6_control_transaction()
                    + Duration::from_secs(1);
                let state = self.core.shared.wait_for(limit, |state| {
                    matches!(
                        state,
                        PortConnectionState::Selected | PortConnectionState::Failed
                    )
                });
                match state {
                    PortConnectionState::Selected => Ok(()),
                    PortConnectionState::Failed => Err(self
                        .core
                        .shared
                        .take_error()
                        .unwrap_or(SecsError::ConnectTimeout)),
                    _ => Err(SecsError::ConnectTimeout),
                }
            }
            PortMode::Passive => {
                let state = self
                    .core
                    .shared
                    .wait_for(Duration::from_secs(2), |state| {
                        state != PortConnectionState::Initial
                            && state != PortConnectionState::OutOfService
                    });
                if state == PortConnectionState::Failed {
                    Err(self
                        .core
                        .shared
                        .take_error()
                        .unwrap_or(SecsError::ConnectTimeout))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Takes the port offline and stops its engine thread.
    ///
    /// With `graceful` the engine first attempts a deselect bounded by
    /// `DeselectTimeLimit`, then separates; without, it separates right
    /// away. All pending sends complete with `Canceled`.
    pub fn go_offline(&self, graceful: bool) -> SecsResult<()> {
        let (commands, thread) = {
            let mut engine = self.core.engine.lock()?;
            (engine.commands.take(), engine.thread.take())
        };
        if let Some(commands) = commands {
            commands.send(EngineCommand::GoOffline { graceful }).ok();
        }
        if let Some(thread) = thread {
            thread.join().map_err(|_| {
                SecsError::Usage("session engine panicked; port state is undefined")
            })?;
        }
        Ok(())
    }

    /// Posts a data message and returns a handle on its terminal result.
    ///
    /// Admission is checked synchronously: the body must fit
    /// `MaximumMesgBodySize`, the port must be selected, and the
    /// pending-send table must have room. A refused send fails with
    /// [`SecsError::SendRejected`] and leaves the session untouched.
    pub fn send(&self, message: DataMessage) -> SecsResult<PendingReply> {
        if message.body().len() > self.core.config.maximum_mesg_body_size() {
            return Err(SecsError::SendRejected(SendRejectReason::TooLarge));
        }
        if !self.connection_state().is_selected() {
            return Err(SecsError::SendRejected(SendRejectReason::NotConnected));
        }

        let posted_count = self.core.shared.posted_count();
        if posted_count.load(Ordering::Relaxed) >= self.core.config.maximum_send_queue_size() {
            return Err(SecsError::SendRejected(SendRejectReason::QueueFull));
        }

        let commands = {
            let engine = self.core.engine.lock()?;
            engine.commands.clone()
        };
        let Some(commands) = commands else {
            return Err(SecsError::SendRejected(SendRejectReason::NotConnected));
        };

        let (tx, rx) = oneshot::channel();
        posted_count.fetch_add(1, Ordering::Relaxed);
        let posted = commands
            .send(EngineCommand::Post(OutboundSend {
                message,
                completion: Some(tx),
                counted: true,
            }))
            .is_ok();
        if !posted {
            posted_count.fetch_sub(1, Ordering::Relaxed);
            return Err(SecsError::SendRejected(SendRejectReason::NotConnected));
        }
        Ok(PendingReply { rx })
    }

    /// Sends a reply-expecting message and blocks for the reply.
    ///
    /// The reply may be the generic `S<n>F0` abort or an S9 fault message;
    /// inspect [`DataMessage::is_abort`] and the stream if that matters.
    pub fn transact(&self, message: DataMessage) -> SecsResult<DataMessage> {
        if !message.header().expects_reply() {
            return Err(SecsError::Usage(
                "transact() requires a reply-expecting message; use send() instead",
            ));
        }
        match self.send(message)?.wait()? {
            Some(reply) => Ok(reply),
            None => Err(SecsError::Usage(
                "reply-expecting send completed without a reply",
            )),
        }
    }

    /// Sends the reply to a previously received primary; used by handlers
    /// that answer asynchronously instead of returning an inline reply.
    pub fn send_reply(&self, primary: &DataMessage, value: &SecsValue) -> SecsResult<()> {
        let reply = DataMessage::reply_to(primary, value)?;
        // fire and forget; the engine logs the write
        self.send(reply).map(drop)
    }
}

/// Handle on the terminal result of one posted send.
///
/// Exactly one outcome arrives: the reply (for reply-expecting sends),
/// `None` (for others), or the error that ended the transaction.
pub struct PendingReply {
    rx: oneshot::Receiver<SendOutcome>,
}

impl std::fmt::Debug for PendingReply {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("PendingReply").finish_non_exhaustive()
    }
}

impl PendingReply {
    /// Blocks until the send reaches its terminal result.
    pub fn wait(self) -> SecsResult<Option<DataMessage>> {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(SecsError::Canceled),
        }
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`. The send
    /// itself stays posted and still completes under its own T3 deadline.
    pub fn wait_timeout(self, timeout: Duration) -> SecsResult<Option<DataMessage>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(oneshot::RecvTimeoutError::Timeout) => Err(SecsError::ReplyTimeout),
            Err(oneshot::RecvTimeoutError::Disconnected) => Err(SecsError::Canceled),
        }
    }
}
