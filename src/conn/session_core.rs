use crate::{
    conn::{
        pending::{PendingSend, PendingSendTable, SendOutcome},
        tcp_client::{PortListener, TcpTransport},
        ConnectParams, PortConfiguration, PortConnectionState, PortMode,
    },
    manager::{DispatchOutcome, MessageManager},
    protocol::{
        frame::{assemble_frame, FrameBuffer},
        DataMessage, DeselectStatus, MessageHeader, RejectReason, SelectStatus, SessionType,
        PTYPE_SECS_II,
    },
    SecsError, SecsResult, SendRejectReason,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::{Duration, Instant};

// Pace of the engine's service loop; the socket read timeout doubles as the
// wait between passes.
pub(crate) const SERVICE_TICK: Duration = Duration::from_millis(10);

// State and counters shared between the application-facing port handle and
// the engine thread.
#[derive(Debug)]
pub(crate) struct PortShared {
    state: Mutex<PortConnectionState>,
    state_cv: Condvar,
    posted_count: Arc<AtomicUsize>,
    local_addr: Mutex<Option<SocketAddr>>,
    last_error: Mutex<Option<SecsError>>,
}

impl PortShared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PortConnectionState::Initial),
            state_cv: Condvar::new(),
            posted_count: Arc::new(AtomicUsize::new(0)),
            local_addr: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PortConnectionState {
        self.state.lock().map(|guard| *guard).unwrap_or_default()
    }

    pub fn set_state(&self, port_name: &str, new_state: PortConnectionState) {
        if let Ok(mut guard) = self.state.lock() {
            if *guard != new_state {
                debug!("port \"{port_name}\": {} -> {new_state}", *guard);
                *guard = new_state;
                self.state_cv.notify_all();
            }
        }
    }

    // Blocks until the predicate holds or the timeout elapses; returns the
    // state seen last.
    pub fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl Fn(PortConnectionState) -> bool,
    ) -> PortConnectionState {
        let deadline = Instant::now() + timeout;
        let Ok(mut guard) = self.state.lock() else {
            return PortConnectionState::Failed;
        };
        loop {
            if predicate(*guard) {
                return *guard;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return *guard;
            };
            guard = match self.state_cv.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(_) => return PortConnectionState::Failed,
            };
        }
    }

    pub fn posted_count(&self) -> &Arc<AtomicUsize> {
        &self.posted_count
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.lock().ok().and_then(|guard| *guard)
    }

    fn store_local_addr(&self, addr: SocketAddr) {
        if let Ok(mut guard) = self.local_addr.lock() {
            *guard = Some(addr);
        }
    }

    fn store_error(&self, error: SecsError) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(error);
        }
    }

    pub fn take_error(&self) -> Option<SecsError> {
        self.last_error.lock().ok().and_then(|mut guard| guard.take())
    }
}

// What the port handle posts to the engine thread.
pub(crate) enum EngineCommand {
    Post(OutboundSend),
    GoOffline { graceful: bool },
}

pub(crate) struct OutboundSend {
    pub message: DataMessage,
    pub completion: Option<oneshot::Sender<SendOutcome>>,
    // true for application sends, which hold a slot in the posted-count
    pub counted: bool,
}

// An outstanding select/deselect/linktest originated by this engine.
#[derive(Debug)]
struct ControlTransaction {
    s_type: SessionType,
    system_bytes: u32,
    started_at: Instant,
}

/// The per-port session engine.
///
/// Runs on its own thread and drives three non-blocking activities per
/// service pass: receive-buffer drain, transmit-queue drain, and the
/// timer/state tick. Everything the application can touch concurrently
/// lives in [`PortShared`].
pub(crate) struct SessionCore {
    name: String,
    params: ConnectParams,
    config: PortConfiguration,
    manager: Weak<MessageManager>,
    shared: Arc<PortShared>,
    commands: Receiver<EngineCommand>,

    transport: Option<TcpTransport>,
    frames: FrameBuffer,
    pending: PendingSendTable,
    send_queue: VecDeque<OutboundSend>,
    outstanding_control: Option<ControlTransaction>,
    last_linktest_at: Instant,
    not_selected_since: Option<Instant>,
    session_ended: bool,
    shutdown_started: bool,
    offline: Option<bool>,
}

impl SessionCore {
    pub fn new(
        name: String,
        params: ConnectParams,
        config: PortConfiguration,
        manager: Weak<MessageManager>,
        shared: Arc<PortShared>,
        commands: Receiver<EngineCommand>,
    ) -> Self {
        let pending = PendingSendTable::new(Arc::clone(shared.posted_count()));
        Self {
            name,
            params,
            config,
            manager,
            shared,
            commands,
            transport: None,
            frames: FrameBuffer::new(),
            pending,
            send_queue: VecDeque::new(),
            outstanding_control: None,
            last_linktest_at: Instant::now(),
            not_selected_since: None,
            session_ended: false,
            shutdown_started: false,
            offline: None,
        }
    }

    /// Thread body; returns when the port goes offline or its handle is
    /// dropped.
    pub fn run(mut self) {
        debug!("port \"{}\": session engine started", self.name);
        self.shared
            .set_state(&self.name, PortConnectionState::OutOfService);
        match self.params.mode() {
            PortMode::Active => self.run_active(),
            PortMode::Passive => self.run_passive(),
        }
        self.teardown_connection();
        self.pending.cancel_all();
        self.reject_all_queued();
        self.drain_commands_while_down();
        self.shared
            .set_state(&self.name, PortConnectionState::OutOfService);
        debug!("port \"{}\": session engine stopped", self.name);
    }

    fn run_active(&mut self) {
        loop {
            if self.offline.is_some() {
                return;
            }
            let ended = self.active_cycle();
            if self.offline.is_some() {
                self.send_separate_best_effort();
            }
            self.teardown_connection();
            self.pending.cancel_all();
            if let Err(e) = ended {
                warn!("port \"{}\": session ended: {e}", self.name);
                self.shared.store_error(e);
            }
            if self.offline.is_some() {
                return;
            }
            self.shared.set_state(&self.name, PortConnectionState::Failed);
            match self.config.auto_reconnect_holdoff() {
                Some(holdoff) => {
                    // T5 keeps successive connect attempts apart
                    self.sleep_interruptibly(holdoff.max(self.config.t5_connect_separation()));
                }
                None => self.idle_until_offline(),
            }
        }
    }

    fn active_cycle(&mut self) -> SecsResult<()> {
        self.shared
            .set_state(&self.name, PortConnectionState::Connecting);
        let transport = TcpTransport::connect(&self.params, &self.config, SERVICE_TICK)?;
        self.transport = Some(transport);

        let system_bytes = self.next_system_bytes()?;
        self.write_control(MessageHeader::select_req(
            self.params.session_id(),
            system_bytes,
        ))?;
        self.outstanding_control = Some(ControlTransaction {
            s_type: SessionType::SelectReq,
            system_bytes,
            started_at: Instant::now(),
        });
        self.shared
            .set_state(&self.name, PortConnectionState::Selecting);
        self.service_loop()
    }

    fn run_passive(&mut self) {
        let listener = match PortListener::bind(&self.params) {
            Ok(listener) => listener,
            Err(e) => {
                warn!("port \"{}\": cannot listen: {e}", self.name);
                self.shared.store_error(e);
                self.shared.set_state(&self.name, PortConnectionState::Failed);
                self.idle_until_offline();
                return;
            }
        };
        self.shared.store_local_addr(listener.local_addr());

        loop {
            if self.offline.is_some() {
                return;
            }
            self.shared
                .set_state(&self.name, PortConnectionState::NotConnected);
            let Some(transport) = self.accept_one(&listener) else {
                return; // offline requested while accepting
            };
            self.transport = Some(transport);
            self.not_selected_since = Some(Instant::now());
            self.shared
                .set_state(&self.name, PortConnectionState::NotSelected);

            let ended = self.service_loop();
            if self.offline.is_some() {
                self.send_separate_best_effort();
            }
            self.teardown_connection();
            self.pending.cancel_all();
            let failed = if let Err(e) = ended {
                warn!("port \"{}\": session ended: {e}", self.name);
                self.shared.store_error(e);
                true
            } else {
                false
            };
            if self.offline.is_some() {
                return;
            }
            if failed {
                self.shared.set_state(&self.name, PortConnectionState::Failed);
                match self.config.auto_reconnect_holdoff() {
                    Some(holdoff) => self.sleep_interruptibly(holdoff),
                    None => {
                        self.idle_until_offline();
                        return;
                    }
                }
            }
            // clean session end: go straight back to accepting
        }
    }

    // Polls for an incoming connection while keeping commands serviced.
    fn accept_one(&mut self, listener: &PortListener) -> Option<TcpTransport> {
        loop {
            if self.offline.is_some() {
                return None;
            }
            self.drain_commands_while_down();
            match listener.try_accept(SERVICE_TICK) {
                Ok(Some(transport)) => return Some(transport),
                Ok(None) => std::thread::sleep(SERVICE_TICK),
                Err(e) => {
                    warn!("port \"{}\": accept failed: {e}", self.name);
                    std::thread::sleep(SERVICE_TICK);
                }
            }
        }
    }

    // One session from (almost) established to its end. Ok(()) is a clean
    // end (offline request, peer deselect/separate); Err is the fault that
    // tears the connection down.
    fn service_loop(&mut self) -> SecsResult<()> {
        let mut scratch = vec![0_u8; 16 * 1024];
        loop {
            if self.offline.is_some() && !self.shutdown_started {
                self.shutdown_started = true;
                let graceful = self.offline == Some(true);
                if graceful && self.state().is_selected() {
                    // deselect is a normal control transaction; its answer
                    // (or T6 expiry) ends the session
                    let system_bytes = self.next_system_bytes()?;
                    self.shared
                        .set_state(&self.name, PortConnectionState::Deselecting);
                    self.write_control(MessageHeader::deselect_req(
                        self.params.session_id(),
                        system_bytes,
                    ))?;
                    self.outstanding_control = Some(ControlTransaction {
                        s_type: SessionType::DeselectReq,
                        system_bytes,
                        started_at: Instant::now(),
                    });
                } else {
                    return Ok(());
                }
            }

            let read = self.transport()?.read_available(&mut scratch)?;
            if let Some(n) = read {
                self.frames.extend(&scratch[..n]);
            }

            while let Some((header, body)) = self
                .frames
                .try_take_frame(self.config.maximum_mesg_body_size())?
            {
                self.handle_frame(header, body)?;
            }
            if self.session_ended {
                self.session_ended = false;
                return Ok(());
            }

            self.drain_commands();
            self.tick_timers()?;
            self.drain_send_queue()?;
        }
    }

    fn handle_frame(&mut self, header: MessageHeader, body: Vec<u8>) -> SecsResult<()> {
        if header.p_type != PTYPE_SECS_II {
            return Err(SecsError::protocol(format!(
                "presentation type {} is not supported",
                header.p_type
            )));
        }
        match header.s_type {
            SessionType::DataMessage => self.handle_data_message(header, body),
            SessionType::SelectReq => self.handle_select_req(&header),
            SessionType::SelectRsp => self.handle_select_rsp(&header),
            SessionType::DeselectReq => self.handle_deselect_req(&header),
            SessionType::DeselectRsp => self.handle_deselect_rsp(&header),
            SessionType::LinktestReq => {
                self.last_linktest_at = Instant::now();
                self.write_control(MessageHeader::linktest_rsp(&header))
            }
            SessionType::LinktestRsp => self.handle_linktest_rsp(&header),
            SessionType::SeparateReq => self.handle_separate_req(&header),
            SessionType::RejectReq => {
                warn!(
                    "port \"{}\": peer rejected a frame (reason {})",
                    self.name, header.function
                );
                Err(SecsError::Rejected(header.function))
            }
        }
    }

    fn handle_select_req(&mut self, header: &MessageHeader) -> SecsResult<()> {
        let state = self.state();
        if state == PortConnectionState::Selected {
            return Err(SecsError::protocol(
                "select request while a session is already selected",
            ));
        }
        if self.params.mode() == PortMode::Passive
            && state == PortConnectionState::NotSelected
            && header.session_id == self.params.session_id()
        {
            self.write_control(MessageHeader::select_rsp(
                header,
                SelectStatus::Established as u8,
            ))?;
            self.not_selected_since = None;
            self.last_linktest_at = Instant::now();
            self.shared
                .set_state(&self.name, PortConnectionState::Selected);
            Ok(())
        } else {
            debug!(
                "port \"{}\": refusing select (state {state}, session {})",
                self.name, header.session_id
            );
            self.write_control(MessageHeader::select_rsp(
                header,
                SelectStatus::NotReady as u8,
            ))
        }
    }

    fn handle_select_rsp(&mut self, header: &MessageHeader) -> SecsResult<()> {
        match self.outstanding_control.take() {
            Some(control)
                if control.s_type == SessionType::SelectReq
                    && control.system_bytes == header.system_bytes
                    && header.session_id == self.params.session_id() =>
            {
                if header.function == SelectStatus::Established as u8 {
                    self.last_linktest_at = Instant::now();
                    self.shared
                        .set_state(&self.name, PortConnectionState::Selected);
                    Ok(())
                } else {
                    Err(SecsError::SelectFailed(header.function))
                }
            }
            other => {
                debug!(
                    "port \"{}\": select response with unexpected system bytes {} ignored",
                    self.name, header.system_bytes
                );
                self.outstanding_control = other;
                Ok(())
            }
        }
    }

    fn handle_deselect_req(&mut self, header: &MessageHeader) -> SecsResult<()> {
        let status = if self.state() == PortConnectionState::Selected {
            DeselectStatus::Ended
        } else {
            DeselectStatus::NotEstablished
        };
        self.write_control(MessageHeader::deselect_rsp(header, status as u8))?;
        if self.state() == PortConnectionState::Selected {
            self.pending.cancel_all();
            self.shared
                .set_state(&self.name, PortConnectionState::NotSelected);
            match self.params.mode() {
                // same connection may be selected again
                PortMode::Passive => self.not_selected_since = Some(Instant::now()),
                PortMode::Active => self.session_ended = true,
            }
        }
        Ok(())
    }

    fn handle_deselect_rsp(&mut self, header: &MessageHeader) -> SecsResult<()> {
        match self.outstanding_control.take() {
            Some(control)
                if control.s_type == SessionType::DeselectReq
                    && control.system_bytes == header.system_bytes =>
            {
                debug!("port \"{}\": deselect acknowledged", self.name);
                if self.state() == PortConnectionState::Deselecting {
                    self.shared
                        .set_state(&self.name, PortConnectionState::NotSelected);
                }
                self.session_ended = true;
                Ok(())
            }
            other => {
                debug!(
                    "port \"{}\": unmatched deselect response ignored",
                    self.name
                );
                self.outstanding_control = other;
                Ok(())
            }
        }
    }

    fn handle_linktest_rsp(&mut self, header: &MessageHeader) -> SecsResult<()> {
        match self.outstanding_control.take() {
            Some(control)
                if control.s_type == SessionType::LinktestReq
                    && control.system_bytes == header.system_bytes =>
            {
                trace!("port \"{}\": linktest round trip complete", self.name);
                self.last_linktest_at = Instant::now();
                Ok(())
            }
            other => {
                debug!(
                    "port \"{}\": linktest response without outstanding request ignored",
                    self.name
                );
                self.outstanding_control = other;
                Ok(())
            }
        }
    }

    fn handle_separate_req(&mut self, header: &MessageHeader) -> SecsResult<()> {
        debug!(
            "port \"{}\": peer separated (system bytes {})",
            self.name, header.system_bytes
        );
        if self.state() == PortConnectionState::Selected {
            self.pending.cancel_all();
            self.shared
                .set_state(&self.name, PortConnectionState::NotSelected);
        }
        self.session_ended = true;
        Ok(())
    }

    fn handle_data_message(&mut self, header: MessageHeader, body: Vec<u8>) -> SecsResult<()> {
        if !self.state().is_selected() {
            debug!(
                "port \"{}\": data message while not selected; rejecting",
                self.name
            );
            return self.write_control(MessageHeader::reject_req(
                &header,
                RejectReason::EntityNotSelected,
            ));
        }

        let message = DataMessage::from_wire(header, body);
        let is_fault_reply = header.function == 0 || header.stream == 9;

        if is_fault_reply || !header.is_primary() {
            // a reply (or a fault standing in for one): route to its sender
            if !self.pending.complete(header.system_bytes, Ok(Some(message))) {
                debug!(
                    "port \"{}\": unmatched reply {} dropped",
                    self.name, header
                );
            }
            return Ok(());
        }

        let Some(manager) = self.manager.upgrade() else {
            debug!(
                "port \"{}\": no manager attached; dropping {}",
                self.name, header
            );
            return Ok(());
        };
        if manager.is_high_rate(header.stream, header.function) {
            trace!("port \"{}\": received primary {}", self.name, header);
        } else {
            debug!("port \"{}\": received primary {}", self.name, header);
        }

        match manager.dispatch(&message) {
            DispatchOutcome::Reply(value) => match DataMessage::reply_to(&message, &value) {
                Ok(reply) => self.queue_internal(reply),
                Err(e) => {
                    warn!(
                        "port \"{}\": handler reply for {} failed to encode: {e}",
                        self.name, header
                    );
                    if header.expects_reply() {
                        self.queue_internal(DataMessage::abort_reply(&message));
                    }
                }
            },
            DispatchOutcome::NoReply => {
                // the handler arranges a deferred reply itself
            }
            DispatchOutcome::NoHandler | DispatchOutcome::HandlerFailed => {
                if header.expects_reply() {
                    self.queue_internal(DataMessage::abort_reply(&message));
                }
            }
        }
        Ok(())
    }

    fn queue_internal(&mut self, message: DataMessage) {
        self.send_queue.push_back(OutboundSend {
            message,
            completion: None,
            counted: false,
        });
    }

    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(EngineCommand::Post(send)) => {
                    if self.state().is_selected() {
                        self.send_queue.push_back(send);
                    } else {
                        self.complete_outbound(
                            send,
                            Err(SecsError::SendRejected(SendRejectReason::NotConnected)),
                        );
                    }
                }
                Ok(EngineCommand::GoOffline { graceful }) => {
                    self.offline = Some(graceful);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    // port handle is gone; treat like a forced offline
                    self.offline = Some(false);
                    return;
                }
            }
        }
    }

    // Command drain for phases without a connection; posts cannot succeed.
    fn drain_commands_while_down(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(EngineCommand::Post(send)) => self.complete_outbound(
                    send,
                    Err(SecsError::SendRejected(SendRejectReason::NotConnected)),
                ),
                Ok(EngineCommand::GoOffline { graceful }) => self.offline = Some(graceful),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.offline = Some(false);
                    return;
                }
            }
        }
    }

    fn tick_timers(&mut self) -> SecsResult<()> {
        let now = Instant::now();

        self.pending.expire_due(now);

        if let Some(control) = &self.outstanding_control {
            // the graceful deselect is additionally bounded by its own limit
            let limit = match control.s_type {
                SessionType::DeselectReq => self
                    .config
                    .t6_control_transaction()
                    .min(self.config.deselect_time_limit()),
                _ => self.config.t6_control_transaction(),
            };
            if now.duration_since(control.started_at) > limit {
                return Err(match control.s_type {
                    SessionType::SelectReq => SecsError::SelectTimeout,
                    SessionType::DeselectReq => SecsError::DeselectTimeout,
                    _ => SecsError::LinktestTimeout,
                });
            }
        }

        if let Some(since) = self.not_selected_since {
            if now.duration_since(since) > self.config.t7_not_selected() {
                return Err(SecsError::NotSelectedTimeout);
            }
        }

        if let Some(since) = self.frames.partial_since() {
            if now.duration_since(since) > self.config.t8_inter_char() {
                return Err(SecsError::InterCharTimeout);
            }
        }

        if self.state().is_selected()
            && self.outstanding_control.is_none()
            && now.duration_since(self.last_linktest_at) > self.config.idle_linktest_interval()
        {
            let system_bytes = self.next_system_bytes()?;
            trace!("port \"{}\": idle line, originating linktest", self.name);
            self.write_control(MessageHeader::linktest_req(system_bytes))?;
            self.outstanding_control = Some(ControlTransaction {
                s_type: SessionType::LinktestReq,
                system_bytes,
                started_at: now,
            });
            self.last_linktest_at = now;
        }

        Ok(())
    }

    fn drain_send_queue(&mut self) -> SecsResult<()> {
        let mut written = 0_usize;
        while written < self.config.max_concurrent_posted_sends() {
            let Some(send) = self.send_queue.pop_front() else {
                return Ok(());
            };
            if !self.state().is_selected() {
                self.complete_outbound(
                    send,
                    Err(SecsError::SendRejected(SendRejectReason::NotConnected)),
                );
                continue;
            }

            if send.message.header().expects_reply()
                && self.pending.len() >= self.config.maximum_send_queue_size()
            {
                self.complete_outbound(
                    send,
                    Err(SecsError::SendRejected(SendRejectReason::QueueFull)),
                );
                continue;
            }

            // replies already carry their transaction; fresh sends get one
            let message = if send.message.header().system_bytes == 0 {
                send.message.with_system_bytes(self.next_system_bytes()?)
            } else {
                send.message.clone()
            };

            let manager_high_rate = self
                .manager
                .upgrade()
                .is_some_and(|m| m.is_high_rate(message.header().stream, message.header().function));
            if manager_high_rate {
                trace!("port \"{}\": sending {}", self.name, message);
            } else {
                debug!("port \"{}\": sending {}", self.name, message);
            }

            let frame = assemble_frame(message.header(), message.body());
            if let Err(e) = self.transport()?.write_frame(&frame) {
                self.complete_outbound(send, Err(SecsError::Canceled));
                return Err(e);
            }

            if message.header().expects_reply() {
                match send.completion {
                    Some(completion) => {
                        let now = Instant::now();
                        self.pending.insert(
                            message.header().system_bytes,
                            PendingSend {
                                sf: message.sf(),
                                posted_at: now,
                                deadline: now + self.config.t3_reply_timeout(),
                                completion,
                            },
                        );
                    }
                    None => {
                        warn!(
                            "port \"{}\": reply-expecting send without a completion",
                            self.name
                        );
                        if send.counted {
                            self.shared.posted_count.fetch_sub(1, Ordering::Relaxed);
                        }
                    }
                }
            } else {
                self.complete_outbound(send, Ok(None));
            }
            written += 1;
        }
        Ok(())
    }

    // Separate ends the session without a response; sent on every offline
    // path while the connection is still up.
    fn send_separate_best_effort(&mut self) {
        if self.transport.is_some() && self.state().is_connected() {
            if let Ok(system_bytes) = self.next_system_bytes() {
                let _ = self.write_control(MessageHeader::separate_req(
                    self.params.session_id(),
                    system_bytes,
                ));
            }
        }
    }

    fn sleep_interruptibly(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            if self.offline.is_some() {
                return;
            }
            match self.commands.recv_timeout(remaining.min(SERVICE_TICK)) {
                Ok(EngineCommand::Post(send)) => self.complete_outbound(
                    send,
                    Err(SecsError::SendRejected(SendRejectReason::NotConnected)),
                ),
                Ok(EngineCommand::GoOffline { graceful }) => {
                    self.offline = Some(graceful);
                    return;
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    self.offline = Some(false);
                    return;
                }
            }
        }
    }

    // Parks a terminally failed engine until it is taken offline.
    fn idle_until_offline(&mut self) {
        loop {
            match self.commands.recv() {
                Ok(EngineCommand::Post(send)) => self.complete_outbound(
                    send,
                    Err(SecsError::SendRejected(SendRejectReason::NotConnected)),
                ),
                Ok(EngineCommand::GoOffline { graceful }) => {
                    self.offline = Some(graceful);
                    return;
                }
                Err(_) => {
                    self.offline = Some(false);
                    return;
                }
            }
        }
    }

    fn teardown_connection(&mut self) {
        self.outstanding_control = None;
        self.not_selected_since = None;
        self.shutdown_started = false;
        self.frames = FrameBuffer::new();
        if let Some(mut transport) = self.transport.take() {
            transport.shutdown();
        }
    }

    fn reject_all_queued(&mut self) {
        while let Some(send) = self.send_queue.pop_front() {
            self.complete_outbound(send, Err(SecsError::Canceled));
        }
    }

    fn complete_outbound(&self, send: OutboundSend, outcome: SendOutcome) {
        if send.counted {
            self.shared.posted_count.fetch_sub(1, Ordering::Relaxed);
        }
        if let Some(completion) = send.completion {
            completion.send(outcome).ok();
        }
    }

    fn write_control(&mut self, header: MessageHeader) -> SecsResult<()> {
        trace!("port \"{}\": sending {header}", self.name);
        let frame = assemble_frame(&header, &[]);
        self.transport()?.write_frame(&frame)
    }

    fn transport(&mut self) -> SecsResult<&mut TcpTransport> {
        self.transport
            .as_mut()
            .ok_or(SecsError::Usage("no connection"))
    }

    fn state(&self) -> PortConnectionState {
        self.shared.state()
    }

    fn next_system_bytes(&self) -> SecsResult<u32> {
        self.manager
            .upgrade()
            .map(|manager| manager.next_system_bytes())
            .ok_or(SecsError::Usage("message manager is gone"))
    }
}
