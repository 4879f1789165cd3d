use crate::{
    conn::{ConnectParams, PortConfiguration},
    SecsError, SecsResult,
};
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

// A connected TCP endpoint with a read timeout that doubles as the service
// tick of the session engine.
#[derive(Debug)]
pub(crate) struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    // Resolves and connects, bounded by ConnectTimeLimit across all
    // candidate addresses. Name resolution happens here as well; its own
    // bound folds into the overall limit.
    pub fn connect(
        params: &ConnectParams,
        config: &PortConfiguration,
        tick: Duration,
    ) -> SecsResult<Self> {
        let start = Instant::now();
        trace!("TcpTransport: connecting to {}", params.addr());

        let addrs: Vec<SocketAddr> = params
            .addr()
            .to_socket_addrs()
            .map_err(|source| SecsError::ConnectFailed { source })?
            .collect();
        if addrs.is_empty() {
            return Err(SecsError::ConnectFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "host name resolved to no address",
                ),
            });
        }

        let mut last_error = None;
        for addr in addrs {
            let remaining = match config
                .connect_time_limit()
                .checked_sub(Instant::now().duration_since(start))
            {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return Err(SecsError::ConnectTimeout),
            };
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => {
                    let transport = Self::from_stream(stream, addr, tick)?;
                    trace!(
                        "TcpTransport: connected to {addr} ({} µs)",
                        Instant::now().duration_since(start).as_micros()
                    );
                    return Ok(transport);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(SecsError::ConnectTimeout);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(SecsError::ConnectFailed {
            source: last_error.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "connect failed")
            }),
        })
    }

    pub fn from_stream(stream: TcpStream, peer: SocketAddr, tick: Duration) -> SecsResult<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(tick))?;
        Ok(Self { stream, peer })
    }

    // Reads whatever is available within one tick. Ok(None) means the tick
    // elapsed without data; 0 bytes means the peer closed.
    pub fn read_available(&mut self, scratch: &mut [u8]) -> SecsResult<Option<usize>> {
        match self.stream.read(scratch) {
            Ok(0) => Err(SecsError::PeerClosed),
            Ok(n) => Ok(Some(n)),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(SecsError::Io { source: e }),
        }
    }

    // One frame, one write.
    pub fn write_frame(&mut self, frame: &[u8]) -> SecsResult<()> {
        self.stream.write_all(frame)?;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        trace!("Drop of TcpTransport to {}", self.peer);
    }
}

// A bound listener polled non-blockingly by the passive engine.
#[derive(Debug)]
pub(crate) struct PortListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl PortListener {
    pub fn bind(params: &ConnectParams) -> SecsResult<Self> {
        let listener = TcpListener::bind(params.addr()).map_err(|source| {
            SecsError::ConnectFailed { source }
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        debug!("PortListener: accepting on {local_addr}");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    // One accept poll; Ok(None) when nobody is knocking.
    pub fn try_accept(&self, tick: Duration) -> SecsResult<Option<TcpTransport>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                debug!("PortListener: accepted connection from {peer}");
                Ok(Some(TcpTransport::from_stream(stream, peer, tick)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(SecsError::Io { source: e }),
        }
    }
}
