//! Low-level blocking netlink socket operations.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::{Bytes, BytesMut};
use netlink_sys::{Socket, SocketAddr, protocols};
use tracing::{debug, trace};

use super::error::{Error, Result};

/// Size of the receive buffer.
///
/// Enough for ACKs and single-link replies; not meant for bulk dumps.
pub const RECV_BUF_SIZE: usize = 32768;

/// Blocking rtnetlink socket.
///
/// One request is in flight at a time; callers that need concurrency open
/// one socket each.
pub struct NetlinkSocket {
    /// The underlying socket.
    socket: Socket,
    /// Sequence number counter.
    seq: AtomicU32,
    /// Local port ID (assigned by kernel).
    pid: u32,
}

impl NetlinkSocket {
    /// Open a `NETLINK_ROUTE` socket bound to a kernel-assigned port ID.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_ROUTE).map_err(Error::Connect)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr).map_err(Error::Connect)?;
        socket.get_address(&mut addr).map_err(Error::Connect)?;
        let pid = addr.port_number();

        debug!(pid, "opened rtnetlink socket");

        Ok(Self {
            socket,
            seq: AtomicU32::new(1),
            pid,
        })
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send one complete message to the kernel.
    pub fn send(&self, msg: &[u8]) -> Result<()> {
        let kernel = SocketAddr::new(0, 0);
        loop {
            match self.socket.send_to(msg, &kernel, 0) {
                Ok(n) if n == msg.len() => {
                    trace!(len = n, "sent netlink message");
                    return Ok(());
                }
                Ok(n) => {
                    return Err(Error::Send(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short send: {} of {} bytes", n, msg.len()),
                    )));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Send(e)),
            }
        }
    }

    /// Block until one datagram from the kernel arrives.
    ///
    /// Interrupted and would-block receives are retried. Datagrams from
    /// other ports are dropped. A datagram larger than [`RECV_BUF_SIZE`]
    /// fails with [`Error::MessageTruncated`] instead of being retried, as
    /// a second receive would read the reply to a different request.
    pub fn recv_msg(&self) -> Result<Bytes> {
        loop {
            let mut buf = BytesMut::with_capacity(RECV_BUF_SIZE);
            let capacity = buf.capacity();

            // MSG_TRUNC makes the kernel report the real datagram length.
            let (n, from) = match self.socket.recv_from(&mut buf, libc::MSG_TRUNC) {
                Ok(received) => received,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                    ) =>
                {
                    trace!(error = %e, "retrying netlink receive");
                    continue;
                }
                Err(e) => return Err(Error::Recv(e)),
            };

            if n == 0 {
                return Err(Error::PeerClosed);
            }
            if n > buf.len() {
                return Err(Error::MessageTruncated { size: n, capacity });
            }
            if from.port_number() != 0 {
                debug!(
                    port = from.port_number(),
                    "dropping datagram not sent by the kernel"
                );
                continue;
            }

            trace!(len = n, "received netlink datagram");
            return Ok(buf.freeze());
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
