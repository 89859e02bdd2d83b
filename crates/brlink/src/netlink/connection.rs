//! High-level netlink connection with request/response handling.

use tracing::debug;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{Message, MessageIter, NLM_F_ACK, NLM_F_REQUEST};
use super::socket::NetlinkSocket;

/// High-level netlink connection.
///
/// Requests are strictly sequential: each call sends one message and
/// blocks until the matching reply arrives.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Open a new rtnetlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Send a request that expects an ACK only (no data response).
    ///
    /// Succeeds when the kernel acknowledges with error code 0. A nonzero
    /// code is returned as [`Error::Kernel`]; a reply of any other type is
    /// [`Error::Protocol`].
    pub fn request_ack(&self, builder: MessageBuilder) -> Result<()> {
        let seq = self.send_request(builder)?;
        self.recv_reply(seq, |msg| {
            msg.ack().inspect_err(|e| debug!(seq, error = %e, "request failed"))
        })
    }

    /// Send a request and return the reply message (header included).
    ///
    /// An error record in place of the reply is turned into the
    /// corresponding error.
    pub fn request(&self, builder: MessageBuilder) -> Result<Vec<u8>> {
        let seq = self.send_request(builder)?;
        self.recv_reply(seq, |msg| {
            if msg.header().is_error() {
                msg.ack()?;
                return Err(Error::Protocol(
                    "expected a data reply, got a bare acknowledgment".into(),
                ));
            }
            Ok(msg.bytes().to_vec())
        })
    }

    fn send_request(&self, mut builder: MessageBuilder) -> Result<u32> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        debug!(seq, len = msg.len(), "sending request");
        self.socket.send(&msg)?;
        Ok(seq)
    }

    /// Receive until a datagram carries the reply to `seq`, then hand the
    /// first matching message to `handle`.
    fn recv_reply<T>(
        &self,
        seq: u32,
        handle: impl FnOnce(&Message<'_>) -> Result<T>,
    ) -> Result<T> {
        loop {
            let data = self.socket.recv_msg()?;

            if let Some(msg) = select_reply(&data, seq, self.socket.pid())? {
                return handle(&msg);
            }

            debug!(seq, len = data.len(), "discarding reply to another request");
        }
    }
}

/// Pick the message answering request `seq` from port `pid` out of one
/// datagram.
///
/// Returns `None` when the datagram only holds replies to other requests,
/// and [`Error::Protocol`] when it holds no complete message at all.
pub fn select_reply(data: &[u8], seq: u32, pid: u32) -> Result<Option<Message<'_>>> {
    let mut messages = MessageIter::new(data).peekable();
    if messages.peek().is_none() {
        return Err(Error::Protocol(format!(
            "reply of {} bytes holds no complete message",
            data.len()
        )));
    }

    Ok(messages.find(|m| {
        let header = m.header();
        header.nlmsg_seq == seq && header.nlmsg_pid == pid
    }))
}

/// Helper to build a request expecting ACK.
pub fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

/// Helper to build a plain request whose reply carries data.
pub fn get_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST)
}
