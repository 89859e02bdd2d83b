//! Netlink message header, response decomposition and error records.

use super::attr::AttrIter;
use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse header from bytes.
    ///
    /// Copies the header out, so `data` needs no particular alignment.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Standard netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;

    // Link messages
    pub const RTM_NEWLINK: u16 = 16;
    pub const RTM_DELLINK: u16 = 17;
    pub const RTM_GETLINK: u16 = 18;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_ACK: u16 = 0x04;

// Modifiers to NEW request
pub const NLM_F_EXCL: u16 = 0x200;
pub const NLM_F_CREATE: u16 = 0x400;

/// One length-framed message inside a received datagram.
///
/// Borrows from the receive buffer; `bytes()` spans exactly `nlmsg_len`
/// bytes starting at the header.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    header: NlMsgHdr,
    bytes: &'a [u8],
}

impl<'a> Message<'a> {
    /// The message header.
    pub fn header(&self) -> &NlMsgHdr {
        &self.header
    }

    /// Message type (`NlMsgType::*` or a family-specific type).
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    /// Whole message, header included.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Everything after the header.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[NLMSG_HDRLEN..]
    }

    /// Iterate the attributes that follow a fixed base payload of
    /// `base_len` bytes (e.g. `IfInfoMsg::SIZE` for link messages).
    pub fn attrs(&self, base_len: usize) -> AttrIter<'a> {
        let start = nlmsg_align(base_len);
        AttrIter::new(self.payload().get(start..).unwrap_or(&[]))
    }

    /// Find an attribute by type after a base payload of `base_len` bytes.
    ///
    /// Absence is a normal outcome and yields `None`.
    pub fn find_attr(&self, base_len: usize, attr_type: u16) -> Option<&'a [u8]> {
        self.attrs(base_len)
            .find(|(kind, _)| *kind == attr_type)
            .map(|(_, payload)| payload)
    }

    /// Interpret this message as the reply to an acknowledged request.
    ///
    /// A message that is not `NLMSG_ERROR` breaks the request contract and
    /// yields [`Error::Protocol`]. An error record with code 0 is success;
    /// any other code becomes [`Error::Kernel`] carrying the positive errno.
    pub fn ack(&self) -> Result<()> {
        if !self.header.is_error() {
            return Err(Error::Protocol(format!(
                "expected NLMSG_ERROR reply, got message type {}",
                self.header.nlmsg_type
            )));
        }

        match NlMsgError::code(self.payload())? {
            0 => Ok(()),
            code => Err(Error::from_errno(code)),
        }
    }
}

/// Iterator over netlink messages in a buffer.
///
/// Stops when fewer bytes remain than one header, or when the next header
/// declares a length that is too short or runs past the buffer. The
/// iterator never touches the buffer, so the same slice can be decomposed
/// any number of times.
#[derive(Debug, Clone)]
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Message<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLMSG_HDRLEN {
            return None;
        }

        let header = NlMsgHdr::from_bytes(self.data).ok()?;

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > self.data.len() {
            self.data = &[];
            return None;
        }

        let bytes = &self.data[..msg_len];
        let aligned_len = nlmsg_align(msg_len);

        // Move to next message
        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some(Message { header, bytes })
    }
}

/// Netlink error message payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse error message from payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }

    /// Read only the leading error code of a record.
    ///
    /// The echoed request header that normally follows is not required.
    pub fn code(data: &[u8]) -> Result<i32> {
        i32::read_from_prefix(data)
            .map(|(code, _)| code)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<i32>(),
                actual: data.len(),
            })
    }

    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }
}
