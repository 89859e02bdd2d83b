//! Message builder for constructing netlink requests.
//!
//! The builder owns a zero-initialized buffer of fixed capacity. Every write
//! goes through [`MessageBuilder::write_at`], so an attribute can never land
//! outside the buffer and pad bytes are always zero. The header length field
//! is kept equal to the logical length after every append.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Default request capacity: header, `ifinfomsg` and 512 bytes of attributes.
pub const DEFAULT_CAPACITY: usize = NLMSG_HDRLEN + 16 + 512;

/// Token returned when starting a nested attribute.
/// Used to finalize the nested attribute length.
#[derive(Debug)]
#[must_use = "a nested attribute must be closed with nest_end"]
pub struct NestToken {
    /// Offset of the nested attribute header in the buffer.
    offset: usize,
}

/// Builder for constructing netlink messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    len: usize,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self::with_capacity(msg_type, flags, DEFAULT_CAPACITY)
    }

    /// Create a builder with an explicit buffer capacity in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` cannot hold a message header.
    pub fn with_capacity(msg_type: u16, flags: u16, capacity: usize) -> Self {
        assert!(
            capacity >= NLMSG_HDRLEN,
            "netlink buffer capacity {capacity} cannot hold a header"
        );
        let mut builder = Self {
            buf: vec![0u8; capacity],
            len: 0,
        };
        builder.write_at(0, NlMsgHdr::new(msg_type, flags).as_bytes());
        builder.len = NLMSG_HDRLEN;
        builder.sync_len();
        builder
    }

    /// Get the current logical message length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.len == NLMSG_HDRLEN
    }

    /// Total bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) {
        let offset = nlmsg_align(self.len);
        self.write_at(offset, data);
        self.len = nlmsg_align(offset + data.len());
        self.sync_len();
    }

    /// Append a fixed-size struct, such as the base payload of a request.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.append_bytes(data.as_bytes());
    }

    /// Append an attribute with the given type and data.
    ///
    /// The declared attribute length is `NLA_HDRLEN + data.len()`; the
    /// logical length then advances to the next alignment boundary.
    ///
    /// # Panics
    ///
    /// Panics if the attribute does not fit in the buffer, or if its length
    /// cannot be expressed in the 16-bit length field.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        let offset = nla_align(self.len);
        let attr = NlAttr::new(attr_type, data.len());
        assert!(
            NLA_HDRLEN + data.len() <= u16::MAX as usize,
            "netlink attribute of {} bytes overflows its length field",
            data.len()
        );
        self.write_at(offset, attr.as_bytes());
        self.write_at(offset + NLA_HDRLEN, data);
        self.len = nla_align(offset + NLA_HDRLEN + data.len());
        self.sync_len();
    }

    /// Append a u8 attribute.
    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_attr(attr_type, &[value]);
    }

    /// Append an empty (flag) attribute with no payload.
    pub fn append_attr_empty(&mut self, attr_type: u16) {
        self.append_attr(attr_type, &[]);
    }

    /// Append a u16 attribute (native endian).
    pub fn append_attr_u16(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a u32 attribute (native endian).
    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        let mut data = value.as_bytes().to_vec();
        data.push(0); // null terminator
        self.append_attr(attr_type, &data);
    }

    /// Start a nested attribute. Returns a token to finalize it.
    ///
    /// Reserves an attribute header whose length is provisionally
    /// `NLA_HDRLEN`; [`nest_end`](Self::nest_end) patches the real length.
    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = nla_align(self.len);
        let attr = NlAttr::new(attr_type | NLA_F_NESTED, 0);
        self.write_at(offset, attr.as_bytes());
        self.len = offset + NLA_HDRLEN;
        self.sync_len();
        NestToken { offset }
    }

    /// End a nested attribute started with `nest_start`.
    ///
    /// The nest length becomes the distance from its own header to the
    /// current write position. Nests must be closed innermost first.
    pub fn nest_end(&mut self, token: NestToken) {
        let len = self.len - token.offset;
        assert!(
            len <= u16::MAX as usize,
            "nested netlink attribute of {len} bytes overflows its length field"
        );
        self.write_at(token.offset, &(len as u16).to_ne_bytes());
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.write_at(8, &seq.to_ne_bytes());
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        self.write_at(12, &pid.to_ne_bytes());
    }

    /// Finalize and return the message bytes.
    ///
    /// The header length is rounded up to the alignment unit; the returned
    /// buffer is exactly that long and any pad bytes are zero.
    pub fn finish(mut self) -> Vec<u8> {
        self.len = nlmsg_align(self.len);
        self.sync_len();
        self.buf.truncate(self.len);
        self.buf
    }

    /// Get the message written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// The single bounds-checked write primitive.
    fn write_at(&mut self, offset: usize, data: &[u8]) {
        let end = offset + data.len();
        assert!(
            end <= self.buf.len(),
            "netlink request of {end} bytes exceeds buffer capacity of {} bytes",
            self.buf.len()
        );
        self.buf[offset..end].copy_from_slice(data);
    }

    fn sync_len(&mut self) {
        let len = self.len as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
    }
}
