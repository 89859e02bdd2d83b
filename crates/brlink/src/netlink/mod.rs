//! Blocking rtnetlink protocol implementation for bridge management.
//!
//! Requests are built with [`MessageBuilder`], sent over a
//! [`NetlinkSocket`] and answered one at a time through [`Connection`].
//!
//! # Quick Start
//!
//! ```ignore
//! use brlink::netlink::Connection;
//! use brlink::netlink::link::link_create_request;
//!
//! let conn = Connection::new()?;
//!
//! // Create a bridge and wait for the kernel's acknowledgment
//! conn.request_ack(link_create_request("br0", "bridge", &[])?)?;
//!
//! // Read fields back out of a reply
//! if let Some(link) = conn.get_link("br0")? {
//!     println!("{}: {:?}", link.ifindex(), link.kind());
//! }
//! ```

pub mod attr;
pub mod builder;
pub mod connection;
pub mod error;
pub mod link;
pub mod message;
pub mod socket;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::Connection;
pub use error::{Error, Result};
pub use link::{BridgeLink, LinkConfig, LinkMessage};
pub use message::{Message, MessageIter, NlMsgError, NlMsgHdr, NlMsgType};
pub use socket::NetlinkSocket;
