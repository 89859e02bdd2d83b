//! Linux bridge management over rtnetlink.
//!
//! This crate builds, sends and decodes the rtnetlink messages needed to
//! create and delete bridge interfaces, and lists bridges from sysfs.
//!
//! # Features
//!
//! - `output` - JSON/text output formatting
//! - `integration` - Root-only integration tests against the running kernel
//!
//! # Example
//!
//! ```ignore
//! use brlink::bridge::BridgeControl;
//! use brlink::netlink::BridgeLink;
//!
//! fn main() -> brlink::Result<()> {
//!     let ctl = BridgeControl::new()?;
//!
//!     ctl.add_bridge(&BridgeLink::new("br0").stp(true))?;
//!     ctl.del_bridge("br0")?;
//!
//!     Ok(())
//! }
//! ```

// Core modules (always available)
pub mod bridge;
pub mod netlink;
pub mod util;

// Feature-gated modules
#[cfg(feature = "output")]
pub mod output;

// Re-export common types at crate root for convenience
pub use netlink::{Connection, Error, Result};
