//! Bridge management on top of the netlink core.
//!
//! [`BridgeControl`] owns one rtnetlink endpoint and turns bridge
//! operations into single acknowledged requests. Listing bridges does not
//! touch netlink at all; see [`sysfs::SysfsScanner`].

pub mod sysfs;

use tracing::debug;

use crate::netlink::link::{BridgeLink, LinkConfig};
use crate::netlink::{Connection, Error, Result};
use crate::util::ifname;

pub use sysfs::{BridgeInfo, IfaceKind, SysfsScanner, select_named};

/// Result of a bridge operation that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The kernel applied the change.
    Done,
    /// The operation is recognized but not implemented; nothing was sent.
    NotSupported,
}

/// Bridge controller holding one netlink connection.
///
/// Operations are sequential. Use one controller per thread when bridges
/// have to be managed concurrently.
pub struct BridgeControl {
    conn: Connection,
}

impl BridgeControl {
    /// Open the netlink endpoint.
    pub fn new() -> Result<Self> {
        Ok(Self {
            conn: Connection::new()?,
        })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create a bridge.
    ///
    /// An existing interface with the same name fails with `EEXIST`.
    pub fn add_bridge(&self, bridge: &BridgeLink) -> Result<Outcome> {
        let request = bridge.build()?;
        debug!(name = bridge.name(), "adding bridge");
        self.conn
            .request_ack(request)
            .map_err(|e| e.with_context("failed to add bridge"))?;
        Ok(Outcome::Done)
    }

    /// Delete a bridge.
    ///
    /// Fails with [`Error::InterfaceNotFound`] or [`Error::NotABridge`]
    /// before any delete request is sent.
    pub fn del_bridge(&self, name: &str) -> Result<Outcome> {
        ifname::validate(name)?;

        match self.conn.get_link(name)? {
            None => {
                return Err(Error::InterfaceNotFound {
                    name: name.to_string(),
                });
            }
            Some(link) if !link.is_bridge() => {
                return Err(Error::NotABridge {
                    name: name.to_string(),
                });
            }
            Some(link) => debug!(name, ifindex = link.ifindex(), "deleting bridge"),
        }

        self.conn
            .del_link(name)
            .map_err(|e| e.with_context("failed to delete bridge"))?;
        Ok(Outcome::Done)
    }

    /// Attach `device` to `bridge`. Not supported yet.
    ///
    /// Only the names are checked; no endpoint is needed.
    pub fn add_interface(bridge: &str, device: &str) -> Result<Outcome> {
        ifname::validate(bridge)?;
        ifname::validate(device)?;
        debug!(bridge, device, "addif is not supported");
        Ok(Outcome::NotSupported)
    }

    /// Detach `device` from `bridge`. Not supported yet.
    pub fn del_interface(bridge: &str, device: &str) -> Result<Outcome> {
        ifname::validate(bridge)?;
        ifname::validate(device)?;
        debug!(bridge, device, "delif is not supported");
        Ok(Outcome::NotSupported)
    }
}
