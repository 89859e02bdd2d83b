//! Common test utilities for integration tests.
//!
//! Bridges are created in the caller's network namespace under unique
//! names and removed again when their guard is dropped.

use brlink::netlink::Connection;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global counter for unique interface names.
static NAME_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique interface name (fits in IFNAMSIZ).
pub fn unique_name(prefix: &str) -> String {
    let id = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 100_000;
    format!("{}{}x{}", prefix, pid, id)
}

/// Deletes the named link on drop, ignoring errors.
pub struct LinkGuard {
    name: String,
}

impl LinkGuard {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        if let Ok(conn) = Connection::new() {
            let _ = conn.del_link(&self.name);
        }
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
///
/// Use this at the beginning of integration tests that require root privileges.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let name1 = unique_name("brl");
        let name2 = unique_name("brl");
        assert_ne!(name1, name2);
        assert!(name1.len() < brlink::util::ifname::IFNAMSIZ);
    }
}
