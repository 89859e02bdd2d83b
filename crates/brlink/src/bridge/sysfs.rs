//! Bridge listing from `/sys/class/net`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::netlink::Result;
use crate::util::ifname;

/// Default sysfs network class directory.
pub const SYSFS_NET: &str = "/sys/class/net";

/// What sysfs knows about an interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaceKind {
    /// No such interface.
    Missing,
    /// The interface is a bridge.
    Bridge,
    /// The interface exists but is not a bridge.
    NotBridge,
}

/// One row of the bridge listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct BridgeInfo {
    /// Bridge interface name.
    pub name: String,
    /// Bridge identifier (priority.mac), as the kernel formats it.
    pub id: String,
    /// Whether STP is enabled.
    pub stp_enabled: bool,
    /// Names of the enslaved ports, sorted.
    pub interfaces: Vec<String>,
}

/// Reads bridge state from a sysfs network class directory.
#[derive(Debug, Clone)]
pub struct SysfsScanner {
    root: PathBuf,
}

impl Default for SysfsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsScanner {
    /// Scanner over [`SYSFS_NET`].
    pub fn new() -> Self {
        Self::with_root(SYSFS_NET)
    }

    /// Scanner over another directory laid out like `/sys/class/net`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the scanned directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify an interface name.
    ///
    /// Names that could never be an interface (empty, too long, containing
    /// a `/`) are reported as missing.
    pub fn classify(&self, name: &str) -> IfaceKind {
        if ifname::validate(name).is_err() {
            return IfaceKind::Missing;
        }

        let path = self.root.join(name);
        if !path.exists() {
            IfaceKind::Missing
        } else if is_bridge(&path) {
            IfaceKind::Bridge
        } else {
            IfaceKind::NotBridge
        }
    }

    /// List all bridges with their ports, sorted by name.
    pub fn scan(&self) -> Result<Vec<BridgeInfo>> {
        let mut bridges: BTreeMap<String, BridgeInfo> = BTreeMap::new();

        for entry in fs::read_dir(&self.root)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();

            if is_bridge(&path) {
                let info = bridges.entry(name.clone()).or_default();
                info.name = name;
                info.id = read_attr(&path.join("bridge/bridge_id"))?.unwrap_or_default();
                info.stp_enabled = read_attr(&path.join("bridge/stp_state"))?
                    .and_then(|s| s.parse::<u32>().ok())
                    .is_some_and(|state| state != 0);
                continue;
            }

            let master = path.join("master");
            if !is_bridge(&master) {
                continue;
            }
            // master is a symlink to the bridge's device directory
            let Some(bridge) = fs::read_link(&master)
                .ok()
                .and_then(|target| target.file_name().map(|n| n.to_string_lossy().to_string()))
            else {
                continue;
            };
            trace!(port = %name, bridge = %bridge, "found bridge port");
            bridges
                .entry(bridge.clone())
                .or_insert_with(|| BridgeInfo {
                    name: bridge,
                    ..Default::default()
                })
                .interfaces
                .push(name);
        }

        let mut list: Vec<_> = bridges.into_values().collect();
        for info in &mut list {
            info.interfaces.sort();
        }
        Ok(list)
    }

    /// List only the named bridges, in the order they were requested.
    ///
    /// Names that are not bridges are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<BridgeInfo>> {
        Ok(select_named(&self.scan()?, names))
    }
}

/// Keep the bridges named in `names`, in that order.
pub fn select_named<S: AsRef<str>>(bridges: &[BridgeInfo], names: &[S]) -> Vec<BridgeInfo> {
    names
        .iter()
        .filter_map(|name| bridges.iter().find(|b| b.name == name.as_ref()).cloned())
        .collect()
}

fn is_bridge(path: &Path) -> bool {
    path.join("bridge").is_dir()
}

/// Read a sysfs attribute, trimmed. A vanished file reads as `None`.
fn read_attr(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use std::sync::atomic::{AtomicU32, Ordering};

    static FIXTURE_COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Temporary directory shaped like /sys/class/net, removed on drop.
    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let id = FIXTURE_COUNTER.fetch_add(1, Ordering::SeqCst);
            let root = std::env::temp_dir().join(format!(
                "brlink-sysfs-{}-{}",
                std::process::id(),
                id
            ));
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn iface(&self, name: &str) -> &Self {
            fs::create_dir_all(self.root.join(name)).unwrap();
            self
        }

        fn bridge(&self, name: &str, id: &str, stp: u32) -> &Self {
            let dir = self.root.join(name).join("bridge");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("bridge_id"), format!("{id}\n")).unwrap();
            fs::write(dir.join("stp_state"), format!("{stp}\n")).unwrap();
            self
        }

        fn port(&self, name: &str, bridge: &str) -> &Self {
            self.iface(name);
            symlink(format!("../{bridge}"), self.root.join(name).join("master")).unwrap();
            self
        }

        fn scanner(&self) -> SysfsScanner {
            SysfsScanner::with_root(&self.root)
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn test_classify() {
        let fx = Fixture::new();
        fx.iface("lo").bridge("br0", "8000.000000000000", 0);
        let scanner = fx.scanner();

        assert_eq!(scanner.classify("br0"), IfaceKind::Bridge);
        assert_eq!(scanner.classify("lo"), IfaceKind::NotBridge);
        assert_eq!(scanner.classify("br9"), IfaceKind::Missing);
        assert_eq!(scanner.classify("../br0"), IfaceKind::Missing);
    }

    #[test]
    fn test_scan_bridges_and_ports() {
        let fx = Fixture::new();
        fx.iface("lo")
            .bridge("br1", "8000.aabbccddeeff", 1)
            .bridge("br0", "8000.000000000000", 0)
            .port("eth1", "br0")
            .port("eth0", "br0");

        let bridges = fx.scanner().scan().unwrap();
        assert_eq!(
            bridges,
            vec![
                BridgeInfo {
                    name: "br0".into(),
                    id: "8000.000000000000".into(),
                    stp_enabled: false,
                    interfaces: vec!["eth0".into(), "eth1".into()],
                },
                BridgeInfo {
                    name: "br1".into(),
                    id: "8000.aabbccddeeff".into(),
                    stp_enabled: true,
                    interfaces: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_scan_without_bridges() {
        let fx = Fixture::new();
        fx.iface("lo").iface("eth0");
        assert!(fx.scanner().scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let scanner = SysfsScanner::with_root("/nonexistent/brlink/net");
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let fx = Fixture::new();
        fx.iface("lo")
            .bridge("br0", "8000.000000000000", 0)
            .bridge("br1", "8000.000000000001", 0);

        let names: Vec<_> = fx
            .scanner()
            .select(&["br1", "lo", "br0", "nope"])
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["br1", "br0"]);
    }
}
