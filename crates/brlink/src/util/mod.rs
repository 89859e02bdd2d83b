//! Shared utilities for brlink.

pub mod ifname;
