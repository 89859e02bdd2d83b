//! Printable implementations.

pub mod bridge;
