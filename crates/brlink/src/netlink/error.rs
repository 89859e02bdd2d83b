//! Error types for netlink operations.

use std::io;

use crate::util::ifname::IfError;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink and bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error outside the socket path (sysfs reads).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The netlink socket could not be created or bound.
    #[error("failed to open netlink socket: {0}")]
    Connect(#[source] io::Error),

    /// The kernel rejected the outgoing datagram.
    #[error("failed to send message: {0}")]
    Send(#[source] io::Error),

    /// Receiving failed with a non-transient error.
    #[error("failed to receive message: {0}")]
    Recv(#[source] io::Error),

    /// The delivered datagram did not fit the receive buffer.
    #[error("message truncated: datagram of {size} bytes exceeds {capacity} byte buffer")]
    MessageTruncated {
        /// Real size of the datagram as reported by the kernel.
        size: usize,
        /// Size of the receive buffer.
        capacity: usize,
    },

    /// A receive returned zero bytes.
    #[error("netlink peer closed the connection")]
    PeerClosed,

    /// The reply does not follow the request/ACK contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// A fixed-size structure was cut short.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected length.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// Interface exists but is not a bridge.
    #[error("interface is not a bridge: {name}")]
    NotABridge {
        /// The interface name.
        name: String,
    },

    /// Invalid interface name.
    #[error(transparent)]
    Interface(#[from] IfError),
}

impl Error {
    /// Create a kernel error from the (negative) code of an error record.
    ///
    /// A code with no positive counterpart (`i32::MIN`) cannot come from a
    /// well-behaved kernel and yields [`Error::Protocol`].
    pub fn from_errno(errno: i32) -> Self {
        match errno.checked_neg() {
            Some(errno) => Self::Kernel {
                errno,
                message: io::Error::from_raw_os_error(errno).to_string(),
            },
            None => Self::invalid_errno(errno),
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        Self::from_errno(errno).with_context(operation)
    }

    fn invalid_errno(errno: i32) -> Self {
        Self::Protocol(format!("error record carries invalid code {errno}"))
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::InterfaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            _ => false,
        }
    }

    /// Check if this is a "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == libc::EEXIST
            }
            _ => false,
        }
    }

    /// Check if this is a "device busy" error (EBUSY).
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == libc::EBUSY
            }
            _ => false,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-libc::EPERM);
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
    }

    #[test]
    fn test_from_errno_rejects_unnegatable_code() {
        let err = Error::from_errno(i32::MIN);
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(err.errno(), None);

        let err = Error::from_errno_with_context(i32::MIN, "failed to add bridge");
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_from_errno_with_context() {
        let err = Error::from_errno_with_context(-libc::ENODEV, "failed to delete bridge");
        assert!(err.is_not_found());
        let msg = err.to_string();
        assert!(msg.contains("failed to delete bridge"));
        assert!(msg.contains("No such device"));
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-libc::EEXIST).with_context("failed to add bridge");
        assert!(err.is_already_exists());
        assert_eq!(err.errno(), Some(libc::EEXIST));
        assert!(err.to_string().starts_with("failed to add bridge: "));
    }

    #[test]
    fn test_with_context_leaves_other_errors() {
        let err = Error::PeerClosed.with_context("failed to add bridge");
        assert!(matches!(err, Error::PeerClosed));
    }

    #[test]
    fn test_is_busy() {
        assert!(Error::from_errno(-libc::EBUSY).is_busy());
        assert!(!Error::from_errno(-libc::EPERM).is_busy());
    }

    #[test]
    fn test_precondition_errors() {
        let err = Error::InterfaceNotFound { name: "br9".into() };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "interface not found: br9");

        let err = Error::NotABridge { name: "lo".into() };
        assert!(!err.is_not_found());
        assert_eq!(err.errno(), None);
        assert_eq!(err.to_string(), "interface is not a bridge: lo");
    }

    #[test]
    fn test_transport_messages() {
        let err = Error::MessageTruncated {
            size: 40000,
            capacity: 32768,
        };
        assert!(err.to_string().contains("40000"));
        assert_eq!(
            Error::PeerClosed.to_string(),
            "netlink peer closed the connection"
        );
    }
}
