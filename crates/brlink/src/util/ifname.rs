//! Interface name validation.

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

/// Error type for interface names.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("invalid interface name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name the way the kernel's `dev_valid_name` does.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "{name}: name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name == "." || name == ".." {
        return Err(IfError::InvalidName(format!("{name}: reserved name")));
    }

    if name.contains('/') || name.contains(':') || name.contains('\0') {
        return Err(IfError::InvalidName(format!(
            "{name}: name contains invalid characters"
        )));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName(format!("{name}: name contains whitespace")));
    }

    Ok(())
}
