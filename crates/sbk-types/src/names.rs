//! Username validation.
//!
//! There is no account system; usernames arrive as unauthenticated strings.
//! The one platform rule is that nobody may claim a name in the reserved
//! platform namespace.

use crate::error::TypeError;

/// Substring reserved for platform-operated accounts.
const RESERVED_FRAGMENT: &str = "stackblocks";

/// Maximum accepted username length.
const MAX_LEN: usize = 64;

/// Validate a username, returning `Ok(())` if acceptable.
///
/// # Examples
///
/// ```
/// use sbk_types::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("StackblocksTeam").is_err());
/// ```
pub fn validate_username(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidUsername {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("username must not be empty"));
    }
    if name.len() > MAX_LEN {
        return Err(invalid("username too long"));
    }
    if name.to_ascii_lowercase().contains(RESERVED_FRAGMENT) {
        return Err(invalid("reserved platform namespace"));
    }
    Ok(())
}
