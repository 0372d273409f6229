//! Target validation.
//!
//! The target ends up on the command line of an external process, so it is
//! checked against an allow-list before anything is spawned.

use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Characters that would let a target smuggle extra shell syntax.
const SHELL_METACHARACTERS: &[char] =
    &[';', '|', '&', '`', '$', '(', ')', '{', '}', '[', ']', '<', '>', '\n', '\r'];

/// Dot separated labels of 1-63 alphanumerics or hyphens, no hyphen at either end.
static HOSTNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("Invalid hostname regex")
});

/// Validate a probe target: an IP address or a DNS host name.
pub fn validate_target(target: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    if target.trim().is_empty() {
        return Err(invalid("target cannot be empty"));
    }

    if target.contains(SHELL_METACHARACTERS) {
        return Err(invalid("contains shell metacharacters"));
    }

    if target.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    if !HOSTNAME_REGEX.is_match(target) {
        return Err(invalid("not a valid hostname or IP address"));
    }

    Ok(())
}

/// A target that passed [`validate_target`].
///
/// Probes only accept this type, so an unchecked string can never reach a
/// spawned process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    pub fn parse(target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        validate_target(&target)?;
        Ok(Self(target))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
