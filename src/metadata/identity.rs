//! Module identity and versioning.
//!
//! A module is identified by its simple name and a four-part version, written in the
//! familiar display-name form:
//!
//! ```text
//! ModuleName[, Version=Major.Minor.Build.Revision]
//! ```
//!
//! The all-zero version doubles as a marker for generated or platform-provided modules:
//! the module registry classifies such modules as system modules regardless of their name.
//!
//! # Examples
//!
//! ```rust
//! use typefactory::metadata::identity::{ModuleIdentity, ModuleVersion};
//!
//! let identity = ModuleIdentity::parse("Acme.Billing, Version=1.2.0.0")?;
//! assert_eq!(identity.name, "Acme.Billing");
//! assert_eq!(identity.version, ModuleVersion::new(1, 2, 0, 0));
//! assert!(!identity.version.is_zero());
//! # Ok::<(), typefactory::Error>(())
//! ```

use std::fmt;

use crate::{Error, Result};

/// Four-part version numbering for modules.
///
/// Versions are compared component-wise in order: major, minor, build, revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModuleVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build version component.
    pub build: u16,
    /// Revision version component.
    pub revision: u16,
}

impl ModuleVersion {
    /// Create a version from its four components
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        ModuleVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// The `0.0.0.0` version
    #[must_use]
    pub const fn zero() -> Self {
        ModuleVersion::new(0, 0, 0, 0)
    }

    /// Returns `true` for the `0.0.0.0` version
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == ModuleVersion::zero()
    }

    /// Parse a dotted version string with one to four components.
    ///
    /// Missing trailing components default to zero (`"2.1"` is `2.1.0.0`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidModuleIdentity`] if the string has more than four
    /// components or a component is not a 16-bit number.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();

        if parts.is_empty() || parts.len() > 4 {
            return Err(Error::InvalidModuleIdentity(format!(
                "invalid version format: {version_str}"
            )));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part.parse::<u16>().map_err(|_| {
                Error::InvalidModuleIdentity(format!("invalid version component: {part}"))
            })?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Name and version of a loaded module.
///
/// Equality and hashing are case-sensitive on the name, matching how module names are
/// compared by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    /// Simple module name (e.g. `Acme.Billing`)
    pub name: String,
    /// Four-part version
    pub version: ModuleVersion,
}

impl ModuleIdentity {
    /// Create an identity from a name and version
    pub fn new(name: impl Into<String>, version: ModuleVersion) -> Self {
        ModuleIdentity {
            name: name.into(),
            version,
        }
    }

    /// Parse an identity from its display name.
    ///
    /// Unknown `Key=Value` components (culture, public key token, ...) are ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidModuleIdentity`] for an empty name or a malformed version.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(Error::InvalidModuleIdentity(
                "module name cannot be empty".to_string(),
            ));
        }

        let mut version = ModuleVersion::zero();
        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                version = ModuleVersion::parse(value)?;
            }
        }

        Ok(ModuleIdentity::new(name, version))
    }

    /// Display name in `Name, Version=a.b.c.d` form
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, Version={}", self.name, self.version)
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let identity = ModuleIdentity::parse("Acme.Billing").unwrap();
        assert_eq!(identity.name, "Acme.Billing");
        assert!(identity.version.is_zero());
    }

    #[test]
    fn test_parse_full_name() {
        let identity =
            ModuleIdentity::parse("Acme.Billing, Version=2.1.0.7, Culture=neutral").unwrap();
        assert_eq!(identity.name, "Acme.Billing");
        assert_eq!(identity.version, ModuleVersion::new(2, 1, 0, 7));
        assert_eq!(identity.display_name(), "Acme.Billing, Version=2.1.0.7");
    }

    #[test]
    fn test_parse_partial_version() {
        assert_eq!(
            ModuleVersion::parse("3.5").unwrap(),
            ModuleVersion::new(3, 5, 0, 0)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ModuleIdentity::parse("  , Version=1.0"),
            Err(Error::InvalidModuleIdentity(_))
        ));
        assert!(ModuleVersion::parse("1.2.3.4.5").is_err());
        assert!(ModuleVersion::parse("1.x").is_err());
        assert!(ModuleVersion::parse("70000").is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(ModuleVersion::new(1, 2, 0, 0) > ModuleVersion::new(1, 1, 9, 9));
        assert!(ModuleVersion::zero().is_zero());
        assert_eq!(ModuleVersion::new(4, 0, 0, 0).to_string(), "4.0.0.0");
    }
}
