//! Reader configuration
//!
//! This module provides the options that control which class files a
//! [`crate::ClassFileReader`] accepts.

/// The range of class file versions a reader accepts.
///
/// Versions compare as `(major, minor)` pairs, so the default range of `45.0` to `50.0` accepts
/// every minor version of majors 45 to 49 but only minor 0 of major 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedVersions {
    /// Oldest accepted `(major, minor)`
    pub min: (u16, u16),
    /// Newest accepted `(major, minor)`
    pub max: (u16, u16),
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self {
            min: (45, 0),
            max: (50, 0),
        }
    }
}

impl SupportedVersions {
    /// Accepts every version from 45.0 upward
    #[must_use]
    pub fn all() -> Self {
        Self {
            min: (45, 0),
            max: (u16::MAX, u16::MAX),
        }
    }

    /// Accepts every minor version of the majors `min_major..=max_major`
    #[must_use]
    pub fn range(min_major: u16, max_major: u16) -> Self {
        Self {
            min: (min_major, 0),
            max: (max_major, u16::MAX),
        }
    }

    /// Returns `true` if `major.minor` lies inside the range
    #[must_use]
    pub fn contains(&self, major: u16, minor: u16) -> bool {
        (self.min..=self.max).contains(&(major, minor))
    }
}

/// Configuration for reading class files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Accepted class file versions, checked before the constant pool is read
    pub supported_versions: SupportedVersions,

    /// Internal name of the root of the class hierarchy (default: `java/lang/Object`).
    /// Only this type may declare no super class without being an interface.
    pub root_type: String,

    /// When false every read fails with [`crate::Error::LoadingDisabled`]
    pub loading_enabled: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            supported_versions: SupportedVersions::default(),
            root_type: "java/lang/Object".to_string(),
            loading_enabled: true,
        }
    }
}

impl ReaderConfig {
    /// Creates a configuration that accepts every class file version from 45.0 upward
    ///
    /// Newer files may contain constant pool tags this reader does not know; those still fail.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            supported_versions: SupportedVersions::all(),
            ..Self::default()
        }
    }

    /// Creates a configuration that refuses to load anything
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            loading_enabled: false,
            ..Self::default()
        }
    }

    /// Replace the name of the root type
    #[must_use]
    pub fn with_root_type(mut self, root_type: &str) -> Self {
        self.root_type = root_type.to_string();
        self
    }

    /// Replace the accepted version range
    #[must_use]
    pub fn with_versions(mut self, versions: SupportedVersions) -> Self {
        self.supported_versions = versions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_versions() {
        let versions = SupportedVersions::default();
        assert!(versions.contains(45, 0));
        assert!(versions.contains(45, 3));
        assert!(versions.contains(49, 0xFFFF));
        assert!(versions.contains(50, 0));
        assert!(!versions.contains(50, 1));
        assert!(!versions.contains(44, 0xFFFF));
        assert!(!versions.contains(51, 0));
    }

    #[test]
    fn version_presets() {
        assert!(SupportedVersions::all().contains(65, 0));
        assert!(!SupportedVersions::all().contains(44, 0));

        let range = SupportedVersions::range(46, 48);
        assert!(range.contains(48, 7));
        assert!(!range.contains(45, 3));
        assert!(!range.contains(49, 0));
    }

    #[test]
    fn config_presets() {
        let default = ReaderConfig::default();
        assert!(default.loading_enabled);
        assert_eq!(default.root_type, "java/lang/Object");

        assert!(!ReaderConfig::disabled().loading_enabled);
        assert_eq!(
            ReaderConfig::permissive().supported_versions,
            SupportedVersions::all()
        );

        let custom = ReaderConfig::default()
            .with_root_type("lang/Root")
            .with_versions(SupportedVersions::range(45, 45));
        assert_eq!(custom.root_type, "lang/Root");
        assert!(!custom.supported_versions.contains(46, 0));
    }
}
