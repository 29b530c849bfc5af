//! Fully-qualified image references.

use std::fmt;


/// Placeholder the import script substitutes for the source registry host.
pub const TARGET_REGISTRY_PLACEHOLDER: &str = "${target_registry}";

/// An image reference of the form `registry/project/repository:tag`.
///
/// References are built once during discovery and never change afterwards.
/// No uniqueness is enforced: two artifacts carrying the same tag produce two
/// equal references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// Builds `registry/project/repository:tag`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::reference::ImageReference;
    ///
    /// let image = ImageReference::new("harbor.example.com", "library", "nginx", "1.25");
    /// assert_eq!(image.as_str(), "harbor.example.com/library/nginx:1.25");
    /// ```
    pub fn new(registry: &str, project: &str, repository: &str, tag: &str) -> Self {
        Self(format!("{}/{}/{}:{}", registry, project, repository, tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rewrites the reference for another registry by replacing the first
    /// occurrence of `source_registry` with `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::reference::{ImageReference, TARGET_REGISTRY_PLACEHOLDER};
    ///
    /// let image = ImageReference::new("harbor.example.com", "library", "nginx", "1.25");
    /// assert_eq!(
    ///     image.retarget("harbor.example.com", TARGET_REGISTRY_PLACEHOLDER),
    ///     "${target_registry}/library/nginx:1.25"
    /// );
    /// ```
    pub fn retarget(&self, source_registry: &str, target: &str) -> String {
        self.0.replacen(source_registry, target, 1)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::ffi::OsStr> for ImageReference {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}
