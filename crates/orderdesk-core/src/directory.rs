//! Organization lookup
//!
//! Reference allocation needs the owning organization's display label. The
//! lookup is behind a trait so the engine can run against whatever directory
//! the deployment provides; `StaticDirectory` is the built-in map-backed
//! implementation used for embedded setups and tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{OrderDeskError, Result};

/// Organization record returned by a directory lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Stable identifier, matches the `organization` value stored on orders
    pub id: String,

    /// Full display name
    pub name: String,

    /// Short label used in order references, when the organization has one
    pub shortcode: Option<String>,
}

impl Organization {
    /// Create a new Organization without a shortcode
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shortcode: None,
        }
    }

    /// Set the shortcode
    pub fn with_shortcode(mut self, shortcode: impl Into<String>) -> Self {
        self.shortcode = Some(shortcode.into());
        self
    }

    /// Label used when formatting order references
    ///
    /// The shortcode when present and non-empty, else the full name.
    pub fn reference_label(&self) -> &str {
        match self.shortcode.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => &self.name,
        }
    }
}

/// External lookup resolving an organization identifier to its record
pub trait OrganizationDirectory {
    /// Resolve an organization by its identifier
    ///
    /// # Errors
    /// * `OrganizationNotFound` - If the directory has no such organization
    fn resolve(&self, organization: &str) -> Result<Organization>;
}

/// Directory backed by a fixed in-memory map
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    organizations: HashMap<String, Organization>,
}

impl StaticDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization under its identifier
    pub fn insert(&mut self, organization: Organization) {
        self.organizations
            .insert(organization.id.clone(), organization);
    }
}

impl OrganizationDirectory for StaticDirectory {
    fn resolve(&self, organization: &str) -> Result<Organization> {
        self.organizations.get(organization).cloned().ok_or_else(|| {
            OrderDeskError::OrganizationNotFound {
                organization: organization.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_label_prefers_shortcode() {
        let org = Organization::new("org:acme", "Acme Corporation").with_shortcode("ACME");
        assert_eq!(org.reference_label(), "ACME");
    }

    #[test]
    fn test_reference_label_falls_back_to_name() {
        let org = Organization::new("org:acme", "Acme Corporation");
        assert_eq!(org.reference_label(), "Acme Corporation");
    }

    #[test]
    fn test_reference_label_ignores_empty_shortcode() {
        let org = Organization::new("org:acme", "Acme Corporation").with_shortcode("");
        assert_eq!(org.reference_label(), "Acme Corporation");
    }

    #[test]
    fn test_static_directory_resolve() {
        let mut directory = StaticDirectory::new();
        directory.insert(Organization::new("org:acme", "Acme").with_shortcode("ACME"));

        let org = directory.resolve("org:acme").unwrap();
        assert_eq!(org.name, "Acme");
    }

    #[test]
    fn test_static_directory_unknown_organization() {
        let directory = StaticDirectory::new();
        let result = directory.resolve("org:missing");
        assert!(matches!(
            result,
            Err(OrderDeskError::OrganizationNotFound { .. })
        ));
    }
}
