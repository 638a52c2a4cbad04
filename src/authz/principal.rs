use std::collections::HashSet;

/// The authenticated identity, loaded once per check from the account
/// store and read-only during evaluation.
#[derive(Debug, Clone)]
pub struct Principal {
    pub uid: String,
    pub permissions: HashSet<String>,
    pub preferred_language: String,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            permissions: HashSet::new(),
            preferred_language: "en".to_string(),
        }
    }

    pub fn with_permissions(mut self, perms: impl IntoIterator<Item = String>) -> Self {
        self.permissions = perms.into_iter().collect();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = language.into();
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True if any of the named grants is held.
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.permissions.contains(*p))
    }
}
