//! Capability checks for backup operations.
//!
//! Callers resolve who is asking (a [`Principal`]) and pass it, together with
//! the [`Action`] they want, to an [`AccessPolicy`]. The policy decides; nothing
//! here knows about identity providers.

use crate::utils::errors::{BackupError, Result};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    email: String,
}

impl Principal {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.trim().to_ascii_lowercase(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Download,
    Create,
    Delete,
    Restore,
    Cleanup,
}

impl Action {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::View | Action::Download)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::View => "view backups",
            Action::Download => "download backups",
            Action::Create => "create backups",
            Action::Delete => "delete backups",
            Action::Restore => "restore backups",
            Action::Cleanup => "clean up backups",
        };
        f.write_str(s)
    }
}

pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, principal: Option<&Principal>, action: Action) -> Result<()>;
}

/// Admins may do anything, viewers only read. Emails compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    admins: HashSet<String>,
    viewers: HashSet<String>,
}

impl AllowList {
    pub fn new<A, V, S>(admins: A, viewers: V) -> Self
    where
        A: IntoIterator<Item = S>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalize = |s: S| Principal::new(s.as_ref()).email;
        Self {
            admins: admins.into_iter().map(normalize).filter(|e| !e.is_empty()).collect(),
            viewers: viewers.into_iter().map(normalize).filter(|e| !e.is_empty()).collect(),
        }
    }

    /// Comma-separated lists, as found in environment variables.
    pub fn from_csv(admins: &str, viewers: &str) -> Self {
        Self::new(admins.split(','), viewers.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty() && self.viewers.is_empty()
    }
}

impl AccessPolicy for AllowList {
    fn authorize(&self, principal: Option<&Principal>, action: Action) -> Result<()> {
        let principal = principal.ok_or(BackupError::Unauthorized)?;
        let email = principal.email();

        if self.admins.contains(email) || (action.is_read_only() && self.viewers.contains(email)) {
            Ok(())
        } else {
            Err(BackupError::Forbidden(format!("{} may not {}", email, action)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AllowList {
        AllowList::from_csv("Admin@Example.com, ops@example.com", "viewer@example.com,")
    }

    #[test]
    fn test_admin_can_do_everything() {
        let admin = Principal::new("admin@example.com");
        for action in [Action::View, Action::Download, Action::Create, Action::Delete, Action::Restore, Action::Cleanup] {
            assert!(policy().authorize(Some(&admin), action).is_ok());
        }
    }

    #[test]
    fn test_viewer_is_read_only() {
        let viewer = Principal::new("Viewer@example.com");
        assert!(policy().authorize(Some(&viewer), Action::View).is_ok());
        assert!(policy().authorize(Some(&viewer), Action::Download).is_ok());
        assert!(matches!(
            policy().authorize(Some(&viewer), Action::Delete),
            Err(BackupError::Forbidden(_))
        ));
    }

    #[test]
    fn test_anonymous_and_strangers() {
        assert!(matches!(policy().authorize(None, Action::View), Err(BackupError::Unauthorized)));
        let stranger = Principal::new("someone@else.com");
        assert!(matches!(
            policy().authorize(Some(&stranger), Action::View),
            Err(BackupError::Forbidden(_))
        ));
    }

    #[test]
    fn test_blank_entries_are_ignored() {
        assert!(AllowList::from_csv("", " , ").is_empty());
        assert!(!policy().is_empty());
    }
}
