use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Reserved names under which guards attach resolved entities. The leading
/// underscore keeps them apart from route parameter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKey {
    Org,
    Conf,
    Task,
    Sub,
    ValidOrgs,
    Subs,
}

impl AttachmentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKey::Org => "_org",
            AttachmentKey::Conf => "_conf",
            AttachmentKey::Task => "_task",
            AttachmentKey::Sub => "_sub",
            AttachmentKey::ValidOrgs => "_valid_orgs",
            AttachmentKey::Subs => "_subs",
        }
    }
}

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    /// The route does not carry a parameter the guard needs.
    #[error("{message}")]
    MissingParameter {
        guard: &'static str,
        param: &'static str,
        message: &'static str,
    },

    #[error("No such {entity}")]
    EntityNotFound {
        guard: &'static str,
        entity: &'static str,
    },

    #[error("{reason}")]
    AuthorizationDenied {
        guard: &'static str,
        reason: &'static str,
    },

    /// A handler asked for an attachment that no guard on its route provides.
    #[error("{key} was not attached by any guard")]
    NotAttached { key: AttachmentKey },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a guard failure surfaces to the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Forbidden,
    Internal,
}

impl GuardError {
    pub fn denied(guard: &'static str, reason: &'static str) -> Self {
        GuardError::AuthorizationDenied { guard, reason }
    }

    pub fn not_found(guard: &'static str, entity: &'static str) -> Self {
        GuardError::EntityNotFound { guard, entity }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            GuardError::MissingParameter { .. } | GuardError::EntityNotFound { .. } => {
                FailureKind::NotFound
            }
            GuardError::AuthorizationDenied { .. } => FailureKind::Forbidden,
            GuardError::NotAttached { .. } | GuardError::Store(_) => FailureKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_is_not_found() {
        let err = GuardError::MissingParameter {
            guard: "conference_is_open",
            param: "conf",
            message: "No such conf",
        };
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(err.to_string(), "No such conf");
    }

    #[test]
    fn test_denied_carries_reason_verbatim() {
        let err = GuardError::denied("user_owns_org", "User is not org owner");
        assert_eq!(err.kind(), FailureKind::Forbidden);
        assert_eq!(err.to_string(), "User is not org owner");
        assert!(matches!(
            err,
            GuardError::AuthorizationDenied {
                guard: "user_owns_org",
                ..
            }
        ));
    }

    #[test]
    fn test_attachment_keys_are_reserved_names() {
        for key in [
            AttachmentKey::Org,
            AttachmentKey::Conf,
            AttachmentKey::Task,
            AttachmentKey::Sub,
            AttachmentKey::ValidOrgs,
            AttachmentKey::Subs,
        ] {
            assert!(key.as_str().starts_with('_'), "{key} should be underscored");
        }
    }
}
