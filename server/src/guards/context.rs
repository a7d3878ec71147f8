use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::{AttachmentKey, GuardError, GuardResult};
use crate::models::{Conference, Organization, Submission, Task, User};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Default)]
struct Attachments {
    org: Option<Organization>,
    conf: Option<Conference>,
    task: Option<Task>,
    sub: Option<Submission>,
    valid_orgs: Option<Vec<Organization>>,
    subs: Option<Vec<Submission>>,
}

/// Request state threaded through a guard chain.
///
/// Holds the principal, the raw route parameters, and whatever the guards
/// have attached so far. Guards never mutate a context in place; each
/// `attach_*` call consumes the value and returns the extended one.
#[derive(Debug, Clone)]
pub struct GuardContext {
    principal: User,
    params: Arc<HashMap<String, String>>,
    attachments: Attachments,
}

impl GuardContext {
    pub fn new(principal: User, params: HashMap<String, String>) -> Self {
        Self {
            principal,
            params: Arc::new(params),
            attachments: Attachments::default(),
        }
    }

    pub fn principal(&self) -> &User {
        &self.principal
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Looks up every name in `names`, failing on the first one the route
    /// did not provide.
    pub fn require<const N: usize>(
        &self,
        guard: &'static str,
        names: [&'static str; N],
        message: &'static str,
    ) -> GuardResult<[&str; N]> {
        let mut values = [""; N];
        for (slot, name) in values.iter_mut().zip(names) {
            *slot = self.param(name).ok_or(GuardError::MissingParameter {
                guard,
                param: name,
                message,
            })?;
        }
        Ok(values)
    }

    pub fn attach_org(self, org: Organization) -> Self {
        Self {
            attachments: Attachments {
                org: Some(org),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn attach_conf(self, conf: Conference) -> Self {
        Self {
            attachments: Attachments {
                conf: Some(conf),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn attach_task(self, task: Task) -> Self {
        Self {
            attachments: Attachments {
                task: Some(task),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn attach_sub(self, sub: Submission) -> Self {
        Self {
            attachments: Attachments {
                sub: Some(sub),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn attach_valid_orgs(self, orgs: Vec<Organization>) -> Self {
        Self {
            attachments: Attachments {
                valid_orgs: Some(orgs),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn attach_subs(self, subs: Vec<Submission>) -> Self {
        Self {
            attachments: Attachments {
                subs: Some(subs),
                ..self.attachments
            },
            ..self
        }
    }

    pub fn org(&self) -> GuardResult<&Organization> {
        attached(self.attachments.org.as_ref(), AttachmentKey::Org)
    }

    pub fn conf(&self) -> GuardResult<&Conference> {
        attached(self.attachments.conf.as_ref(), AttachmentKey::Conf)
    }

    pub fn task(&self) -> GuardResult<&Task> {
        attached(self.attachments.task.as_ref(), AttachmentKey::Task)
    }

    pub fn sub(&self) -> GuardResult<&Submission> {
        attached(self.attachments.sub.as_ref(), AttachmentKey::Sub)
    }

    pub fn valid_orgs(&self) -> GuardResult<&[Organization]> {
        attached(self.attachments.valid_orgs.as_deref(), AttachmentKey::ValidOrgs)
    }

    pub fn subs(&self) -> GuardResult<&[Submission]> {
        attached(self.attachments.subs.as_deref(), AttachmentKey::Subs)
    }
}

fn attached<T: ?Sized>(value: Option<&T>, key: AttachmentKey) -> GuardResult<&T> {
    value.ok_or(GuardError::NotAttached { key })
}

/// Handlers behind a guarded route receive the context the chain produced.
#[async_trait]
impl<S> FromRequestParts<S> for GuardContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<GuardContext>().cloned().ok_or_else(|| {
            AppError::InternalServerError("Route is not protected by a guard chain".to_string())
        })
    }
}
