//! Authorization guards.
//!
//! A route declares a [`GuardChain`]; [`middleware::enforce`] runs it after
//! routing and before the handler. Each guard checks one rule against the
//! entity store and either extends the [`GuardContext`] or aborts with a
//! [`GuardError`] that maps to 404 or 403.

pub mod chain;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod middleware;
pub mod primitives;
pub mod submission;

pub use chain::{Guard, GuardChain};
pub use context::GuardContext;
pub use error::{AttachmentKey, FailureKind, GuardError, GuardResult};
pub use lifecycle::{ConferenceIsOpen, TaskIsOpen};
pub use membership::{UserIsActiveParticipant, UserIsMemberOfOrg, UserIsParticipant, UserOwnsOrg};
pub use middleware::guarded;
pub use submission::UserMayEditSubmission;
