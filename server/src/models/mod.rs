pub mod conference;
pub mod organization;
pub mod submission;
pub mod user;

pub use conference::{Conference, Task};
pub use organization::{NewOrganization, Organization, UpdateOrganization};
pub use submission::{NewSubmission, Submission};
pub use user::User;
