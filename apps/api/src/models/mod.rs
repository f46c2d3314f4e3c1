pub mod company;
pub mod contact;
pub mod interview;
pub mod role;

pub use company::{Company, NewCompany};
pub use contact::{Contact, ContactListing, NewContact};
pub use interview::{Interview, InterviewContactLink, InterviewListing, InterviewType, NewInterview};
pub use role::{NewRole, Role, RoleListing};
