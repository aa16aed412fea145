//! Publisher adapters

pub mod linkedin;
pub mod oauth1;
pub mod x;

pub use linkedin::LinkedInPublisher;
pub use oauth1::OAuth1Credentials;
pub use x::{XPublisher, XWriteCredentials};
