//! Identifiers, redacted secrets, and the normalized token and user records.

pub mod id;
pub mod secret;
pub mod token;
pub mod user;

pub use id::*;
pub use secret::*;
pub use token::*;
pub use user::*;
