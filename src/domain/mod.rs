pub mod error;
pub mod identity;
pub mod provider;
pub mod user;

pub use error::{AccountConflict, InvariantViolation};
pub use identity::Identity;
pub use provider::AuthProvider;
pub use user::User;
