//! Credential primitives: password hashing/verification and opaque
//! token generation.

mod password;
mod token;

pub use password::hash_password;
pub use password::validate_password;
pub use password::verify_password;
pub use token::generate_token;
