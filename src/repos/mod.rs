//! Persistence layer: the user directory and the token
//! issuer/consumer, plus the invalidation rules that run inside their
//! transactions.

mod invalidation;
mod token;
mod user;

pub use token::ConsumeMutation;
pub use token::TokenRepository;
pub use user::UserRepository;

pub(crate) use user::hash_password_blocking;
