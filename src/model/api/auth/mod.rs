mod token;
mod user;

pub use token::{AuthToken, Claims, GuardFailure, AUTHORIZATION_HEADER};
pub use user::{Access, Admin, Authenticated, Role};

#[cfg(test)]
pub use token::examples;
