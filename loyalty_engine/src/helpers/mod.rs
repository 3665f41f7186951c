mod luhn;
mod passwords;

pub use luhn::luhn_valid;
pub use passwords::{hash_password, verify_password};
