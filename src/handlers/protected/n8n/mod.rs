pub mod token;

pub use token::{token_get, token_rotate};
pub use webhook_test::webhook_test;
