mod api;
mod env;
mod reflections;
pub mod utils;

pub use utils::{test_client, test_db};
