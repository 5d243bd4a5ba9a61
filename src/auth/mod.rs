pub mod guard;
pub mod permissions;
pub mod user;

pub use guard::*;
pub use permissions::*;
pub use user::*;
