pub mod checkins;
pub mod groups;
pub mod posts;
pub mod reflections;
pub mod resources;
pub mod sessions;
pub mod users;

pub use checkins::*;
pub use groups::*;
pub use posts::*;
pub use reflections::*;
pub use resources::*;
pub use sessions::*;
pub use users::*;
