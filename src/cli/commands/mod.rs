mod seed;
mod staff;
mod wipe;

pub use seed::{cmd_seed_chances, cmd_seed_tasks};
pub use staff::cmd_create_staff;
pub use wipe::{cmd_wipe_chances, cmd_wipe_tasks};
