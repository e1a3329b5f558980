pub mod config;
pub mod duty;
pub mod roster;

pub use config::Playbook;
pub use duty::Duty;
pub use roster::{Roster, RosterSelector};
