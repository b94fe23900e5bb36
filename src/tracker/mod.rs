pub mod state;

pub use state::{RunStatus, RunTracker};
