pub mod run;

pub use run::{speed_kmh, RunRecord};
