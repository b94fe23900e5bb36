pub mod controller;
pub mod edge;
pub mod loop_worker;

pub use controller::MonitorController;
pub use edge::MonitorState;
pub use loop_worker::{monitor_loop, EdgeMonitor, TickOutcome};
