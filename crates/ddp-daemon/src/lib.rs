//! ddp-daemon
//!
//! Async orchestration around the pure `ddp-risk` core: account sampling with
//! a bounded timeout, the three scheduled ticks behind one overlap guard, the
//! engine event bus, control operations, and reports.

pub mod api_types;
pub mod collaborators;
pub mod monitor;
pub mod replay;
pub mod scheduler;
pub mod state;

pub use api_types::*;
pub use collaborators::*;
pub use monitor::DrawdownMonitor;
