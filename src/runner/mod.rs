//! Loop runner module - the generate-render-repair loop.
//!
//! `RepairLoop` owns the state machine; generators, renderers and recorders
//! are injected so the loop can run against fakes.

mod repair_loop;

pub use repair_loop::{DEFAULT_MAX_ATTEMPTS, LoopState, RepairLoop};
