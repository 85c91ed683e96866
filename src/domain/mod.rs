//! Domain types for algoviz
//!
//! - GenerationRequest: what the user asked to animate
//! - Attempt: one generate -> render cycle of the repair loop
//! - LoopResult: the single result handed back when the loop terminates

pub mod attempt;
pub mod outcome;
pub mod request;

pub use attempt::{Attempt, AttemptOutcome};
pub use outcome::{FinalOutcome, LoopResult};
pub use request::{GenerationRequest, TemplateMode};
