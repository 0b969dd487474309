//! Part state store.
//!
//! Every completed `(part, step)` leaves a record of the inputs that produced
//! it. The lifecycle executor consults these records to skip work that is
//! already done, and the clean orchestrator removes them.

mod store;
mod types;

pub use store::StateStore;
pub use types::{StateError, StateRecord, StepInputs};
