//! Compensating undo.
//!
//! Exactly reverses one finalized batch: credits back the recorded budget
//! debits, removes the tax-authority and archive sub-records, reverts the
//! originating payments, and flips the batch to `undone` with a receipt of
//! what the compensation actually did.

pub mod engine;
pub mod error;
pub mod types;


pub use engine::UndoEngine;
pub use error::UndoError;
pub use types::UndoOperation;
