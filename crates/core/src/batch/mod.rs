//! Batch finalization.
//!
//! A batch is the unit of atomicity and reversal: one finalize event over
//! one or more staged payments, recorded immutably and debited against the
//! touched budget lines.

pub mod error;
pub mod finalizer;
pub mod types;
pub mod view;


pub use error::FinalizeError;
pub use finalizer::Finalizer;
pub use types::{
    ArchivedPayment, Batch, BatchStatus, FinalizeContext, LineDebit, WhtReturnEntry,
};
pub use view::RetentionView;
