//! Background workers driving queued operations to a terminal state.
//!
//! Each worker owns one operation type and runs the same shape of loop:
//! sleep, check out the next queued row through the skip-locked selector,
//! decide its fate, commit. Ticks are detached tasks, so a slow decision
//! blocks only the row it holds; the selector keeps peers off that row.

pub mod accrual;
pub mod client;
pub mod withdrawal;

pub use accrual::AccrualPoller;
pub use client::{AccrualClient, AccrualError, AccrualReply};
pub use withdrawal::WithdrawalFinalizer;
