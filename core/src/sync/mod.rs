//! Roster reconciliation
//!
//! `codec` owns the fixed column layouts, `merge` the pure last-write-wins
//! reconciliation, and `engine` drives one full pass against the external
//! store.

pub mod codec;
pub mod engine;
pub mod merge;
