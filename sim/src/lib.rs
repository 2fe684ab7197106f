//! Cycle-level simulator of the five-stage Y86-64 pipeline.
//!
//! A program is read from a `.yo` object file with [`load`], committed to a
//! [`framework::Memory`] and clocked by [`PipeSim`] until a halted or faulted
//! instruction reaches the write back stage.
mod dsl;
pub mod error;
pub mod framework;
pub mod isa;
pub mod object;
pub mod stages;
pub mod utils;

pub use error::LoadError;
pub use framework::PipeSim;
pub use object::{load, ObjectFile};
pub use utils::mem_diff;
