//! Typed errors of the simulator library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the data/instruction memory.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("memory address out of bounds: {0:#x}")]
    OutOfBounds(u64),
}

/// Errors raised by the register file.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register id: {0:#x}")]
    InvalidId(u8),
}

/// Errors that reject an object file before any cycle runs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read object file '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("object file '{0}' does not have the .yo extension")]
    Extension(PathBuf),

    #[error("malformed record on line {line}: {text:?}")]
    Malformed { line: usize, text: String },

    #[error("address {addr:#05x} on line {line} is below the end of the previous record ({last:#05x})")]
    AddressOrder { line: usize, addr: u64, last: u64 },

    #[error("data on line {line} overflows memory")]
    Overflow { line: usize },
}
