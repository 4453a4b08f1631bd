//! The `utils` module provides the definitions shared by every part of the
//! `statusbot` application: the error enums for each failure domain and the
//! tracing initialisation used by the binary.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests;
