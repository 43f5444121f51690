//! Functional core for justlog.
//!
//! Pure types and functions shared by every storage backend: entry and
//! credential types, the single-table key scheme, the error taxonomy, and the
//! repository traits. Nothing in this crate performs I/O.

pub mod credential;
pub mod entry;
pub mod storage;
pub mod tools;
