//! Base types and error handling.
//!
//! - [`NetError`]: every terminal outcome of a call other than a response
//! - [`context`]: helpers that turn IO failures into retry-matchable errors

pub mod context;
pub mod neterror;

pub use neterror::NetError;
