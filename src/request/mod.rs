//! Call orchestration.
//!
//! A [`RequestJob`] owns the merged [`Options`](crate::options::Options) of
//! one call and loops over attempts until a response is final or an error ends
//! the call:
//!
//! ```text
//! resolve body -> Init hooks
//! loop {
//!     BeforeRequest hooks -> adapter -> AfterResponse hooks
//!     -> retry engine -> redirect engine
//! }
//! ```

pub mod job;

pub use job::RequestJob;
