//! The Fundlens aggregation engine.
//!
//! Turns donation records into cross-tabulated, column-complete, and
//! deterministically sorted [`ReportTable`]s. The engine is pure per
//! request: each report builds its own group set from scratch; the only
//! shared state is the injected [`cache::ReportCache`].
//!
//! [`ReportTable`]: fundlens_core::report::ReportTable

pub mod aggregate;
pub mod assemble;
pub mod cache;
pub mod engine;
pub mod error;

pub use cache::{MemoryCache, NoCache, ReportCache};
pub use engine::ReportEngine;
pub use error::{EngineError, Result};
