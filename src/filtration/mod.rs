//! Call annotation measures used by downstream filtering.

pub mod measures;

pub use measures::{available_measures, make_measure, CallRecord, MeasureKind};
