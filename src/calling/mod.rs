//! The calling surface: the traits the engine consumes, and the closed
//! family of callers addressable by name.
//!
//! Caller families are a tagged enum with a static name table instead of a
//! registry of boxed factories, so selecting one costs a single lookup at
//! configuration time and nothing on the hot path.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;

use crate::errors;
use crate::haplotypes::Haplotype;
use crate::utils;
use crate::variants::{AlignedRead, GenomicRegion};

pub mod scheduler;

pub use scheduler::{
    MemoryBudget, PipelineOutcome, RegionPipeline, RegionReport, RegionResult, RegionScheduler,
    RegionSchedulerBuilder, RunSummary, SkipCause,
};

/// Pairwise read-vs-haplotype scoring: `ln P(read | haplotype)` under an
/// error model implemented upstream.
pub trait PairwiseAligner: Sync {
    fn align(&self, read: &AlignedRead, haplotype: &Haplotype) -> f64;
}

/// Supplies the active read set of a sample over a region.
pub trait ReadSource {
    fn reads(&mut self, region: &GenomicRegion, sample: &str) -> Result<Vec<AlignedRead>>;
}

/// Fetches reads with bounded backoff against transient I/O failures.
/// Once the attempts are exhausted the region fails with `ReadExhausted`;
/// the run continues.
pub fn fetch_reads_with_retries(
    source: &mut dyn ReadSource,
    region: &GenomicRegion,
    sample: &str,
    attempts: u32,
    base_delay: Duration,
) -> Result<Vec<AlignedRead>> {
    utils::with_backoff(attempts, base_delay, || source.reads(region, sample)).map_err(|source| {
        errors::Error::ReadExhausted {
            what: format!("{} reads in {}", sample, region),
            attempts,
            source,
        }
        .into()
    })
}

/// The closed set of caller families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerKind {
    Individual,
    Population,
    Cancer,
    Trio,
    Polyclone,
}

impl CallerKind {
    pub fn name(&self) -> &'static str {
        match self {
            CallerKind::Individual => "individual",
            CallerKind::Population => "population",
            CallerKind::Cancer => "cancer",
            CallerKind::Trio => "trio",
            CallerKind::Polyclone => "polyclone",
        }
    }
}

lazy_static! {
    static ref CALLER_MAKERS: HashMap<&'static str, CallerKind> = {
        let mut makers = HashMap::new();
        for kind in [
            CallerKind::Individual,
            CallerKind::Population,
            CallerKind::Cancer,
            CallerKind::Trio,
            CallerKind::Polyclone,
        ] {
            makers.insert(kind.name(), kind);
        }
        makers
    };
}

pub fn available_callers() -> Vec<&'static str> {
    let mut names: Vec<_> = CALLER_MAKERS.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn make_caller(name: &str) -> Result<CallerKind, errors::Error> {
    CALLER_MAKERS
        .get(name)
        .copied()
        .ok_or_else(|| errors::Error::UnknownCaller {
            name: name.to_owned(),
            known: available_callers().join(", "),
        })
}
