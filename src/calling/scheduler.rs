//! Region scheduling: a worker pool drives each region through the
//! pipeline end-to-end, progress is metered per completion, and output is
//! re-assembled into the configured contig order no matter which worker
//! finishes first.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use anyhow::Result;
use crossbeam::channel::bounded;
use crossbeam::thread::scope;
use derive_builder::Builder;
use strum_macros::Display;

use crate::config::ContigOrder;
use crate::progress::ProgressMeter;
use crate::variants::GenomicRegion;

/// Why a region was given up without calls. Skips are terminal for the
/// region but never for the run.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SkipCause {
    #[strum(serialize = "haplotype overflow")]
    HaplotypeOverflow { count: usize, limit: usize },
    #[strum(serialize = "holdout attempts exhausted")]
    HoldoutExhausted { attempts: usize },
}

/// What a pipeline run over one region produced.
pub enum PipelineOutcome<T> {
    Completed(T),
    Skipped(SkipCause),
}

/// One region's trip through the pipeline: candidate generation,
/// haplotype construction, likelihoods and calling, implemented upstream.
pub trait RegionPipeline: Sync {
    type Output: Send;

    fn process(&self, region: &GenomicRegion) -> Result<PipelineOutcome<Self::Output>>;
}

/// Terminal state of a region.
#[derive(Debug)]
pub enum RegionResult<T> {
    Completed(T),
    Skipped(SkipCause),
    Failed(String),
}

#[derive(Debug)]
pub struct RegionReport<T> {
    pub region: GenomicRegion,
    pub result: RegionResult<T>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Regions never started because cancellation was requested.
    pub cancelled: usize,
}

/// Soft byte budget shared by the workers' read buffers. A worker asking
/// for more than is free blocks until another worker releases its share;
/// a request larger than the whole budget is admitted alone rather than
/// deadlocking.
pub struct MemoryBudget {
    max_bytes: usize,
    used: Mutex<usize>,
    released: Condvar,
}

impl MemoryBudget {
    pub fn new(max_bytes: usize) -> Self {
        MemoryBudget {
            max_bytes,
            used: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    pub fn used(&self) -> usize {
        *self.used.lock().unwrap()
    }

    pub fn acquire(&self, bytes: usize) -> BudgetGuard {
        let mut used = self.used.lock().unwrap();
        while *used > 0 && *used + bytes > self.max_bytes {
            used = self.released.wait(used).unwrap();
        }
        *used += bytes;
        BudgetGuard {
            budget: self,
            bytes,
        }
    }
}

pub struct BudgetGuard<'a> {
    budget: &'a MemoryBudget,
    bytes: usize,
}

impl<'a> Drop for BudgetGuard<'a> {
    fn drop(&mut self) {
        let mut used = self.budget.used.lock().unwrap();
        *used -= self.bytes;
        self.budget.released.notify_all();
    }
}

/// Orders regions for output: first by the configured contig rank, then by
/// start position within a contig. Contigs missing from the reference
/// index sort last, by name.
pub fn order_regions(
    mut regions: Vec<GenomicRegion>,
    order: ContigOrder,
    contigs: &[(String, u64)],
) -> Vec<GenomicRegion> {
    let index: std::collections::HashMap<&str, (usize, u64)> = contigs
        .iter()
        .enumerate()
        .map(|(rank, (name, size))| (name.as_str(), (rank, *size)))
        .collect();
    let contig_key = |contig: &str| -> (u8, i64, String) {
        match (order, index.get(contig)) {
            (_, None) => (1, 0, contig.to_owned()),
            (ContigOrder::AsInReferenceIndex, Some((rank, _))) => (0, *rank as i64, String::new()),
            (ContigOrder::AsInReferenceIndexReversed, Some((rank, _))) => {
                (0, -(*rank as i64), String::new())
            }
            (ContigOrder::LexAscending, Some(_)) => (0, 0, contig.to_owned()),
            (ContigOrder::LexDescending, Some(_)) => (0, 0, contig.to_owned()),
            (ContigOrder::ContigSizeAscending, Some((_, size))) => {
                (0, *size as i64, contig.to_owned())
            }
            (ContigOrder::ContigSizeDescending, Some((_, size))) => {
                (0, -(*size as i64), contig.to_owned())
            }
        }
    };
    regions.sort_by(|a, b| {
        let (ka, kb) = (contig_key(a.contig()), contig_key(b.contig()));
        let contig_ordering = if order == ContigOrder::LexDescending {
            ka.0.cmp(&kb.0).then(kb.2.cmp(&ka.2))
        } else {
            ka.cmp(&kb)
        };
        contig_ordering.then(a.start().cmp(&b.start()))
    });
    regions
}

/// Reassembles indexed results into submission order, emitting the longest
/// ready prefix as results arrive.
struct OrderedContainer<T> {
    pending: BTreeMap<usize, T>,
    next: usize,
}

impl<T> OrderedContainer<T> {
    fn new() -> Self {
        OrderedContainer {
            pending: BTreeMap::new(),
            next: 0,
        }
    }

    fn insert(&mut self, index: usize, item: T) {
        self.pending.insert(index, item);
    }

    fn drain_ready(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            ready.push(item);
            self.next += 1;
        }
        ready
    }

    /// Remaining items in index order; used once no more results can
    /// arrive (gaps are then permanent, e.g. after cancellation).
    fn into_remainder(self) -> Vec<T> {
        self.pending.into_iter().map(|(_, item)| item).collect()
    }
}

#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct RegionScheduler {
    #[builder(default = "1")]
    threads: usize,
    #[builder(default)]
    contig_order: ContigOrder,
    /// Reference index order and contig sizes, for output ordering.
    #[builder(default)]
    contigs: Vec<(String, u64)>,
    /// Cooperative cancellation, checked at region boundaries.
    #[builder(default = "Arc::new(AtomicBool::new(false))")]
    cancel: Arc<AtomicBool>,
    /// Shared read-buffer budget handed to pipelines that fetch reads.
    #[builder(default = "Arc::new(MemoryBudget::new(2_000_000_000))")]
    read_budget: Arc<MemoryBudget>,
}

impl RegionScheduler {
    pub fn read_budget(&self) -> Arc<MemoryBudget> {
        Arc::clone(&self.read_budget)
    }

    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Drives every region through the pipeline and hands reports to the
    /// sink in the configured output order. Returns the run summary, or
    /// the first fatal error.
    pub fn run<P, S>(&self, regions: Vec<GenomicRegion>, pipeline: &P, mut sink: S) -> Result<RunSummary>
    where
        P: RegionPipeline,
        S: FnMut(RegionReport<P::Output>) -> Result<()> + Send,
    {
        assert!(self.threads >= 1);
        let ordered = order_regions(regions, self.contig_order, &self.contigs);
        let total = ordered.len();
        let progress = ProgressMeter::new(&ordered);
        let (in_sender, in_receiver) = bounded::<(usize, GenomicRegion)>(2 * self.threads);
        let (out_sender, out_receiver) =
            bounded::<(usize, RegionReport<P::Output>)>(2 * self.threads);

        let summary = scope(|scope| -> Result<RunSummary> {
            let cancel = &self.cancel;
            let progress = &progress;

            scope.spawn(move |_| {
                for (index, region) in ordered.into_iter().enumerate() {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    if in_sender.send((index, region)).is_err() {
                        break;
                    }
                }
                // dropping the sender lets the workers drain and stop
            });

            let workers: Vec<_> = (0..self.threads)
                .map(|_| {
                    let in_receiver = in_receiver.clone();
                    let out_sender = out_sender.clone();
                    scope.spawn(move |_| -> Result<()> {
                        for (index, region) in in_receiver {
                            if cancel.load(Ordering::Relaxed) {
                                break;
                            }
                            let result = match pipeline.process(&region) {
                                Ok(PipelineOutcome::Completed(output)) => {
                                    RegionResult::Completed(output)
                                }
                                Ok(PipelineOutcome::Skipped(cause)) => {
                                    warn!("skipping {}: {}", region, cause);
                                    RegionResult::Skipped(cause)
                                }
                                Err(e) => {
                                    if e.downcast_ref::<crate::errors::Error>()
                                        .map_or(false, |e| e.is_fatal())
                                    {
                                        return Err(e);
                                    }
                                    error!("region {} failed: {}", region, e);
                                    RegionResult::Failed(e.to_string())
                                }
                            };
                            progress.report_completed(&region);
                            let report = RegionReport { region, result };
                            if out_sender.send((index, report)).is_err() {
                                break;
                            }
                        }
                        Ok(())
                    })
                })
                .collect();
            drop(in_receiver);
            drop(out_sender);

            let mut summary = RunSummary::default();
            let mut delivered = 0usize;
            let mut items = OrderedContainer::new();
            let mut emit = |report: RegionReport<P::Output>,
                            summary: &mut RunSummary,
                            delivered: &mut usize|
             -> Result<()> {
                match &report.result {
                    RegionResult::Completed(_) => summary.completed += 1,
                    RegionResult::Skipped(_) => summary.skipped += 1,
                    RegionResult::Failed(_) => summary.failed += 1,
                }
                *delivered += 1;
                sink(report)
            };
            for (index, report) in out_receiver {
                items.insert(index, report);
                for report in items.drain_ready() {
                    emit(report, &mut summary, &mut delivered)?;
                }
            }
            for report in items.into_remainder() {
                emit(report, &mut summary, &mut delivered)?;
            }

            for worker in workers {
                worker.join().expect("worker thread panicked")?;
            }
            summary.cancelled = total - delivered;
            Ok(summary)
        })
        .map_err(|_| anyhow::anyhow!("scheduler thread panicked"))??;

        progress.finish();
        Ok(summary)
    }
}
