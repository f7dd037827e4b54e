//! Per-read, per-haplotype log-likelihood storage.
//!
//! The cache is primed once per (region, sample) with the vectors produced
//! by the pairwise aligner and is dropped at region end. Querying an
//! unprimed cache, an unknown sample or an unknown handle is a programmer
//! error and panics; the evaluation code upstream guarantees every
//! genotype it proposes refers to installed haplotypes.

use std::collections::HashMap;

use crate::calling::PairwiseAligner;
use crate::haplotypes::{HaplotypeHandle, HaplotypeSet};
use crate::variants::AlignedRead;
use crate::SampleName;

#[derive(Debug, Default)]
struct SampleLikelihoods {
    by_handle: HashMap<HaplotypeHandle, Vec<f64>>,
    read_count: usize,
}

/// Two-level mapping sample → haplotype handle → per-read log-likelihoods.
#[derive(Debug, Default)]
pub struct HaplotypeLikelihoodCache {
    samples: HashMap<SampleName, SampleLikelihoods>,
    current: Option<SampleName>,
}

impl HaplotypeLikelihoodCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the per-haplotype vectors for one sample and makes it the
    /// current sample for implicit-sample queries. All vectors must have
    /// the sample's read count as their length.
    pub fn prime(
        &mut self,
        sample: impl Into<SampleName>,
        likelihoods: Vec<(HaplotypeHandle, Vec<f64>)>,
    ) {
        let sample = sample.into();
        let read_count = likelihoods.first().map_or(0, |(_, v)| v.len());
        assert!(
            likelihoods.iter().all(|(_, v)| v.len() == read_count),
            "likelihood vectors for sample {} differ in length",
            sample
        );
        let by_handle: HashMap<_, _> = likelihoods.into_iter().collect();
        self.samples.insert(
            sample.clone(),
            SampleLikelihoods {
                by_handle,
                read_count,
            },
        );
        self.current = Some(sample);
    }

    /// Runs the aligner over every (read, haplotype) pair and primes the
    /// cache with the resulting vectors.
    pub fn populate(
        &mut self,
        sample: impl Into<SampleName>,
        haplotypes: &HaplotypeSet,
        reads: &[AlignedRead],
        aligner: &dyn PairwiseAligner,
    ) {
        let likelihoods = haplotypes
            .iter()
            .map(|(handle, haplotype)| {
                let scores = reads
                    .iter()
                    .map(|read| aligner.align(read, haplotype))
                    .collect();
                (handle, scores)
            })
            .collect();
        self.prime(sample, likelihoods);
    }

    pub fn is_primed(&self) -> bool {
        self.current.is_some()
    }

    /// Switches the implicit sample used by [`Self::get`].
    pub fn select_sample(&mut self, sample: &str) {
        assert!(
            self.samples.contains_key(sample),
            "sample {} has not been primed",
            sample
        );
        self.current = Some(sample.to_owned());
    }

    fn current_sample(&self) -> &SampleLikelihoods {
        let sample = self
            .current
            .as_ref()
            .expect("haplotype likelihood cache queried before priming");
        &self.samples[sample]
    }

    /// Log-likelihood vector of a haplotype for the current sample.
    pub fn get(&self, handle: HaplotypeHandle) -> &[f64] {
        Self::lookup(self.current_sample(), handle)
    }

    pub fn get_for_sample(&self, sample: &str, handle: HaplotypeHandle) -> &[f64] {
        let sample_likelihoods = self
            .samples
            .get(sample)
            .unwrap_or_else(|| panic!("sample {} has not been primed", sample));
        Self::lookup(sample_likelihoods, handle)
    }

    fn lookup(sample: &SampleLikelihoods, handle: HaplotypeHandle) -> &[f64] {
        sample
            .by_handle
            .get(&handle)
            .unwrap_or_else(|| panic!("unknown haplotype handle {:?}", handle))
    }

    /// Read count of the current sample.
    pub fn read_count(&self) -> usize {
        self.current_sample().read_count
    }

    pub fn contains(&self, handle: HaplotypeHandle) -> bool {
        self.current
            .as_ref()
            .map_or(false, |s| self.samples[s].by_handle.contains_key(&handle))
    }

    /// Drops all state; the cache must be primed again before use.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.current = None;
    }
}
