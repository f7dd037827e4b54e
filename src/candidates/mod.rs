//! Candidate variant proposal.
//!
//! Discovery itself (CIGAR walking, local assembly) lives upstream; this
//! module defines the generator contract and the composition that unions
//! and deduplicates candidates from several generators for one region.

use anyhow::Result;

use crate::variants::{GenomicRegion, Variant};

pub mod external;

pub trait CandidateGenerator {
    fn generate(&mut self, region: &GenomicRegion) -> Result<Vec<Variant>>;
}

/// Composes several candidate generators; their outputs are unioned,
/// sorted by position and alleles, and deduplicated.
#[derive(Default)]
pub struct CandidateRegistry {
    generators: Vec<Box<dyn CandidateGenerator + Send>>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, generator: Box<dyn CandidateGenerator + Send>) {
        self.generators.push(generator);
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn generate(&mut self, region: &GenomicRegion) -> Result<Vec<Variant>> {
        let mut candidates = Vec::new();
        for generator in &mut self.generators {
            candidates.extend(generator.generate(region)?);
        }
        candidates.sort_unstable();
        candidates.dedup();
        debug!("{} candidates in {}", candidates.len(), region);
        Ok(candidates)
    }
}

impl CandidateGenerator for CandidateRegistry {
    fn generate(&mut self, region: &GenomicRegion) -> Result<Vec<Variant>> {
        CandidateRegistry::generate(self, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Variant>);

    impl CandidateGenerator for Fixed {
        fn generate(&mut self, _region: &GenomicRegion) -> Result<Vec<Variant>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn union_is_sorted_and_deduplicated() {
        let mut registry = CandidateRegistry::new();
        registry.register(Box::new(Fixed(vec![
            Variant::new(10, "A", "T"),
            Variant::new(5, "C", "G"),
        ])));
        registry.register(Box::new(Fixed(vec![
            Variant::new(10, "A", "T"),
            Variant::new(10, "A", "C"),
        ])));
        let region = GenomicRegion::new("1", 0, 100);
        let candidates = registry.generate(&region).unwrap();
        assert_eq!(
            candidates,
            vec![
                Variant::new(5, "C", "G"),
                Variant::new(10, "A", "C"),
                Variant::new(10, "A", "T"),
            ]
        );
    }

    #[test]
    fn empty_registry_produces_no_candidates() {
        let mut registry = CandidateRegistry::new();
        let region = GenomicRegion::new("1", 0, 100);
        assert!(registry.generate(&region).unwrap().is_empty());
    }
}
