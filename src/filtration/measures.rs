//! Per-call annotation measures.
//!
//! Measures are evaluated once per emitted record, so the family is a
//! closed tagged enum dispatched with a `match`; the name table exists
//! only at the configuration boundary where users select measures by
//! string.

use std::collections::HashMap;

use anyhow::Result;

use crate::errors;

/// The slice of an emitted call that measures inspect.
#[derive(Debug, Clone, Default)]
pub struct CallRecord {
    pub depth: u32,
    pub quality: f64,
    pub genotype_quality: Option<f64>,
    /// Observed support per allele, reference first.
    pub allele_counts: Vec<u32>,
    pub strand_bias: Option<f64>,
    pub gc_content: Option<f64>,
}

/// The closed set of measure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    AlleleCount,
    AlleleFrequency,
    Depth,
    Quality,
    QualityByDepth,
    GenotypeQuality,
    StrandBias,
    GCContent,
}

impl MeasureKind {
    pub fn name(&self) -> &'static str {
        match self {
            MeasureKind::AlleleCount => "AC",
            MeasureKind::AlleleFrequency => "AF",
            MeasureKind::Depth => "DP",
            MeasureKind::Quality => "QUAL",
            MeasureKind::QualityByDepth => "QD",
            MeasureKind::GenotypeQuality => "GQ",
            MeasureKind::StrandBias => "SB",
            MeasureKind::GCContent => "GC",
        }
    }

    /// Evaluate against one call; `None` when the record lacks the
    /// required annotation.
    pub fn evaluate(&self, call: &CallRecord) -> Option<f64> {
        match self {
            MeasureKind::AlleleCount => {
                Some(call.allele_counts.iter().skip(1).sum::<u32>() as f64)
            }
            MeasureKind::AlleleFrequency => {
                let total: u32 = call.allele_counts.iter().sum();
                if total == 0 {
                    return None;
                }
                let alt: u32 = call.allele_counts.iter().skip(1).sum();
                Some(f64::from(alt) / f64::from(total))
            }
            MeasureKind::Depth => Some(f64::from(call.depth)),
            MeasureKind::Quality => Some(call.quality),
            MeasureKind::QualityByDepth => {
                if call.depth == 0 {
                    None
                } else {
                    Some(call.quality / f64::from(call.depth))
                }
            }
            MeasureKind::GenotypeQuality => call.genotype_quality,
            MeasureKind::StrandBias => call.strand_bias,
            MeasureKind::GCContent => call.gc_content,
        }
    }
}

const ALL_MEASURES: [MeasureKind; 8] = [
    MeasureKind::AlleleCount,
    MeasureKind::AlleleFrequency,
    MeasureKind::Depth,
    MeasureKind::Quality,
    MeasureKind::QualityByDepth,
    MeasureKind::GenotypeQuality,
    MeasureKind::StrandBias,
    MeasureKind::GCContent,
];

lazy_static! {
    static ref MEASURE_MAKERS: HashMap<&'static str, MeasureKind> = ALL_MEASURES
        .iter()
        .map(|kind| (kind.name(), *kind))
        .collect();
}

pub fn available_measures() -> Vec<&'static str> {
    let mut names: Vec<_> = MEASURE_MAKERS.keys().copied().collect();
    names.sort_unstable();
    names
}

pub fn make_measure(name: &str) -> Result<MeasureKind, errors::Error> {
    MEASURE_MAKERS
        .get(name)
        .copied()
        .ok_or_else(|| errors::Error::UnknownMeasure {
            name: name.to_owned(),
            known: available_measures().join(", "),
        })
}
