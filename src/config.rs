//! Run-wide settings with the defaults of the original option surface.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors;

/// A byte count that parses from human-friendly strings such as "500MB",
/// "2GB" or "1024".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemoryFootprint {
    bytes: usize,
}

impl MemoryFootprint {
    pub fn from_bytes(bytes: usize) -> Self {
        MemoryFootprint { bytes }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl FromStr for MemoryFootprint {
    type Err = errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || errors::Error::InvalidFootprint {
            value: s.to_owned(),
        };
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or_else(|| trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let number: f64 = number.parse().map_err(|_| parse_err())?;
        if !number.is_finite() || number < 0.0 {
            return Err(parse_err());
        }
        let multiplier: usize = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "KB" | "K" => 1000,
            "MB" | "M" => 1000 * 1000,
            "GB" | "G" => 1000 * 1000 * 1000,
            "TB" | "T" => 1000 * 1000 * 1000 * 1000,
            _ => return Err(parse_err()),
        };
        Ok(MemoryFootprint {
            bytes: (number * multiplier as f64) as usize,
        })
    }
}

impl TryFrom<String> for MemoryFootprint {
    type Error = errors::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemoryFootprint> for String {
    fn from(footprint: MemoryFootprint) -> String {
        footprint.to_string()
    }
}

impl fmt::Display for MemoryFootprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}B", self.bytes)
    }
}

/// Order in which per-contig output is emitted, independent of the order
/// regions happen to complete in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContigOrder {
    AsInReferenceIndex,
    AsInReferenceIndexReversed,
    LexAscending,
    LexDescending,
    ContigSizeAscending,
    ContigSizeDescending,
}

impl Default for ContigOrder {
    fn default() -> Self {
        ContigOrder::AsInReferenceIndex
    }
}

impl FromStr for ContigOrder {
    type Err = errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "as-in-reference-index" => ContigOrder::AsInReferenceIndex,
            "as-in-reference-index-reversed" => ContigOrder::AsInReferenceIndexReversed,
            "lex-ascending" => ContigOrder::LexAscending,
            "lex-descending" => ContigOrder::LexDescending,
            "contig-size-ascending" => ContigOrder::ContigSizeAscending,
            "contig-size-descending" => ContigOrder::ContigSizeDescending,
            _ => {
                return Err(errors::Error::InvalidContigOrder {
                    value: s.to_owned(),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Worker threads for region processing.
    pub threads: usize,
    /// Ploidy assumed for contigs without an explicit entry.
    pub organism_ploidy: u32,
    /// Per-contig ploidy overrides.
    pub contig_ploidies: HashMap<String, u32>,
    pub contig_output_order: ContigOrder,
    /// Cap on cached reference sequence.
    pub max_reference_cache_footprint: MemoryFootprint,
    /// Soft cap on buffered read data across all workers.
    pub target_read_buffer_footprint: MemoryFootprint,
    /// Regions with more candidate haplotypes than this are skipped.
    pub haplotype_overflow: usize,
    /// Haplotype count above which the generator starts holding out alleles.
    pub haplotype_holdout_threshold: usize,
    /// Holdout attempts before the region is given up as skipped.
    pub max_holdout_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let mut contig_ploidies = HashMap::new();
        contig_ploidies.insert("Y".to_owned(), 1);
        contig_ploidies.insert("MT".to_owned(), 1);
        Settings {
            threads: 1,
            organism_ploidy: 2,
            contig_ploidies,
            contig_output_order: ContigOrder::default(),
            max_reference_cache_footprint: "500MB".parse().unwrap(),
            target_read_buffer_footprint: "2GB".parse().unwrap(),
            haplotype_overflow: 16384,
            haplotype_holdout_threshold: 2048,
            max_holdout_depth: 3,
        }
    }
}

impl Settings {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let settings: Settings =
            serde_yaml::from_reader(file).map_err(|source| errors::Error::InvalidSettingsFile {
                path: path.as_ref().to_owned(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(errors::Error::InvalidThreadCount {
                count: self.threads,
            }
            .into());
        }
        if self.haplotype_holdout_threshold > self.haplotype_overflow {
            return Err(errors::Error::InvalidHoldoutThreshold {
                threshold: self.haplotype_holdout_threshold,
                overflow: self.haplotype_overflow,
            }
            .into());
        }
        Ok(())
    }

    pub fn ploidy_of(&self, contig: &str) -> u32 {
        self.contig_ploidies
            .get(contig)
            .copied()
            .unwrap_or(self.organism_ploidy)
    }
}
