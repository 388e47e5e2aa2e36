//! Engine configuration.
//!
//! Defaults: 10 000-row load batches, 1 000-point association batches and a
//! 200 m association bound.
//! Loading a config from files or the environment is the embedding
//! application's concern; with the `serde` feature the struct deserializes
//! directly from any serde format.

use crate::{CoreError, CoreResult};

/// Tunables for ingestion, association and text ranking.
///
/// None of these affect correctness except `association_max_distance_m`,
/// which defines which points are routable at all.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Rows per atomically published ingestion batch.
    pub load_batch_size: usize,

    /// Points processed per association batch.
    pub association_batch_size: usize,

    /// Strict upper bound (metres) on the nearest-intersection distance.
    pub association_max_distance_m: f64,

    /// Compute nearest intersections of a batch on the Rayon pool.  Only has
    /// an effect when `sg-ingest` is built with the `parallel` feature.
    pub association_parallel: bool,

    /// BM25 term-frequency saturation.
    pub bm25_k1: f64,

    /// BM25 document-length normalization.
    pub bm25_b: f64,

    /// Result count used when a caller does not pass a search limit.
    pub default_search_limit: usize,
}

impl EngineConfig {
    pub const DEFAULT_LOAD_BATCH_SIZE: usize = 10_000;
    pub const DEFAULT_ASSOCIATION_BATCH_SIZE: usize = 1_000;
    pub const DEFAULT_ASSOCIATION_MAX_DISTANCE_M: f64 = 200.0;

    /// Reject settings that would make loading or association meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        if self.load_batch_size == 0 {
            return Err(CoreError::Config("load_batch_size must be > 0".into()));
        }
        if self.association_batch_size == 0 {
            return Err(CoreError::Config("association_batch_size must be > 0".into()));
        }
        if !self.association_max_distance_m.is_finite() || self.association_max_distance_m <= 0.0 {
            return Err(CoreError::Config(format!(
                "association_max_distance_m must be a positive finite distance, got {}",
                self.association_max_distance_m
            )));
        }
        if !self.bm25_k1.is_finite() || self.bm25_k1 < 0.0 {
            return Err(CoreError::Config(format!("bm25_k1 must be >= 0, got {}", self.bm25_k1)));
        }
        if !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(CoreError::Config(format!("bm25_b must be in [0, 1], got {}", self.bm25_b)));
        }
        if self.default_search_limit == 0 {
            return Err(CoreError::Config("default_search_limit must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            load_batch_size:            Self::DEFAULT_LOAD_BATCH_SIZE,
            association_batch_size:     Self::DEFAULT_ASSOCIATION_BATCH_SIZE,
            association_max_distance_m: Self::DEFAULT_ASSOCIATION_MAX_DISTANCE_M,
            association_parallel:       false,
            bm25_k1:                    1.2,
            bm25_b:                     0.75,
            default_search_limit:       25,
        }
    }
}
