//! Nearest-intersection association builder.
//!
//! For every address and POI without an association, the nearest
//! intersection strictly closer than `max_distance_m` is looked up in the
//! intersection index and attached with its great-circle distance.  Points
//! with no intersection in range stay unassociated.
//!
//! Only unassociated points are visited, so re-running the builder is cheap
//! and never changes an existing association.  Work proceeds in batches of
//! `batch_size` points; each batch is published like a load batch.  A batch
//! only writes place pages, so its staging copy shares the graph and every
//! index with the snapshot it started from.
//!
//! With the `parallel` feature and `parallel = true`, the lookups of a batch
//! run on the Rayon pool; the edges themselves are always attached
//! sequentially.

use std::sync::Arc;

use tracing::info;

use sg_core::{EngineConfig, GeoPoint, NodeId, PlaceKey};
use sg_spatial::SpatialIndex;
use sg_store::{Association, Snapshot};

use crate::error::IngestResult;
use crate::loader::Publisher;

/// Outcome of one association run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociationReport {
    /// Unassociated points at the start of the run.
    pub candidates:   usize,
    pub associated:   usize,
    /// Points with no intersection within the distance bound.
    pub out_of_range: usize,
    pub batches:      usize,
}

#[derive(Copy, Clone, Debug)]
pub struct AssociationBuilder {
    batch_size:     usize,
    max_distance_m: f64,
    parallel:       bool,
}

impl AssociationBuilder {
    pub fn new(batch_size: usize, max_distance_m: f64) -> Self {
        Self { batch_size: batch_size.max(1), max_distance_m, parallel: false }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.association_batch_size, config.association_max_distance_m)
            .with_parallel(config.association_parallel)
    }

    /// Request parallel lookups.  Ignored unless built with `parallel`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Associate every unassociated place of `base`.
    ///
    /// Fails with `NotProvisioned` if the intersection index does not exist.
    pub fn run<P>(&self, mut base: Arc<Snapshot>, publisher: &mut P) -> IngestResult<AssociationReport>
    where
        P: Publisher + ?Sized,
    {
        base.require_indexes()?;
        let pending = base.unassociated();
        let mut report = AssociationReport { candidates: pending.len(), ..Default::default() };

        for chunk in pending.chunks(self.batch_size) {
            let hits = self.lookup(&base, chunk)?;
            let mut next = (*base).clone();
            let before = report.associated;
            for (&(key, _), hit) in chunk.iter().zip(hits) {
                match hit {
                    Some((intersection, length)) => {
                        if next.associate(key, Association { intersection, length })? {
                            report.associated += 1;
                        }
                    }
                    None => report.out_of_range += 1,
                }
            }
            base = publisher.publish(next)?;
            info!(
                batch = report.batches,
                points = chunk.len(),
                associated = report.associated - before,
                "association batch committed"
            );
            report.batches += 1;
        }

        info!(
            candidates = report.candidates,
            associated = report.associated,
            out_of_range = report.out_of_range,
            batches = report.batches,
            parallel = self.parallel,
            "association finished"
        );
        Ok(report)
    }

    fn lookup(
        &self,
        snapshot: &Snapshot,
        chunk: &[(PlaceKey, GeoPoint)],
    ) -> IngestResult<Vec<Option<(NodeId, f64)>>> {
        let index = &snapshot.require_indexes()?.intersections;
        let max = self.max_distance_m;

        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;
            return Ok(chunk.par_iter().map(|&(_, p)| nearest_within(index, p, max)).collect());
        }

        Ok(chunk.iter().map(|&(_, p)| nearest_within(index, p, max)).collect())
    }
}

fn nearest_within(index: &SpatialIndex<NodeId>, p: GeoPoint, max: f64) -> Option<(NodeId, f64)> {
    index.nearest(p, 1, Some(max)).first().map(|n| (n.item, n.distance_m))
}
