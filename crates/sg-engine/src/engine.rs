//! The `Engine`: published snapshot, writer slot, loading and admin ops.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::info;

use sg_core::{CoreResult, EngineConfig, PlaceKey};
use sg_ingest::{
    AssociationBuilder, AssociationReport, BulkLoader, CsvSource, IngestError, IngestResult,
    LoadReport, Record, RecordKind,
};
use sg_network::{DijkstraRouter, Router};
use sg_store::{SchemaReport, Snapshot, SnapshotStats};

use crate::output::{AddressInfo, IntersectionInfo, PointOfInterest};
use crate::{EngineError, EngineResult};

const POISONED: &str = "engine lock poisoned";

/// Geospatial graph query engine.
///
/// # Concurrency
///
/// The current state is an immutable [`Snapshot`] behind an `Arc`.  Readers
/// clone the `Arc` under a momentary read lock and then work without any
/// lock, so queries never wait on each other or on a writer's work.
///
/// Writers (loads, association, admin ops) first take the writer slot, so
/// at most one runs at a time.  Each batch is applied to a private clone of
/// the current snapshot and made visible with a single pointer swap.
///
/// Create with [`Engine::new`] or [`Engine::with_router`].
pub struct Engine<R: Router = DijkstraRouter> {
    config:    EngineConfig,
    router:    R,
    published: RwLock<Arc<Snapshot>>,
    writer:    Mutex<()>,
}

impl Engine<DijkstraRouter> {
    /// Empty, unprovisioned engine using Dijkstra routing.
    pub fn new(config: EngineConfig) -> CoreResult<Self> {
        Self::with_router(config, DijkstraRouter)
    }
}

impl<R: Router> Engine<R> {
    pub fn with_router(config: EngineConfig, router: R) -> CoreResult<Self> {
        config.validate()?;
        let empty = Snapshot::new(text_params(&config));
        Ok(Self {
            config,
            router,
            published: RwLock::new(Arc::new(empty)),
            writer: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn router(&self) -> &R {
        &self.router
    }

    // ── Snapshot handling ─────────────────────────────────────────────────

    /// The currently published snapshot.  Stays valid (and unchanged) for as
    /// long as the caller holds it, regardless of later writes.
    pub fn snapshot(&self) -> EngineResult<Arc<Snapshot>> {
        self.published
            .read()
            .map(|s| Arc::clone(&*s))
            .map_err(|_| EngineError::Storage(POISONED.into()))
    }

    fn writer_slot(&self) -> EngineResult<MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|_| EngineError::Storage(POISONED.into()))
    }

    fn publish(&self, next: Snapshot) -> IngestResult<Arc<Snapshot>> {
        let next = Arc::new(next);
        let mut slot = self.published.write().map_err(|_| IngestError::Publish(POISONED.into()))?;
        *slot = Arc::clone(&next);
        Ok(next)
    }

    /// Run `f` on a staging copy of the current snapshot under the writer
    /// slot and publish the result.
    fn mutate<T>(&self, f: impl FnOnce(&mut Snapshot) -> EngineResult<T>) -> EngineResult<T> {
        let _slot = self.writer_slot()?;
        let mut next = (*self.snapshot()?).clone();
        let out = f(&mut next)?;
        self.publish(next)?;
        Ok(out)
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Load records of one kind in batches of `load_batch_size`.
    ///
    /// Per-row failures are counted in the report.  An `Err` means the
    /// in-flight batch was dropped; earlier batches remain published.
    pub fn load<I>(&self, kind: RecordKind, records: I) -> EngineResult<LoadReport>
    where
        I: IntoIterator<Item = Record>,
    {
        let _slot = self.writer_slot()?;
        let mut publish = |next: Snapshot| self.publish(next);
        Ok(BulkLoader::from_config(&self.config).load(kind, self.snapshot()?, records, &mut publish)?)
    }

    /// Load a CSV file of one record kind.
    pub fn load_csv(&self, kind: RecordKind, path: &Path) -> EngineResult<LoadReport> {
        let mut source = CsvSource::from_path(path)?;
        self.load_csv_source(kind, &mut source)
    }

    /// Like [`Engine::load_csv`] but accepts any `Read` source.
    pub fn load_csv_reader<Rd: Read>(&self, kind: RecordKind, reader: Rd) -> EngineResult<LoadReport> {
        let mut source = CsvSource::from_reader(reader)?;
        self.load_csv_source(kind, &mut source)
    }

    fn load_csv_source<Rd: Read>(&self, kind: RecordKind, source: &mut CsvSource<Rd>) -> EngineResult<LoadReport> {
        let _slot = self.writer_slot()?;
        let mut publish = |next: Snapshot| self.publish(next);
        Ok(BulkLoader::from_config(&self.config).load_csv(kind, self.snapshot()?, source, &mut publish)?)
    }

    /// Attach the nearest intersection (within the configured bound) to every
    /// address and POI that has none yet.
    pub fn associate(&self) -> EngineResult<AssociationReport> {
        let _slot = self.writer_slot()?;
        let mut publish = |next: Snapshot| self.publish(next);
        Ok(AssociationBuilder::from_config(&self.config).run(self.snapshot()?, &mut publish)?)
    }

    // ── Administration ────────────────────────────────────────────────────

    /// Create the uniqueness constraints and the spatial and text indexes if
    /// they do not exist yet.
    pub fn provision(&self) -> EngineResult<SchemaReport> {
        let _slot = self.writer_slot()?;
        let current = self.snapshot()?;
        if current.is_provisioned() {
            return Ok(SchemaReport::new(false));
        }
        let mut next = (*current).clone();
        let report = next.provision();
        self.publish(next)?;
        info!(indexes = report.indexes.len(), "schema provisioned");
        Ok(report)
    }

    /// Drop every entity and index.  The engine is unprovisioned afterwards.
    pub fn truncate(&self) -> EngineResult<()> {
        let _slot = self.writer_slot()?;
        self.publish(Snapshot::new(text_params(&self.config)))?;
        info!("engine truncated");
        Ok(())
    }

    /// Remove every nearest-intersection association.  Returns how many were
    /// removed.
    pub fn reset_associations(&self) -> EngineResult<usize> {
        let cleared = self.mutate(|s| Ok(s.clear_associations()))?;
        info!(cleared, "associations reset");
        Ok(cleared)
    }

    pub fn stats(&self) -> EngineResult<SnapshotStats> {
        Ok(self.snapshot()?.stats())
    }

    /// Write the current entities as JSON.
    pub fn save_to<W: Write>(&self, writer: W) -> EngineResult<()> {
        let snapshot = self.snapshot()?;
        sg_store::save(&snapshot, writer)?;
        Ok(())
    }

    /// Replace the current state with one written by [`Engine::save_to`].
    pub fn load_from<Rd: Read>(&self, reader: Rd) -> EngineResult<SnapshotStats> {
        let restored = sg_store::restore(reader)?;
        let stats = restored.stats();
        let _slot = self.writer_slot()?;
        self.publish(restored)?;
        Ok(stats)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn intersection(&self, osmid: i64) -> EngineResult<IntersectionInfo> {
        let snapshot = self.snapshot()?;
        let graph = snapshot.graph();
        graph
            .node_by_osmid(osmid)
            .and_then(|n| graph.intersection(n))
            .map(IntersectionInfo::from)
            .ok_or_else(|| EngineError::NotFound(format!("Intersection({osmid})")))
    }

    pub fn address(&self, id: i64) -> EngineResult<AddressInfo> {
        let snapshot = self.snapshot()?;
        snapshot
            .address(id)
            .map(|a| AddressInfo::new(a, &snapshot))
            .ok_or_else(|| EngineError::NotFound(PlaceKey::address(id).to_string()))
    }

    pub fn poi(&self, id: i64) -> EngineResult<PointOfInterest> {
        let snapshot = self.snapshot()?;
        snapshot
            .poi(id)
            .map(PointOfInterest::from)
            .ok_or_else(|| EngineError::NotFound(PlaceKey::poi(id).to_string()))
    }
}

fn text_params(config: &EngineConfig) -> sg_text::Bm25Params {
    sg_text::Bm25Params { k1: config.bm25_k1, b: config.bm25_b }
}
