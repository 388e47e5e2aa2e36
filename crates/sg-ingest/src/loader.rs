//! Batched bulk loader.
//!
//! # Batches
//!
//! Records are consumed in chunks of `batch_size`.  Each chunk is applied to
//! a private clone of the latest snapshot and handed to a [`Publisher`] as a
//! whole, so readers see either all of a batch or none of it.  A batch that
//! hits a fatal error is discarded; batches published before it stay.
//!
//! # Per-row failures
//!
//! | Outcome              | Counted in                    |
//! |----------------------|-------------------------------|
//! | applied (new/merged) | `created` / `updated`         |
//! | no key               | `skipped_missing_key`         |
//! | bad field, bad tags  | `malformed`                   |
//! | unknown endpoint     | `dangling`                    |
//!
//! None of these end the load.

use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info, warn};

use sg_core::EngineConfig;
use sg_network::NetworkError;
use sg_store::Snapshot;

use crate::error::{IngestError, IngestResult, RowError};
use crate::record::Record;
use crate::rows::{address_row, intersection_row, poi_row, segment_row, RecordKind};
use crate::source::CsvSource;

// ── Publisher ─────────────────────────────────────────────────────────────────

/// Receives every completed batch.
///
/// Returns the snapshot the next batch builds on, normally the one just
/// published.
pub trait Publisher {
    fn publish(&mut self, next: Snapshot) -> IngestResult<Arc<Snapshot>>;
}

impl<F> Publisher for F
where
    F: FnMut(Snapshot) -> IngestResult<Arc<Snapshot>>,
{
    fn publish(&mut self, next: Snapshot) -> IngestResult<Arc<Snapshot>> {
        self(next)
    }
}

// ── LoadReport ────────────────────────────────────────────────────────────────

/// Row accounting for one load call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows read from the source.
    pub rows:                usize,
    pub created:             usize,
    pub updated:             usize,
    pub skipped_missing_key: usize,
    pub malformed:           usize,
    pub dangling:            usize,
    /// Batches published.
    pub batches:             usize,
}

impl LoadReport {
    /// Rows that made it into the store.
    pub fn applied(&self) -> usize {
        self.created + self.updated
    }

    pub fn skipped(&self) -> usize {
        self.skipped_missing_key + self.malformed + self.dangling
    }

    fn absorb(&mut self, other: &LoadReport) {
        self.rows += other.rows;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped_missing_key += other.skipped_missing_key;
        self.malformed += other.malformed;
        self.dangling += other.dangling;
        self.batches += other.batches;
    }

    fn count_skip(&mut self, err: &RowError) {
        match err {
            RowError::MissingKey { .. } => self.skipped_missing_key += 1,
            RowError::Malformed { .. } => self.malformed += 1,
            RowError::Dangling { .. } => self.dangling += 1,
        }
    }
}

enum RowFailure {
    Skip(RowError),
    Fatal(IngestError),
}

impl From<RowError> for RowFailure {
    fn from(e: RowError) -> Self {
        RowFailure::Skip(e)
    }
}

impl From<NetworkError> for RowFailure {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::DanglingReference { osmid } => RowFailure::Skip(RowError::Dangling { osmid }),
            NetworkError::InvalidLength { length } => {
                RowFailure::Skip(RowError::malformed("length", format!("invalid length {length}")))
            }
            NetworkError::MissingLocation { .. } => {
                RowFailure::Skip(RowError::malformed("location", "missing"))
            }
            other => RowFailure::Fatal(other.into()),
        }
    }
}

// ── BulkLoader ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
pub struct BulkLoader {
    batch_size: usize,
}

impl BulkLoader {
    /// `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1) }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.load_batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Load already-decoded records of one kind on top of `base`.
    pub fn load<I, P>(
        &self,
        kind: RecordKind,
        base: Arc<Snapshot>,
        records: I,
        publisher: &mut P,
    ) -> IngestResult<LoadReport>
    where
        I: IntoIterator<Item = Record>,
        P: Publisher + ?Sized,
    {
        self.load_rows(kind, base, records.into_iter().map(Ok), publisher)
    }

    /// Load every row of a CSV source.
    pub fn load_csv<R, P>(
        &self,
        kind: RecordKind,
        base: Arc<Snapshot>,
        source: &mut CsvSource<R>,
        publisher: &mut P,
    ) -> IngestResult<LoadReport>
    where
        R: Read,
        P: Publisher + ?Sized,
    {
        self.load_rows(kind, base, source.records(), publisher)
    }

    /// Load rows that may already have failed to decode.
    pub fn load_rows<I, P>(
        &self,
        kind: RecordKind,
        mut base: Arc<Snapshot>,
        rows: I,
        publisher: &mut P,
    ) -> IngestResult<LoadReport>
    where
        I: IntoIterator<Item = Result<Record, RowError>>,
        P: Publisher + ?Sized,
    {
        let mut total = LoadReport::default();
        let mut rows = rows.into_iter().peekable();

        while rows.peek().is_some() {
            let batch_no = total.batches;
            let mut next = (*base).clone();
            let mut report = LoadReport::default();

            for row in rows.by_ref().take(self.batch_size) {
                report.rows += 1;
                let outcome = row.map_err(RowFailure::Skip).and_then(|rec| apply(&mut next, kind, &rec));
                match outcome {
                    Ok(true) => report.created += 1,
                    Ok(false) => report.updated += 1,
                    Err(RowFailure::Skip(reason)) => {
                        debug!(kind = kind.label(), row = total.rows + report.rows, %reason, "row skipped");
                        report.count_skip(&reason);
                    }
                    Err(RowFailure::Fatal(err)) => {
                        warn!(kind = kind.label(), batch = batch_no, error = %err, "batch dropped");
                        return Err(err);
                    }
                }
            }

            base = publisher.publish(next).inspect_err(|err| {
                warn!(kind = kind.label(), batch = batch_no, error = %err, "batch dropped");
            })?;
            report.batches = 1;
            info!(
                kind = kind.label(),
                batch = batch_no,
                rows = report.rows,
                applied = report.applied(),
                skipped = report.skipped(),
                "batch committed"
            );
            total.absorb(&report);
        }

        info!(
            kind = kind.label(),
            rows = total.rows,
            created = total.created,
            updated = total.updated,
            missing_key = total.skipped_missing_key,
            malformed = total.malformed,
            dangling = total.dangling,
            batches = total.batches,
            "load finished"
        );
        Ok(total)
    }
}

/// Apply one record.  `Ok(true)` if it created a new entity.
fn apply(next: &mut Snapshot, kind: RecordKind, rec: &Record) -> Result<bool, RowFailure> {
    match kind {
        RecordKind::Intersection => {
            let row = intersection_row(rec)?;
            let outcome = next
                .upsert_intersection(Some(row.osmid), row.attrs)?
                .ok_or(RowError::MissingKey { field: "osmid" })?;
            Ok(outcome.is_created())
        }
        RecordKind::Segment => {
            let row = segment_row(rec)?;
            Ok(next.upsert_segment(row.from, row.to, row.osmid, row.attrs)?.is_created())
        }
        RecordKind::Address => Ok(next.upsert_address(address_row(rec)?).is_created()),
        RecordKind::PointOfInterest => Ok(next.upsert_poi(poi_row(rec)?).is_created()),
    }
}
