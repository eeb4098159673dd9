use itertools::Itertools;
use rust_lapper::{
    Interval,
    Lapper,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::typedef::{
    PosType,
    Uid,
};

/// Spatial index over the container children of one parent feature.
///
/// Coordinates are 1-based and closed, as in GFF3/GTF. A feature `[start,
/// end]` is stored as the half-open `[start, end + 1)`. A zero-length feature
/// (`end <= start`) is widened to `[start, start + pad)`. Queries are
/// converted the same way, so a feature touching the last base of a
/// container overlaps it and a zero-width feature finds itself.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct IntervalIndex {
    pad:   PosType,
    inner: Lapper<PosType, Uid>,
}

impl IntervalIndex {
    pub fn new(pad: PosType) -> Self {
        Self {
            pad,
            inner: Lapper::new(vec![]),
        }
    }

    fn bounds(
        &self,
        start: PosType,
        end: PosType,
    ) -> (PosType, PosType) {
        if end <= start {
            (start, start.saturating_add(self.pad.max(1)))
        }
        else {
            (start, end.saturating_add(1))
        }
    }

    pub fn insert(
        &mut self,
        start: PosType,
        end: PosType,
        uid: Uid,
    ) {
        let (start, stop) = self.bounds(start, end);
        self.inner.insert(Interval {
            start,
            stop,
            val: uid,
        });
    }

    /// All indexed features overlapping the closed range `[start, end]`.
    pub fn query(
        &self,
        start: PosType,
        end: PosType,
    ) -> Vec<&Uid> {
        let (start, stop) = self.bounds(start, end);
        self.inner
            .find(start, stop)
            .map(|iv| &iv.val)
            .unique()
            .collect_vec()
    }

    pub fn remove(
        &mut self,
        uid: &Uid,
    ) -> bool {
        let before = self.inner.len();
        let kept = self
            .inner
            .iter()
            .filter(|iv| &iv.val != uid)
            .cloned()
            .collect_vec();
        if kept.len() == before {
            return false;
        }
        self.inner = Lapper::new(kept);
        true
    }

    pub fn contains(
        &self,
        uid: &Uid,
    ) -> bool {
        self.inner.iter().any(|iv| &iv.val == uid)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn pad(&self) -> PosType {
        self.pad
    }
}
