//! Parallel construction.
//!
//! Records are grouped by chromosome and each group is turned into features
//! by an independent worker on [`THREAD_POOL`]. Workers only read the
//! [`IdentityAssigner`]; their results are folded into the store on the
//! calling thread once all of them finished.

use indexmap::IndexMap;
use itertools::Itertools;
use log::{
    debug,
    error,
    info,
};
use rayon::prelude::*;

use super::feature::{
    Feature,
    FeatureRecord,
};
use super::identity::IdentityAssigner;
use super::store::{
    AnnotStore,
    BuildReport,
};
use super::typedef::Aid;
use crate::config::{
    BatchPolicy,
    StoreConfig,
};
use crate::error::{
    AnnotError,
    AnnotResult,
};
use crate::utils::THREAD_POOL;

/// Features of one chromosome, grouped by parent reference.
#[derive(Debug, Default)]
pub struct PartitionResult {
    pub chr:      String,
    /// Features without a parent reference.
    pub orphans:  Vec<Feature>,
    /// Features keyed by the parent identifier they reference.
    pub children: IndexMap<Aid, Vec<Feature>>,
    pub rejected: Vec<AnnotError>,
}

impl PartitionResult {
    pub fn n_features(&self) -> usize {
        self.orphans.len()
            + self
                .children
                .values()
                .map(Vec::len)
                .sum::<usize>()
    }

    /// Parentless features first, then children in first-reference order.
    fn into_features(self) -> (Vec<Feature>, Vec<AnnotError>) {
        let features = self
            .orphans
            .into_iter()
            .chain(self.children.into_values().flatten())
            .collect_vec();
        (features, self.rejected)
    }
}

/// Builds the features of a single partition. Under
/// [`BatchPolicy::AllOrNothing`] the first malformed record fails the
/// partition.
pub fn build_partition(
    chr: String,
    records: Vec<FeatureRecord>,
    assigner: &IdentityAssigner,
    batch_policy: BatchPolicy,
) -> AnnotResult<PartitionResult> {
    let mut result = PartitionResult {
        chr,
        ..Default::default()
    };
    for record in records {
        let feature = match assigner.build(record) {
            Ok(feature) => feature,
            Err(err) if batch_policy == BatchPolicy::PartialSuccess => {
                error!("Skipping record on {}: {}", result.chr, err);
                result.rejected.push(err);
                continue;
            },
            Err(err) => return Err(err),
        };
        match feature.parent_aid().cloned() {
            Some(parent) => {
                result
                    .children
                    .entry(parent)
                    .or_default()
                    .push(feature)
            },
            None => result.orphans.push(feature),
        }
    }
    debug!(
        "Partition {}: {} features, {} rejected",
        result.chr,
        result.n_features(),
        result.rejected.len()
    );
    Ok(result)
}

/// Splits records by chromosome, keeping first-seen order.
pub fn partition_by_chr<I>(records: I) -> IndexMap<String, Vec<FeatureRecord>>
where
    I: IntoIterator<Item = FeatureRecord>, {
    let mut partitions: IndexMap<String, Vec<FeatureRecord>> = IndexMap::new();
    for record in records {
        partitions
            .entry(record.chr.clone())
            .or_default()
            .push(record);
    }
    partitions
}

impl AnnotStore {
    /// Builds a store with one worker per chromosome.
    ///
    /// Parent references are resolved after all partitions are merged, so a
    /// parent on another chromosome is still found.
    pub fn from_records_parallel<I>(
        records: I,
        config: StoreConfig,
    ) -> AnnotResult<(Self, BuildReport)>
    where
        I: IntoIterator<Item = FeatureRecord>, {
        let partitions = partition_by_chr(records);
        let n_partitions = partitions.len();
        let assigner = IdentityAssigner::new(config.identity.clone());
        let batch_policy = config.batch_policy;

        let results = THREAD_POOL.install(|| {
            partitions
                .into_iter()
                .collect_vec()
                .into_par_iter()
                .map(|(chr, records)| {
                    build_partition(chr, records, &assigner, batch_policy)
                })
                .collect::<AnnotResult<Vec<_>>>()
        })?;

        let policy = config.duplicate_policy;
        let mut store = AnnotStore::new(config);
        let mut features = Vec::new();
        let mut rejected = Vec::new();
        for result in results {
            let (part_features, part_rejected) = result.into_features();
            features.extend(part_features);
            rejected.extend(part_rejected);
        }
        info!(
            "Built {} features from {} partitions",
            features.len(),
            n_partitions
        );

        let mut report = store.insert_features(features, policy)?;
        report.rejected.extend(rejected);
        Ok((store, report))
    }
}
