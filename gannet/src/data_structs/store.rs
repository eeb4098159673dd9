use std::fs::File;
use std::path::Path;

use hashbrown::HashMap;
use indexmap::{
    IndexMap,
    IndexSet,
};
use itertools::Itertools;
use log::{
    debug,
    error,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::feature::{
    Feature,
    FeatureRecord,
    FeatureTree,
};
use super::identity::IdentityAssigner;
use super::interval::IntervalIndex;
use super::typedef::{
    Aid,
    Uid,
};
use crate::config::{
    BatchPolicy,
    DuplicatePolicy,
    MergePolicy,
    StoreConfig,
};
use crate::error::{
    AnnotError,
    AnnotResult,
    AnnotWarning,
};
use crate::io::reader::AnnotReader;

/// Outcome of an insertion.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Uids registered by the operation, in registration order.
    pub inserted: Vec<Uid>,
    pub warnings: Vec<AnnotWarning>,
    /// Records skipped under [`BatchPolicy::PartialSuccess`].
    pub rejected: Vec<AnnotError>,
}

impl BuildReport {
    fn warn(
        &mut self,
        warning: AnnotWarning,
    ) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn absorb(
        &mut self,
        other: BuildReport,
    ) {
        self.inserted.extend(other.inserted);
        self.warnings.extend(other.warnings);
        self.rejected.extend(other.rejected);
    }
}

/// Outcome of [`AnnotStore::remove`].
#[derive(Debug)]
pub struct Removal {
    /// Subtree as it was before removal.
    pub snapshot: FeatureTree,
    /// Removed uids, descendants first.
    pub removed:  Vec<Uid>,
    pub warnings: Vec<AnnotWarning>,
}

/// Feature displaced by an overwrite, kept so a failed operation can put it
/// back.
#[derive(Debug)]
struct Displaced {
    feature:    Feature,
    parent:     Option<Uid>,
    was_orphan: bool,
    index:      Option<IntervalIndex>,
}

#[derive(Debug, Default)]
struct Journal {
    registered: Vec<Uid>,
    displaced:  Vec<Displaced>,
    /// Orphans linked to a parent registered by the same operation.
    adopted:    Vec<Uid>,
}

/// Hierarchical annotation store.
///
/// Every feature is owned by `by_hash`. Tree links are uid keys: a parent
/// lists its children's uids and each child records its `parent_uid`.
/// `by_aid` maps attribute identifiers to the uids carrying them, in
/// insertion order. When containment placement is configured, `containers`
/// holds one [`IntervalIndex`] per parent over its container-type children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotStore {
    config:     StoreConfig,
    assigner:   IdentityAssigner,
    by_hash:    IndexMap<Uid, Feature>,
    by_aid:     IndexMap<Aid, IndexSet<Uid>>,
    orphans:    IndexSet<Uid>,
    containers: HashMap<Uid, IntervalIndex>,
}

impl Default for AnnotStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl AnnotStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            assigner: IdentityAssigner::new(config.identity.clone()),
            config,
            by_hash: Default::default(),
            by_aid: Default::default(),
            orphans: Default::default(),
            containers: Default::default(),
        }
    }

    /// Builds a store from decoded records using the configured duplicate
    /// policy.
    pub fn from_records<I>(
        records: I,
        config: StoreConfig,
    ) -> AnnotResult<(Self, BuildReport)>
    where
        I: IntoIterator<Item = FeatureRecord>, {
        let policy = config.duplicate_policy;
        let mut store = Self::new(config);
        let report = store.insert_batch(records, policy)?;
        Ok((store, report))
    }

    /// Reads a GFF3/GTF file and builds a store from it.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        config: StoreConfig,
    ) -> AnnotResult<(Self, BuildReport)> {
        let reader = AnnotReader::new(File::open(path)?, config.format);
        let mut records = Vec::new();
        let mut rejected = Vec::new();
        for record in reader {
            match record {
                Ok(record) => records.push(record),
                Err(err @ AnnotError::MalformedRecord { .. })
                    if config.batch_policy == BatchPolicy::PartialSuccess =>
                {
                    error!("Skipping record: {}", err);
                    rejected.push(err);
                },
                Err(err) => return Err(err),
            }
        }
        let (store, mut report) = Self::from_records(records, config)?;
        report.rejected.extend(rejected);
        Ok((store, report))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn assigner(&self) -> &IdentityAssigner {
        &self.assigner
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn contains(
        &self,
        uid: &Uid,
    ) -> bool {
        self.by_hash.contains_key(uid)
    }

    pub fn lookup(
        &self,
        uid: &Uid,
    ) -> Option<&Feature> {
        self.by_hash.get(uid)
    }

    pub fn get_feature(
        &self,
        uid: &Uid,
    ) -> AnnotResult<&Feature> {
        self.by_hash
            .get(uid)
            .ok_or_else(|| AnnotError::not_found(uid))
    }

    /// Uids carrying the attribute identifier `aid`, in insertion order.
    pub fn uids_for(
        &self,
        aid: &str,
    ) -> Option<&IndexSet<Uid>> {
        self.by_aid.get(aid)
    }

    /// Uid of the feature with identifier `aid`. When several features share
    /// it, `context` picks one as in [`AnnotStore::resolve_aid`]; without
    /// context the lookup fails with [`AnnotError::DuplicateId`].
    pub fn get_uid(
        &self,
        aid: &str,
        context: Option<&Feature>,
    ) -> AnnotResult<Uid> {
        match (self.by_aid.get(aid).map(IndexSet::len), context) {
            (Some(n), None) if n > 1 => {
                Err(AnnotError::DuplicateId {
                    id:    aid.to_string(),
                    count: n,
                })
            },
            (Some(1), _) | (_, None) => {
                self.by_aid
                    .get(aid)
                    .and_then(|uids| uids.first().cloned())
                    .ok_or_else(|| {
                        AnnotError::UnresolvableParent {
                            aid: aid.to_string(),
                        }
                    })
            },
            (_, Some(context)) => self.resolve_aid(aid, context),
        }
    }

    pub fn aids(&self) -> impl Iterator<Item = &Aid> {
        self.by_aid.keys()
    }

    /// Features in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &Feature)> {
        self.by_hash.iter()
    }

    /// Features whose parent could not be resolved or was removed.
    pub fn orphans(&self) -> &IndexSet<Uid> {
        &self.orphans
    }

    /// Features without a parent reference, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Feature> {
        self.by_hash.values().filter(|f| f.is_root())
    }

    /// Features without a parent link, in insertion order. Orphans are
    /// included.
    pub fn top_level(&self) -> impl Iterator<Item = &Feature> {
        self.by_hash
            .values()
            .filter(|f| f.parent_uid().is_none())
    }

    /// Interval index over the container children of `parent`.
    pub fn container_index(
        &self,
        parent: &Uid,
    ) -> Option<&IntervalIndex> {
        self.containers.get(parent)
    }

    pub fn clear(&mut self) {
        self.by_hash.clear();
        self.by_aid.clear();
        self.orphans.clear();
        self.containers.clear();
    }

    /// Resolves an attribute identifier to a single uid. With several
    /// candidates the one most similar to `context` wins; equal scores go to
    /// the first inserted.
    pub fn resolve_aid(
        &self,
        aid: &str,
        context: &Feature,
    ) -> AnnotResult<Uid> {
        let uids = self
            .by_aid
            .get(aid)
            .filter(|uids| !uids.is_empty())
            .ok_or_else(|| {
                AnnotError::UnresolvableParent {
                    aid: aid.to_string(),
                }
            })?;
        if uids.len() == 1 {
            return Ok(uids[0].clone());
        }

        let mut best: Option<(&Uid, i64)> = None;
        for uid in uids {
            let candidate = self.get_feature(uid)?;
            let score = context.similarity(candidate);
            match best {
                Some((_, top)) if score <= top => {},
                _ => best = Some((uid, score)),
            }
        }
        debug!(
            "Resolved '{}' among {} candidates to {}",
            aid,
            uids.len(),
            best.map(|(u, _)| u.short()).unwrap_or_default()
        );
        best.map(|(uid, _)| uid.clone())
            .ok_or_else(|| {
                AnnotError::UnresolvableParent {
                    aid: aid.to_string(),
                }
            })
    }

    /// Pre-order list of every feature below `uid`.
    pub fn descendants(
        &self,
        uid: &Uid,
    ) -> AnnotResult<Vec<&Feature>> {
        let root = self.get_feature(uid)?;
        let mut result = Vec::new();
        let mut stack = root.children().iter().rev().collect_vec();
        while let Some(child_uid) = stack.pop() {
            let child = self.get_feature(child_uid)?;
            result.push(child);
            stack.extend(child.children().iter().rev());
        }
        Ok(result)
    }

    /// Owned copy of the subtree rooted at `uid`.
    pub fn subtree(
        &self,
        uid: &Uid,
    ) -> AnnotResult<FeatureTree> {
        let feature = self.get_feature(uid)?;
        let children = feature
            .children()
            .iter()
            .map(|child| self.subtree(child))
            .collect::<AnnotResult<Vec<_>>>()?;
        Ok(FeatureTree {
            feature: feature.clone(),
            children,
        })
    }

    /// Builds features from `records` and inserts them in two passes: all
    /// features are registered first, then every parent reference is
    /// resolved and linked. On error the store is left unchanged.
    pub fn insert_batch<I>(
        &mut self,
        records: I,
        policy: DuplicatePolicy,
    ) -> AnnotResult<BuildReport>
    where
        I: IntoIterator<Item = FeatureRecord>, {
        let mut report = BuildReport::default();
        let mut features = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            match self.assigner.build(record) {
                Ok(feature) => features.push(feature),
                Err(err)
                    if self.config.batch_policy == BatchPolicy::PartialSuccess =>
                {
                    error!("Skipping record #{}: {}", idx, err);
                    report.rejected.push(err);
                },
                Err(err) => return Err(err),
            }
        }
        debug!("Inserting batch of {} features", features.len());
        let inserted = self.insert_features(features, policy)?;
        report.absorb(inserted);
        Ok(report)
    }

    /// Inserts `tree.feature` and, with `cascade`, its whole subtree. A
    /// feature whose uid is already present replaces the stored one and
    /// inherits its children.
    pub fn add(
        &mut self,
        tree: FeatureTree,
        cascade: bool,
    ) -> AnnotResult<BuildReport> {
        let mut features = Vec::new();
        if cascade {
            let mut stack = vec![tree];
            while let Some(node) = stack.pop() {
                stack.extend(node.children.into_iter().rev());
                features.push(node.feature);
            }
        }
        else {
            features.push(tree.feature);
        }
        for feature in features.iter_mut() {
            self.assigner.reassign(feature)?;
        }
        self.insert_features(features, DuplicatePolicy::Overwrite)
    }

    /// Removes `uid` and returns a snapshot of its subtree. With `cascade`
    /// all descendants are removed too; otherwise its children become
    /// orphans.
    pub fn remove(
        &mut self,
        uid: &Uid,
        cascade: bool,
    ) -> AnnotResult<Removal> {
        let snapshot = self.subtree(uid)?;
        let mut removed = Vec::new();
        let mut warnings = Vec::new();

        if cascade {
            let descendants = self
                .descendants(uid)?
                .into_iter()
                .map(|f| f.uid().clone())
                .collect_vec();
            for desc in descendants.into_iter().rev() {
                self.unregister(&desc);
                removed.push(desc);
            }
        }
        else {
            for orphan in self.orphan_children(uid) {
                let warning = AnnotWarning::Orphan {
                    uid:           orphan,
                    former_parent: uid.clone(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
        self.unregister(uid);
        removed.push(uid.clone());

        debug!("Removed {} features under {}", removed.len(), uid.short());
        Ok(Removal {
            snapshot,
            removed,
            warnings,
        })
    }

    /// Detaches `uid` without touching its descendants and returns it. The
    /// children stay in the store as orphans.
    pub(crate) fn take(
        &mut self,
        uid: &Uid,
    ) -> AnnotResult<Feature> {
        if !self.contains(uid) {
            return Err(AnnotError::not_found(uid));
        }
        self.orphan_children(uid);
        self.unregister(uid)
            .map(|(feature, _)| feature)
            .ok_or_else(|| AnnotError::not_found(uid))
    }

    pub(crate) fn get_feature_mut(
        &mut self,
        uid: &Uid,
    ) -> AnnotResult<&mut Feature> {
        self.by_hash
            .get_mut(uid)
            .ok_or_else(|| AnnotError::not_found(uid))
    }

    /// Moves every feature of `other` into this store.
    ///
    /// With [`MergePolicy::Fail`] any identifier or uid present in both
    /// stores aborts the merge. With [`MergePolicy::Rename`] colliding
    /// identifiers of `other` get the configured suffix, parent references to
    /// them are rewritten, and uid collisions are made unique.
    pub fn merge(
        &mut self,
        other: AnnotStore,
        on_conflict: MergePolicy,
    ) -> AnnotResult<BuildReport> {
        let aid_collisions = other
            .by_aid
            .keys()
            .filter(|aid| self.by_aid.contains_key(*aid))
            .cloned()
            .collect_vec();
        let uid_collisions = other
            .by_hash
            .keys()
            .filter(|uid| self.by_hash.contains_key(*uid))
            .count();

        let policy = match on_conflict {
            MergePolicy::Fail => {
                if let Some(first) = aid_collisions.first() {
                    return Err(AnnotError::DuplicateId {
                        id:    first.clone(),
                        count: aid_collisions.len(),
                    });
                }
                if let Some(uid) = other
                    .by_hash
                    .keys()
                    .find(|uid| self.by_hash.contains_key(*uid))
                {
                    return Err(AnnotError::DuplicateId {
                        id:    uid.to_string(),
                        count: uid_collisions,
                    });
                }
                DuplicatePolicy::Fail
            },
            MergePolicy::Rename => DuplicatePolicy::MakeUnique,
        };

        let mut renames: HashMap<Aid, Aid> = HashMap::new();
        for aid in aid_collisions {
            let mut renamed = format!("{}{}", aid, self.config.merge_suffix);
            while self.by_aid.contains_key(&renamed)
                || other.by_aid.contains_key(&renamed)
            {
                renamed.push_str(&self.config.merge_suffix);
            }
            renames.insert(aid, renamed);
        }
        debug!(
            "Merging {} features, renaming {} identifiers",
            other.len(),
            renames.len()
        );

        let id_key = self.assigner.id_key().to_string();
        let parent_key = self.assigner.parent_key().to_string();
        let mut features = Vec::with_capacity(other.len());
        for (_, feature) in other.by_hash.into_iter() {
            let mut feature = feature.unlinked();
            if let Some(new_aid) = feature.aid().and_then(|a| renames.get(a)) {
                let new_aid = new_aid.clone();
                feature.attributes_mut().set_ci(&id_key, new_aid);
            }
            if let Some(new_parent) =
                feature.parent_aid().and_then(|a| renames.get(a))
            {
                let new_parent = new_parent.clone();
                feature
                    .attributes_mut()
                    .set_ci(&parent_key, new_parent);
            }
            self.assigner.reassign(&mut feature)?;
            features.push(feature);
        }
        self.insert_features(features, policy)
    }

    /// Two-pass insertion of features that already carry an identity. Orphans
    /// whose parent identifier arrives with `features` are linked as well.
    pub(crate) fn insert_features(
        &mut self,
        features: Vec<Feature>,
        policy: DuplicatePolicy,
    ) -> AnnotResult<BuildReport> {
        let mut journal = Journal::default();
        let mut report = BuildReport::default();
        let result = self
            .register_all(features, policy, &mut journal, &mut report)
            .and_then(|_| self.link_pending(&mut journal, &mut report));
        match result {
            Ok(()) => {
                report.inserted = journal.registered;
                Ok(report)
            },
            Err(err) => {
                self.rollback(journal);
                Err(err)
            },
        }
    }

    fn register_all(
        &mut self,
        features: Vec<Feature>,
        policy: DuplicatePolicy,
        journal: &mut Journal,
        report: &mut BuildReport,
    ) -> AnnotResult<()> {
        for feature in features {
            let mut feature = feature.unlinked();
            let mut inherited = None;
            if self.by_hash.contains_key(feature.uid()) {
                match policy {
                    DuplicatePolicy::Fail => {
                        return Err(AnnotError::DuplicateUid {
                            uid: feature.uid().clone(),
                        });
                    },
                    DuplicatePolicy::MakeUnique => self.make_unique(&mut feature)?,
                    DuplicatePolicy::Overwrite => {
                        let uid = feature.uid().clone();
                        let fresh = journal.registered.contains(&uid);
                        if let Some(displaced) = self.displace(&uid) {
                            *feature.children_mut() =
                                displaced.feature.children().to_vec();
                            inherited = displaced.index.clone();
                            // Features registered by this same call are not
                            // restored on rollback
                            if !fresh {
                                journal.displaced.push(displaced);
                            }
                        }
                        if fresh {
                            journal.registered.retain(|r| r != &uid);
                        }
                        report.warn(AnnotWarning::Duplicate { uid });
                    },
                }
            }
            let uid = feature.uid().clone();
            if let Some(aid) = feature.aid() {
                self.by_aid
                    .entry(aid.clone())
                    .or_default()
                    .insert(uid.clone());
            }
            if let Some(index) = inherited {
                self.containers.insert(uid.clone(), index);
            }
            self.by_hash.insert(uid.clone(), feature);
            journal.registered.push(uid);
        }
        Ok(())
    }

    /// Appends `{sep}{n}` to the identifier (or to the feature type when
    /// there is none) until the uid is free.
    fn make_unique(
        &self,
        feature: &mut Feature,
    ) -> AnnotResult<()> {
        let base = feature
            .aid()
            .cloned()
            .unwrap_or_else(|| feature.feature_type().to_string());
        let id_key = self.assigner.id_key().to_string();
        let mut n = 1usize;
        while self.by_hash.contains_key(feature.uid()) {
            let candidate =
                format!("{}{}{}", base, self.config.unique_suffix_sep, n);
            feature.attributes_mut().set_ci(&id_key, candidate);
            self.assigner.reassign(feature)?;
            n += 1;
        }
        debug!("Renamed duplicate to {:?}", feature.aid());
        Ok(())
    }

    fn link_pending(
        &mut self,
        journal: &mut Journal,
        report: &mut BuildReport,
    ) -> AnnotResult<()> {
        let new_aids: IndexSet<&Aid> = journal
            .registered
            .iter()
            .filter_map(|uid| self.by_hash.get(uid))
            .filter_map(|f| f.aid())
            .collect();
        let adopted = self
            .orphans
            .iter()
            .filter(|uid| !journal.registered.contains(uid))
            .filter(|uid| {
                self.by_hash
                    .get(*uid)
                    .and_then(|f| f.parent_aid())
                    .is_some_and(|aid| new_aids.contains(aid))
            })
            .cloned()
            .collect_vec();
        if !adopted.is_empty() {
            debug!("Re-linking {} orphans", adopted.len());
        }
        journal.adopted = adopted;

        let pending = journal
            .registered
            .iter()
            .chain(journal.adopted.iter())
            .cloned()
            .collect_vec();
        self.link_all(&pending, report)
    }

    fn link_all(
        &mut self,
        uids: &[Uid],
        report: &mut BuildReport,
    ) -> AnnotResult<()> {
        // Containers must be indexed before contained features are placed
        let (contained, direct): (Vec<&Uid>, Vec<&Uid>) =
            uids.iter().partition(|uid| self.is_contained_type(uid));
        for uid in direct.into_iter().chain(contained) {
            self.link(uid, report)?;
        }
        Ok(())
    }

    fn is_contained_type(
        &self,
        uid: &Uid,
    ) -> bool {
        match (&self.config.containment, self.by_hash.get(uid)) {
            (Some(rule), Some(feature)) => {
                feature.feature_type().as_str() == rule.contained_type
            },
            _ => false,
        }
    }

    fn link(
        &mut self,
        uid: &Uid,
        report: &mut BuildReport,
    ) -> AnnotResult<()> {
        let feature = self.get_feature(uid)?;
        let Some(parent_aid) = feature.parent_aid().cloned()
        else {
            return Ok(());
        };
        if !self.by_aid.contains_key(&parent_aid) {
            self.orphans.insert(uid.clone());
            report.warn(AnnotWarning::MissingParent {
                uid: uid.clone(),
                parent_aid,
            });
            return Ok(());
        }

        let parent_uid = self.resolve_aid(&parent_aid, feature)?;
        if &parent_uid == uid {
            self.orphans.insert(uid.clone());
            report.warn(AnnotWarning::MissingParent {
                uid: uid.clone(),
                parent_aid,
            });
            return Ok(());
        }
        let parent_uid = self.place(uid, parent_uid)?;
        self.attach(uid, &parent_uid);
        Ok(())
    }

    /// Redirects a contained-type feature to the single container child of
    /// `parent_uid` it overlaps.
    fn place(
        &self,
        uid: &Uid,
        parent_uid: Uid,
    ) -> AnnotResult<Uid> {
        let Some(rule) = &self.config.containment
        else {
            return Ok(parent_uid);
        };
        let feature = self.get_feature(uid)?;
        let parent = self.get_feature(&parent_uid)?;
        if feature.feature_type().as_str() != rule.contained_type
            || parent.feature_type().as_str() == rule.container_type
        {
            return Ok(parent_uid);
        }

        let candidates = self
            .containers
            .get(&parent_uid)
            .map(|index| index.query(feature.start(), feature.end()))
            .unwrap_or_default();
        match candidates.as_slice() {
            [single] => Ok((*single).clone()),
            other => {
                Err(AnnotError::AmbiguousContainment {
                    uid:        uid.clone(),
                    parent:     parent_uid.clone(),
                    candidates: other.len(),
                })
            },
        }
    }

    fn attach(
        &mut self,
        uid: &Uid,
        parent_uid: &Uid,
    ) {
        let mut interval = None;
        if let Some(child) = self.by_hash.get_mut(uid) {
            child.set_parent_uid(Some(parent_uid.clone()));
            if let Some(rule) = &self.config.containment {
                if child.feature_type().as_str() == rule.container_type {
                    interval = Some((child.start(), child.end(), rule.zero_width_pad));
                }
            }
        }
        if let Some(parent) = self.by_hash.get_mut(parent_uid) {
            if !parent.children().contains(uid) {
                parent.children_mut().push(uid.clone());
            }
        }
        if let Some((start, end, pad)) = interval {
            let index = self
                .containers
                .entry(parent_uid.clone())
                .or_insert_with(|| IntervalIndex::new(pad));
            if !index.contains(uid) {
                index.insert(start, end, uid.clone());
            }
        }
        self.orphans.shift_remove(uid);
    }

    /// Unlinks `uid` from its parent. Returns the former parent.
    fn detach(
        &mut self,
        uid: &Uid,
    ) -> Option<Uid> {
        let child = self.by_hash.get_mut(uid)?;
        let parent_uid = child.parent_uid().cloned()?;
        child.set_parent_uid(None);
        if let Some(parent) = self.by_hash.get_mut(&parent_uid) {
            parent.children_mut().retain(|c| c != uid);
        }
        if let Some(index) = self.containers.get_mut(&parent_uid) {
            index.remove(uid);
            if index.is_empty() {
                self.containers.remove(&parent_uid);
            }
        }
        Some(parent_uid)
    }

    /// Detaches every child of `uid` and marks it as orphan.
    fn orphan_children(
        &mut self,
        uid: &Uid,
    ) -> Vec<Uid> {
        let children = self
            .by_hash
            .get(uid)
            .map(|f| f.children().to_vec())
            .unwrap_or_default();
        for child in children.iter() {
            self.detach(child);
            self.orphans.insert(child.clone());
        }
        children
    }

    /// Drops `uid` from every index. Its children, if any, are left with a
    /// dangling `parent_uid`; callers remove or orphan them first.
    fn unregister(
        &mut self,
        uid: &Uid,
    ) -> Option<(Feature, Option<Uid>)> {
        let parent = self.detach(uid);
        let feature = self.by_hash.shift_remove(uid)?;
        if let Some(aid) = feature.aid() {
            if let Some(uids) = self.by_aid.get_mut(aid) {
                uids.shift_remove(uid);
                if uids.is_empty() {
                    self.by_aid.shift_remove(aid);
                }
            }
        }
        self.orphans.shift_remove(uid);
        self.containers.remove(uid);
        Some((feature, parent))
    }

    /// Unregisters `uid` for an overwrite, keeping its children linked to the
    /// same uid.
    fn displace(
        &mut self,
        uid: &Uid,
    ) -> Option<Displaced> {
        let was_orphan = self.orphans.contains(uid);
        let index = self.containers.get(uid).cloned();
        let (feature, parent) = self.unregister(uid)?;
        Some(Displaced {
            feature,
            parent,
            was_orphan,
            index,
        })
    }

    fn rollback(
        &mut self,
        journal: Journal,
    ) {
        debug!(
            "Rolling back {} registrations and {} overwrites",
            journal.registered.len(),
            journal.displaced.len()
        );
        for uid in journal.adopted.iter() {
            self.detach(uid);
            self.orphans.insert(uid.clone());
        }
        for uid in journal.registered.iter().rev() {
            self.unregister(uid);
        }
        let mut links = Vec::with_capacity(journal.displaced.len());
        for displaced in journal.displaced.into_iter().rev() {
            let Displaced {
                feature,
                parent,
                was_orphan,
                index,
            } = displaced;
            let uid = feature.uid().clone();
            if let Some(aid) = feature.aid() {
                self.by_aid
                    .entry(aid.clone())
                    .or_default()
                    .insert(uid.clone());
            }
            if let Some(index) = index {
                self.containers.insert(uid.clone(), index);
            }
            self.by_hash.insert(uid.clone(), feature);
            links.push((uid, parent, was_orphan));
        }
        // Parents may themselves have been displaced, so link once all are back
        for (uid, parent, was_orphan) in links {
            if let Some(parent) = parent {
                self.attach(&uid, &parent);
            }
            if was_orphan {
                self.orphans.insert(uid);
            }
        }
    }
}
