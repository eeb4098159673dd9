//! Cross-store renaming.
//!
//! A feature of one store is renamed after its counterpart in a reference
//! store. Attribute values are copied according to per-type rules, excluded
//! attributes are dropped, and every node of the subtree gets a fresh identity
//! and is linked back into the tree.

use hashbrown::HashMap;
use log::{
    debug,
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::feature::{
    Feature,
    FeatureTree,
};
use super::store::AnnotStore;
use super::typedef::{
    Aid,
    Uid,
};
use crate::error::AnnotResult;

/// Rule set used for feature types without a rule set of their own.
pub const DEFAULT_RULES_KEY: &str = "default";

/// `(original_key, reference_key)` pairs per feature type.
pub type AttributeRules = HashMap<String, Vec<(String, String)>>;

/// Subtree of the renamed feature before and after resolution.
#[derive(Debug, Clone)]
pub struct SynonymResolution {
    pub before:  FeatureTree,
    pub after:   FeatureTree,
    pub new_uid: Uid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymResolver {
    rules:               AttributeRules,
    excluded_attributes: Vec<String>,
}

impl SynonymResolver {
    pub fn new(
        rules: AttributeRules,
        excluded_attributes: Vec<String>,
    ) -> Self {
        Self {
            rules,
            excluded_attributes,
        }
    }

    pub fn rules(&self) -> &AttributeRules {
        &self.rules
    }

    pub fn excluded_attributes(&self) -> &[String] {
        &self.excluded_attributes
    }

    /// Adds a rule pair for `feature_type`.
    pub fn with_rule<S: Into<String>>(
        mut self,
        feature_type: S,
        original_key: S,
        reference_key: S,
    ) -> Self {
        self.rules
            .entry(feature_type.into())
            .or_default()
            .push((original_key.into(), reference_key.into()));
        self
    }

    pub fn with_excluded<S: Into<String>>(
        mut self,
        key: S,
    ) -> Self {
        self.excluded_attributes.push(key.into());
        self
    }

    fn rules_for(
        &self,
        feature_type: &str,
    ) -> &[(String, String)] {
        self.rules
            .get(feature_type)
            .or_else(|| self.rules.get(DEFAULT_RULES_KEY))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Renames `original_uid` in `original` after `reference_uid` in
    /// `reference`. The top feature takes the reference identifier; its
    /// descendants keep theirs but follow the new parent.
    pub fn resolve(
        &self,
        original: &mut AnnotStore,
        original_uid: &Uid,
        reference: &AnnotStore,
        reference_uid: &Uid,
    ) -> AnnotResult<SynonymResolution> {
        let ref_feature = reference.get_feature(reference_uid)?;
        let before = original.subtree(original_uid)?;

        // Nodes are taken and re-added one at a time
        let snapshot = original.clone();
        let mut renames = HashMap::new();
        let new_uid = match self.rewrite(
            original,
            original_uid,
            ref_feature,
            true,
            &mut renames,
        ) {
            Ok(uid) => uid,
            Err(err) => {
                warn!("Synonym resolution of {} failed: {}", original_uid.short(), err);
                *original = snapshot;
                return Err(err);
            },
        };
        let after = original.subtree(&new_uid)?;

        info!(
            "Resolved {} as {} ({} features rewritten)",
            before.feature,
            after.feature,
            after.n_features()
        );
        Ok(SynonymResolution {
            before,
            after,
            new_uid,
        })
    }

    fn rewrite(
        &self,
        store: &mut AnnotStore,
        uid: &Uid,
        ref_feature: &Feature,
        is_top: bool,
        renames: &mut HashMap<Aid, Aid>,
    ) -> AnnotResult<Uid> {
        let children = store.get_feature(uid)?.children().to_vec();
        let id_key = store.assigner().id_key().to_string();
        let parent_key = store.assigner().parent_key().to_string();

        let mut feature = store.take(uid)?;
        let old_aid = feature.aid().cloned();

        if let Some(new_parent) = feature
            .parent_aid()
            .and_then(|aid| renames.get(aid))
            .cloned()
        {
            feature
                .attributes_mut()
                .set_ci(&parent_key, new_parent);
        }

        for (original_key, reference_key) in
            self.rules_for(feature.feature_type().as_str())
        {
            if !feature.attributes().contains_key_ci(original_key) {
                continue;
            }
            if let Some(value) = ref_feature.attributes().get_ci(reference_key) {
                let value = value.to_string();
                feature
                    .attributes_mut()
                    .set_ci(original_key, value);
            }
        }
        for key in self.excluded_attributes.iter() {
            feature.attributes_mut().remove_ci(key);
        }
        if is_top {
            if let Some(ref_aid) = ref_feature.aid() {
                feature
                    .attributes_mut()
                    .set_ci(&id_key, ref_aid.clone());
            }
        }

        store.assigner().reassign(&mut feature)?;
        if let (Some(old), Some(new)) = (old_aid, feature.aid()) {
            if &old != new {
                renames.insert(old, new.clone());
            }
        }
        let new_uid = feature.uid().clone();
        debug!("Rewrote {} as {}", uid.short(), new_uid.short());
        store.add(FeatureTree::leaf(feature), false)?;

        for child in children.iter() {
            self.rewrite(store, child, ref_feature, false, renames)?;
        }
        Ok(new_uid)
    }
}

/// Renames `original_uid` after `reference_uid` with the given rules and
/// returns the subtree before and after.
pub fn resolve_synonym(
    original: &mut AnnotStore,
    original_uid: &Uid,
    reference: &AnnotStore,
    reference_uid: &Uid,
    attribute_rules: AttributeRules,
    excluded_attributes: Vec<String>,
) -> AnnotResult<(FeatureTree, FeatureTree)> {
    let resolution = SynonymResolver::new(attribute_rules, excluded_attributes)
        .resolve(original, original_uid, reference, reference_uid)?;
    Ok((resolution.before, resolution.after))
}
