use std::fmt;

use arcstr::ArcStr;
use serde::{
    Deserialize,
    Serialize,
};

use super::attributes::Attributes;
use super::enums::{
    Frame,
    Strand,
};
use super::identity::Identity;
use super::typedef::{
    Aid,
    PosType,
    ScoreType,
    Uid,
};
use crate::config::AnnotFormat;
use crate::getter_fn;

/// One decoded row of the annotation file, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureRecord {
    pub chr:          String,
    pub src:          String,
    pub feature_type: String,
    pub start:        PosType,
    pub end:          PosType,
    pub score:        Option<ScoreType>,
    pub strand:       String,
    pub frame:        String,
    pub attributes:   Attributes,
}

/// Flat nine-column view of a feature handed to output formatters:
/// `(chr, src, feature_type, start, end, score_or_dot, strand, frame,
/// attributes)`.
pub type FeatureFields = (
    String,
    String,
    String,
    PosType,
    PosType,
    String,
    char,
    char,
    String,
);

/// A single annotation feature.
///
/// Positional fields and attributes describe the record. The identity block
/// (`uid`, `aid`, `parent_aid`) is derived from them by the
/// [`IdentityAssigner`](super::identity::IdentityAssigner); `parent_uid` and
/// `children` are tree links maintained by the
/// [`AnnotStore`](super::store::AnnotStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    chr:          ArcStr,
    source:       ArcStr,
    feature_type: ArcStr,
    start:        PosType,
    end:          PosType,
    score:        Option<ScoreType>,
    strand:       Strand,
    frame:        Frame,
    attributes:   Attributes,
    children:     Vec<Uid>,
    uid:          Uid,
    aid:          Option<Aid>,
    parent_aid:   Option<Aid>,
    parent_uid:   Option<Uid>,
}

impl Feature {
    /// Creates a feature without identity. Pass it through
    /// [`IdentityAssigner::assign`](super::identity::IdentityAssigner::assign)
    /// before inserting it into a store.
    #[allow(clippy::too_many_arguments)]
    pub fn draft(
        chr: ArcStr,
        source: ArcStr,
        feature_type: ArcStr,
        start: PosType,
        end: PosType,
        score: Option<ScoreType>,
        strand: Strand,
        frame: Frame,
        attributes: Attributes,
    ) -> Self {
        Self {
            chr,
            source,
            feature_type,
            start,
            end,
            score,
            strand,
            frame,
            attributes,
            children: Vec::new(),
            uid: Uid::default(),
            aid: None,
            parent_aid: None,
            parent_uid: None,
        }
    }

    getter_fn!(chr, ArcStr);

    getter_fn!(source, ArcStr);

    getter_fn!(feature_type, ArcStr);

    getter_fn!(attributes, Attributes);

    getter_fn!(uid, Uid);

    pub fn start(&self) -> PosType {
        self.start
    }

    pub fn end(&self) -> PosType {
        self.end
    }

    pub fn score(&self) -> Option<ScoreType> {
        self.score
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn children(&self) -> &[Uid] {
        &self.children
    }

    pub fn aid(&self) -> Option<&Aid> {
        self.aid.as_ref()
    }

    pub fn parent_aid(&self) -> Option<&Aid> {
        self.parent_aid.as_ref()
    }

    pub fn parent_uid(&self) -> Option<&Uid> {
        self.parent_uid.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent_aid.is_none()
    }

    pub(crate) fn set_identity(
        &mut self,
        identity: Identity,
    ) {
        self.uid = identity.uid;
        self.aid = identity.aid;
        self.parent_aid = identity.parent_aid;
    }

    pub(crate) fn set_parent_uid(
        &mut self,
        parent_uid: Option<Uid>,
    ) {
        self.parent_uid = parent_uid;
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Uid> {
        &mut self.children
    }

    /// Drops tree links, leaving content and identity intact.
    pub(crate) fn unlinked(mut self) -> Self {
        self.children.clear();
        self.parent_uid = None;
        self
    }

    /// Collision tie-break score against `other`: one point each for a shared
    /// chromosome and strand, minus the absolute start and end distances.
    pub fn similarity(
        &self,
        other: &Feature,
    ) -> i64 {
        let same_chr = i64::from(self.chr == other.chr);
        let same_strand = i64::from(self.strand == other.strand);
        let start_diff = (i64::from(self.start) - i64::from(other.start)).abs();
        let end_diff = (i64::from(self.end) - i64::from(other.end)).abs();
        same_chr + same_strand - start_diff - end_diff
    }

    pub fn fields(
        &self,
        format: AnnotFormat,
    ) -> FeatureFields {
        (
            self.chr.to_string(),
            self.source.to_string(),
            self.feature_type.to_string(),
            self.start,
            self.end,
            self.score
                .map(|s| s.to_string())
                .unwrap_or_else(|| ".".to_string()),
            self.strand.into(),
            self.frame.into(),
            self.attributes.to_column(format),
        )
    }

    /// One tab-separated line, without the trailing newline.
    pub fn to_line(
        &self,
        format: AnnotFormat,
    ) -> String {
        let (chr, src, ft, start, end, score, strand, frame, attrs) =
            self.fields(format);
        format!(
            "{chr}\t{src}\t{ft}\t{start}\t{end}\t{score}\t{strand}\t{frame}\t{attrs}"
        )
    }
}

impl fmt::Display for Feature {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}:{},{},{}-{}",
            self.feature_type,
            self.aid.as_deref().unwrap_or("."),
            self.strand,
            self.start,
            self.end
        )
    }
}

/// Owned copy of a feature and its whole subtree, detached from any store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTree {
    pub feature:  Feature,
    pub children: Vec<FeatureTree>,
}

impl FeatureTree {
    pub fn leaf(feature: Feature) -> Self {
        Self {
            feature,
            children: Vec::new(),
        }
    }

    /// Pre-order walk over the features of the tree.
    pub fn iter(&self) -> FeatureTreeIter<'_> {
        FeatureTreeIter { stack: vec![self] }
    }

    pub fn n_features(&self) -> usize {
        self.iter().count()
    }

    /// Renders one line per feature in pre-order.
    pub fn to_lines(
        &self,
        format: AnnotFormat,
    ) -> Vec<String> {
        self.iter()
            .map(|f| f.to_line(format))
            .collect()
    }
}

impl fmt::Display for FeatureTree {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for line in self.to_lines(AnnotFormat::Gff3) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

pub struct FeatureTreeIter<'a> {
    stack: Vec<&'a FeatureTree>,
}

impl<'a> Iterator for FeatureTreeIter<'a> {
    type Item = &'a Feature;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev());
        Some(&node.feature)
    }
}
