use std::str::FromStr;

use itertools::Itertools;
use rstest::{
    fixture,
    rstest,
};

use super::*;
use crate::config::{
    AnnotFormat,
    BatchPolicy,
    ContainmentConfig,
    DuplicatePolicy,
    IdentityConfig,
    MergePolicy,
    StoreConfig,
};
use crate::error::{
    AnnotError,
    AnnotWarning,
};

fn record(
    chr: &str,
    feature_type: &str,
    start: PosType,
    end: PosType,
    strand: &str,
    attributes: &str,
) -> FeatureRecord {
    FeatureRecord {
        chr:          chr.to_string(),
        src:          "test".to_string(),
        feature_type: feature_type.to_string(),
        start,
        end,
        score:        None,
        strand:       strand.to_string(),
        frame:        ".".to_string(),
        attributes:   Attributes::parse(attributes, AnnotFormat::Gff3).unwrap(),
    }
}

fn gene_records() -> Vec<FeatureRecord> {
    vec![
        record("chr1", "gene", 100, 1000, "+", "ID=G1;Name=alpha"),
        record("chr1", "mRNA", 100, 1000, "+", "ID=T1;Parent=G1"),
        record("chr1", "exon", 100, 300, "+", "ID=E1;Parent=T1"),
        record("chr1", "exon", 500, 800, "+", "ID=E2;Parent=T1"),
        record("chr1", "CDS", 150, 200, "+", "ID=C1;Parent=T1"),
        record("chr1", "CDS", 550, 600, "+", "ID=C2;Parent=T1"),
    ]
}

fn containment_config() -> StoreConfig {
    StoreConfig::default().with_containment(Some(ContainmentConfig::default()))
}

fn uid_of(
    store: &AnnotStore,
    aid: &str,
) -> Uid {
    store.uids_for(aid).unwrap()[0].clone()
}

fn desc_aids(
    store: &AnnotStore,
    uid: &Uid,
) -> Vec<String> {
    store
        .descendants(uid)
        .unwrap()
        .into_iter()
        .map(|f| f.aid().cloned().unwrap_or_default())
        .collect_vec()
}

#[fixture]
fn gene_store() -> AnnotStore {
    AnnotStore::from_records(gene_records(), containment_config())
        .unwrap()
        .0
}

#[fixture]
fn plain_store() -> AnnotStore {
    AnnotStore::from_records(gene_records(), StoreConfig::default())
        .unwrap()
        .0
}

#[test]
fn test_attributes_gff3() {
    let attributes =
        Attributes::parse("ID=gene1; Name=abc ;note=x=y;", AnnotFormat::Gff3).unwrap();
    assert_eq!(attributes.len(), 3);
    assert_eq!(attributes.get("Name"), Some("abc"));
    assert_eq!(attributes.get("note"), Some("x=y"));
    assert_eq!(attributes.get_ci("id"), Some("gene1"));
    assert_eq!(attributes.to_column(AnnotFormat::Gff3), "ID=gene1;Name=abc;note=x=y");
}

#[test]
fn test_attributes_gtf() {
    let attributes = Attributes::parse(
        "gene_id \"g1\"; transcript_id \"t1\";",
        AnnotFormat::Gtf,
    )
    .unwrap();
    assert_eq!(attributes.get("gene_id"), Some("g1"));
    assert_eq!(attributes.get("transcript_id"), Some("t1"));
    assert_eq!(
        attributes.to_column(AnnotFormat::Gtf),
        "gene_id \"g1\"; transcript_id \"t1\";"
    );
}

#[test]
fn test_attributes_malformed() {
    assert!(matches!(
        Attributes::parse("ID=a;junk", AnnotFormat::Gff3),
        Err(AnnotError::MalformedRecord { .. })
    ));
    assert!(matches!(
        Attributes::parse("=a", AnnotFormat::Gff3),
        Err(AnnotError::MalformedRecord { .. })
    ));
    assert_eq!(Attributes::default().to_column(AnnotFormat::Gff3), ".");
}

#[test]
fn test_attributes_case_insensitive_edit() {
    let mut attributes: Attributes =
        [("id", "a"), ("PARENT", "b"), ("Note", "c")].into_iter().collect();
    attributes.set_ci("Parent", "z");
    assert_eq!(attributes.get("PARENT"), Some("z"));
    assert!(attributes.get("Parent").is_none());

    attributes.set_ci("Alias", "q");
    assert_eq!(attributes.iter().last(), Some(("Alias", "q")));

    assert_eq!(attributes.remove_ci("NOTE"), 1);
    assert!(!attributes.contains_key_ci("note"));
}

#[rstest]
#[case("+", Strand::Forward)]
#[case("-", Strand::Reverse)]
#[case(".", Strand::None)]
#[case("?", Strand::None)]
fn test_strand_parse(
    #[case] input: &str,
    #[case] expected: Strand,
) {
    assert_eq!(Strand::from_str(input).unwrap(), expected);
}

#[test]
fn test_frame_parse() {
    assert_eq!(Frame::from_str("2").unwrap(), Frame::Two);
    assert_eq!(Option::<u8>::from(Frame::None), None);
    assert!(Frame::from_str("3").is_err());
    assert!(Frame::from_str("").is_err());
}

#[test]
fn test_assign_deterministic() {
    let assigner = IdentityAssigner::default();
    let first = assigner
        .build(record("chr1", "gene", 1, 10, "+", "ID=G1"))
        .unwrap();
    let second = assigner
        .build(record("chr1", "gene", 1, 10, "+", "ID=G1"))
        .unwrap();
    assert_eq!(first.uid(), second.uid());
    assert_eq!(first.uid().as_str().len(), 64);
    assert_eq!(assigner.assign(&first).unwrap().uid, *first.uid());

    let edited = assigner
        .build(record("chr1", "gene", 1, 10, "+", "ID=G1;Note=x"))
        .unwrap();
    assert_ne!(first.uid(), edited.uid());
}

#[test]
fn test_assign_identifiers() {
    let assigner = IdentityAssigner::default();
    let feature = assigner
        .build(record("chr1", "exon", 1, 10, "-", "id=E1;PARENT=T1"))
        .unwrap();
    assert_eq!(feature.aid().map(String::as_str), Some("E1"));
    assert_eq!(feature.parent_aid().map(String::as_str), Some("T1"));

    let anonymous = assigner
        .build(record("chr1", "exon", 1, 10, "-", "ID=;Note=x"))
        .unwrap();
    assert!(anonymous.aid().is_none());
    assert!(anonymous.is_root());

    let custom = IdentityAssigner::new(
        IdentityConfig::default()
            .with_id_key("gene_id".to_string())
            .with_parent_key("gene_parent".to_string()),
    );
    let feature = custom
        .build(record("chr1", "gene", 1, 10, "+", "ID=x;GENE_ID=g7"))
        .unwrap();
    assert_eq!(feature.aid().map(String::as_str), Some("g7"));
}

#[rstest]
#[case(record("chr1", "gene", 20, 10, "+", "ID=a"))]
#[case(record("", "gene", 1, 10, "+", "ID=a"))]
#[case(record("chr1", "", 1, 10, "+", "ID=a"))]
#[case(record("chr1", "gene", 1, 10, "x", "ID=a"))]
#[case(record("chr1", "gene", 1, 10, "", "ID=a"))]
fn test_assign_malformed(#[case] input: FeatureRecord) {
    let result = IdentityAssigner::default().build(input);
    assert!(matches!(result, Err(AnnotError::MalformedRecord { .. })));
}

#[test]
fn test_uid_short() {
    let uid = IdentityAssigner::default()
        .build(record("chr1", "gene", 1, 10, "+", "ID=G1"))
        .unwrap()
        .uid()
        .clone();
    assert_eq!(uid.short(), &uid.as_str()[..12]);
    assert_eq!(Uid::from("abc").short(), "abc");
    assert_eq!(Uid::from("ééééééééééééé").short(), "éééééééééééé");
}

#[test]
fn test_similarity() {
    let assigner = IdentityAssigner::default();
    let a = assigner
        .build(record("chr1", "gene", 100, 200, "+", ""))
        .unwrap();
    let b = assigner
        .build(record("chr1", "gene", 110, 190, "+", ""))
        .unwrap();
    let c = assigner
        .build(record("chr2", "gene", 100, 200, "-", ""))
        .unwrap();
    assert_eq!(a.similarity(&a), 2);
    assert_eq!(a.similarity(&b), 2 - 20);
    assert_eq!(a.similarity(&c), 0);
}

#[test]
fn test_interval_zero_width() {
    let mut index = IntervalIndex::new(1);
    index.insert(100, 100, Uid::from("a"));
    assert_eq!(index.query(100, 100), vec![&Uid::from("a")]);
    assert!(index.query(101, 105).is_empty());
}

#[test]
fn test_interval_closed() {
    let mut index = IntervalIndex::new(1);
    index.insert(100, 300, Uid::from("e1"));
    index.insert(400, 600, Uid::from("e2"));

    assert_eq!(index.query(150, 200), vec![&Uid::from("e1")]);
    assert_eq!(index.query(300, 300), vec![&Uid::from("e1")]);
    assert_eq!(index.query(600, 600), vec![&Uid::from("e2")]);
    assert!(index.query(301, 399).is_empty());
    assert_eq!(index.query(300, 400).len(), 2);

    assert!(index.remove(&Uid::from("e1")));
    assert!(!index.remove(&Uid::from("e1")));
    assert!(!index.contains(&Uid::from("e1")));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_interval_zero_width_pad() {
    let mut index = IntervalIndex::new(3);
    index.insert(100, 100, Uid::from("a"));
    assert_eq!(index.query(102, 102), vec![&Uid::from("a")]);
    assert!(index.query(103, 110).is_empty());
}

#[rstest]
fn test_insert_links(gene_store: AnnotStore) {
    assert_eq!(gene_store.len(), 6);
    let gene = uid_of(&gene_store, "G1");
    let mrna = uid_of(&gene_store, "T1");
    let exon = uid_of(&gene_store, "E1");
    let cds = uid_of(&gene_store, "C1");

    assert_eq!(gene_store.lookup(&mrna).unwrap().parent_uid(), Some(&gene));
    assert_eq!(gene_store.lookup(&cds).unwrap().parent_uid(), Some(&exon));
    assert!(gene_store.lookup(&gene).unwrap().children().contains(&mrna));
    assert_eq!(
        desc_aids(&gene_store, &gene),
        vec!["T1", "E1", "C1", "E2", "C2"]
    );
    assert!(gene_store.orphans().is_empty());
    assert_eq!(gene_store.container_index(&mrna).unwrap().len(), 2);
    assert_eq!(gene_store.top_level().count(), 1);
}

#[rstest]
fn test_insert_without_containment(plain_store: AnnotStore) {
    let gene = uid_of(&plain_store, "G1");
    let mrna = uid_of(&plain_store, "T1");
    assert_eq!(
        desc_aids(&plain_store, &gene),
        vec!["T1", "E1", "E2", "C1", "C2"]
    );
    assert!(plain_store.container_index(&mrna).is_none());
}

#[test]
fn test_insert_children_first() {
    let records = gene_records().into_iter().rev().collect_vec();
    let (store, report) =
        AnnotStore::from_records(records, containment_config()).unwrap();
    assert!(report.warnings.is_empty());
    let gene = uid_of(&store, "G1");
    assert_eq!(store.descendants(&gene).unwrap().len(), 5);
}

#[test]
fn test_missing_parent_is_orphan() {
    let (store, report) = AnnotStore::from_records(
        vec![record("chr1", "exon", 1, 10, "+", "ID=E9;Parent=nowhere")],
        StoreConfig::default(),
    )
    .unwrap();
    let uid = uid_of(&store, "E9");
    assert!(store.orphans().contains(&uid));
    assert!(matches!(
        report.warnings.as_slice(),
        [AnnotWarning::MissingParent { parent_aid, .. }] if parent_aid == "nowhere"
    ));
}

#[test]
fn test_duplicate_fail_rolls_back() {
    let mut records = gene_records();
    records.push(record("chr1", "gene", 100, 1000, "+", "ID=G1;Name=alpha"));
    let mut store = AnnotStore::new(StoreConfig::default());
    let result = store.insert_batch(records, DuplicatePolicy::Fail);
    assert!(matches!(result, Err(AnnotError::DuplicateUid { .. })));
    assert!(store.is_empty());
    assert_eq!(store.aids().count(), 0);
}

#[test]
fn test_duplicate_make_unique() {
    let records = vec![
        record("chr1", "gene", 1, 10, "+", "ID=X"),
        record("chr1", "gene", 1, 10, "+", "ID=X"),
        record("chr1", "gene", 1, 10, "+", "ID=X"),
    ];
    let mut store = AnnotStore::default();
    store
        .insert_batch(records, DuplicatePolicy::MakeUnique)
        .unwrap();
    assert_eq!(store.len(), 3);
    assert!(store.uids_for("X").is_some());
    assert!(store.uids_for("X-1").is_some());
    assert!(store.uids_for("X-2").is_some());
}

#[rstest]
fn test_duplicate_overwrite_keeps_children(mut gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let copy = gene_store.lookup(&gene).unwrap().clone();

    let report = gene_store.add(FeatureTree::leaf(copy), false).unwrap();
    assert!(matches!(
        report.warnings.as_slice(),
        [AnnotWarning::Duplicate { uid }] if uid == &gene
    ));
    assert_eq!(gene_store.len(), 6);
    assert_eq!(gene_store.descendants(&gene).unwrap().len(), 5);
}

#[test]
fn test_partial_success() {
    let mut records = gene_records();
    records.insert(1, record("chr1", "gene", 50, 10, "+", "ID=bad"));
    let config = StoreConfig::default().with_batch_policy(BatchPolicy::PartialSuccess);
    let (store, report) = AnnotStore::from_records(records.clone(), config).unwrap();
    assert_eq!(store.len(), 6);
    assert_eq!(report.rejected.len(), 1);

    let strict = AnnotStore::from_records(records, StoreConfig::default());
    assert!(matches!(strict, Err(AnnotError::MalformedRecord { .. })));
}

#[test]
fn test_resolve_aid_similarity() {
    let records = vec![
        record("chr1", "gene", 100, 200, "+", "ID=X"),
        record("chr1", "gene", 300, 400, "+", "ID=X"),
    ];
    let (store, _) = AnnotStore::from_records(records, StoreConfig::default()).unwrap();
    let candidates = store.uids_for("X").unwrap().iter().cloned().collect_vec();
    let assigner = IdentityAssigner::default();

    let near_second = assigner
        .build(record("chr1", "exon", 310, 410, "+", ""))
        .unwrap();
    assert_eq!(store.resolve_aid("X", &near_second).unwrap(), candidates[1]);

    let between = assigner
        .build(record("chr1", "exon", 200, 300, "+", ""))
        .unwrap();
    assert_eq!(store.resolve_aid("X", &between).unwrap(), candidates[0]);

    assert!(matches!(
        store.resolve_aid("Y", &between),
        Err(AnnotError::UnresolvableParent { .. })
    ));

    assert_eq!(store.get_uid("X", Some(&near_second)).unwrap(), candidates[1]);
    assert!(matches!(
        store.get_uid("X", None),
        Err(AnnotError::DuplicateId { count: 2, .. })
    ));
    assert!(matches!(
        store.get_uid("Y", None),
        Err(AnnotError::UnresolvableParent { .. })
    ));
}

#[rstest]
fn test_get_uid_and_roots(gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    assert_eq!(gene_store.get_uid("G1", None).unwrap(), gene);

    let roots = gene_store.roots().collect_vec();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].aid().map(String::as_str), Some("G1"));
}

#[test]
fn test_ambiguous_containment() {
    let records = vec![
        record("chr1", "mRNA", 100, 600, "+", "ID=T1"),
        record("chr1", "exon", 100, 300, "+", "ID=E1;Parent=T1"),
        record("chr1", "exon", 400, 600, "+", "ID=E2;Parent=T1"),
        record("chr1", "CDS", 250, 450, "+", "ID=C1;Parent=T1"),
    ];
    let mut store = AnnotStore::new(containment_config());
    let result = store.insert_batch(records, DuplicatePolicy::Fail);
    assert!(matches!(
        result,
        Err(AnnotError::AmbiguousContainment { candidates: 2, .. })
    ));
    assert!(store.is_empty());
    assert!(store.orphans().is_empty());
}

#[test]
fn test_uncontained_cds() {
    let records = vec![
        record("chr1", "mRNA", 100, 600, "+", "ID=T1"),
        record("chr1", "exon", 100, 300, "+", "ID=E1;Parent=T1"),
        record("chr1", "CDS", 350, 380, "+", "ID=C1;Parent=T1"),
    ];
    let result = AnnotStore::from_records(records, containment_config());
    assert!(matches!(
        result,
        Err(AnnotError::AmbiguousContainment { candidates: 0, .. })
    ));
}

#[test]
fn test_cds_on_last_exon_base() {
    let records = vec![
        record("chr1", "gene", 100, 1000, "+", "ID=G1"),
        record("chr1", "mRNA", 100, 1000, "+", "ID=T1;Parent=G1"),
        record("chr1", "exon", 100, 300, "+", "ID=E1;Parent=T1"),
        record("chr1", "CDS", 300, 300, "+", "ID=C1;Parent=T1"),
    ];
    let (store, _) = AnnotStore::from_records(records, containment_config()).unwrap();
    let exon = uid_of(&store, "E1");
    let cds = store.lookup(&uid_of(&store, "C1")).unwrap();
    assert_eq!(cds.parent_uid(), Some(&exon));
    assert_eq!(desc_aids(&store, &exon), vec!["C1"]);
}

#[rstest]
fn test_insert_remove_net_zero(mut gene_store: AnnotStore) {
    let (len, n_aids) = (gene_store.len(), gene_store.aids().count());
    let report = gene_store
        .insert_batch(
            vec![record("chr2", "gene", 1, 10, "-", "ID=lonely")],
            DuplicatePolicy::Fail,
        )
        .unwrap();
    let uid = report.inserted[0].clone();
    gene_store.remove(&uid, false).unwrap();

    assert_eq!(gene_store.len(), len);
    assert_eq!(gene_store.aids().count(), n_aids);
    assert!(gene_store.uids_for("lonely").is_none());
}

#[rstest]
fn test_remove_cascade(mut gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let removal = gene_store.remove(&gene, true).unwrap();

    assert!(gene_store.is_empty());
    assert_eq!(gene_store.aids().count(), 0);
    assert!(gene_store.container_index(&uid_of_tree(&removal.snapshot, "T1")).is_none());
    assert_eq!(removal.removed.len(), 6);
    assert_eq!(removal.removed.last(), Some(&gene));
    assert_eq!(removal.snapshot.n_features(), 6);
    assert!(matches!(
        gene_store.descendants(&gene),
        Err(AnnotError::FeatureNotFound { .. })
    ));
}

fn uid_of_tree(
    tree: &FeatureTree,
    aid: &str,
) -> Uid {
    tree.iter()
        .find(|f| f.aid().map(String::as_str) == Some(aid))
        .map(|f| f.uid().clone())
        .unwrap()
}

#[rstest]
fn test_remove_orphans_children(mut gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let mrna = uid_of(&gene_store, "T1");
    let removal = gene_store.remove(&mrna, false).unwrap();

    assert_eq!(gene_store.len(), 5);
    assert_eq!(removal.warnings.len(), 2);
    assert!(gene_store.lookup(&gene).unwrap().children().is_empty());
    let exon = uid_of(&gene_store, "E1");
    assert!(gene_store.orphans().contains(&exon));
    assert!(gene_store.lookup(&exon).unwrap().parent_uid().is_none());
    assert_eq!(desc_aids(&gene_store, &exon), vec!["C1"]);
}

#[test]
fn test_remove_missing() {
    let mut store = AnnotStore::default();
    assert!(matches!(
        store.remove(&Uid::from("nope"), true),
        Err(AnnotError::FeatureNotFound { .. })
    ));
}

#[rstest]
fn test_remove_then_add(mut gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let before = gene_store.subtree(&gene).unwrap();
    let removal = gene_store.remove(&gene, true).unwrap();

    let report = gene_store.add(removal.snapshot, true).unwrap();
    assert_eq!(report.inserted.len(), 6);
    assert!(report.warnings.is_empty());
    assert_eq!(gene_store.subtree(&gene).unwrap(), before);
}

#[rstest]
fn test_readd_parent_relinks_orphans(mut gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let mrna = uid_of(&gene_store, "T1");
    let removal = gene_store.remove(&gene, false).unwrap();
    assert!(gene_store.orphans().contains(&mrna));

    let report = gene_store
        .add(FeatureTree::leaf(removal.snapshot.feature), false)
        .unwrap();
    assert_eq!(report.inserted, vec![gene.clone()]);
    assert!(gene_store.orphans().is_empty());
    assert_eq!(gene_store.lookup(&mrna).unwrap().parent_uid(), Some(&gene));
    assert_eq!(gene_store.lookup(&gene).unwrap().children(), &[mrna]);
    assert_eq!(
        desc_aids(&gene_store, &gene),
        vec!["T1", "E1", "C1", "E2", "C2"]
    );
}

#[rstest]
fn test_failed_adoption_rolls_back(mut gene_store: AnnotStore) {
    let mrna = uid_of(&gene_store, "T1");
    let cds = uid_of(&gene_store, "C1");
    let exon1 = uid_of(&gene_store, "E1");
    let exon2 = uid_of(&gene_store, "E2");
    gene_store.remove(&exon1, false).unwrap();
    assert!(gene_store.orphans().contains(&cds));

    let leaf = FeatureTree::leaf(gene_store.lookup(&mrna).unwrap().clone());
    let result = gene_store.add(leaf, false);
    assert!(matches!(
        result,
        Err(AnnotError::AmbiguousContainment { candidates: 0, .. })
    ));

    assert_eq!(gene_store.len(), 5);
    assert!(gene_store.orphans().contains(&cds));
    assert!(gene_store.lookup(&cds).unwrap().parent_uid().is_none());
    assert_eq!(gene_store.lookup(&mrna).unwrap().children(), &[exon2.clone()]);
    assert_eq!(gene_store.lookup(&exon2).unwrap().parent_uid(), Some(&mrna));
    assert_eq!(
        gene_store.lookup(&mrna).unwrap().parent_uid(),
        Some(&uid_of(&gene_store, "G1"))
    );
}

#[rstest]
fn test_merge_fail(gene_store: AnnotStore) {
    let mut store = gene_store.clone();
    let result = store.merge(gene_store, MergePolicy::Fail);
    assert!(matches!(
        result,
        Err(AnnotError::DuplicateId { ref id, count: 6 }) if id == "G1"
    ));
    assert_eq!(store.len(), 6);
}

#[rstest]
fn test_merge_rename(gene_store: AnnotStore) {
    let mut store = gene_store.clone();
    store.merge(gene_store, MergePolicy::Rename).unwrap();
    assert_eq!(store.len(), 12);

    let matches = store
        .aids()
        .filter(|aid| aid.starts_with("G1"))
        .sorted()
        .collect_vec();
    assert_eq!(matches, vec!["G1", "G1_merged"]);

    let gene = uid_of(&store, "G1_merged");
    let mrna = uid_of(&store, "T1_merged");
    let exon = uid_of(&store, "E1_merged");
    assert_eq!(store.lookup(&mrna).unwrap().parent_uid(), Some(&gene));
    assert_eq!(
        store
            .lookup(&mrna)
            .unwrap()
            .attributes()
            .get("Parent"),
        Some("G1_merged")
    );
    assert_eq!(
        desc_aids(&store, &gene),
        vec!["T1_merged", "E1_merged", "C1_merged", "E2_merged", "C2_merged"]
    );
    assert_eq!(
        desc_aids(&store, &exon),
        vec!["C1_merged"]
    );
    assert_eq!(desc_aids(&store, &uid_of(&store, "G1")).len(), 5);
}

#[test]
fn test_merge_disjoint() {
    let (mut left, _) = AnnotStore::from_records(
        vec![record("chr1", "gene", 1, 10, "+", "ID=A")],
        StoreConfig::default(),
    )
    .unwrap();
    let (right, _) = AnnotStore::from_records(
        vec![
            record("chr2", "gene", 1, 10, "+", "ID=B"),
            record("chr2", "mRNA", 1, 10, "+", "ID=B.1;Parent=B"),
        ],
        StoreConfig::default(),
    )
    .unwrap();
    let report = left.merge(right, MergePolicy::Fail).unwrap();
    assert_eq!(report.inserted.len(), 2);
    assert_eq!(left.len(), 3);
    assert_eq!(desc_aids(&left, &uid_of(&left, "B")), vec!["B.1"]);
}

#[test]
fn test_synonym_resolution() {
    let (mut original, _) = AnnotStore::from_records(
        vec![
            record("chr1", "gene", 100, 500, "+", "ID=G1;product=old"),
            record("chr1", "mRNA", 100, 500, "+", "ID=T1;Parent=G1"),
        ],
        StoreConfig::default(),
    )
    .unwrap();
    let (reference, _) = AnnotStore::from_records(
        vec![record("chr1", "gene", 100, 500, "+", "ID=G2;product=new")],
        StoreConfig::default(),
    )
    .unwrap();
    let g1 = uid_of(&original, "G1");
    let g2 = uid_of(&reference, "G2");

    let mut rules = AttributeRules::new();
    rules.insert(
        "gene".to_string(),
        vec![("product".to_string(), "product".to_string())],
    );
    let (before, after) =
        resolve_synonym(&mut original, &g1, &reference, &g2, rules, vec![]).unwrap();

    assert_eq!(after.feature.attributes().get("product"), Some("new"));
    assert_eq!(after.feature.aid().map(String::as_str), Some("G2"));
    assert_eq!(after.children.len(), 1);
    assert_eq!(after.children[0].feature.attributes().get("Parent"), Some("G2"));
    assert_eq!(after.children[0].feature.parent_uid(), Some(after.feature.uid()));

    assert_eq!(before.feature.attributes().get("product"), Some("old"));
    assert_eq!(before.feature.start(), after.feature.start());
    assert_eq!(before.feature.end(), after.feature.end());
    assert_eq!(before.feature.feature_type(), after.feature.feature_type());
    assert_eq!(
        before.children[0].feature.aid(),
        after.children[0].feature.aid()
    );

    assert!(original.lookup(&g1).is_none());
    assert!(original.uids_for("G1").is_none());
    assert_eq!(original.len(), 2);
    assert!(original.orphans().is_empty());
}

#[test]
fn test_synonym_rules_and_exclusions() {
    let (mut original, _) = AnnotStore::from_records(
        vec![
            record("chr1", "gene", 100, 500, "+", "ID=G1;Name=a;tmp=1"),
            record("chr1", "mRNA", 100, 500, "+", "ID=T1;Parent=G1;Name=a.1"),
            record("chr1", "exon", 100, 200, "+", "ID=E1;Parent=T1"),
        ],
        StoreConfig::default(),
    )
    .unwrap();
    let (reference, _) = AnnotStore::from_records(
        vec![record("chr1", "gene", 100, 500, "+", "ID=G2;Name=b;symbol=B")],
        StoreConfig::default(),
    )
    .unwrap();
    let g1 = uid_of(&original, "G1");
    let g2 = uid_of(&reference, "G2");

    let resolver = SynonymResolver::default()
        .with_rule(DEFAULT_RULES_KEY, "Name", "symbol")
        .with_excluded("TMP");
    let resolution = resolver
        .resolve(&mut original, &g1, &reference, &g2)
        .unwrap();

    let gene = original.lookup(&resolution.new_uid).unwrap();
    assert_eq!(gene.attributes().get("Name"), Some("B"));
    assert!(!gene.attributes().contains_key_ci("tmp"));

    let mrna = original.lookup(&uid_of(&original, "T1")).unwrap();
    assert_eq!(mrna.attributes().get("Name"), Some("B"));
    assert_eq!(mrna.parent_uid(), Some(&resolution.new_uid));
    assert_eq!(resolution.after.n_features(), 3);
    assert_eq!(
        desc_aids(&original, &resolution.new_uid),
        vec!["T1", "E1"]
    );
}

#[rstest]
fn test_synonym_failure_restores_store(mut gene_store: AnnotStore) {
    let (reference, _) = AnnotStore::from_records(
        vec![record("chr1", "gene", 100, 1000, "+", "ID=GENE_A")],
        StoreConfig::default(),
    )
    .unwrap();
    let gene = uid_of(&gene_store, "G1");
    let before = gene_store.subtree(&gene).unwrap();

    // Moving E1 under the gene leaves C1 without a container inside T1
    let resolver = SynonymResolver::default().with_rule("exon", "Parent", "ID");
    let result = resolver.resolve(
        &mut gene_store,
        &gene,
        &reference,
        &uid_of(&reference, "GENE_A"),
    );
    assert!(matches!(
        result,
        Err(AnnotError::AmbiguousContainment { candidates: 0, .. })
    ));

    assert_eq!(gene_store.len(), 6);
    assert!(gene_store.uids_for("GENE_A").is_none());
    assert!(gene_store.orphans().is_empty());
    assert_eq!(gene_store.subtree(&gene).unwrap(), before);
}

#[test]
fn test_synonym_missing_feature() {
    let mut original = AnnotStore::default();
    let reference = AnnotStore::default();
    let result = SynonymResolver::default().resolve(
        &mut original,
        &Uid::from("a"),
        &reference,
        &Uid::from("b"),
    );
    assert!(matches!(result, Err(AnnotError::FeatureNotFound { .. })));
}

#[test]
fn test_partition_build() {
    let mut records = gene_records();
    records.extend([
        record("chr2", "gene", 10, 90, "-", "ID=G2"),
        record("chr2", "mRNA", 10, 90, "-", "ID=T2;Parent=G2"),
        record("chr3", "exon", 10, 90, "-", "ID=E3;Parent=T2"),
    ]);

    let (parallel, report) =
        AnnotStore::from_records_parallel(records.clone(), containment_config()).unwrap();
    let (sequential, _) = AnnotStore::from_records(records, containment_config()).unwrap();

    assert_eq!(report.inserted.len(), 9);
    assert_eq!(parallel.len(), sequential.len());
    for (uid, feature) in sequential.iter() {
        let other = parallel.lookup(uid).unwrap();
        assert_eq!(other.parent_uid(), feature.parent_uid());
    }
    assert_eq!(
        desc_aids(&parallel, &uid_of(&parallel, "G2")),
        vec!["T2", "E3"]
    );
}

#[test]
fn test_build_partition_groups() {
    let assigner = IdentityAssigner::default();
    let result = partition::build_partition(
        "chr1".to_string(),
        gene_records(),
        &assigner,
        BatchPolicy::AllOrNothing,
    )
    .unwrap();
    assert_eq!(result.orphans.len(), 1);
    assert_eq!(result.children["G1"].len(), 1);
    assert_eq!(result.children["T1"].len(), 4);
    assert_eq!(result.n_features(), 6);

    let partitions = partition::partition_by_chr(vec![
        record("chr2", "gene", 1, 2, "+", ""),
        record("chr1", "gene", 1, 2, "+", ""),
        record("chr2", "gene", 3, 4, "+", ""),
    ]);
    assert_eq!(partitions.keys().collect_vec(), vec!["chr2", "chr1"]);
}

#[test]
fn test_config_json() {
    let config = StoreConfig::from_json_str(
        r#"{"duplicate_policy": "MakeUnique", "containment": {"container_type": "exon", "contained_type": "CDS", "zero_width_pad": 2}}"#,
    )
    .unwrap();
    assert_eq!(config.duplicate_policy, DuplicatePolicy::MakeUnique);
    assert_eq!(config.containment.unwrap().zero_width_pad, 2);
    assert_eq!(config.identity.id_key, "ID");
    assert_eq!(config.merge_suffix, "_merged");
}

#[rstest]
fn test_feature_tree_lines(gene_store: AnnotStore) {
    let gene = uid_of(&gene_store, "G1");
    let tree = gene_store.subtree(&gene).unwrap();
    let lines = tree.to_lines(AnnotFormat::Gff3);
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "chr1\ttest\tgene\t100\t1000\t.\t+\t.\tID=G1;Name=alpha"
    );
    assert!(lines[3].contains("ID=C1"));
}
