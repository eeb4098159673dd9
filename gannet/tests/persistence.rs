use gannet::io::GIX_EXTENSION;
use gannet::prelude::*;
use itertools::Itertools;
use tempfile::tempdir;

mod common;
use common::{
    first_uid,
    load_demo,
};

#[test]
fn test_gix_roundtrip() -> anyhow::Result<()> {
    let (store, _) = load_demo();
    let dir = tempdir()?;
    let path = dir.path().join("annot").with_extension(GIX_EXTENSION);

    store.save_gix(&path)?;
    let loaded = AnnotStore::load_gix(&path)?;

    assert_eq!(loaded.len(), store.len());
    assert_eq!(loaded.config(), store.config());
    assert_eq!(loaded.orphans(), store.orphans());
    for (uid, feature) in store.iter() {
        assert_eq!(loaded.lookup(uid), Some(feature));
        assert_eq!(
            loaded.descendants(uid)?.into_iter().map(Feature::uid).collect_vec(),
            store.descendants(uid)?.into_iter().map(Feature::uid).collect_vec()
        );
    }
    for aid in store.aids() {
        for uid in store.uids_for(aid).unwrap() {
            let context = store.lookup(uid).unwrap();
            assert_eq!(
                loaded.resolve_aid(aid, context)?,
                store.resolve_aid(aid, context)?
            );
        }
    }
    Ok(())
}

#[test]
fn test_loaded_store_is_editable() -> anyhow::Result<()> {
    let (store, _) = load_demo();
    let mut buffer = Vec::new();
    store.to_writer(&mut buffer)?;
    let mut loaded = AnnotStore::from_reader(&mut buffer.as_slice())?;

    let tx1 = first_uid(&loaded, "tx1");
    let exon1 = first_uid(&loaded, "exon1");
    assert_eq!(loaded.container_index(&tx1).map(|i| i.len()), Some(3));

    loaded.remove(&exon1, true)?;
    assert_eq!(loaded.container_index(&tx1).map(|i| i.len()), Some(2));
    assert!(loaded.uids_for("cds1").is_none());

    let (other, _) = load_demo();
    loaded.merge(other, MergePolicy::Rename)?;
    assert!(loaded.uids_for("gene1_merged").is_some());
    Ok(())
}

#[test]
fn test_corrupt_gix() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.gix");
    std::fs::write(&path, b"not a store")?;
    assert!(matches!(
        AnnotStore::load_gix(&path),
        Err(AnnotError::Decode(_))
    ));
    Ok(())
}
