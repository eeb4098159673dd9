use std::path::PathBuf;

use gannet::prelude::*;

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

pub fn load_demo() -> (AnnotStore, BuildReport) {
    let config = StoreConfig::default().with_containment(Some(ContainmentConfig::default()));
    AnnotStore::from_path(data_path("annot.gff3"), config).unwrap()
}

pub fn first_uid(
    store: &AnnotStore,
    aid: &str,
) -> Uid {
    store
        .uids_for(aid)
        .and_then(|uids| uids.first().cloned())
        .unwrap()
}
