pub use crate::config::{
    AnnotFormat,
    BatchPolicy,
    ContainmentConfig,
    DuplicatePolicy,
    IdentityConfig,
    MergePolicy,
    StoreConfig,
};
pub use crate::data_structs::typedef::{
    Aid,
    PosType,
    ScoreType,
    Uid,
};
pub use crate::data_structs::{
    resolve_synonym,
    AnnotStore,
    AttributeRules,
    Attributes,
    BuildReport,
    Feature,
    FeatureRecord,
    FeatureTree,
    Frame,
    IdentityAssigner,
    IntervalIndex,
    Removal,
    Strand,
    SynonymResolution,
    SynonymResolver,
};
pub use crate::error::{
    AnnotError,
    AnnotResult,
    AnnotWarning,
};
pub use crate::io::{
    AnnotReader,
    GffWriter,
};
