pub mod persist;
pub mod reader;
pub mod writer;

pub use persist::GIX_EXTENSION;
pub use reader::{
    parse_record,
    AnnotReader,
};
pub use writer::{
    GffWriter,
    GFF3_HEADER,
};
