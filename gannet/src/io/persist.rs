use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
    Read,
    Write,
};
use std::path::Path;

use log::info;

use crate::data_structs::AnnotStore;
use crate::error::AnnotResult;

/// Extension of serialized store files.
pub const GIX_EXTENSION: &str = "gix";

impl AnnotStore {
    /// Serializes the whole store, indexes included, with bincode.
    pub fn to_writer<W: Write>(
        &self,
        writer: &mut W,
    ) -> AnnotResult<()> {
        let config = bincode::config::standard();
        bincode::serde::encode_into_std_write(self, writer, config)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: &mut R) -> AnnotResult<Self> {
        let config = bincode::config::standard();
        Ok(bincode::serde::decode_from_std_read(reader, config)?)
    }

    pub fn save_gix<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> AnnotResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            "Saved {} features to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load_gix<P: AsRef<Path>>(path: P) -> AnnotResult<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let store = Self::from_reader(&mut reader)?;
        info!(
            "Loaded {} features from {}",
            store.len(),
            path.as_ref().display()
        );
        Ok(store)
    }
}
