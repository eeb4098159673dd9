use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{
    ReaderBuilder,
    StringRecord,
    StringRecordsIntoIter,
};

use crate::config::AnnotFormat;
use crate::data_structs::typedef::{
    PosType,
    ScoreType,
};
use crate::data_structs::{
    Attributes,
    FeatureRecord,
};
use crate::error::{
    AnnotError,
    AnnotResult,
};

/// Minimal number of columns; the attribute column may be omitted.
const MIN_COLUMNS: usize = 8;

/// Streaming reader of tab-delimited GFF3/GTF files.
///
/// Lines starting with `#` are skipped. Every row is decoded into a
/// [`FeatureRecord`]; validation of positional fields happens when the record
/// is turned into a feature.
pub struct AnnotReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    format:  AnnotFormat,
}

impl<R: Read> AnnotReader<R> {
    pub fn new(
        handle: R,
        format: AnnotFormat,
    ) -> Self {
        let records = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_reader(handle)
            .into_records();
        Self { records, format }
    }

    pub fn format(&self) -> AnnotFormat {
        self.format
    }
}

impl AnnotReader<File> {
    /// Opens `path`, guessing the format from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> AnnotResult<Self> {
        let format = AnnotFormat::from_path(&path);
        Ok(Self::new(File::open(path)?, format))
    }
}

impl<R: Read> Iterator for AnnotReader<R> {
    type Item = AnnotResult<FeatureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(err) => return Some(Err(err.into())),
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or_default();
        Some(parse_record(&record, self.format).map_err(|e| e.at_line(line)))
    }
}

/// Decodes one row into a [`FeatureRecord`].
pub fn parse_record(
    record: &StringRecord,
    format: AnnotFormat,
) -> AnnotResult<FeatureRecord> {
    if record.len() < MIN_COLUMNS {
        return Err(AnnotError::malformed(format!(
            "expected at least {} columns, found {}",
            MIN_COLUMNS,
            record.len()
        )));
    }
    let column = |idx: usize| record.get(idx).unwrap_or_default().trim();

    let start = parse_position(column(3), "start")?;
    let end = parse_position(column(4), "end")?;
    let score = match column(5) {
        "." | "" => None,
        value => {
            Some(value.parse::<ScoreType>().map_err(|_| {
                AnnotError::malformed(format!("invalid score '{value}'"))
            })?)
        },
    };
    let attributes = match column(8) {
        "." | "" => Attributes::default(),
        value => Attributes::parse(value, format)?,
    };

    Ok(FeatureRecord {
        chr: column(0).to_string(),
        src: column(1).to_string(),
        feature_type: column(2).to_string(),
        start,
        end,
        score,
        strand: column(6).to_string(),
        frame: column(7).to_string(),
        attributes,
    })
}

fn parse_position(
    value: &str,
    name: &str,
) -> AnnotResult<PosType> {
    if value.is_empty() {
        return Err(AnnotError::malformed(format!("missing {name}")));
    }
    value.parse::<PosType>().map_err(|_| {
        AnnotError::malformed(format!("invalid {name} '{value}'"))
    })
}
