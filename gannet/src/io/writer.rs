use std::io::Write;

use csv::{
    QuoteStyle,
    Writer,
    WriterBuilder,
};

use crate::config::AnnotFormat;
use crate::data_structs::{
    AnnotStore,
    Feature,
    FeatureTree,
};
use crate::error::AnnotResult;

pub const GFF3_HEADER: &str = "##gff-version 3";

/// Writes features as tab-delimited lines, one per feature.
pub struct GffWriter<W: Write> {
    inner:  Writer<W>,
    format: AnnotFormat,
}

impl<W: Write> GffWriter<W> {
    /// Creates a writer. GFF3 output starts with the version pragma.
    pub fn try_new(
        mut sink: W,
        format: AnnotFormat,
    ) -> AnnotResult<Self> {
        if format == AnnotFormat::Gff3 {
            writeln!(sink, "{}", GFF3_HEADER)?;
        }
        let inner = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(sink);
        Ok(Self { inner, format })
    }

    pub fn write_feature(
        &mut self,
        feature: &Feature,
    ) -> AnnotResult<()> {
        let (chr, src, ft, start, end, score, strand, frame, attrs) =
            feature.fields(self.format);
        self.inner.write_record([
            chr,
            src,
            ft,
            start.to_string(),
            end.to_string(),
            score,
            strand.to_string(),
            frame.to_string(),
            attrs,
        ])?;
        Ok(())
    }

    /// Writes a detached subtree in pre-order.
    pub fn write_tree(
        &mut self,
        tree: &FeatureTree,
    ) -> AnnotResult<()> {
        for feature in tree.iter() {
            self.write_feature(feature)?;
        }
        Ok(())
    }

    /// Writes every top-level feature of the store followed by its
    /// descendants. Returns the number of written lines.
    pub fn write_store(
        &mut self,
        store: &AnnotStore,
    ) -> AnnotResult<usize> {
        let mut written = 0;
        for top in store.top_level() {
            self.write_feature(top)?;
            written += 1;
            for desc in store.descendants(top.uid())? {
                self.write_feature(desc)?;
                written += 1;
            }
        }
        Ok(written)
    }

    pub fn flush(&mut self) -> AnnotResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}
