use std::fs::File;
use std::io::{
    stdout,
    BufWriter,
    Write,
};
use std::path::PathBuf;

use clap::Args;
use gannet::prelude::*;
use log::info;

use crate::utils::{
    load_store,
    select_feature,
    validate_output,
    CliFormat,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct ExportArgs {
    #[arg(required = true, help = "Path to .gix file")]
    input: PathBuf,

    #[arg(short, long, help = "Output path. Writes to stdout when omitted.")]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = CliFormat::Gff3, help = "Output format")]
    format: CliFormat,

    #[arg(long, help = "Export only the subtree of the feature with this identifier")]
    id: Option<String>,

    #[arg(long, help = "Export only the subtree of the feature with this uid")]
    uid: Option<String>,
}

impl ExportArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let store = load_store(&self.input)?;
        let sink: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(validate_output(path)?)?)),
            None => Box::new(BufWriter::new(stdout().lock())),
        };
        let mut writer = GffWriter::try_new(sink, self.format.into())?;

        if self.id.is_some() || self.uid.is_some() {
            let uid = select_feature(&store, self.id.as_deref(), self.uid.as_deref())?;
            let tree = store.subtree(&uid)?;
            writer.write_tree(&tree)?;
            info!("Exported {} features", tree.n_features());
        }
        else {
            let written = writer.write_store(&store)?;
            info!("Exported {} features", written);
        }
        writer.flush()?;
        Ok(())
    }
}
