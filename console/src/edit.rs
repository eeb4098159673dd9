use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Args;
use console::style;
use gannet::prelude::*;
use log::info;

use crate::utils::{
    load_store,
    read_rules,
    select_feature,
    validate_output,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct RemoveArgs {
    #[arg(required = true, help = "Path to .gix file")]
    input: PathBuf,

    #[arg(short, long, help = "Output .gix path. Overwrites the input when omitted.")]
    output: Option<PathBuf>,

    #[arg(long, help = "Identifier of the feature to remove")]
    id: Option<String>,

    #[arg(long, help = "Uid of the feature to remove")]
    uid: Option<String>,

    #[arg(long, default_value_t = false, help = "Remove all descendants as well")]
    cascade: bool,

    #[arg(long, help = "Write the removed subtree as GFF3 to this path")]
    snapshot: Option<PathBuf>,
}

impl RemoveArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let mut store = load_store(&self.input)?;
        let uid = select_feature(&store, self.id.as_deref(), self.uid.as_deref())?;
        let removal = store.remove(&uid, self.cascade)?;

        if let Some(path) = &self.snapshot {
            let sink = BufWriter::new(File::create(validate_output(path)?)?);
            let mut writer = GffWriter::try_new(sink, AnnotFormat::Gff3)?;
            writer.write_tree(&removal.snapshot)?;
            writer.flush()?;
        }
        for warning in removal.warnings.iter() {
            eprintln!("{}", style(warning).yellow());
        }

        let output = self.output.as_ref().unwrap_or(&self.input);
        store.save_gix(validate_output(output)?)?;
        info!(
            "Removed {} features, {} left",
            removal.removed.len(),
            store.len()
        );
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct MergeArgs {
    #[arg(required = true, num_args = 2.., help = "Paths to .gix files")]
    inputs: Vec<PathBuf>,

    #[arg(short, long, required = true, help = "Output .gix path")]
    output: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Rename colliding identifiers instead of failing"
    )]
    rename: bool,
}

impl MergeArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let output = validate_output(&self.output)?;
        let policy = if self.rename {
            MergePolicy::Rename
        }
        else {
            MergePolicy::Fail
        };

        let mut paths = self.inputs.iter();
        let first = paths
            .next()
            .ok_or_else(|| anyhow::anyhow!("No input files given"))?;
        let mut store = load_store(first)?;
        for path in paths {
            let other = load_store(path)?;
            let report = store.merge(other, policy)?;
            info!(
                "Merged {} features from {}",
                report.inserted.len(),
                path.display()
            );
        }
        store.save_gix(output)?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct SynonymArgs {
    #[arg(required = true, help = "Path to .gix file with the feature to rename")]
    original: PathBuf,

    #[arg(required = true, help = "Path to .gix file with the reference feature")]
    reference: PathBuf,

    #[arg(long, required = true, help = "Identifier of the feature to rename")]
    id: String,

    #[arg(long, required = true, help = "Identifier of the reference feature")]
    ref_id: String,

    #[arg(
        short,
        long,
        help = "JSON file with attribute rules: {\"gene\": [[\"original_key\", \"reference_key\"]]}"
    )]
    rules: Option<PathBuf>,

    #[arg(short, long, num_args = 1.., help = "Attributes to drop from renamed features")]
    exclude: Vec<String>,

    #[arg(short, long, help = "Output .gix path. Overwrites the original when omitted.")]
    output: Option<PathBuf>,
}

impl SynonymArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let mut original = load_store(&self.original)?;
        let reference = load_store(&self.reference)?;
        let original_uid = select_feature(&original, Some(self.id.as_str()), None)?;
        let reference_uid = select_feature(&reference, Some(self.ref_id.as_str()), None)?;
        let rules = match &self.rules {
            Some(path) => read_rules(path)?,
            None => AttributeRules::new(),
        };

        let resolution = SynonymResolver::new(rules, self.exclude.clone()).resolve(
            &mut original,
            &original_uid,
            &reference,
            &reference_uid,
        )?;

        let before = resolution.before.to_lines(AnnotFormat::Gff3);
        let after = resolution.after.to_lines(AnnotFormat::Gff3);
        for line in before.iter().filter(|l| !after.contains(l)) {
            println!("{}", style(format!("- {line}")).red());
        }
        for line in after.iter().filter(|l| !before.contains(l)) {
            println!("{}", style(format!("+ {line}")).green());
        }

        let output = self.output.as_ref().unwrap_or(&self.original);
        original.save_gix(validate_output(output)?)?;
        info!(
            "Renamed {} to {} (uid {})",
            self.id,
            self.ref_id,
            resolution.new_uid.short()
        );
        Ok(())
    }
}
