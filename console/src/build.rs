use std::path::PathBuf;

use clap::Args;
use console::style;
use gannet::prelude::*;
use log::{
    info,
    warn,
};

use crate::utils::{
    init_spinner,
    validate_input,
    validate_output,
    CliDuplicatePolicy,
    CliFormat,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct BuildArgs {
    #[arg(required = true, help = "Path to GFF3/GTF annotation file")]
    input: PathBuf,

    #[arg(short, long, required = true, help = "Path of the output .gix file")]
    output: PathBuf,

    #[arg(
        short,
        long,
        help = "JSON file with store configuration. Command line options \
                override its values."
    )]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_enum,
        help = "Input format. Guessed from the extension when omitted."
    )]
    format: Option<CliFormat>,

    #[arg(long, value_enum, help = "How to handle records with identical content")]
    on_duplicate: Option<CliDuplicatePolicy>,

    #[arg(long, default_value_t = false, help = "Skip malformed records")]
    partial: bool,

    #[arg(
        long,
        default_value_t = false,
        help = "Place contained features under the overlapping container"
    )]
    containment: bool,

    #[arg(long, default_value = "exon", help = "Container feature type")]
    container_type: String,

    #[arg(long, default_value = "CDS", help = "Contained feature type")]
    contained_type: String,

    #[arg(long, default_value_t = false, help = "Build chromosomes in parallel")]
    parallel: bool,
}

impl BuildArgs {
    fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_json_file(validate_input(path)?)?,
            None => StoreConfig::default(),
        };
        config.format = self
            .format
            .map(AnnotFormat::from)
            .unwrap_or_else(|| AnnotFormat::from_path(&self.input));
        if let Some(policy) = self.on_duplicate {
            config.duplicate_policy = policy.into();
        }
        if self.partial {
            config.batch_policy = BatchPolicy::PartialSuccess;
        }
        if self.containment {
            config.containment = Some(
                ContainmentConfig::default()
                    .with_container_type(self.container_type.clone())
                    .with_contained_type(self.contained_type.clone()),
            );
        }
        Ok(config)
    }

    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let input = validate_input(&self.input)?;
        let output = validate_output(&self.output)?;
        let config = self.store_config()?;

        let spinner = init_spinner(
            !utils.no_progress,
            &format!("Reading {}", input.display()),
        )?;
        let (store, report) = if self.parallel {
            let records = AnnotReader::new(std::fs::File::open(&input)?, config.format)
                .filter_map(|record| {
                    match record {
                        Ok(record) => Some(Ok(record)),
                        Err(err @ AnnotError::MalformedRecord { .. })
                            if config.batch_policy == BatchPolicy::PartialSuccess =>
                        {
                            warn!("Skipping record: {}", err);
                            None
                        },
                        Err(err) => Some(Err(err)),
                    }
                })
                .collect::<AnnotResult<Vec<_>>>()?;
            AnnotStore::from_records_parallel(records, config)?
        }
        else {
            AnnotStore::from_path(&input, config)?
        };
        spinner.set_message(format!("Saving {}", output.display()));
        store.save_gix(&output)?;
        spinner.finish_and_clear();

        info!(
            "Built store with {} features from {}",
            store.len(),
            input.display()
        );
        if !report.warnings.is_empty() {
            eprintln!(
                "{} warnings, {} orphans",
                style(report.warnings.len()).yellow(),
                style(store.orphans().len()).yellow()
            );
        }
        if !report.rejected.is_empty() {
            eprintln!(
                "{} records were skipped",
                style(report.rejected.len()).red()
            );
        }
        Ok(())
    }
}
