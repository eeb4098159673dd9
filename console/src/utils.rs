use std::fs::File;
use std::io::BufReader;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use anyhow::{
    anyhow,
    bail,
};
use clap::{
    Args,
    ValueEnum,
};
use gannet::prelude::*;
use gannet::utils::NUM_THREADS_ENV;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use itertools::Itertools;
use log::LevelFilter;

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(long, short = 'v', default_value_t = false, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(
        long,
        short = 't',
        help = "Number of threads to use. Defaults to all available."
    )]
    pub threads: Option<usize>,

    #[arg(long, default_value_t = false, help = "Hide progress spinner.")]
    pub no_progress: bool,
}

impl UtilsArgs {
    pub fn setup(&self) -> anyhow::Result<()> {
        let level = if self.verbose {
            LevelFilter::Debug
        }
        else {
            LevelFilter::Info
        };
        pretty_env_logger::formatted_builder()
            .filter_level(level)
            .parse_default_env()
            .try_init()?;

        if let Some(threads) = self.threads {
            // Must happen before the thread pool is first used
            std::env::set_var(NUM_THREADS_ENV, threads.to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum CliFormat {
    Gff3,
    Gtf,
}

impl From<CliFormat> for AnnotFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Gff3 => AnnotFormat::Gff3,
            CliFormat::Gtf => AnnotFormat::Gtf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum CliDuplicatePolicy {
    Fail,
    MakeUnique,
    Overwrite,
}

impl From<CliDuplicatePolicy> for DuplicatePolicy {
    fn from(value: CliDuplicatePolicy) -> Self {
        match value {
            CliDuplicatePolicy::Fail => DuplicatePolicy::Fail,
            CliDuplicatePolicy::MakeUnique => DuplicatePolicy::MakeUnique,
            CliDuplicatePolicy::Overwrite => DuplicatePolicy::Overwrite,
        }
    }
}

pub(crate) fn validate_input(path: &Path) -> anyhow::Result<PathBuf> {
    if !path.exists() {
        bail!("Path {} does not exist", path.display());
    }
    if !path.is_file() {
        bail!("Path {} is not a file", path.display());
    }
    Ok(path.to_path_buf())
}

pub(crate) fn validate_output(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_dir() {
        bail!("Output path {} is a directory", path.display());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            bail!("Directory {} does not exist", parent.display());
        }
    }
    Ok(path.to_path_buf())
}

pub(crate) fn init_spinner(
    enabled: bool,
    message: &str,
) -> anyhow::Result<ProgressBar> {
    if !enabled {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

pub(crate) fn load_store(path: &Path) -> anyhow::Result<AnnotStore> {
    Ok(AnnotStore::load_gix(validate_input(path)?)?)
}

/// Picks a single feature either by uid or by identifier.
pub(crate) fn select_feature(
    store: &AnnotStore,
    id: Option<&str>,
    uid: Option<&str>,
) -> anyhow::Result<Uid> {
    match (id, uid) {
        (_, Some(uid)) => {
            let uid = Uid::from(uid);
            store.get_feature(&uid)?;
            Ok(uid)
        },
        (Some(id), None) => {
            let uids = store
                .uids_for(id)
                .ok_or_else(|| anyhow!("No feature with identifier '{}'", id))?;
            if uids.len() > 1 {
                bail!(
                    "Identifier '{}' matches {} features, select one by uid: {}",
                    id,
                    uids.len(),
                    uids.iter().join(", ")
                );
            }
            uids.first()
                .cloned()
                .ok_or_else(|| anyhow!("No feature with identifier '{}'", id))
        },
        (None, None) => bail!("Either an identifier or a uid must be given"),
    }
}

/// Reads attribute rules as a JSON object of
/// `feature_type -> [[original_key, reference_key], ...]`.
pub(crate) fn read_rules(path: &Path) -> anyhow::Result<AttributeRules> {
    let reader = BufReader::new(File::open(validate_input(path)?)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_read_rules() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"gene": [["product", "product"]], "default": [["Name", "symbol"]]}}"#
        )?;
        let rules = read_rules(file.path())?;
        assert_eq!(
            rules["gene"],
            vec![("product".to_string(), "product".to_string())]
        );
        assert_eq!(rules["default"].len(), 1);
        Ok(())
    }

    #[test]
    fn test_select_feature() -> anyhow::Result<()> {
        let record = |start: PosType, id: &str| {
            FeatureRecord {
                chr: "chr1".to_string(),
                src: ".".to_string(),
                feature_type: "gene".to_string(),
                start,
                end: start + 10,
                score: None,
                strand: "+".to_string(),
                frame: ".".to_string(),
                attributes: [("ID", id)].into_iter().collect(),
            }
        };
        let (store, _) = AnnotStore::from_records(
            vec![record(1, "a"), record(20, "b"), record(40, "b")],
            StoreConfig::default(),
        )?;

        let a = select_feature(&store, Some("a"), None)?;
        assert_eq!(store.lookup(&a).and_then(|f| f.aid()).map(String::as_str), Some("a"));
        assert!(select_feature(&store, Some("b"), None).is_err());
        assert!(select_feature(&store, Some("c"), None).is_err());
        assert!(select_feature(&store, None, Some("deadbeef")).is_err());
        assert_eq!(select_feature(&store, None, Some(a.as_str()))?, a);
        Ok(())
    }
}
