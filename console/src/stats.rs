use std::path::PathBuf;

use clap::Args;
use console::style;
use hashbrown::HashMap;
use itertools::Itertools;

use crate::utils::{
    load_store,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct StatsArgs {
    #[arg(required = true, help = "Path to .gix file")]
    input: PathBuf,

    #[arg(long, default_value_t = false, help = "Print statistics as JSON")]
    json: bool,
}

impl StatsArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let store = load_store(&self.input)?;

        let mut by_type: HashMap<String, usize> = HashMap::new();
        let mut by_chr: HashMap<String, usize> = HashMap::new();
        for (_, feature) in store.iter() {
            *by_type
                .entry(feature.feature_type().to_string())
                .or_default() += 1;
            *by_chr
                .entry(feature.chr().to_string())
                .or_default() += 1;
        }
        let top_level = store.top_level().count();
        let ambiguous = store
            .aids()
            .filter(|aid| {
                store
                    .uids_for(aid)
                    .is_some_and(|uids| uids.len() > 1)
            })
            .count();

        if self.json {
            let value = serde_json::json!({
                "features": store.len(),
                "identifiers": store.aids().count(),
                "ambiguous_identifiers": ambiguous,
                "top_level": top_level,
                "orphans": store.orphans().len(),
                "feature_types": by_type,
                "chromosomes": by_chr,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("Features:              {}", style(store.len()).green());
        println!("Identifiers:           {}", store.aids().count());
        println!("Ambiguous identifiers: {}", style(ambiguous).yellow());
        println!("Top-level features:    {}", top_level);
        println!("Orphans:               {}", style(store.orphans().len()).yellow());
        println!();
        for (feature_type, count) in by_type
            .iter()
            .sorted_by_key(|(k, v)| (std::cmp::Reverse(**v), (*k).clone()))
        {
            println!("{:<22} {}", feature_type, count);
        }
        println!();
        for (chr, count) in by_chr.iter().sorted() {
            println!("{:<22} {}", chr, count);
        }
        Ok(())
    }
}
