mod build;
mod edit;
mod export;
mod stats;
pub mod utils;

use build::BuildArgs;
use clap::{
    Parser,
    Subcommand,
};
use edit::{
    MergeArgs,
    RemoveArgs,
    SynonymArgs,
};
use export::ExportArgs;
use stats::StatsArgs;
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    /// Build a .gix store from a GFF3/GTF file.
    Build {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  BuildArgs,
    },

    /// Write a store (or one subtree) back as GFF3/GTF.
    Export {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  ExportArgs,
    },

    /// Remove a feature, optionally with its descendants.
    Remove {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  RemoveArgs,
    },

    /// Merge several stores into one.
    Merge {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  MergeArgs,
    },

    /// Rename a feature after its counterpart in a reference store.
    Synonym {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  SynonymArgs,
    },

    /// Print store statistics.
    Stats {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  StatsArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Build { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Export { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Remove { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Merge { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Synonym { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Stats { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
