use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sbk",
    about = "Inspect and convert ScrapBook archives",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Archive root holding scrapbook.rdf and data/
    #[arg(long, global = true, default_value = ".")]
    pub source: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the resolved root folder (the default)
    Tree,
    /// Dump every item with its property count
    Items,
    /// Dump the property names of one item
    Props(IdArgs),
    /// Print one resolved item
    Item(IdArgs),
    /// Convert the archive into plain files
    Convert(ConvertArgs),
    /// Pack a directory into an MHTML container
    Pack(PackArgs),
    /// Unpack an MHTML container into a new directory
    Unpack(PackArgs),
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Output directory
    pub out: PathBuf,
    /// Pack saved pages into .mht files instead of copying them
    #[arg(long)]
    pub container: bool,
    /// Skip desktop.ini and .dat files
    #[arg(long)]
    pub no_sidecars: bool,
    /// Abort on the first failure
    #[arg(long)]
    pub strict: bool,
    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
    /// TOML file with conversion settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct PackArgs {
    /// Container file, or "-" for stdin/stdout
    pub mht: PathBuf,
    pub dir: PathBuf,
    #[arg(long)]
    pub overwrite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_is_the_default() {
        let cli = Cli::try_parse_from(["sbk"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.source, PathBuf::from("."));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sbk", "items", "--source", "/arch", "-v", "--format", "json"])
            .unwrap();
        assert!(matches!(cli.command, Some(Command::Items)));
        assert_eq!(cli.source, PathBuf::from("/arch"));
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_props() {
        let cli = Cli::try_parse_from(["sbk", "props", "20150101000000"]).unwrap();
        if let Some(Command::Props(args)) = cli.command {
            assert_eq!(args.id, "20150101000000");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_convert() {
        let cli = Cli::try_parse_from([
            "sbk", "convert", "out", "--container", "--no-sidecars", "--strict", "--config", "c.toml",
        ])
        .unwrap();
        if let Some(Command::Convert(args)) = cli.command {
            assert_eq!(args.out, PathBuf::from("out"));
            assert!(args.container && args.no_sidecars && args.strict);
            assert!(!args.overwrite);
            assert_eq!(args.config, Some(PathBuf::from("c.toml")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_unpack_from_stdin() {
        let cli = Cli::try_parse_from(["sbk", "unpack", "-", "dir", "--overwrite"]).unwrap();
        if let Some(Command::Unpack(args)) = cli.command {
            assert_eq!(args.mht, PathBuf::from("-"));
            assert!(args.overwrite);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn convert_needs_output() {
        assert!(Cli::try_parse_from(["sbk", "convert"]).is_err());
    }
}
