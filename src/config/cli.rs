use crate::config::toml_config::{BuildConfig, DEFAULT_CONFIG_FILE};
use crate::domain::model::{ConversionOptions, RoundingMode, Variant};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pcblib", version)]
#[command(about = "Build KiCad IPC7351 footprint libraries and fetch their 3D models")]
pub struct CliConfig {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Show what would be built without touching anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build every IPC variant, then refresh the 3D models
    All,
    /// Build IPC footprint libraries
    Ipc(IpcArgs),
    /// Refresh the 3D model directory
    #[command(name = "3d")]
    Models3d,
    /// Convert FreePCB library files into a KiCad .pretty directory
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct IpcArgs {
    /// Variants to build (default: the ones listed in the configuration)
    #[arg(long = "variant", value_name = "VARIANT", action = ArgAction::Append)]
    pub variants: Vec<Variant>,

    /// Ask for the FreePCB license before downloading
    #[arg(long)]
    pub confirm_license: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Output directory
    #[arg(value_name = "DIR")]
    pub outdir: PathBuf,

    /// FreePCB-format inputs, merged into one library
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// File mapping footprints to 3D models
    #[arg(long = "3dmap", value_name = "FILE")]
    pub threedmap: Option<PathBuf>,

    /// Round all corners of square pads
    #[arg(long, conflicts_with = "rounded_except_1")]
    pub rounded_pads: bool,

    /// Round all corners of square pads, except pad 1
    #[arg(long = "rounded-except-1")]
    pub rounded_except_1: bool,

    /// Exceptions list for rounded pads
    #[arg(long, value_name = "FILE")]
    pub rounded_pad_exceptions: Option<PathBuf>,

    /// Exceptions list for rounded center pads
    #[arg(long, value_name = "FILE")]
    pub rounded_center_exceptions: Option<PathBuf>,

    /// Strip final L/M/N specifiers from names
    #[arg(long)]
    pub strip_lmn: bool,

    /// Add a courtyard this many mm outside the bounding box
    #[arg(long = "add-courtyard", value_name = "MM")]
    pub courtyard: Option<f64>,

    /// Set a fake edit time on the footprints using a hash
    #[arg(long)]
    pub hash_time: bool,
}

impl ConvertArgs {
    pub fn options(&self) -> ConversionOptions {
        let rounding = if self.rounded_pads {
            RoundingMode::All
        } else if self.rounded_except_1 {
            RoundingMode::AllButPin1
        } else {
            RoundingMode::None
        };

        ConversionOptions {
            threedmap: self.threedmap.clone(),
            rounded_pad_exceptions: self.rounded_pad_exceptions.clone(),
            rounded_center_exceptions: self.rounded_center_exceptions.clone(),
            courtyard_mm: self.courtyard,
            rounding,
            hash_time: self.hash_time,
            strip_lmn: self.strip_lmn,
            confirm_license: false,
        }
    }
}

impl IpcArgs {
    /// 將命令列參數套用到配置
    pub fn apply_to(&self, config: &mut BuildConfig) {
        if !self.variants.is_empty() {
            config.ipc.variants = self.variants.clone();
        }
        if self.confirm_license {
            config.converter.confirm_license = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipc_variants() {
        let cli = CliConfig::try_parse_from([
            "pcblib", "ipc", "--variant", "least", "--variant", "nominal",
        ])
        .unwrap();
        let Command::Ipc(args) = cli.command else {
            panic!("expected ipc command");
        };

        let mut config = BuildConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.ipc.variants, vec![Variant::Least, Variant::Nominal]);
    }

    #[test]
    fn test_parse_convert_flags() {
        let cli = CliConfig::try_parse_from([
            "pcblib",
            "convert",
            "out.pretty",
            "a.fpl",
            "b.fpl",
            "--rounded-except-1",
            "--add-courtyard",
            "0.25",
            "--3dmap",
            "ipc-3dmap",
            "--strip-lmn",
        ])
        .unwrap();
        let Command::Convert(args) = cli.command else {
            panic!("expected convert command");
        };

        assert_eq!(args.inputs.len(), 2);
        let options = args.options();
        assert_eq!(options.rounding, RoundingMode::AllButPin1);
        assert_eq!(options.courtyard_mm, Some(0.25));
        assert_eq!(options.threedmap, Some(PathBuf::from("ipc-3dmap")));
        assert!(options.strip_lmn);
        assert!(!options.hash_time);
    }

    #[test]
    fn test_rounding_flags_conflict() {
        let result = CliConfig::try_parse_from([
            "pcblib",
            "convert",
            "out",
            "a.fpl",
            "--rounded-pads",
            "--rounded-except-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_models_subcommand_and_globals() {
        let cli = CliConfig::try_parse_from(["pcblib", "3d", "--dry-run", "--log-format", "json"])
            .unwrap();
        assert!(matches!(cli.command, Command::Models3d));
        assert!(cli.dry_run);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, PathBuf::from("pcblib.toml"));
    }
}
