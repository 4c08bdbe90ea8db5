//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use crosspost_domain::{Platform, PublishMode};
use std::path::PathBuf;

/// crosspost: publish local markdown articles to dev.to and Qiita
#[derive(Parser, Debug)]
#[command(name = "crosspost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory that post maps and content paths are relative to
    #[arg(long, global = true)]
    pub working_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update articles on one platform
    Publish(PublishArgs),

    /// Check mapped remote articles against local content
    Verify(VerifyArgs),

    /// List changed content files per content directory
    Changes(ChangesArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    Devto,
    Qiita,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Devto => Platform::Devto,
            PlatformArg::Qiita => Platform::Qiita,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeArg {
    #[default]
    Draft,
    Publish,
}

impl From<ModeArg> for PublishMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Draft => PublishMode::Draft,
            ModeArg::Publish => PublishMode::Publish,
        }
    }
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Target platform
    #[arg(long, value_enum)]
    pub platform: PlatformArg,

    /// Create/update a draft, or make an existing draft public
    #[arg(long, value_enum, default_value_t = ModeArg::Draft)]
    pub mode: ModeArg,

    /// Use the changed content files for this platform when no files are given
    #[arg(long)]
    pub changed: bool,

    /// Content files, relative to the working directory
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Platforms to verify (default: all)
    #[arg(long, value_enum)]
    pub platform: Vec<PlatformArg>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChangesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./crosspost.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
