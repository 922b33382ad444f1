// CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "obs-tool")]
#[command(author = "hatlonely <hatlonely@foxmail.com>")]
#[command(version = "0.1.0")]
#[command(about = "Huawei Cloud OBS object store tool", long_about = None)]
pub struct Cli {
    /// OBS endpoint (e.g., obs.cn-north-4.myhuaweicloud.com)
    #[arg(short, long, global = true, default_value = "")]
    pub endpoint: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a local file
    Put(PutArgs),
    /// Download an object (to stdout when no output is given)
    Get(GetArgs),
    /// Check whether an object exists
    Exists(ObjectArgs),
    /// List object keys, or common prefixes when --delimiter is set
    Ls(LsArgs),
    /// Remove an object
    Rm(ObjectArgs),
    /// Create a pre-signed GET URL
    Sign(SignArgs),
}

#[derive(Args, Debug)]
pub struct ObjectArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,
}

#[derive(Args, Debug)]
pub struct PutArgs {
    #[command(flatten)]
    pub object: ObjectArgs,

    /// Local file to upload
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub object: ObjectArgs,

    /// Local output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket name
    pub bucket: String,

    /// Key prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Group keys into common prefixes by this delimiter
    #[arg(short, long)]
    pub delimiter: Option<String>,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub object: ObjectArgs,

    /// URL lifetime (e.g., 600, 10m, 1h30m)
    #[arg(short, long, default_value = "1h")]
    pub ttl: String,
}
