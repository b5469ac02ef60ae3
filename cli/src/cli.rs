use clap::{Args, Parser, Subcommand};
use cloud_config::Serializer;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cloud-config",
    about = "Read and write a configuration document kept in object storage",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Local ini file supplying `bucket_name` and `config_name`
    #[arg(long, global = true, env = "CLOUD_CONFIG_FILE", default_value = "cloudconfig.ini")]
    pub config_file: PathBuf,

    /// Bucket holding the document (overrides the ini file)
    #[arg(long, global = true, env = "CLOUD_CONFIG_BUCKET")]
    pub bucket: Option<String>,

    /// Name of the document (overrides the ini file)
    #[arg(long, global = true, env = "CLOUD_CONFIG_NAME")]
    pub document: Option<String>,

    /// Encoding of the document: yaml or json
    #[arg(long, global = true, default_value = "yaml")]
    pub format: Serializer,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the values at one or more dotted key paths
    Get(GetArgs),
    /// Set the value at a dotted key path and save the document
    Set(SetArgs),
    /// Print the whole document
    Show,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key paths such as `database.host`
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Key path such as `database.port`
    pub path: String,
    /// Value, parsed as YAML (`5432`, `true`, `[a, b]`); anything else is a string
    pub value: String,
    /// Store the value verbatim as a string, without YAML parsing
    #[arg(long)]
    pub string: bool,
}
