use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};


#[derive(Clone, Debug, Eq, Hash, Ord, Parser, PartialEq, PartialOrd)]
pub struct Opts {
    /// TOML file with the directory configuration
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// TOML file holding the administrative bind credentials
    #[arg(short = 'C', long, conflicts_with = "bind_password_prompt")]
    pub credentials_file: Option<PathBuf>,

    /// Ask for the administrative bind password instead of reading it from the configuration
    #[arg(short = 'W', long)]
    pub bind_password_prompt: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Subcommand)]
pub enum Mode {
    /// Look up people and print their attributes
    People(PeopleOpts),

    /// Check a user's password
    Auth(AuthOpts),
}

#[derive(Args, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PeopleOpts {
    /// Comma-separated attributes to print; defaults to all configured attributes
    #[arg(short = 'a', long)]
    pub attributes: Option<String>,

    #[arg(required = true)]
    pub usernames: Vec<String>,
}

#[derive(Args, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthOpts {
    pub userid: String,
}

#[derive(Clone, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Credentials {
    pub bind_dn: String,
    pub password: String,
}
