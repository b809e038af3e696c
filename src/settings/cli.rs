use super::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tokenbind", about = "Issue, check and revoke bound session tokens")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue tokens for a principal and bind the access token
    Login {
        key: String,
        /// Extra claims as a JSON object
        #[arg(long)]
        claims: Option<String>,
    },
    /// Resolve an access token to its principal
    Whoami { token: String },
    /// Drop the binding held by a principal (single-token mode)
    Logout { key: String },
    /// Drop the binding of one access token
    Revoke { token: String },
    /// Trade a refresh token for a new access token
    Renew { refresh_token: String },
}
