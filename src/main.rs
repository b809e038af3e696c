use serde_json::{Map, Value};
use tokenbind::domain_model::{PrincipalKey, SessionToken};
use tokenbind::logger::*;
use tokenbind::server::*;
use tokenbind::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let server = Server::try_new(&project_settings).await?;
    let sessions = &server.session_service;

    match cli.command {
        Command::Login { key, claims } => {
            let claims = parse_claims(claims.as_deref())?;
            let issued = sessions.login(PrincipalKey::new(key), claims).await?;
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }
        Command::Whoami { token } => {
            let key = sessions.authenticate(&SessionToken(token)).await?;
            println!("{}", key);
        }
        Command::Logout { key } => {
            sessions.logout(&PrincipalKey::new(key)).await?;
        }
        Command::Revoke { token } => {
            sessions.revoke(&SessionToken(token)).await?;
        }
        Command::Renew { refresh_token } => {
            let renewed = sessions.renew(&SessionToken(refresh_token)).await?;
            println!("{}", serde_json::to_string_pretty(&renewed)?);
        }
    }

    Ok(())
}

fn parse_claims(raw: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(anyhow::anyhow!("claims must be a JSON object, got {}", other)),
        },
    }
}
