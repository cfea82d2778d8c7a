use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::{json, Map};

use crate::auth::{TokenError, TokenService};
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a token for an account email")]
    Issue {
        #[arg(help = "Login identifier (account email)")]
        email: String,
    },

    #[command(about = "Verify a token and print its claims")]
    Inspect {
        #[arg(help = "Token, with or without the `Bearer ` prefix")]
        token: String,
    },
}

fn token_error_code(err: TokenError) -> &'static str {
    match err {
        TokenError::Malformed => "TOKEN_MALFORMED",
        TokenError::Expired => "TOKEN_EXPIRED",
        TokenError::InvalidSignature => "TOKEN_INVALID_SIGNATURE",
        TokenError::Unsupported => "TOKEN_UNSUPPORTED",
    }
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    // Same secret resolution as the server, so tokens are interchangeable
    let config = AppConfig::from_env()?;
    let tokens = TokenService::new(config.security.jwt_secret.as_bytes());

    match cmd {
        TokenCommands::Issue { email } => {
            let token = tokens.issue(&email)?;

            let mut data = Map::new();
            data.insert("subject".to_string(), json!(email));
            data.insert("token".to_string(), json!(token));
            data.insert("expires_in".to_string(), json!(tokens.ttl().num_seconds()));
            utils::output_success(&output_format, "Token issued", data)
        }
        TokenCommands::Inspect { token } => {
            let raw = token.strip_prefix(crate::auth::BEARER_PREFIX).unwrap_or(&token);

            match tokens.decode_claims(raw) {
                Ok(claims) => {
                    let mut data = Map::new();
                    data.insert("subject".to_string(), json!(claims.sub));
                    data.insert("issued_at".to_string(), json!(Utc.timestamp_opt(claims.iat, 0).single()));
                    data.insert("expires_at".to_string(), json!(Utc.timestamp_opt(claims.exp, 0).single()));
                    utils::output_success(&output_format, "Token is valid", data)
                }
                Err(e) => {
                    utils::output_error(&output_format, &e.to_string(), Some(token_error_code(e)))?;
                    anyhow::bail!("token rejected: {}", e)
                }
            }
        }
    }
}
