use clap::Subcommand;
use serde_json::{json, Map};

use crate::auth::PasswordHasher;
use crate::cli::{utils, OutputFormat};
use crate::config::{AppConfig, BCRYPT_COST_RANGE};

#[derive(Subcommand)]
pub enum PasswordCommands {
    #[command(about = "Produce a bcrypt hash, e.g. to seed an admin account")]
    Hash {
        #[arg(help = "Plaintext password")]
        password: String,

        #[arg(long, help = "bcrypt cost (defaults to the configured cost)")]
        cost: Option<u32>,
    },
}

pub async fn handle(cmd: PasswordCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PasswordCommands::Hash { password, cost } => {
            let cost = match cost {
                Some(cost) => cost,
                None => AppConfig::from_env()?.security.bcrypt_cost,
            };
            if !BCRYPT_COST_RANGE.contains(&cost) {
                anyhow::bail!("bcrypt cost must be between 4 and 31, got {}", cost);
            }
            let hash = PasswordHasher::new(cost).hash(&password).await?;

            let mut data = Map::new();
            data.insert("cost".to_string(), json!(cost));
            data.insert("hash".to_string(), json!(hash));
            utils::output_success(&output_format, "Password hashed", data)
        }
    }
}
