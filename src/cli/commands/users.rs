//! Account moderation commands

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{Role, UserStatus};
use crate::services::{AuthService, SeaOrmAuthService, TokenService};

async fn auth_service(config: &Config) -> anyhow::Result<SeaOrmAuthService> {
    let store = Store::with_pool_options(&config.general.database_path, 1, 1).await?;
    let tokens = Arc::new(TokenService::from_config(&config.security));
    Ok(SeaOrmAuthService::new(
        store,
        tokens,
        config.security.clone(),
    ))
}

pub async fn cmd_set_role(config: &Config, username: &str, role: &str) -> anyhow::Result<()> {
    let role: Role = role.parse().map_err(anyhow::Error::msg)?;
    let user = auth_service(config)
        .await?
        .set_role(username, role)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("✓ {} is now {}", user.username, user.role);
    Ok(())
}

pub async fn cmd_set_status(config: &Config, username: &str, status: &str) -> anyhow::Result<()> {
    let status: UserStatus = status.parse().map_err(anyhow::Error::msg)?;
    let user = auth_service(config)
        .await?
        .set_status(username, status)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("✓ {} is now {}", user.username, user.status);
    Ok(())
}
