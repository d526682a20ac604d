//! User management command handlers

use crate::config::Config;
use crate::db::Store;

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

pub async fn cmd_users_list(config: &Config, pending_only: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let users = store.list_users(pending_only).await?;

    if users.is_empty() {
        if pending_only {
            println!("No accounts waiting for approval.");
        } else {
            println!("No registered accounts.");
        }
        return Ok(());
    }

    let title = if pending_only {
        "Pending Accounts"
    } else {
        "Registered Accounts"
    };
    println!("{} ({} total)", title, users.len());
    println!("{:-<70}", "");

    for user in users {
        let status = if user.is_active { "✓" } else { "⏳" };
        println!("{} {} <{}>", status, user.full_name, user.email);
        println!(
            "  ID: {} | Username: {} | Role: {} | Municipality: {}",
            user.id, user.username, user.designation, user.municipality
        );
    }

    println!();
    println!("Legend: ✓ Active | ⏳ Pending approval");

    Ok(())
}

pub async fn cmd_users_set_active(
    config: &Config,
    email: &str,
    is_active: bool,
) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    let store = open_store(config).await?;

    if store.set_user_active(&email, is_active).await? {
        let verb = if is_active { "Activated" } else { "Deactivated" };
        println!("✓ {verb} {email}");
    } else {
        println!("No account registered with email: {email}");
    }

    Ok(())
}
