//! Token and app-info administration commands.

use anyhow::Result;
use console::style;

use parley_core::app_info::AppInfoStore;

use crate::http::extractors::auth::issue_token;
use crate::state::AppState;

pub async fn create_token(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        anyhow::bail!("user id must not be empty");
    }
    let token = issue_token(state, user_id).await?;

    if json {
        let out = serde_json::json!({ "user_id": user_id, "token": token });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} API token for '{}' (save this -- it won't be shown again):",
        style("🔑").bold(),
        style(user_id).cyan()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();
    Ok(())
}

pub async fn get_app_info(state: &AppState, key: &str, json: bool) -> Result<()> {
    let value = state.app_info.get(key).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "key": key, "value": value }))?
        );
        return Ok(());
    }

    match value {
        Some(value) => println!("{value}"),
        None => println!("  {}", style(format!("'{key}' is not set")).dim()),
    }
    Ok(())
}

pub async fn set_app_info(state: &AppState, key: &str, value: &str, json: bool) -> Result<()> {
    state.app_info.set(key, value).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "key": key, "value": value }))?
        );
    } else {
        println!("  {} {} = {}", style("✓").green(), style(key).bold(), value);
    }
    Ok(())
}
