//! Workspace administration commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

pub async fn create_workspace(state: &AppState, user_id: &str, name: &str, json: bool) -> Result<()> {
    let workspace = state.workspace_service.create(user_id, name).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspace)?);
    } else {
        println!(
            "  {} Created workspace '{}' ({})",
            style("✓").green(),
            style(&workspace.name).cyan(),
            style(workspace.id).dim()
        );
    }
    Ok(())
}

pub async fn list_workspaces(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let workspaces = state.workspace_service.list(user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }

    if workspaces.is_empty() {
        println!("  {}", style(format!("No workspaces for '{user_id}'.")).dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);
    for workspace in &workspaces {
        table.add_row(vec![
            Cell::new(&workspace.name).fg(Color::Cyan),
            Cell::new(workspace.id),
            Cell::new(workspace.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
    Ok(())
}
