//! `parley models`: the model registry as a table.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_core::llm::ModelRegistry;

pub fn list_models(models: &ModelRegistry, json: bool) -> Result<()> {
    let models = models.list();

    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    if models.is_empty() {
        println!("  {}", style("No models registered.").dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Context").fg(Color::White),
        Cell::new("Tools").fg(Color::White),
        Cell::new("Vision").fg(Color::White),
    ]);

    let flag = |on: bool| if on { "yes" } else { "-" };
    for model in models {
        table.add_row(vec![
            Cell::new(&model.id).fg(Color::Cyan),
            Cell::new(&model.name),
            Cell::new(&model.provider),
            Cell::new(model.context_window),
            Cell::new(flag(model.tools)),
            Cell::new(flag(model.vision)),
        ]);
    }

    println!("{table}");
    Ok(())
}
