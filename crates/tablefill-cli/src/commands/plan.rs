use anyhow::{Context, Result};
use serde_json::json;

use tablefill_core::graph::order::plan_fill_order;
use tablefill_core::schema::introspect::introspect_graph;

use crate::args::{PlanArgs, PlanFormat};

pub async fn run(args: &PlanArgs) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::connect(args.db.as_deref(), config.as_ref(), &[]).await?;
    let graph = introspect_graph(&catalog)
        .await
        .context("Failed to introspect schema")?;
    let order = plan_fill_order(&graph);
    let names = order.table_names(&graph);

    match args.format {
        PlanFormat::Json => {
            let out = json!({
                "order": names,
                "cycles": order.cycles,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        PlanFormat::Text => {
            for (position, table) in names.iter().enumerate() {
                println!("{:>4}. {}", position + 1, table);
            }
            if !order.cycles.is_empty() {
                println!();
                println!("Foreign-key cycles (the order cannot satisfy these):");
                for cycle in &order.cycles {
                    println!("  - {}", cycle.join(" ↔ "));
                }
            }
        }
    }

    Ok(())
}
