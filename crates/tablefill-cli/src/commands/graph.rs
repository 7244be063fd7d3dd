use anyhow::{Context, Result};

use tablefill_core::graph::order::plan_fill_order;
use tablefill_core::graph::visualize::{self, GraphFormat as VizFormat};
use tablefill_core::schema::introspect::introspect_graph;

use crate::args::{GraphArgs, GraphFormat};

pub async fn run(args: &GraphArgs) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::connect(args.db.as_deref(), config.as_ref(), &[]).await?;
    let graph = introspect_graph(&catalog)
        .await
        .context("Failed to introspect schema")?;
    let order = plan_fill_order(&graph);

    let format = match args.format {
        GraphFormat::Mermaid => VizFormat::Mermaid,
        GraphFormat::Dot => VizFormat::Dot,
        GraphFormat::Tree => VizFormat::Tree,
    };

    let output = visualize::visualize(&graph, &order, format);
    println!("{}", output);

    Ok(())
}
