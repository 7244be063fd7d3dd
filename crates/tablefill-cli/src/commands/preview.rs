use anyhow::{Context, Result};

use tablefill_core::fill::fill_tables;
use tablefill_core::graph::order::plan_fill_order;
use tablefill_core::schema::introspect::introspect_graph;
use tablefill_core::sink::memory::MemorySink;

use crate::args::PreviewArgs;

/// Introspect the live schema and consult its enum catalog, but keep every
/// generated row in memory. Prints the rows as JSON, keyed by table.
pub async fn run(args: &PreviewArgs) -> Result<()> {
    if args.rows == 0 {
        anyhow::bail!("--rows must be at least 1");
    }

    let config = super::load_config()?;
    let catalog = super::connect(args.db.as_deref(), config.as_ref(), &[]).await?;
    let graph = introspect_graph(&catalog)
        .await
        .context("Failed to introspect schema")?;
    let order = plan_fill_order(&graph);

    let mut options = config
        .as_ref()
        .map(|cfg| cfg.fill_options())
        .unwrap_or_default();
    options.default_rows = args.rows;
    options.table_rows.clear();
    if args.seed.is_some() {
        options.seed = args.seed;
    }

    let sink = MemorySink::new(options.seed.unwrap_or_default());
    let mut synthesizer = options.synthesizer();
    fill_tables(
        &graph,
        &order,
        &options,
        &mut synthesizer,
        &catalog,
        &sink,
        None,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&sink.into_tables())?);
    Ok(())
}
