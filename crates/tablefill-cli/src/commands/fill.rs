use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use tablefill_core::fill::{fill_tables, FillOptions};
use tablefill_core::graph::order::plan_fill_order;
use tablefill_core::schema::introspect::introspect_graph;

use crate::args::FillArgs;

pub async fn run(args: &FillArgs) -> Result<()> {
    let config = super::load_config()?;

    // Phase 1: Introspect
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{prefix}] {msg}")?);
    pb.set_prefix("1/3");
    pb.set_message("Introspecting schema...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let catalog = super::connect(args.db.as_deref(), config.as_ref(), &args.exclude_schema).await?;
    let graph = introspect_graph(&catalog)
        .await
        .context("Failed to introspect schema")?;

    pb.finish_with_message(format!(
        "Introspecting schema... ✓ {} tables, {} foreign keys",
        graph.table_count(),
        graph.edge_count()
    ));

    // Phase 2: Plan
    let order = plan_fill_order(&graph);
    eprintln!(
        "  [2/3] Planning fill order... ✓ {}",
        order.table_names(&graph).join(" → ")
    );
    for cycle in &order.cycles {
        eprintln!(
            "  ⚠ Foreign-key cycle between {}; filling will fail on its first row",
            cycle.join(", ")
        );
    }

    // CLI flags override config file
    let mut options = config
        .as_ref()
        .map(|cfg| cfg.fill_options())
        .unwrap_or_default();
    if let Some(rows) = args.rows {
        if rows == 0 {
            anyhow::bail!("--rows must be at least 1");
        }
        options.default_rows = rows;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    options.table_rows.extend(args.parse_table_rows()?);
    warn_unknown_tables(&options, &graph.table_names());

    // Phase 3: Fill
    let total_rows: usize = order
        .tables
        .iter()
        .map(|&idx| options.rows_for(graph.table_name(idx)))
        .sum();
    let pb3 = ProgressBar::new(total_rows as u64);
    pb3.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.cyan} [3/3] Inserting rows... {bar:40.cyan/dim} {pos}/{len} {msg}",
            )?
            .progress_chars("█▓░"),
    );

    let mut synthesizer = options.synthesizer();
    let report = fill_tables(
        &graph,
        &order,
        &options,
        &mut synthesizer,
        &catalog,
        &catalog,
        Some(&|table, current, _total| {
            pb3.set_message(table.to_string());
            pb3.set_position(current as u64);
        }),
    )
    .await;

    let report = match report {
        Ok(report) => report,
        Err(err) => {
            pb3.abandon_with_message("failed");
            return Err(err.into());
        }
    };

    pb3.finish_with_message(format!("✓ ({} rows)", report.total_rows()));

    let mut t = ComfyTable::new();
    t.set_header(vec!["Table", "Rows", "Omitted columns"]);
    for (table, rows) in &report.tables {
        let omitted = report
            .omitted_columns
            .get(table)
            .map(|cols| cols.join(", "))
            .unwrap_or_default();
        t.add_row(vec![Cell::new(table), Cell::new(rows), Cell::new(omitted)]);
    }
    eprintln!("{}", t);
    eprintln!(
        "\n✓ Inserted {} rows across {} tables",
        report.total_rows(),
        report.tables.len()
    );

    Ok(())
}

fn warn_unknown_tables(options: &FillOptions, known: &[&str]) {
    for table in options.table_rows.keys() {
        if !known.contains(&table.as_str()) {
            warn!("Row override for '{}' matches no table in the schema", table);
        }
    }
}
