use std::collections::BTreeMap;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "tablefill",
    about = "Fill every table of a PostgreSQL database with referentially-valid sample rows",
    version,
    after_help = "Examples:\n  tablefill fill --db postgres://localhost/myapp --rows 10\n  tablefill fill --rows 50 --seed 42         # DB from DATABASE_URL, .env or tablefill.toml\n  tablefill introspect --db postgres://localhost/myapp\n  tablefill plan --db postgres://localhost/myapp\n  tablefill graph --db postgres://localhost/myapp --format tree\n  tablefill preview --db postgres://localhost/myapp --rows 3"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert generated rows into every table, parents first
    Fill(FillArgs),

    /// Introspect a database schema and display tables, columns and foreign keys
    Introspect(IntrospectArgs),

    /// Show the order tables would be filled in
    Plan(PlanArgs),

    /// Visualize table dependency graph
    Graph(GraphArgs),

    /// Generate sample rows in memory without touching the database
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
pub struct FillArgs {
    /// Database connection URL (postgres://)
    /// Falls back to DATABASE_URL env var, .env file, or tablefill.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Number of rows to insert per table [default: 10]
    #[arg(long)]
    pub rows: Option<usize>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-table row count overrides (e.g., public.users=50,public.orders=200)
    #[arg(long, value_delimiter = ',')]
    pub table_rows: Vec<String>,

    /// Schemas to skip in addition to pg_catalog and information_schema
    #[arg(long, value_delimiter = ',')]
    pub exclude_schema: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct IntrospectArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: IntrospectFormat,
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: PlanFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Output format for the dependency graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Number of sample rows to preview per table
    #[arg(long, default_value = "3")]
    pub rows: usize,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum IntrospectFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    Tree,
}

impl FillArgs {
    /// Parse table row overrides like "public.users=50,public.orders=200".
    pub fn parse_table_rows(&self) -> anyhow::Result<BTreeMap<String, usize>> {
        let mut map = BTreeMap::new();
        for entry in &self.table_rows {
            let (table, count_str) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Invalid --table-rows entry '{}': expected table=count", entry)
            })?;
            let count: usize = count_str.parse().map_err(|_| {
                anyhow::anyhow!("Invalid row count '{}' for table '{}'", count_str, table)
            })?;
            if count == 0 {
                anyhow::bail!("Row count for table '{}' must be at least 1", table);
            }
            map.insert(table.to_string(), count);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_args(table_rows: &[&str]) -> FillArgs {
        FillArgs {
            db: None,
            rows: None,
            seed: None,
            table_rows: table_rows.iter().map(|s| s.to_string()).collect(),
            exclude_schema: Vec::new(),
        }
    }

    #[test]
    fn test_parse_table_rows() {
        let map = fill_args(&["public.users=50", "public.orders=200"])
            .parse_table_rows()
            .unwrap();
        assert_eq!(map["public.users"], 50);
        assert_eq!(map["public.orders"], 200);
    }

    #[test]
    fn test_parse_table_rows_rejects_garbage() {
        assert!(fill_args(&["public.users"]).parse_table_rows().is_err());
        assert!(fill_args(&["public.users=many"]).parse_table_rows().is_err());
        assert!(fill_args(&["public.users=0"]).parse_table_rows().is_err());
    }

    #[test]
    fn test_cli_parses_fill() {
        let cli = Cli::try_parse_from([
            "tablefill",
            "fill",
            "--db",
            "postgres://localhost/app",
            "--rows",
            "25",
            "--seed",
            "7",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Fill(args) => {
                assert_eq!(args.db.as_deref(), Some("postgres://localhost/app"));
                assert_eq!(args.rows, Some(25));
                assert_eq!(args.seed, Some(7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
