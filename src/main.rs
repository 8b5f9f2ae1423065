use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::Stylize;
use grid_engine::config::config::GridConfig;
use grid_engine::data::data_exporter::{DataExporter, ExportFormat};
use grid_engine::data::data_grid::DataGrid;
use grid_engine::data::filter::{parse_filter_spec, Filter};
use grid_engine::data::loaders::load_rows;
use grid_engine::data::sort::SortState;
use grid_engine::data::type_inference::infer_columns;
use grid_engine::table_display::display_page;
use grid_engine::utils::logging::init_tracing;
use std::path::PathBuf;

fn print_help() {
    println!("{}", "Grid Engine - page, filter and export tabular data".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  grid-engine [OPTIONS] <FILE.json|FILE.csv>");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}       - Free-text search", "--search <Q>".green());
    println!(
        "  {} - Column filter, repeatable (e.g. age:gte:30)",
        "--filter <col:op:value>".green()
    );
    println!("  {}  - Sort by a column", "--sort <col[:desc]>".green());
    println!("  {}         - Page to show, starting at 1", "--page <N>".green());
    println!("  {}    - Rows per page", "--page-size <N>".green());
    println!("  {} - Write the filtered rows to a file", "--export <csv|json>".green());
    println!("  {}        - Export directory", "--out <DIR>".green());
    println!("  {} - Write a commented config file", "--generate-config".green());
    println!("  {}          - Echo logs to stderr", "--verbose".green());
    println!();
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    file: Option<PathBuf>,
    search: Option<String>,
    filters: Vec<Filter>,
    sort: Option<SortState>,
    page: Option<usize>,
    page_size: Option<usize>,
    export: Option<ExportFormat>,
    out: Option<PathBuf>,
    generate_config: bool,
    verbose: bool,
    help: bool,
}

fn parse_sort(spec: &str) -> Result<SortState> {
    match spec.rsplit_once(':') {
        Some((column, "desc")) => Ok(SortState::descending(column)),
        Some((column, "asc")) => Ok(SortState::ascending(column)),
        Some((_, other)) => bail!("Unknown sort direction '{}'", other),
        None => Ok(SortState::ascending(spec)),
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {}", name))
        };

        match arg.as_str() {
            "--search" => cli.search = Some(value("--search")?),
            "--filter" => cli.filters.push(parse_filter_spec(&value("--filter")?)?),
            "--sort" => cli.sort = Some(parse_sort(&value("--sort")?)?),
            "--page" => {
                let page: usize = value("--page")?.parse().context("--page expects a number")?;
                cli.page = Some(page.saturating_sub(1));
            }
            "--page-size" => {
                cli.page_size = Some(
                    value("--page-size")?
                        .parse()
                        .context("--page-size expects a number")?,
                )
            }
            "--export" => cli.export = Some(value("--export")?.parse()?),
            "--out" => cli.out = Some(PathBuf::from(value("--out")?)),
            "--generate-config" => cli.generate_config = true,
            "--verbose" | "-v" => cli.verbose = true,
            "--help" | "-h" => cli.help = true,
            other if other.starts_with("--") => bail!("Unknown option '{}'", other),
            other => {
                if cli.file.is_some() {
                    bail!("Only one data file can be given");
                }
                cli.file = Some(PathBuf::from(other));
            }
        }
    }

    Ok(cli)
}

fn generate_config() -> Result<()> {
    let path = GridConfig::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(&path, GridConfig::create_default_with_comments())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn run(cli: CliArgs) -> Result<()> {
    let config = GridConfig::load().unwrap_or_else(|e| {
        tracing::warn!(target: "grid", "Using default config: {:#}", e);
        GridConfig::default()
    });

    let file = cli
        .file
        .ok_or_else(|| anyhow!("No data file given (try --help)"))?;
    let rows = load_rows(&file)?;
    let columns = infer_columns(&rows);
    let mut grid = DataGrid::with_config(columns, rows, &config)?;

    if let Some(query) = cli.search {
        grid.set_query(query);
    }
    for filter in cli.filters {
        grid.apply_filter(filter)?;
    }
    if let Some(sort) = cli.sort {
        grid.set_sort(sort)?;
    }
    if let Some(page_size) = cli.page_size {
        grid.set_page_size(page_size);
    }
    if let Some(page) = cli.page {
        grid.go_to_page(page);
    }

    display_page(&grid, &config.display);

    if let Some(format) = cli.export {
        let content = grid.export(format)?;
        let dir = cli
            .out
            .unwrap_or_else(|| config.export.resolved_directory());
        let path =
            DataExporter::write_to_dir(&dir, &config.export.filename_prefix, format, &content)?;
        println!(
            "{}",
            format!("{} rows exported to {}", grid.total(), path.display()).green()
        );
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            print_help();
            std::process::exit(2);
        }
    };

    init_tracing(cli.verbose);

    if cli.help {
        print_help();
        return;
    }

    let result = if cli.generate_config {
        generate_config()
    } else {
        run(cli)
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}
