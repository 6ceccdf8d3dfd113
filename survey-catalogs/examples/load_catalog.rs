//! Load a survey catalog and print a short summary of it
//!
//! Missing files are downloaded into the data root on first use.
//!
//! Usage:
//!   cargo run --example load_catalog -- [options] SURVEY
//!
//! Options:
//!   --release DR      Data release to load (default: the survey's default)
//!   --data-dir PATH   Data root (default: $CATALOG_DATA_DIR or ~/.survey_catalogs)
//!   --config PATH     Load loader settings from a JSON file
//!   --rows N          Number of rows to print (default: 5)
//!
//! Surveys: galah, rave, raveon, tgas

use std::env;
use std::path::PathBuf;

use survey_catalogs::{CatalogRequest, CatalogTable, Loader, LoaderConfig, Release, Survey};

fn print_summary(survey: Survey, table: &CatalogTable, rows: usize) {
    println!("{}: {} rows, {} columns", survey, table.num_rows(), table.num_columns());

    for column in table.columns() {
        println!(
            "  {:<24} {:<6} {} null",
            column.name(),
            format!("{:?}", column.column_type()),
            column.data().null_count()
        );
    }

    let names: Vec<&str> = table.column_names().collect();
    println!("\n{}", names.join("\t"));
    for row in 0..rows.min(table.num_rows()) {
        let cells: Vec<String> = names
            .iter()
            .map(|name| {
                table
                    .value(row, name)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let mut survey = None;
    let mut release: Option<Release> = None;
    let mut data_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut rows = 5;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--release" if i + 1 < args.len() => {
                release = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--data-dir" if i + 1 < args.len() => {
                data_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--config" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--rows" if i + 1 < args.len() => {
                rows = args[i + 1].parse()?;
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: load_catalog [--release DR] [--data-dir PATH] [--config PATH] [--rows N] SURVEY");
                return Ok(());
            }
            other => {
                survey = Some(other.parse::<Survey>()?);
                i += 1;
            }
        }
    }

    let Some(survey) = survey else {
        return Err("no survey given (galah, rave, raveon, tgas)".into());
    };

    let mut config = match config_path {
        Some(path) => LoaderConfig::load_from_file(&path)?,
        None => LoaderConfig::from_env(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    let loader = Loader::from_config(&config)?;
    let mut request = CatalogRequest::new(survey);
    request.release = release;

    let table = loader.load(&request)?;
    print_summary(survey, &table, rows);
    Ok(())
}
