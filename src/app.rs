//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - renders curves through the shared pipeline
//! - prints summaries, charts, and warnings
//! - writes optional exports

use clap::Parser;
use tracing::debug;

use crate::cli::{Command, CountriesArgs, DatasetsArgs, PlotArgs};
use crate::data::DatasetStore;
use crate::domain::DatasetId;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `covplot` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `covplot` and `covplot -c Italy` behave like `covplot plot ...`.
    //
    // Clap requires a subcommand name, so the argv list is rewritten before
    // parsing. This keeps the clap structure clean.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let verbose = match &cli.command {
        Command::Plot(args) => args.source.verbose,
        Command::Countries(args) => args.source.verbose,
        Command::Datasets(args) => args.source.verbose,
    };
    crate::logging::init(verbose);

    match cli.command {
        Command::Plot(args) => handle_plot(args),
        Command::Countries(args) => handle_countries(args),
        Command::Datasets(args) => handle_datasets(args),
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let config = args.chart_config()?;
    debug!(?config, "chart config");
    let run = pipeline::run_plot(config, pipeline::build_loader(&args.source), args.rank)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.view, &run.config, &run.source)
    );
    println!("{}", crate::report::format_curve_table(&run.summaries));

    if !args.no_plot {
        let chart = crate::plot::render_ascii_chart(&run.view, args.width, args.height);
        println!("{chart}");
    }
    let warnings = crate::report::format_diagnostics(&run.view);
    if !warnings.is_empty() {
        eprint!("{warnings}");
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_curves_csv(path, &run.view)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_view_json(path, &run.config, &run.view)?;
    }

    if run.view.drawable().next().is_none() {
        return Err(AppError::no_data(format!(
            "No drawable points for any of: {}",
            run.config.countries.join(", ")
        )));
    }
    Ok(())
}

fn handle_countries(args: CountriesArgs) -> Result<(), AppError> {
    let mut store = DatasetStore::new(pipeline::build_loader(&args.source));
    let countries = pipeline::list_countries(&mut store, args.dataset, args.filter.as_deref())?;
    let table = store.ensure_countries();
    print!(
        "{}",
        crate::report::format_country_list(args.dataset, &countries, Some(table))
    );
    if countries.is_empty() {
        return Err(AppError::no_data("No matching countries."));
    }
    Ok(())
}

fn handle_datasets(args: DatasetsArgs) -> Result<(), AppError> {
    print!("{}", crate::report::format_dataset_list(DatasetId::DEFAULT));
    if !args.check {
        return Ok(());
    }

    let mut store = DatasetStore::new(pipeline::build_loader(&args.source));
    println!("\nAvailability ({}):", store.describe_source());
    let mut any = false;
    for (id, status) in pipeline::check_datasets(&mut store) {
        match status {
            Ok(n) => {
                any = true;
                println!("  {:<18} ok ({n} countries)", id.as_str());
            }
            Err(reason) => println!("  {:<18} unavailable: {reason}", id.as_str()),
        }
    }
    if any {
        Ok(())
    } else {
        Err(AppError::no_data("No dataset could be loaded."))
    }
}

/// Rewrite argv so `covplot` defaults to `covplot plot`.
///
/// Rules:
/// - `covplot`                      -> `covplot plot`
/// - `covplot -c Italy ...`         -> `covplot plot -c Italy ...`
/// - `covplot --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("plot".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "plot" | "countries" | "datasets");
    if is_subcommand {
        return argv;
    }

    // A leading flag is a plot flag.
    if arg1.starts_with('-') {
        argv.insert(1, "plot".to_string());
        return argv;
    }

    argv
}
