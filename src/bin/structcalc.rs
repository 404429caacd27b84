//! Structure Calc command-line runner
//!
//! Reads a structure JSON document, runs one combination with the
//! reference solver and writes the run report as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use structure_calc::loads::analysis_label;
use structure_calc::prelude::*;

#[derive(Parser)]
#[command(name = "structcalc")]
#[command(about = "Build, solve and extract a structural model", long_about = None)]
#[command(version)]
struct Cli {
    /// Structure input document (JSON)
    #[arg(value_name = "INPUT", required_unless_present = "list_combinations")]
    input: Option<PathBuf>,

    /// Run options (JSON); defaults apply when omitted
    #[arg(long)]
    options: Option<PathBuf>,

    /// Active combination identifier, e.g. "1001_1.2DL+1.6LL"
    #[arg(long, short)]
    combination: Option<String>,

    /// Add member self-weight as a dead load
    #[arg(long)]
    self_weight: bool,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the combination table and exit
    #[arg(long)]
    list_combinations: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.list_combinations {
        let table = CombinationTable::standard();
        for combo in table.iter() {
            let factors: Vec<String> = combo
                .factors
                .iter()
                .map(|(case, f)| format!("{}={}", case, f))
                .collect();
            println!(
                "{:<28} {:<24} {}",
                combo.name,
                analysis_label(&combo.name),
                factors.join(" ")
            );
        }
        return Ok(());
    }

    let Some(input_path) = cli.input else {
        bail!("an input document is required");
    };
    let text = std::fs::read_to_string(&input_path)
        .with_context(|| format!("reading {}", input_path.display()))?;
    let input = StructureInput::from_json(&text)
        .with_context(|| format!("parsing {}", input_path.display()))?;

    let mut options = match &cli.options {
        Some(path) => CalcOptions::from_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => CalcOptions::default(),
    };
    if let Some(name) = cli.combination {
        options = options.with_combination(&name);
    }
    if cli.self_weight {
        options = options.with_self_weight(true);
    }

    let report = Pipeline::new(options).run(&input);
    let json = report.to_json().context("serializing run report")?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }

    if report.state != RunState::ResultsExtracted {
        eprintln!(
            "Run ended in {:?} with {} warning(s)",
            report.state,
            report.warnings.len()
        );
        std::process::exit(2);
    }
    Ok(())
}
