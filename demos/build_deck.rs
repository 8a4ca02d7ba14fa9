/// Example: Build a deck from a template, a structure and a content plan.
///
/// This example demonstrates how to use the longan library to:
/// - Open a template through the template cache
/// - Read the structure, plan, roster and options documents
/// - Build the deck and write it next to the inputs
///
/// Usage:
///   cargo run --example build_deck -- --template template.pptx \
///       --structure structure.json --content plan.json --output deck.pptx
///
/// Set `RUST_LOG=longan=debug` to see the build stages.
use std::path::{Path, PathBuf};

use clap::Parser;
use longan::ooxml::pptx::{BuildOptions, ContentPlan, Roster, TemplateCache, TemplateStructure, build_from_archive};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "build_deck")]
#[command(about = "Assemble a .pptx deck from a template and a content plan")]
struct Args {
    /// Template package
    #[arg(short, long, value_name = "PPTX")]
    template: PathBuf,

    /// Template structure (JSON)
    #[arg(short, long, value_name = "JSON")]
    structure: PathBuf,

    /// Content plan (JSON)
    #[arg(short, long, value_name = "JSON")]
    content: PathBuf,

    /// Team roster (JSON array of {name, role})
    #[arg(short, long, value_name = "JSON")]
    roster: Option<PathBuf>,

    /// Build options (JSON, or YAML with the `yaml` feature)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the deck
    #[arg(short, long, value_name = "PPTX", default_value = "deck.pptx")]
    output: PathBuf,
}

fn read_options(path: &Path) -> Result<BuildOptions, Box<dyn std::error::Error>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    Ok(BuildOptions::from_str_with_ext(&std::fs::read_to_string(path)?, ext)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let options = match &args.config {
        Some(path) => read_options(path)?,
        None => BuildOptions::default(),
    };
    let structure = TemplateStructure::from_json(&std::fs::read_to_string(&args.structure)?)?;
    let plan = ContentPlan::from_json(&std::fs::read_to_string(&args.content)?)?;
    let roster = match &args.roster {
        Some(path) => Some(Roster::from_json(&std::fs::read_to_string(path)?)?),
        None => None,
    };

    let cache = TemplateCache::new();
    let template = cache.get_or_open(&std::fs::read(&args.template)?)?;

    let result = build_from_archive(&template, &structure, &plan, roster.as_ref(), &options)?;
    std::fs::write(&args.output, &result.bytes)?;

    println!("Wrote {} ({} bytes)", args.output.display(), result.bytes.len());
    for ((slide_type, path), report) in result.slides.iter().zip(&result.reports) {
        println!(
            "  {path:<28} {slide_type:<12} {} substitutions, {} list items",
            report.total_substitutions(),
            report.list_items
        );
    }
    Ok(())
}
