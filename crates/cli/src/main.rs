//! CLI tool for extracting embedded files from PowerPoint containers.

use anyhow::{bail, Context, Result};
use clap::Parser;
use embed_core::report::format_size;
use embed_core::{
    ExtractionPlan, ExtractionReport, ExtractorConfig, HintPrecedence, NameMapping, NameOrigin,
};
use embed_ooxml::Extractor;
use std::path::{Path, PathBuf};

/// Extract embedded documents, media, and OLE objects from .pptx files,
/// recovering their original names where possible.
#[derive(Parser, Debug)]
#[command(name = "embed-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input presentation file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: `<input stem>_embedded` beside each input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the names that would be used without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// JSON name mapping with user-chosen original names
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Write a name mapping template for the input and exit
    #[arg(long, value_name = "FILE")]
    write_mapping: Option<PathBuf>,

    /// Prefer filename-looking frame names over the object's own frame name
    #[arg(long)]
    filename_like_first: bool,

    /// Skip the post-write size check
    #[arg(long)]
    no_verify: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let extractor = build_extractor(&args)?;

    if let Some(mapping_path) = &args.write_mapping {
        if args.input.len() != 1 {
            bail!("--write-mapping takes exactly one input file");
        }
        return write_mapping_template(&extractor, &args.input[0], mapping_path);
    }

    let mut had_errors = false;

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        let outcome = if args.dry_run {
            extractor.plan(input_path).map(|plan| {
                print_plan(&plan, args.json);
                plan.failures.is_empty()
            })
        } else {
            let output_dir = get_output_dir(input_path, args.output.as_deref());
            extractor.extract(input_path, &output_dir).map(|report| {
                print_report(&report, args.json);
                report.is_complete()
            })
        };

        match outcome {
            Ok(complete) => had_errors |= !complete,
            Err(e) => {
                eprintln!("Error processing {}: {}", input_path.display(), e);
                had_errors = true;
            }
        }
    }

    if had_errors {
        std::process::exit(1);
    }

    Ok(())
}

/// Map command-line flags onto an extractor.
fn build_extractor(args: &Args) -> Result<Extractor> {
    let precedence = if args.filename_like_first {
        HintPrecedence::FilenameLikeFirst
    } else {
        HintPrecedence::EnclosingFrameFirst
    };

    let config = ExtractorConfig::new()
        .with_hint_precedence(precedence)
        .with_verify_writes(!args.no_verify)
        .with_subdirectory_per_container(args.output.is_some() && args.input.len() > 1);

    let mut extractor = Extractor::new(config);

    if let Some(path) = &args.mapping {
        let mapping = NameMapping::load(path)
            .with_context(|| format!("Failed to load name mapping {}", path.display()))?;
        log::info!("Loaded {} mapped names from {}", mapping.filled_count(), path.display());
        extractor = extractor.with_mapping(mapping);
    }

    Ok(extractor)
}

/// Determine the output directory for an input file.
fn get_output_dir(input_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let stem = input_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let dir_name = format!("{}_embedded", stem);

            match input_path.parent() {
                Some(parent) => parent.join(dir_name),
                None => PathBuf::from(dir_name),
            }
        }
    }
}

fn write_mapping_template(extractor: &Extractor, input_path: &Path, mapping_path: &Path) -> Result<()> {
    let plan = extractor
        .plan(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let container = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let template = NameMapping::template(container, &plan.parts);
    template
        .save(mapping_path)
        .with_context(|| format!("Failed to write {}", mapping_path.display()))?;

    println!(
        "Wrote mapping template for {} parts to {}",
        template.mappings.len(),
        mapping_path.display()
    );
    println!("Fill in \"original_name\" and re-run with --mapping {}", mapping_path.display());

    Ok(())
}

fn origin_label(origin: NameOrigin) -> &'static str {
    match origin {
        NameOrigin::Mapping => "mapping",
        NameOrigin::Hint => "slide",
        NameOrigin::OleRoot => "ole",
        NameOrigin::Generic => "part",
    }
}

fn print_plan(plan: &ExtractionPlan, json: bool) {
    if json {
        match serde_json::to_string_pretty(plan) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to serialize plan: {}", e),
        }
        return;
    }

    println!("{} (dry run)", plan.container.display());
    for part in &plan.parts {
        println!(
            "  {} -> {}  [{}, {}, {}]",
            part.source_path,
            part.file_name,
            part.detected_type.description,
            format_size(part.byte_size),
            origin_label(part.name_origin)
        );
    }
    for failure in &plan.failures {
        println!("  FAILED {}: {}", failure.source_path, failure.message);
    }
    for warning in &plan.warnings {
        println!("  warning: {}: {}", warning.source, warning.message);
    }
}

fn print_report(report: &ExtractionReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to serialize report: {}", e),
        }
        return;
    }

    println!(
        "{} -> {}",
        report.container.display(),
        report.target_dir.display()
    );

    for (category, records) in report.by_category() {
        println!("  {} ({})", category.label(), records.len());
        for record in records {
            println!(
                "    {}  [{}, {}, {}]",
                record.file_name,
                record.detected_type.description,
                format_size(record.byte_size),
                origin_label(record.name_origin)
            );
        }
    }

    for failure in &report.failures {
        println!("  FAILED {}: {}", failure.source_path, failure.message);
    }
    for warning in &report.warnings {
        println!("  warning: {}: {}", warning.source, warning.message);
    }

    println!(
        "  {} of {} parts extracted, {}",
        report.records.len(),
        report.total(),
        format_size(report.total_bytes())
    );
}
