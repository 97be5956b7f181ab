//! C to eFlow Translator CLI
//!
//! Usage:
//!   c2eflow examples.c
//!   c2eflow examples.c -o images/examples.mif --ir examples.c.gimple
//!   c2eflow --from-json parsed.json --ir examples.c.gimple examples.c

use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use c_to_eflow::{extract, translate_documents, StructuredProgram, TranslateError, Translation};

#[derive(Parser, Debug)]
#[command(name = "c2eflow")]
#[command(author = "FPGA Team")]
#[command(version = "0.1.0")]
#[command(about = "Compiles a restricted C dialect into eFlow memory images")]
struct Args {
    /// C source file to translate
    #[arg(value_name = "SOURCE")]
    input: PathBuf,

    /// Output image path (default: output/<stem>.mif)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Low-level IR dump produced for the same source
    /// (default: <SOURCE>.gimple; generating it is up to the toolchain)
    #[arg(long = "ir")]
    ir: Option<PathBuf>,

    /// Load the structured document from JSON instead of extracting it
    #[arg(long = "from-json", value_name = "JSON")]
    from_json: Option<PathBuf>,

    /// Keep intermediate documents under build/
    #[arg(long = "debug")]
    debug: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn read_text(path: &PathBuf) -> Result<String, TranslateError> {
    fs::read_to_string(path).map_err(|_| TranslateError::input_not_found(path.display().to_string()))
}

fn main() {
    let args = Args::parse();

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        PathBuf::from("output").join(format!("{}.mif", stem))
    });
    let ir_path = args
        .ir
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.gimple", args.input.display())));

    if args.verbose {
        println!("{}", "C to eFlow Translator".bold().blue());
        println!("{}", "=".repeat(35));
        println!("{}: {}", "Source".green(), args.input.display());
        println!("{}: {}", "IR dump".green(), ir_path.display());
        println!("{}: {}", "Image".green(), output.display());
        println!();
    }

    // Stage 1: structural extraction (or a pre-extracted document)
    let structured = match &args.from_json {
        Some(path) => read_text(path).and_then(|text| StructuredProgram::from_json(&text)),
        None => read_text(&args.input).and_then(|source| extract(&source)),
    };
    let structured = match structured {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {}", "Extraction error".red(), e);
            std::process::exit(1);
        }
    };

    let ir_text = match read_text(&ir_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: {}", "IR error".red(), e);
            std::process::exit(1);
        }
    };

    if args.debug {
        write_document(
            &PathBuf::from("build").join("parsed.json"),
            structured.to_json(),
        );
    }

    // Stages 2 + 3: reconciliation, allocation, image assembly
    let translation = match translate_documents(structured, &ir_text) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}: {}", "Translation error".red(), e);
            std::process::exit(1);
        }
    };

    if args.debug {
        write_document(
            &PathBuf::from("build").join("matched_ir.json"),
            translation.refined.to_json(),
        );
    }

    for diag in &translation.diagnostics {
        eprintln!("{}: {}", "warning".yellow(), diag);
    }

    if let Some(dir) = output.parent() {
        if !dir.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(dir) {
                eprintln!("{}: {}: {}", "Output error".red(), dir.display(), e);
                std::process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(&output, translation.image.render()) {
        eprintln!("{}: {}: {}", "Output error".red(), output.display(), e);
        std::process::exit(1);
    }

    print_summary(&translation, &output);
}

fn write_document(path: &PathBuf, json: Result<String, serde_json::Error>) {
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("{}: {}", "warning".yellow(), e);
            return;
        }
    };
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    if let Err(e) = fs::write(path, json) {
        eprintln!("{}: {}: {}", "warning".yellow(), path.display(), e);
    }
}

fn print_summary(translation: &Translation, output: &PathBuf) {
    println!("{}", "Translation Results".bold().green());
    println!("{}", "=".repeat(50));
    println!(
        "{}: {}",
        "Functions".cyan(),
        translation.structured.functions.len()
    );
    println!("{}: {}", "Cores".cyan(), translation.banks.len());
    println!(
        "{}: {}",
        "Image words".cyan(),
        translation.image.data_line_count()
    );
    for bank in &translation.banks {
        let role = if bank.core % 2 == 0 { "init" } else { "action" };
        println!(
            "  GPC {:<3} {:<8} {:<16} {} registers bound",
            bank.core,
            role,
            bank.function,
            bank.occupied()
        );
    }
    if !translation.diagnostics.is_empty() {
        println!(
            "{}: {}",
            "Warnings".yellow(),
            translation.diagnostics.len()
        );
    }
    println!("{}: {}", "Written".green(), output.display());
}
