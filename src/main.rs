//! keylift - scoring-key recovery from scanned pages
//!
//! CLI entry point

use anyhow::{bail, Context};
use clap::Parser;
use keylift::{
    exit_codes, CaptureProfile, Cli, Commands, PageScanner, ScanArgs, SectionKind, SectionLayout,
};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Scan(args) => run_scan(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::GENERAL_ERROR
        }
    });
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

// ============ Scan Command ============

fn run_scan(args: &ScanArgs) -> anyhow::Result<()> {
    if !valid_test_code(&args.test_code) {
        bail!("test code must be yyyymm, got {:?}", args.test_code);
    }
    for dir in [&args.reference_dir, &args.capture_dir] {
        if !dir.is_dir() {
            eprintln!("Error: directory does not exist: {}", dir.display());
            std::process::exit(exit_codes::INPUT_NOT_FOUND);
        }
    }

    let profile = match &args.profile {
        Some(path) => match CaptureProfile::load_from_path(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Warning: failed to load profile: {e}");
                CaptureProfile::default()
            }
        },
        None => CaptureProfile::load().unwrap_or_default(),
    };

    let scanner = PageScanner::new(profile);
    let grids = scanner
        .scan_directory(&args.reference_dir, &args.capture_dir)
        .context("scan failed")?;

    for (kind, grid) in &grids {
        println!(
            "  {:?}: {} questions, {} category marks{}",
            kind,
            grid.question_count(),
            grid.total_marks(),
            if grid.is_empty() { " (blank table)" } else { "" }
        );
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create output directory {}", args.output.display()))?;
    let path = keylift::write_category_file(&args.output, &args.test_code, &grids)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn valid_test_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("Calibrated page: {}x{}", keylift::PAGE_WIDTH, keylift::PAGE_HEIGHT);
    for kind in SectionKind::all() {
        let layout = SectionLayout::of(kind);
        println!(
            "\n{:?} ({} questions, rows {} + {})",
            kind,
            layout.question_count,
            layout.first_half_rows(),
            layout.second_half_rows()
        );
        println!("  categories: {}", layout.labels.join(", "));
        for (half, table) in layout.tables.iter().enumerate() {
            println!(
                "  half {}: {}x{} at ({}, {})",
                half, table.w, table.h, table.x, table.y
            );
        }
    }
    Ok(())
}
