//! sopdoc CLI - SOP document export tool

mod fetch;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use sopdoc::layout::{self, resolve_symbol};
use sopdoc::{
    load_sop, write_result, ExportFormat, ExportOptions, Exporter, FilenameStyle, JsonFormat,
    Paper, Sop, StepRecord,
};

use fetch::{pending_images, ImageFetcher};

#[derive(Parser)]
#[command(name = "sopdoc")]
#[command(version)]
#[command(about = "Export SOP documents to PDF, print-ready HTML, and JSON", long_about = None)]
struct Cli {
    /// Input SOP JSON file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an SOP document
    Export {
        /// Input SOP JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory (current directory if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, env = "SOPDOC_FORMAT", default_value = "pdf")]
        format: FormatArg,

        /// Paper size
        #[arg(long, value_enum, env = "SOPDOC_PAPER", default_value = "a4-landscape")]
        paper: PaperArg,

        /// Skip image loading (images become placeholders)
        #[arg(long)]
        no_images: bool,

        /// Directory relative image paths are resolved against
        /// (defaults to the input file's directory)
        #[arg(long, value_name = "DIR")]
        image_dir: Option<PathBuf>,

        /// Use the `_SOP` filename suffix
        #[arg(long)]
        upper_suffix: bool,

        /// Maximum concurrent image fetches
        #[arg(long, env = "SOPDOC_MAX_IN_FLIGHT", default_value = "4")]
        max_in_flight: usize,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show how the steps are laid out on pages
    Plan {
        /// Input SOP JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Paper size
        #[arg(long, value_enum, env = "SOPDOC_PAPER", default_value = "a4-landscape")]
        paper: PaperArg,

        /// Print the full plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document information
    Info {
        /// Input SOP JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Paginated PDF
    Pdf,
    /// Print-ready HTML
    Html,
    /// Layout plan and drawing commands
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Html => ExportFormat::Html,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PaperArg {
    /// A4, landscape (default)
    A4Landscape,
    /// A4, portrait
    A4Portrait,
    /// US Letter, landscape
    LetterLandscape,
}

impl From<PaperArg> for Paper {
    fn from(paper: PaperArg) -> Self {
        match paper {
            PaperArg::A4Landscape => Paper::A4Landscape,
            PaperArg::A4Portrait => Paper::A4Portrait,
            PaperArg::LetterLandscape => Paper::LetterLandscape,
        }
    }
}

/// Settings of one `export` run.
struct ExportArgs {
    output: Option<PathBuf>,
    options: ExportOptions,
    load_images: bool,
    image_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Export {
            input,
            output,
            format,
            paper,
            no_images,
            image_dir,
            upper_suffix,
            max_in_flight,
            compact,
        }) => {
            let options = ExportOptions::new()
                .with_format(format.into())
                .with_paper(paper.into())
                .with_max_in_flight(max_in_flight)
                .with_filename_style(if upper_suffix {
                    FilenameStyle::Upper
                } else {
                    FilenameStyle::Lower
                })
                .with_json_format(if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                });
            cmd_export(
                &input,
                ExportArgs {
                    output,
                    options,
                    load_images: !no_images,
                    image_dir,
                },
            )
        }
        Some(Commands::Plan { input, paper, json }) => cmd_plan(&input, paper, json),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: export to PDF if input is provided
            if let Some(input) = cli.input {
                cmd_export(
                    &input,
                    ExportArgs {
                        output: cli.output,
                        options: ExportOptions::default(),
                        load_images: true,
                        image_dir: None,
                    },
                )
            } else {
                println!("{}", "Usage: sopdoc <FILE> [OUTPUT]".yellow());
                println!("       sopdoc --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        let message = match e.downcast_ref::<sopdoc::Error>() {
            Some(err) => err.user_message(),
            None => e.to_string(),
        };
        eprintln!("{}: {}", "Error".red().bold(), message);
        std::process::exit(1);
    }
}

fn cmd_export(input: &Path, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut sop = load_sop(input)?;

    // Refuse invalid documents before fetching any image.
    args.options.geometry.validate()?;
    layout::validate(&sop)?;

    // Untitled steps never reach the page; don't fetch their images.
    sop.steps.retain(StepRecord::has_title);

    let pending = pending_images(&sop.steps);
    if args.load_images && pending > 0 {
        let base_dir = args
            .image_dir
            .clone()
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let pb = ProgressBar::new(pending);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message("Fetching images...");
        log::debug!(
            "fetching {} images relative to {}",
            pending,
            base_dir.display()
        );

        let fetcher = ImageFetcher::new(base_dir, pb.clone())?;
        let rt = tokio::runtime::Runtime::new()?;
        sop.steps = rt.block_on(fetcher.resolve(&sop.steps, args.options.max_in_flight));

        pb.finish_with_message("Images ready");
    }

    // Images are resolved (or deliberately skipped) at this point; unresolved
    // references render as placeholders.
    let result = Exporter::new().with_options(args.options).export(&sop)?;

    let target = args.output.unwrap_or_else(|| PathBuf::from("."));
    let path = write_result(&result, &target)?;

    println!("{} {}", "Saved to".green(), path.display());
    println!("{}", result.notice());
    Ok(())
}

fn cmd_plan(input: &Path, paper: PaperArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let sop = load_sop(input)?;
    let plan = Exporter::new().with_paper(paper.into()).plan(&sop)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", "Page Plan".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!(
        "{}: {} steps on {} pages",
        plan.metadata.title.bold(),
        plan.step_count(),
        plan.page_count()
    );

    for page in &plan.pages {
        println!();
        println!("{}", format!("Page {}", page.page_index + 1).bold());
        for row in &page.rows {
            let title = plan.step(row).map(|s| s.title.as_str()).unwrap_or("");
            let overflow = row.bottom() > plan.geometry.usable_bottom();
            println!(
                "  {} {:>3}. {} {}{}",
                "├─".dimmed(),
                row.step_index + 1,
                title,
                format!("[{:.1}pt @ {:.1}]", row.height, row.top).dimmed(),
                if overflow {
                    " (overflows page)".yellow().to_string()
                } else {
                    String::new()
                }
            );
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let sop: Sop = load_sop(input)?;
    let meta = &sop.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref id) = sop.id {
        println!("{}: {}", "Id".bold(), id);
    }
    println!("{}: {}", "Title".bold(), meta.title);
    for (label, value) in meta.display_fields() {
        if !value.is_empty() {
            println!("{}: {}", label.bold(), value);
        }
    }

    let steps = layout::normalize_steps(&sop.steps);

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Steps".bold(), steps.len());
    println!(
        "{}: {}",
        "Dropped (untitled)".bold(),
        sop.step_count() - steps.len()
    );
    println!("{}: {}", "Images".bold(), sop.image_count());

    println!();
    println!("{}", "Steps".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (index, step) in steps.iter().enumerate() {
        let symbol = resolve_symbol(step, index);
        let source = if symbol.explicit { "" } else { " (auto)" };
        println!(
            "  {:>3}. {} {}",
            index + 1,
            step.title,
            format!("[{}{}]", symbol.symbol, source).dimmed()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "sopdoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("SOP document layout and export tool");
    println!();
    println!("Formats: pdf, html, json");
    println!("License: MIT");
}
