//! Sticker Generator CLI tool
//!
//! A command-line front end for generating front/back sticker documents.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{error, info, warn};

use sticker_generator::docx::extract_metadata;
use sticker_generator::fiscal::FiscalYear;
use sticker_generator::layout::{LayoutConfig, PageDimensions};
use sticker_generator::metrics::{self, ShapedFont};
use sticker_generator::order::{FiscalYearField, OrderRequest, ProductOrder};
use sticker_generator::{logging, output, resources};
use sticker_generator::{Assembler, Error, ProductField, StickerJob, Theme};

/// Sticker Generator - Front and back stickers for UPS and battery chargers
#[derive(Parser)]
#[command(name = "sticker-generator")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # One sticker pair with two product lines
    sticker-generator generate --customer \"Acme Corp\" --job JOB-2024-001 \\
        --field Model=UPS-3000 --field Serial=SN123456 -o acme.docx

    # Three 30kVA UPS units plus bypass, for fiscal year 25-26
    sticker-generator batch ups --customer Acme --job 1234 --op 5 --fy 25-26 \\
        --kva 30 --units-per-set 3 --open

    # An order saved as JSON
    sticker-generator batch file order.json -o order.docx

    # Battery chargers numbered from zero, printed straight away
    sticker-generator batch charger --customer Acme --job 1234 --op 6 --count 4 \\
        --voltage 110 --current 20 --capacity 200 --start-from-zero --print")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Turn on verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log to the terminal only
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one front/back sticker document
    Generate {
        /// Customer name printed on the back side
        #[arg(long, required_unless_present = "job_file")]
        customer: Option<String>,

        /// Job number printed on the back side
        #[arg(long, required_unless_present = "job_file")]
        job: Option<String>,

        /// Product line for the front side, repeatable
        #[arg(long = "field", value_name = "LABEL=VALUE")]
        fields: Vec<ProductField>,

        /// Colour theme (light when not given; overrides the theme in --job-file)
        #[arg(long)]
        theme: Option<Theme>,

        /// Read the job from a JSON file instead of flags
        #[arg(long, conflicts_with_all = ["customer", "job", "fields"])]
        job_file: Option<PathBuf>,

        /// Output file path (defaults to the Sticker Generator output folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Expand a production order and generate every sticker into one document
    Batch {
        #[command(subcommand)]
        kind: BatchCommand,
    },

    /// Show information about a generated document
    Info {
        /// Document to inspect
        input: PathBuf,
    },

    /// Show where bundled resources are looked up and which were found
    Resources,

    /// List the fiscal years accepted by --fy, current one first
    FiscalYears {
        /// How many years to list
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Delete all .docx files from the output folder
    Purge {
        /// Folder to purge (defaults to the Sticker Generator output folder)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BatchCommand {
    /// Generate stickers for every unit of a UPS order
    Ups {
        #[command(flatten)]
        order: OrderArgs,

        /// kVA rating
        #[arg(long)]
        kva: u32,

        /// Number of UPS sets
        #[arg(long, default_value_t = 1)]
        sets: u32,

        /// UPS units per set (a BYPASS sticker is added when more than one)
        #[arg(long, default_value_t = 1)]
        units_per_set: u32,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Generate stickers for every charger of a battery charger order
    Charger {
        #[command(flatten)]
        order: OrderArgs,

        /// Number of chargers
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Output voltage (V)
        #[arg(long, default_value = "")]
        voltage: String,

        /// Output current (A)
        #[arg(long, default_value = "")]
        current: String,

        /// Battery capacity (Ah)
        #[arg(long, default_value = "")]
        capacity: String,

        /// Charger type
        #[arg(long, default_value = "FCBC")]
        charger_type: String,

        /// Battery type
        #[arg(long, default_value = "VRLA")]
        battery_type: String,

        /// Number chargers from 0 (charger 0 has no index suffix)
        #[arg(long)]
        start_from_zero: bool,

        /// Use the customer name instead of the rating label
        #[arg(long)]
        no_label: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Generate stickers from a JSON order file
    File {
        /// Order file
        file: PathBuf,

        /// Output file path (defaults to Sticker_{CUSTOMER}_{job}_{op}_{kind}.docx in the output folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args)]
struct OrderArgs {
    /// Customer name (printed upper-case)
    #[arg(long)]
    customer: String,

    /// Job number
    #[arg(long)]
    job: u32,

    /// OP number
    #[arg(long)]
    op: u32,

    /// Fiscal year override, e.g. "25-26" (defaults to the current one)
    #[arg(long)]
    fy: Option<FiscalYear>,

    /// Colour theme
    #[arg(long, default_value = "light")]
    theme: Theme,

    /// Output file path (defaults to Sticker_{CUSTOMER}_{job}_{op}_{kind}.docx in the output folder)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    /// Sticker image (defaults to the bundled sticker.png)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Paper size
    #[arg(long, value_enum, default_value_t = Paper::Letter)]
    paper: Paper,

    /// TrueType/OpenType font to measure text with instead of built-in Arial metrics
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Font family written into the document (defaults to the font file's name)
    #[arg(long, requires = "font_file")]
    font_family: Option<String>,

    /// Bold face of --font-file (defaults to a *-Bold sibling of the font file)
    #[arg(long, requires = "font_file")]
    bold_font_file: Option<PathBuf>,

    /// Open the output file after creation
    #[arg(long)]
    open: bool,

    /// Send the output file to the default printer after creation
    #[arg(long)]
    print: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Paper {
    Letter,
    A4,
}

fn main() {
    let cli = Cli::parse();

    let log_file = if cli.no_log_file {
        None
    } else {
        Some(output::log_file_path())
    };
    logging::init(logging::level_from_verbosity(cli.verbose), log_file.as_deref());
    info!("Starting sticker-generator v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Generate {
            customer, job, fields, theme, job_file, output, render,
        } => cmd_generate(customer, job, fields, theme, job_file, output, render),
        Commands::Batch { kind } => cmd_batch(kind),
        Commands::Info { input } => cmd_info(&input),
        Commands::Resources => {
            cmd_resources();
            Ok(())
        }
        Commands::FiscalYears { count } => {
            cmd_fiscal_years(count);
            Ok(())
        }
        Commands::Purge { dir } => cmd_purge(dir),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        // 2 means the input or destination needs fixing, 1 is anything else
        let code = match e.downcast_ref::<Error>() {
            Some(err) if err.is_user_correctable() => 2,
            _ => 1,
        };
        process::exit(code);
    }
}

fn cmd_batch(kind: BatchCommand) -> anyhow::Result<()> {
    match kind {
        BatchCommand::Ups {
            order, kva, sets, units_per_set, render,
        } => {
            let product = ProductOrder::Ups {
                kva_rating: kva,
                sets,
                units_per_set,
            };
            cmd_order(order_request(&order, product), order.output, render)
        }
        BatchCommand::Charger {
            order, count, voltage, current, capacity, charger_type, battery_type,
            start_from_zero, no_label, render,
        } => {
            let product = ProductOrder::Charger {
                voltage,
                current,
                battery_capacity: capacity,
                charger_type,
                battery_type,
                count,
                start_from_zero,
                show_label: !no_label,
            };
            cmd_order(order_request(&order, product), order.output, render)
        }
        BatchCommand::File { file, output, render } => {
            cmd_order(load_order(&file)?, output, render)
        }
    }
}

fn order_request(args: &OrderArgs, product: ProductOrder) -> OrderRequest {
    OrderRequest {
        customer_name: args.customer.clone(),
        job_number: args.job,
        op_number: args.op,
        fiscal_year: FiscalYearField(args.fy.unwrap_or_else(FiscalYear::current)),
        product,
        theme: args.theme,
    }
}

fn load_order(path: &Path) -> anyhow::Result<OrderRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read order file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid order file {}", path.display()))
}

/// Build an assembler from the rendering flags
fn build_assembler(render: &RenderArgs) -> anyhow::Result<Assembler> {
    let image = match &render.image {
        Some(path) => path.clone(),
        // Let the assembler report the missing image with the expected name
        None => resources::bundled_image_path()
            .unwrap_or_else(|| PathBuf::from(resources::STICKER_IMAGE)),
    };
    info!("Using sticker image {}", image.display());

    let mut layout = LayoutConfig {
        page: match render.paper {
            Paper::Letter => PageDimensions::letter(),
            Paper::A4 => PageDimensions::a4(),
        },
        ..LayoutConfig::default()
    };

    let Some(font_file) = &render.font_file else {
        return Ok(Assembler::new(image).with_layout(layout));
    };

    let mut font = ShapedFont::from_file(font_file)?;
    match render.bold_font_file.clone().or_else(|| metrics::find_bold_sibling(font_file)) {
        Some(bold) => {
            info!("Measuring bold text with {}", bold.display());
            font = font.with_bold_file(&bold)?;
        }
        None => warn!(
            "No bold face found for {}; bold lines are measured {:.0}% wider than regular",
            font_file.display(),
            (metrics::SYNTHETIC_BOLD_ALLOWANCE - 1.0) * 100.0
        ),
    }
    layout.font_family = match &render.font_family {
        Some(family) => family.clone(),
        None => font_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("Cannot derive a font family from the font file name")?,
    };
    info!("Measuring text with {} ({})", layout.font_family, font_file.display());

    Ok(Assembler::new(image).with_layout(layout).with_measure(font))
}

/// Resolve the output path, creating the default output folder when it is used
fn resolve_output(output: Option<PathBuf>, file_name: &str) -> anyhow::Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path);
    }
    let dir = output::default_output_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Cannot create output folder {}", dir.display()))?;
    Ok(dir.join(file_name))
}

/// Open and/or print the result; failures here never undo the generated file
fn deliver(path: &Path, render: &RenderArgs) {
    if render.open {
        if let Err(e) = output::open_file(path) {
            warn!("Could not open {}: {}", path.display(), e);
        }
    }
    if render.print {
        if let Err(e) = output::print_file(path) {
            warn!("Could not print {}: {}", path.display(), e);
        }
    }
}

/// Build the job from a job file or from flags; an explicit --theme wins over the file's
fn resolve_job(
    customer: Option<String>,
    job_number: Option<String>,
    fields: Vec<ProductField>,
    theme: Option<Theme>,
    job_file: Option<&Path>,
) -> anyhow::Result<StickerJob> {
    let job = match job_file {
        Some(path) => {
            let job = StickerJob::from_json_file(path)?;
            match theme {
                Some(theme) => job.with_theme(theme),
                None => job,
            }
        }
        None => StickerJob {
            customer_name: customer.unwrap_or_default(),
            job_number: job_number.unwrap_or_default(),
            product_fields: fields,
            theme: theme.unwrap_or_default(),
        },
    };
    Ok(job)
}

/// Generate one sticker document
fn cmd_generate(
    customer: Option<String>,
    job_number: Option<String>,
    fields: Vec<ProductField>,
    theme: Option<Theme>,
    job_file: Option<PathBuf>,
    output: Option<PathBuf>,
    render: RenderArgs,
) -> anyhow::Result<()> {
    let job = resolve_job(customer, job_number, fields, theme, job_file.as_deref())?;
    job.validate()?;

    let file_name = output::sanitize_file_name(&format!(
        "Sticker_{}_{}.docx",
        job.customer_name.trim(),
        job.job_number.trim()
    ));
    let output = resolve_output(output, &file_name)?;

    let assembler = build_assembler(&render)?;
    let path = assembler.generate(&job, &output)?;

    println!("Generated: {}", path.display());
    deliver(&path, &render);
    Ok(())
}

/// Expand an order and generate all of its stickers into one document
fn cmd_order(request: OrderRequest, output: Option<PathBuf>, render: RenderArgs) -> anyhow::Result<()> {
    let jobs = request.expand()?;
    info!(
        "Generating {} sticker(s), {} page(s), fiscal year {}",
        jobs.len(),
        request.page_count(),
        request.fiscal_year.0
    );

    let output = resolve_output(output, &request.file_name())?;
    let assembler = build_assembler(&render)?;
    let path = assembler.generate_batch(&jobs, &output)?;

    println!("Generated: {}", path.display());
    deliver(&path, &render);
    Ok(())
}

/// Show information about a generated document
fn cmd_info(input: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let metadata = extract_metadata(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Images: {}", metadata.image_count);
    if let Some(title) = &metadata.title {
        println!("Title: {}", title);
    }
    for page in 0..metadata.page_count {
        println!("Page {}:", page + 1);
        for line in metadata.lines_on_page(page) {
            println!("  [{:>4.1}pt] {}", line.size_pt, line.text);
        }
    }

    Ok(())
}

/// Each bundled resource with where it was found
fn bundled_resources() -> [(&'static str, Option<PathBuf>); 2] {
    [
        (resources::STICKER_IMAGE, resources::bundled_image_path()),
        (resources::APP_ICON, resources::bundled_icon_path()),
    ]
}

fn cmd_resources() {
    println!("Search folders:");
    for dir in resources::search_dirs() {
        println!("  {}", dir.display());
    }
    for (name, path) in bundled_resources() {
        match path {
            Some(path) => println!("{}: {}", name, path.display()),
            None => println!("{}: not found", name),
        }
    }
}

fn cmd_fiscal_years(count: usize) {
    for (i, year) in FiscalYear::recent(count).iter().enumerate() {
        if i == 0 {
            println!("{} (current)", year);
        } else {
            println!("{}", year);
        }
    }
}

/// Delete generated documents
fn cmd_purge(dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(output::default_output_dir);
    let report = output::purge_documents(&dir)?;

    if report.deleted.is_empty() && report.failed.is_empty() {
        println!("No .docx files found in {}", dir.display());
        return Ok(());
    }

    println!("Deleted {} file(s) from {}", report.deleted.len(), dir.display());
    if !report.failed.is_empty() {
        for (path, reason) in &report.failed {
            eprintln!("Failed to delete {}: {}", path.display(), reason);
        }
        bail!("{} file(s) could not be deleted", report.failed.len());
    }
    Ok(())
}
