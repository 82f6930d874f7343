//! depoparse CLI - deposition transcript extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use depoparse::render::{self, JsonFormat, PageSelection, RenderOptions};
use depoparse::{
    extract_file_with_options, Enricher, ExtractOptions, ExtractionMethod, LayoutConfig,
    ParserOptions, Transcript,
};

#[derive(Parser)]
#[command(name = "depoparse")]
#[command(version)]
#[command(about = "Rebuild deposition transcripts and extract Q/A testimony", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct numbered transcript pages
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "txt")]
        format: PageFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Show confidence scores
        #[arg(long)]
        confidence: bool,

        /// Show header/footer positions
        #[arg(long)]
        positions: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Extract question/answer testimony
    #[command(alias = "qa")]
    Testimony {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: TestimonyFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Add a rule-based summary and topic to each item
        #[arg(long)]
        enrich: bool,

        /// Report questions left without an answer
        #[arg(long)]
        collect_unanswered: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Show how each page was read and classified
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ExtractionArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Layout configuration file (JSON)
    #[arg(long, value_name = "FILE", env = "DEPOPARSE_CONFIG")]
    config: Option<PathBuf>,

    /// Left margin as a fraction of page width
    #[arg(long, value_name = "FRACTION")]
    margin_left: Option<f32>,

    /// Right margin as a fraction of page width
    #[arg(long, value_name = "FRACTION")]
    margin_right: Option<f32>,

    /// Top margin as a fraction of page height
    #[arg(long, value_name = "FRACTION")]
    margin_top: Option<f32>,

    /// Bottom margin as a fraction of page height
    #[arg(long, value_name = "FRACTION")]
    margin_bottom: Option<f32>,

    /// Fragment count below which a page is sent to OCR
    #[arg(long, value_name = "N", env = "DEPOPARSE_MIN_ITEMS")]
    min_items: Option<usize>,

    /// Fixed printed-page offset (detected when omitted)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    offset: Option<i32>,

    /// OCR sparse pages with pdftoppm + tesseract
    #[arg(long, env = "DEPOPARSE_OCR")]
    ocr: bool,

    /// Never OCR the margin of digital pages that lack line numbers
    #[arg(long)]
    no_margin_ocr: bool,

    /// Abort when a page's text layer cannot be read
    #[arg(long)]
    strict: bool,
}

impl ExtractionArgs {
    fn layout(&self) -> Result<LayoutConfig, Box<dyn std::error::Error>> {
        let mut layout = match &self.config {
            Some(path) => LayoutConfig::from_json_file(path)?,
            None => LayoutConfig::default(),
        };

        let mut margins = layout.margins;
        if let Some(left) = self.margin_left {
            margins = margins.with_left(left);
        }
        if let Some(right) = self.margin_right {
            margins = margins.with_right(right);
        }
        if let Some(top) = self.margin_top {
            margins = margins.with_top(top);
        }
        if let Some(bottom) = self.margin_bottom {
            margins = margins.with_bottom(bottom);
        }
        layout = layout.with_margins(margins);
        layout.validate()?;
        Ok(layout)
    }

    fn page_selection(&self) -> Result<PageSelection, Box<dyn std::error::Error>> {
        match &self.pages {
            Some(p) => Ok(PageSelection::parse(p)?),
            None => Ok(PageSelection::All),
        }
    }

    fn options(&self) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
        let mut options = ExtractOptions::new()
            .with_layout(self.layout()?)
            .with_pages(self.page_selection()?)
            .with_ocr(self.ocr)
            .with_hybrid(!self.no_margin_ocr);

        if let Some(min_items) = self.min_items {
            options = options.with_min_items(min_items);
        }
        if let Some(offset) = self.offset {
            options = options.with_page_offset(offset);
        }
        if self.strict {
            options = options.strict();
        }
        Ok(options)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageFormat {
    /// Plain text page layout
    Txt,
    /// Markdown
    #[value(alias = "markdown")]
    Md,
    /// Full transcript as JSON
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TestimonyFormat {
    /// JSON array of Q/A items
    Json,
    /// Markdown
    #[value(alias = "markdown")]
    Md,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            format,
            output,
            confidence,
            positions,
            compact,
            extraction,
        }) => {
            let render_options = RenderOptions::new()
                .with_confidence(confidence)
                .with_positions(positions);
            cmd_extract(
                &input,
                format,
                output.as_deref(),
                render_options,
                compact,
                &extraction,
            )
        }
        Some(Commands::Testimony {
            input,
            format,
            output,
            enrich,
            collect_unanswered,
            compact,
            extraction,
        }) => cmd_testimony(
            &input,
            format,
            output.as_deref(),
            enrich,
            collect_unanswered,
            compact,
            &extraction,
        ),
        Some(Commands::Info {
            input,
            json,
            extraction,
        }) => cmd_info(&input, json, &extraction),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: depoparse <COMMAND> <FILE>".yellow());
            println!("       depoparse --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_extraction(
    input: &Path,
    options: ExtractOptions,
) -> Result<Transcript, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Reading {}...", input.display()));

    let result = extract_file_with_options(input, options);
    pb.finish_and_clear();
    Ok(result?)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_extract(
    input: &Path,
    format: PageFormat,
    output: Option<&Path>,
    render_options: RenderOptions,
    compact: bool,
    extraction: &ExtractionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = extraction.options()?;
    let render_options = render_options.with_pages(options.pages.clone());
    let transcript = run_extraction(input, options)?;

    let content = match format {
        PageFormat::Txt => render::to_text(&transcript, &render_options)?,
        PageFormat::Md => render::to_markdown(&transcript, &render_options)?,
        PageFormat::Json => render::to_json(&transcript, json_format(compact))?,
    };

    write_output(output, &content)
}

fn cmd_testimony(
    input: &Path,
    format: TestimonyFormat,
    output: Option<&Path>,
    enrich: bool,
    collect_unanswered: bool,
    compact: bool,
    extraction: &ExtractionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = extraction.options()?;
    if collect_unanswered {
        options = options.with_parser(ParserOptions::new().collect_unanswered());
    }
    let transcript = run_extraction(input, options)?;

    let content = if enrich {
        let enriched = Enricher::rule_based().enrich(&transcript.testimony);
        match format {
            TestimonyFormat::Json => render::to_json(&enriched, json_format(compact))?,
            TestimonyFormat::Md => render::enriched_to_markdown(&enriched),
        }
    } else {
        match format {
            TestimonyFormat::Json => render::to_json(&transcript.testimony, json_format(compact))?,
            TestimonyFormat::Md => render::testimony_to_markdown(&transcript.testimony),
        }
    };

    write_output(output, &content)?;

    if transcript.unanswered_questions > 0 {
        eprintln!(
            "{} {} question(s) without an answer were dropped",
            "Note:".yellow(),
            transcript.unanswered_questions
        );
        for dangling in &transcript.dangling {
            eprintln!("  {} [{}] {}", "-".dimmed(), dangling.location, dangling.question);
        }
    }

    Ok(())
}

fn method_label(method: ExtractionMethod) -> &'static str {
    match method {
        ExtractionMethod::Digital => "digital",
        ExtractionMethod::Ocr => "ocr",
        ExtractionMethod::DigitalFallback => "fallback",
        ExtractionMethod::Hybrid => "hybrid",
    }
}

fn cmd_info(
    input: &Path,
    json: bool,
    extraction: &ExtractionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let header = depoparse::sniff_file(input)?;
    let transcript = run_extraction(input, extraction.options()?)?;
    let meta = &transcript.metadata;

    if json {
        let pages: Vec<serde_json::Value> = transcript
            .pages
            .iter()
            .map(|page| {
                let e = &page.extraction;
                serde_json::json!({
                    "page": e.page_number,
                    "method": method_label(e.extraction_method),
                    "confidence": e.confidence,
                    "headers": e.headers.len(),
                    "footers": e.footers.len(),
                    "lineNumbers": e.line_numbers.len(),
                    "content": e.main_content.len(),
                    "lines": page.lines.len(),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "file": input.display().to_string(),
            "pdfVersion": header.version,
            "pageCount": meta.page_count,
            "printedPageOffset": meta.printed_page_offset,
            "qaItems": transcript.testimony.len(),
            "unansweredQuestions": transcript.unanswered_questions,
            "pages": pages,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Transcript Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), header);
    println!("{}: {}", "Pages".bold(), meta.page_count);
    println!(
        "{}: {} digital, {} OCR, {} hybrid, {} fallback",
        "Sources".bold(),
        meta.digital_pages,
        meta.ocr_pages,
        meta.hybrid_pages,
        meta.fallback_pages
    );
    println!("{}: {}", "Printed page offset".bold(), meta.printed_page_offset);
    println!("{}: {}", "Q/A items".bold(), transcript.testimony.len());
    println!(
        "{}: {}",
        "Unanswered questions".bold(),
        transcript.unanswered_questions
    );

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in &transcript.pages {
        let e = &page.extraction;
        println!(
            "{:>4}  {:<8} {:>5.1}%  {} hdr  {} ftr  {} num  {} content  {} lines",
            e.page_number,
            method_label(e.extraction_method),
            e.confidence,
            e.headers.len(),
            e.footers.len(),
            e.line_numbers.len(),
            e.main_content.len(),
            page.lines.len()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "depoparse".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Deposition transcript extraction tool");
    println!();
    println!("License: MIT");
}
