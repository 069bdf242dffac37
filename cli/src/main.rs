//! paragrid CLI - paragraph metadata extraction and batch tool

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use paragrid::batch::{self, BatchEvent, FileOutcome};
use paragrid::grid::{self, FilterOutcome};
use paragrid::host::HostDocument;
use paragrid::matches::{self, IndentUpdate, MatchFinder};
use paragrid::render::{self, JsonFormat, TableOptions};
use paragrid::{
    EditOutcome, ExtractOptions, Frame, MemoryApplication, Projection, Session, Settings,
};

#[derive(Parser)]
#[command(name = "paragrid")]
#[command(version)]
#[command(about = "Extract, filter and edit paragraph metadata of documents", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, env = "PARAGRID_SETTINGS", value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract paragraph records from a document
    Extract {
        /// Input document snapshot
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Columns to show in text and markdown output
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Fail on the first host error
        #[arg(long)]
        strict: bool,

        /// Give paragraphs inside tables their own number
        #[arg(long)]
        sequential: bool,
    },

    /// Show the rows matching a filter expression
    Filter {
        /// Input document snapshot
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Expression such as "`Font Size` > 12 and `Is Bold` == True"
        #[arg(value_name = "EXPR")]
        expression: String,

        /// Columns to show
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Sort the result by a column
        #[arg(long, value_name = "COLUMN")]
        sort: Option<String>,

        /// Write the result to the configured CSV file
        #[arg(long)]
        export: bool,
    },

    /// Show rows containing a term in any column
    Search {
        /// Input document snapshot
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Search term (case-insensitive)
        #[arg(value_name = "TERM")]
        term: String,

        /// Columns to show
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Print the saved filter history
    History,

    /// Edit a cell and write it back into the document
    Edit {
        /// Input document snapshot
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Paragraph number of the row
        #[arg(short, long)]
        number: u32,

        /// Column name
        #[arg(short, long)]
        column: String,

        /// New value
        #[arg(short, long)]
        value: String,
    },

    /// Find pattern matches and optionally update one of them
    Matches {
        /// Input document snapshot
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Regular expression (or literal text with --literal)
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Treat the pattern as literal text
        #[arg(long)]
        literal: bool,

        /// Match to update (1-based)
        #[arg(long, value_name = "N")]
        index: Option<usize>,

        /// New left, first-line and right indents in points, e.g. "36,-18,0"
        #[arg(long, value_name = "L,F,R")]
        indents: Option<String>,

        /// New tab stops in points, e.g. "36,72"
        #[arg(long, value_name = "LIST", default_value = "")]
        tabs: String,

        /// Replacement for the matched text
        #[arg(long)]
        text: Option<String>,

        /// New paragraph style
        #[arg(long)]
        style: Option<String>,
    },

    /// Measure every document of a directory
    Scan {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Continue page numbers across documents
    Paginate {
        /// Directory holding the documents
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Files in processing order (all documents of DIR if omitted)
        #[arg(value_name = "FILES")]
        files: Vec<String>,

        /// Number of the first page
        #[arg(long, default_value = "1")]
        start: u32,
    },

    /// Copy the first-section headers of one document into others
    CopyHeaders {
        /// Source document
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Destination documents
        #[arg(value_name = "DEST", required = true)]
        destinations: Vec<PathBuf>,
    },

    /// Set the header and/or footer text of every section
    SetHeaders {
        /// Documents or directories
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Header text
        #[arg(long)]
        header: Option<String>,

        /// Footer text
        #[arg(long)]
        footer: Option<String>,
    },

    /// Export documents to PDF
    Pdf {
        /// Documents or directories
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Text,
    /// Markdown table
    Markdown,
    /// JSON array of records
    Json,
    /// Compact JSON
    JsonCompact,
    /// CSV with typed columns
    Csv,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = load_settings(cli.settings.as_deref()).and_then(|settings| {
        let session = Session::new(Arc::new(MemoryApplication::new()), settings);
        run(session, cli.command)
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// 2 for rejected user input, 1 for everything else.
fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    match error.downcast_ref::<paragrid::Error>() {
        Some(e) if e.is_user_input() => 2,
        _ => 1,
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, Box<dyn std::error::Error>> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    log::debug!("History file {}", settings.history_path.display());
    Ok(settings)
}

fn run(mut session: Session<MemoryApplication>, command: Commands) -> CliResult {
    match command {
        Commands::Extract {
            input,
            output,
            format,
            columns,
            strict,
            sequential,
        } => {
            let mut options = session.settings().extract.clone();
            if strict {
                options = options.strict();
            }
            if sequential {
                options = options.sequential();
            }
            cmd_extract(&session, &input, output.as_deref(), format, columns, options)
        }
        Commands::Filter {
            input,
            expression,
            columns,
            sort,
            export,
        } => cmd_filter(&session, &input, &expression, columns, sort.as_deref(), export),
        Commands::Search {
            input,
            term,
            columns,
        } => cmd_search(&session, &input, &term, columns),
        Commands::History => cmd_history(&session),
        Commands::Edit {
            input,
            number,
            column,
            value,
        } => cmd_edit(&session, &input, number, &column, &value),
        Commands::Matches {
            input,
            pattern,
            literal,
            index,
            indents,
            tabs,
            text,
            style,
        } => {
            let edit = MatchEdit {
                index,
                indents,
                tabs,
                text,
                style,
            };
            cmd_matches(&session, &input, &pattern, literal, edit)
        }
        Commands::Scan { dir, json } => cmd_scan(&session, &dir, json),
        Commands::Paginate { dir, files, start } => {
            session.set_current_dir(&dir);
            cmd_paginate(&session, &dir, files, start)
        }
        Commands::CopyHeaders {
            source,
            destinations,
        } => {
            session.select_source(source);
            cmd_copy_headers(&session, &destinations)
        }
        Commands::SetHeaders {
            inputs,
            header,
            footer,
        } => cmd_set_headers(&session, &inputs, header.as_deref(), footer.as_deref()),
        Commands::Pdf { inputs, output } => cmd_pdf(&session, &inputs, output),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

fn table_options(columns: Vec<String>) -> TableOptions {
    TableOptions::new().with_columns(columns)
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_extract(
    session: &Session<MemoryApplication>,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    columns: Vec<String>,
    options: ExtractOptions,
) -> CliResult {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Extracting paragraphs...");

    let doc = session.open(input)?;
    let records = paragrid::Extractor::new(&*doc, options)
        .extract_with_progress(|fraction| pb.set_position((fraction * 100.0) as u64))?;
    doc.close(false)?;
    pb.finish_and_clear();

    let frame = Frame::from_records(&records);
    match format {
        OutputFormat::Text => write_output(output, &render::to_text(&frame, &table_options(columns))),
        OutputFormat::Markdown => {
            write_output(output, &render::to_markdown(&frame, &table_options(columns)))
        }
        OutputFormat::Json => write_output(output, &render::to_json(&records, JsonFormat::Pretty)?),
        OutputFormat::JsonCompact => {
            write_output(output, &render::to_json(&records, JsonFormat::Compact)?)
        }
        OutputFormat::Csv => {
            match output {
                Some(path) => {
                    grid::export_csv(&frame, path)?;
                    println!("{} {}", "Saved to".green(), path.display());
                }
                None => grid::write_csv(&frame, io::stdout().lock())?,
            }
            Ok(())
        }
    }
}

fn cmd_filter(
    session: &Session<MemoryApplication>,
    input: &Path,
    expression: &str,
    columns: Vec<String>,
    sort: Option<&str>,
    export: bool,
) -> CliResult {
    let mut projection = session.load_projection(input)?;
    match projection.filter(expression)? {
        FilterOutcome::Applied { rows } => {
            session.save_history(&projection)?;
            if let Some(column) = sort {
                projection.sort(column)?;
            }
            println!("{}", render::view_to_text(projection.view(), &table_options(columns)));
            println!("{} {} rows", "Matched".green().bold(), rows);
            if export {
                export_view(session, &projection)?;
            }
        }
        FilterOutcome::Rejected { message } => {
            eprintln!("{}: {}", "Filter rejected".yellow().bold(), message);
        }
    }
    Ok(())
}

fn export_view(session: &Session<MemoryApplication>, projection: &Projection) -> CliResult {
    if let Some(frame) = projection.view().frame() {
        let path = &session.settings().csv_path;
        grid::export_csv(frame, path)?;
        println!("{} {}", "Exported to".green(), path.display());
    }
    Ok(())
}

fn cmd_search(
    session: &Session<MemoryApplication>,
    input: &Path,
    term: &str,
    columns: Vec<String>,
) -> CliResult {
    let mut projection = session.load_projection(input)?;
    let hits = projection.search(term)?;
    println!("{}", render::view_to_text(projection.view(), &table_options(columns)));
    println!("{} {} rows", "Found".green().bold(), hits);
    Ok(())
}

fn cmd_history(session: &Session<MemoryApplication>) -> CliResult {
    let projection = session.projection();
    if projection.history().is_empty() {
        println!("{}", "No saved filters".dimmed());
    }
    for (i, entry) in projection.history().entries().iter().enumerate() {
        println!("{:>3}  {}", i + 1, entry);
    }
    Ok(())
}

fn cmd_edit(
    session: &Session<MemoryApplication>,
    input: &Path,
    number: u32,
    column: &str,
    value: &str,
) -> CliResult {
    let mut doc = session.open(input)?;
    let records = paragrid::extract_records(&*doc, &session.settings().extract)?;
    let mut projection = session.projection();
    projection.load(&records);

    let outcome = projection.edit_cell(&mut *doc, number, column, value)?;
    match &outcome {
        EditOutcome::Applied => {
            doc.close(true)?;
            println!("{} paragraph {} {} = {}", "Updated".green().bold(), number, column, value);
        }
        EditOutcome::DisplayOnly => {
            doc.close(false)?;
            println!(
                "{} {} has no document counterpart; nothing written",
                "Note:".yellow().bold(),
                column
            );
        }
        EditOutcome::Failed(reason) => {
            doc.close(false)?;
            eprintln!("{}: {}", "Document not updated".red().bold(), reason);
        }
    }
    Ok(())
}

struct MatchEdit {
    index: Option<usize>,
    indents: Option<String>,
    tabs: String,
    text: Option<String>,
    style: Option<String>,
}

fn parse_indents(list: &str) -> Result<(f64, f64, f64), String> {
    let values: Vec<f64> = list
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Invalid indents {:?}: {}", list, e))?;
    match values.as_slice() {
        [left, first, right] => Ok((*left, *first, *right)),
        _ => Err(format!("Expected three indents, got {:?}", list)),
    }
}

fn cmd_matches(
    session: &Session<MemoryApplication>,
    input: &Path,
    pattern: &str,
    literal: bool,
    edit: MatchEdit,
) -> CliResult {
    let finder = if literal {
        MatchFinder::literal(pattern)?
    } else {
        MatchFinder::new(pattern)?
    };

    let mut doc = session.open(input)?;
    let hits = finder.find(&*doc)?;
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{:>3}  {}  {:<20} first {:>6.2}  left {:>6.2}  right {:>6.2}  {}",
            i + 1,
            hit.position.range().to_string().dimmed(),
            hit.style,
            hit.first_line_indent,
            hit.left_indent,
            hit.right_indent,
            hit.position.matched.cyan()
        );
    }
    println!("{} {} matches", "Found".green().bold(), hits.len());

    let Some(index) = edit.index else {
        return Ok(());
    };
    let hit = index
        .checked_sub(1)
        .and_then(|i| hits.get(i))
        .ok_or_else(|| format!("No match {} ({} found)", index, hits.len()))?;
    let position = matches::goto_match(&mut *doc, &hit.position)?;

    if let Some(indents) = &edit.indents {
        let (left, first, right) = parse_indents(indents)?;
        let mut update = IndentUpdate::new(left, first, right).with_tab_list(&edit.tabs)?;
        if let Some(text) = &edit.text {
            update = update.with_text(text.as_str());
        }
        matches::apply_indents(&mut *doc, &position, &update)?;
    } else if let Some(text) = &edit.text {
        doc.set_range_text(position.range(), text)?;
    }
    if let Some(style) = &edit.style {
        matches::set_style(&mut *doc, &position, style)?;
    }
    doc.close(true)?;
    println!("{} match {}", "Updated".green().bold(), index);
    Ok(())
}

fn cmd_scan(session: &Session<MemoryApplication>, dir: &Path, json: bool) -> CliResult {
    let (events, handle) = batch::spawn_walk(
        session.app_handle(),
        dir.to_path_buf(),
        session.settings().walk.clone(),
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut report = None;
    for event in events {
        match event {
            BatchEvent::Started { total } => pb.set_length(total as u64),
            BatchEvent::FileDone(file) => {
                pb.set_message(file.file.clone());
                pb.inc(1);
            }
            BatchEvent::Finished(done) => report = Some(done),
            BatchEvent::Failed(reason) => {
                pb.abandon();
                return Err(reason.into());
            }
        }
    }
    pb.finish_and_clear();
    handle.join().map_err(|_| "scan worker panicked")?;

    let Some(report) = report else {
        return Err("scan ended without a report".into());
    };
    if json {
        println!("{}", render::to_json(&report, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!(
        "{:<32} {:>5} {:>8} {:<13} {:>6} {:>6}",
        "File".bold(),
        "Pages".bold(),
        "Sections".bold(),
        "Headers".bold(),
        "Start".bold(),
        "End".bold()
    );
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Processed(props) => {
                println!(
                    "{:<32} {:>5} {:>8} {:<13} {:>6} {:>6}",
                    file.file,
                    props.pages,
                    props.sections,
                    props.headers.to_string(),
                    props.starting_page,
                    props.ending_page
                );
                if let batch::HeaderInfo::Declared { even, odd } = &props.headers {
                    println!("    {} {}", "Even Header:".dimmed(), even);
                    println!("    {} {}", "Odd Header:".dimmed(), odd);
                }
            }
            FileOutcome::Failed { reason } => {
                println!("{:<32} {}", file.file, reason.red());
            }
        }
    }
    Ok(())
}

fn cmd_paginate(
    session: &Session<MemoryApplication>,
    dir: &Path,
    files: Vec<String>,
    start: u32,
) -> CliResult {
    let names = if files.is_empty() {
        batch::list_documents(dir, &session.settings().walk)?
    } else {
        files
    };
    let paths: Vec<PathBuf> = names.iter().map(|n| session.resolve(n)).collect();
    let report = batch::continue_page_numbers(session.app(), &paths, start);

    for file in &report.files {
        println!(
            "{:<32} {:>5} - {:<5} ({} pages)",
            file.file, file.numbering.starting_page, file.numbering.ending_page, file.numbering.total_pages
        );
    }
    for skipped in &report.skipped {
        println!("{:<32} {}", skipped.file, skipped.reason.red());
    }
    println!("{} next document starts at {}", "Done!".green().bold(), report.next_start);
    Ok(())
}

fn cmd_copy_headers(session: &Session<MemoryApplication>, destinations: &[PathBuf]) -> CliResult {
    let source = session
        .source_file()
        .ok_or("No source file selected")?
        .to_path_buf();
    let report = batch::copy_headers(session.app(), &source, destinations)?;

    println!("{} {}", "Even Header:".dimmed(), report.headers.even);
    println!("{} {}", "Odd Header:".dimmed(), report.headers.odd);
    for name in &report.copied {
        println!("{} {}", "Copied to".green(), name);
    }
    for skipped in &report.skipped {
        println!("{} {}: {}", "Skipped".yellow(), skipped.file, skipped.reason);
    }
    Ok(())
}

fn cmd_set_headers(
    session: &Session<MemoryApplication>,
    inputs: &[PathBuf],
    header: Option<&str>,
    footer: Option<&str>,
) -> CliResult {
    let blank = |text: Option<&str>| text.map_or(true, str::is_empty);
    if blank(header) && blank(footer) {
        return Err("Nothing to set: pass --header and/or --footer".into());
    }
    let files = expand_inputs(inputs, session.settings())?;
    let report = batch::set_header_footer_text(session.app(), &files, header, footer);

    for name in &report.updated {
        println!("{} {}", "Updated".green(), name);
    }
    for skipped in &report.skipped {
        println!("{} {}: {}", "Skipped".yellow(), skipped.file, skipped.reason);
    }
    Ok(())
}

/// Expand directories into their candidate documents.
fn expand_inputs(inputs: &[PathBuf], settings: &Settings) -> Result<Vec<PathBuf>, paragrid::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for name in batch::list_documents(input, &settings.walk)? {
                files.push(input.join(name));
            }
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn cmd_pdf(
    session: &Session<MemoryApplication>,
    inputs: &[PathBuf],
    output: Option<PathBuf>,
) -> CliResult {
    let files = expand_inputs(inputs, session.settings())?;
    let out_dir = output.unwrap_or_else(|| session.settings().pdf_dir.clone());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut exported = 0;
    for file in &files {
        pb.set_message(file.display().to_string());
        let report = batch::export_pdfs(session.app(), std::slice::from_ref(file), &out_dir)?;
        exported += report.exported.len();
        for skipped in &report.skipped {
            pb.println(format!("{} {}: {}", "Skipped".yellow(), skipped.file, skipped.reason));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "\n{} {} of {} documents exported to {}",
        "Done!".green().bold(),
        exported,
        files.len(),
        out_dir.display()
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "paragrid".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Paragraph metadata extraction and batch tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indents() {
        assert_eq!(parse_indents("36, -18, 0").unwrap(), (36.0, -18.0, 0.0));
        assert!(parse_indents("36,18").is_err());
        assert!(parse_indents("a,b,c").is_err());
    }

    #[test]
    fn test_exit_code() {
        let user: Box<dyn std::error::Error> = Box::new(paragrid::Error::RowNotFound(9));
        assert_eq!(exit_code(user.as_ref()), 2);
        let host: Box<dyn std::error::Error> = Box::new(paragrid::Error::NoData);
        assert_eq!(exit_code(host.as_ref()), 1);
        let io: Box<dyn std::error::Error> = Box::new(io::Error::other("disk"));
        assert_eq!(exit_code(io.as_ref()), 1);
    }

    #[test]
    fn test_expand_inputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Unit 2.docx", "Unit 1.docx", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let single = dir.path().join("single.docx");
        let files = expand_inputs(&[dir.path().to_path_buf(), single.clone()], &Settings::default())
            .unwrap();
        assert_eq!(
            files,
            [
                dir.path().join("Unit 1.docx"),
                dir.path().join("Unit 2.docx"),
                single
            ]
        );
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["paragrid", "filter", "a.docx", "`Font Size` > 12"]).unwrap();
        assert!(matches!(cli.command, Commands::Filter { .. }));
        let cli = Cli::try_parse_from(["paragrid", "copy-headers", "src.docx"]);
        assert!(cli.is_err());
    }
}
