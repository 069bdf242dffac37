//! Integration tests for folder batches and sessions over snapshot files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use paragrid::batch::pages::in_directory;
use paragrid::batch::{
    continue_page_numbers, copy_headers, export_pdfs, list_documents, scan_directory,
    set_header_footer_text, spawn_walk, BatchEvent, HeaderInfo, WalkOptions,
};
use paragrid::host::{HostApplication, MemoryApplication, MemoryDocument, MemoryParagraph};
use paragrid::{is_pdf, DocumentKind, FilterOutcome, Session, Settings};

fn write_snapshot(dir: &Path, doc: &MemoryDocument) -> PathBuf {
    let path = dir.join(&doc.name);
    fs::write(&path, doc.to_json().unwrap()).unwrap();
    path
}

fn lesson(name: &str, pages: u32) -> MemoryDocument {
    MemoryDocument::new(name)
        .with_paragraph(MemoryParagraph::new(name.trim_end_matches(".docx")).with_style("Heading 1"))
        .with_paragraph(MemoryParagraph::new("Worked example, step 1"))
        .with_pages(pages)
}

fn reopen(path: &Path) -> MemoryDocument {
    MemoryApplication::new().open(path).unwrap()
}

#[test]
fn test_walker_orders_units_and_skips_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(dir.path(), &lesson("Unit 2.docx", 4));
    write_snapshot(dir.path(), &lesson("Unit 1.docx", 3));
    write_snapshot(dir.path(), &lesson("~temp.docx", 1));
    fs::write(dir.path().join("notes.txt"), "not a document").unwrap();

    let names = list_documents(dir.path(), &WalkOptions::default()).unwrap();
    assert_eq!(names, ["Unit 1.docx", "Unit 2.docx"]);

    let app = MemoryApplication::new();
    let report = scan_directory(&app, dir.path(), &WalkOptions::default()).unwrap();
    assert_eq!(report.file_names(), ["Unit 1.docx", "Unit 2.docx"]);
    assert_eq!(report.processed().count(), 2);

    let first = &report.files[0];
    assert_eq!(first.kind, Some(DocumentKind::Snapshot));
    let props = first.properties().unwrap();
    assert_eq!(props.pages, 3);
    assert_eq!(props.sections, 1);
    assert_eq!(props.headers, HeaderInfo::NotDeclared);
    assert_eq!(props.starting_page, 1);
    assert_eq!(props.ending_page, 3);
}

#[test]
fn test_unreadable_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(dir.path(), &lesson("Unit 1.docx", 2));
    fs::write(dir.path().join("Unit 2.docx"), "{ not json").unwrap();

    let app = MemoryApplication::new();
    let report = scan_directory(&app, dir.path(), &WalkOptions::default()).unwrap();
    assert_eq!(report.processed().count(), 1);
    let failed: Vec<&str> = report.failed().map(|f| f.file.as_str()).collect();
    assert_eq!(failed, ["Unit 2.docx"]);
}

#[test]
fn test_background_scan_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    for (name, pages) in [("Unit 3.docx", 1), ("Unit 10.docx", 2), ("Unit 1.docx", 3)] {
        write_snapshot(dir.path(), &lesson(name, pages));
    }

    let (rx, handle) = spawn_walk(
        Arc::new(MemoryApplication::new()),
        dir.path().to_path_buf(),
        WalkOptions::default(),
    );
    let events: Vec<BatchEvent> = rx.iter().collect();
    handle.join().unwrap();

    assert!(matches!(events.first(), Some(BatchEvent::Started { total: 3 })));
    let done: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::FileDone(report) => Some(report.file.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(done, ["Unit 1.docx", "Unit 3.docx", "Unit 10.docx"]);
    assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
}

#[test]
fn test_page_numbers_continue_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_snapshot(dir.path(), &lesson("Unit 1.docx", 3));

    // The host renders fewer pages than it counts for this one.
    let mut short = lesson("Unit 2.docx", 5);
    short.rendered_last_page = Some(2);
    let second = write_snapshot(dir.path(), &short);

    let third = write_snapshot(dir.path(), &lesson("Unit 3.docx", 2));
    let missing = dir.path().join("Unit 4.docx");

    let app = MemoryApplication::new();
    let files = [first.clone(), second, missing, third.clone()];
    let report = continue_page_numbers(&app, &files, 1);

    let starts: Vec<u32> = report.files.iter().map(|f| f.numbering.starting_page).collect();
    assert_eq!(starts, [1, 4, 3]);
    assert_eq!(report.files[1].numbering.ending_page, 2);
    assert_eq!(report.files[2].numbering.ending_page, 4);
    assert_eq!(report.next_start, 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "Unit 4.docx");

    let saved = reopen(&third);
    assert!(saved.sections[0].restart_numbering);
    assert_eq!(saved.sections[0].starting_number, 3);
    assert_eq!(reopen(&first).sections[0].starting_number, 1);
}

#[test]
fn test_page_numbering_shrinks_first_header() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = lesson("Unit 1.docx", 2);
    doc.sections[0].header_paragraph.font_size = 14.0;
    doc.sections[0].header_paragraph.space_before = 6.0;
    doc.sections[0].header_paragraph.space_after = 12.0;
    let path = write_snapshot(dir.path(), &doc);

    let report = continue_page_numbers(&MemoryApplication::new(), &[path.clone()], 1);
    assert_eq!(report.files.len(), 1);

    let header = reopen(&path).sections[0].header_paragraph;
    assert_eq!(header.font_size, 1.0);
    assert_eq!(header.space_before, 0.0);
    assert_eq!(header.space_after, 0.0);
}

#[test]
fn test_set_header_footer_text_in_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let mut two_sections = lesson("Unit 1.docx", 3);
    two_sections.sections.push(Default::default());
    let first = write_snapshot(dir.path(), &two_sections);
    let second = write_snapshot(dir.path(), &lesson("Unit 2.docx", 1));
    let missing = dir.path().join("Unit 5.docx");

    let app = MemoryApplication::new();
    let report = set_header_footer_text(
        &app,
        &[first.clone(), missing, second.clone()],
        Some("Grade 6 Mathematics"),
        Some(""),
    );
    assert_eq!(report.updated, ["Unit 1.docx", "Unit 2.docx"]);
    assert_eq!(report.skipped.len(), 1);

    let saved = reopen(&first);
    for section in &saved.sections {
        assert_eq!(section.headers.primary, "Grade 6 Mathematics");
        assert_eq!(section.headers.even_pages, "Grade 6 Mathematics");
        assert_eq!(section.headers.first_page, "Grade 6 Mathematics");
        assert!(section.footers.primary.is_empty());
    }

    set_header_footer_text(&app, &[second.clone()], None, Some("Page"));
    let saved = reopen(&second);
    assert_eq!(saved.sections[0].footers.even_pages, "Page");
    assert_eq!(saved.sections[0].headers.primary, "Grade 6 Mathematics");
}

#[test]
fn test_copy_headers_to_destinations() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = lesson("Unit 1.docx", 2);
    source.sections[0].headers.even_pages = "Grade 6 Mathematics\r".to_string();
    source.sections[0].headers.primary = "Unit Overview\r".to_string();
    let source = write_snapshot(dir.path(), &source);
    let target = write_snapshot(dir.path(), &lesson("Unit 2.docx", 2));
    let missing = dir.path().join("Unit 9.docx");

    let app = MemoryApplication::new();
    let report = copy_headers(&app, &source, &[target.clone(), missing]).unwrap();
    assert_eq!(report.headers.even, "Grade 6 Mathematics");
    assert_eq!(report.headers.odd, "Unit Overview");
    assert_eq!(report.copied, ["Unit 2.docx"]);
    assert_eq!(report.skipped.len(), 1);

    let updated = reopen(&target);
    assert_eq!(updated.sections[0].headers.even_pages, "Grade 6 Mathematics");
    assert_eq!(updated.sections[0].headers.primary, "Unit Overview");

    let scanned = scan_directory(&app, dir.path(), &WalkOptions::default()).unwrap();
    let props = scanned.files[1].properties().unwrap();
    assert!(props.headers.is_declared());
}

#[test]
fn test_copy_headers_requires_source() {
    let dir = tempfile::tempdir().unwrap();
    let target = write_snapshot(dir.path(), &lesson("Unit 2.docx", 2));
    let app = MemoryApplication::new();
    assert!(copy_headers(&app, dir.path().join("gone.docx"), &[target]).is_err());
}

#[test]
fn test_export_pdfs() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["Unit 1.docx", "Unit 2.docx"];
    for name in names {
        write_snapshot(dir.path(), &lesson(name, 1));
    }
    let out = dir.path().join("output");

    let app = MemoryApplication::new();
    let files = in_directory(dir.path(), &names);
    let report = export_pdfs(&app, &files, &out).unwrap();
    assert_eq!(report.exported.len(), 2);
    assert!(report.skipped.is_empty());
    assert_eq!(report.exported[0], out.join("Unit 1.pdf"));
    for pdf in &report.exported {
        assert!(is_pdf(pdf), "{}", pdf.display());
    }
}

#[test]
fn test_session_flow() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(dir.path(), &lesson("Unit 1.docx", 2));
    let settings = Settings::new().with_history_path(dir.path().join("Data/filter_history.json"));

    let mut session = Session::new(Arc::new(MemoryApplication::new()), settings.clone());
    session.set_current_dir(dir.path());

    let mut projection = session.load_projection("Unit 1.docx").unwrap();
    let outcome = projection.filter("paragraph_style == 'Heading 1'").unwrap();
    assert_eq!(outcome, FilterOutcome::Applied { rows: 1 });
    session.save_history(&projection).unwrap();

    let reloaded = Session::new(Arc::new(MemoryApplication::new()), settings);
    assert_eq!(
        reloaded.projection().history().entries(),
        ["paragraph_style == 'Heading 1'"]
    );
}
