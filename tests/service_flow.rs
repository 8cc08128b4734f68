mod common;

use common::{d, healthy, offline, upload_bytes, Ask, ACTIVITIES, PNG_1X1};
use logbook::config::Config;
use logbook::enrich::{COMMENT_FALLBACK, COMMENT_NO_TASKS};
use logbook::error::{is_not_found, LogbookError};
use logbook::layout::{find_blocks, load_bytes};
use logbook::model::ACTIVITY_NA;
use logbook::report::ReportStatus;
use logbook::service::Logbook;
use logbook::store::{MemoryStore, RecordStore};
use logbook::util::sha256_hex;

const TASKS: &[(&str, &str)] = &[
    ("2025-06-02", "Safety induction"),
    ("2025-06-04", "Cable termination on feeder 3"),
    ("2025-06-16", "Insulation testing"),
];

#[test]
fn upload_to_signed_document() {
    let stub = healthy();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let bytes = upload_bytes(TASKS, ACTIVITIES);

    let report = logbook.upload(&bytes, "J. Otieno", "2025-06-02", "2025-06-18").unwrap();
    assert_eq!(report.status, ReportStatus::Draft);
    assert_eq!(report.source_digest, sha256_hex(&bytes));
    // the empty middle week is dropped
    let endings: Vec<_> = report.weeks.iter().map(|w| w.week_ending).collect();
    assert_eq!(endings, vec![d("2025-06-08"), d("2025-06-22")]);
    assert_eq!(report.weeks[0].tasks[1].activity_no, "1.1, 2.1");
    assert_eq!(report.weeks[0].problems, "Parts arrived late.");
    assert_eq!(stub.count(Ask::Activity), 3);

    logbook.submit(report.id).unwrap();
    let waiting = logbook.submitted().unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].weeks, 2);

    let comments = logbook.generate_comments_all(report.id).unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|(_, c)| c == "Steady work, well documented."));

    let signed = logbook.finalize(report.id, PNG_1X1).unwrap();
    assert_eq!(logbook.report(report.id).unwrap().status, ReportStatus::Completed);

    let wb = load_bytes(&signed).unwrap();
    let sheet = wb.sheet("log").unwrap();
    let blocks = find_blocks(sheet);
    assert_eq!(blocks.len(), 2);
    let first = blocks[0].to_week_record().unwrap();
    assert_eq!(first.tasks, report.weeks[0].tasks);
    assert_eq!(first.supervisor_comment, "Steady work, well documented.");
}

#[test]
fn offline_service_still_produces_a_report() {
    let stub = offline();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let bytes = upload_bytes(TASKS, ACTIVITIES);

    let report = logbook.upload(&bytes, "J. Otieno", "2025-06-02", "2025-06-08").unwrap();
    assert_eq!(report.weeks.len(), 1);
    assert!(report.weeks[0].tasks.iter().all(|t| t.activity_no == ACTIVITY_NA));

    let week = logbook.generate_comment(report.weeks[0].id).unwrap();
    assert_eq!(week.supervisor_comment, COMMENT_FALLBACK);

    let preview = logbook.download(report.id).unwrap();
    assert!(!preview.is_empty());
}

#[test]
fn upload_without_activity_sheet_is_na() {
    let stub = healthy();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let bytes = upload_bytes(TASKS, &[]);

    let report = logbook.upload(&bytes, "J. Otieno", "2025-06-02", "2025-06-08").unwrap();
    assert!(report.weeks[0].tasks.iter().all(|t| t.activity_no == ACTIVITY_NA));
    assert_eq!(stub.count(Ask::Activity), 0);
}

#[test]
fn comments_and_versions() {
    let stub = healthy();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let report = logbook
        .upload(&upload_bytes(TASKS, ACTIVITIES), "J. Otieno", "2025-06-02", "2025-06-22")
        .unwrap();

    assert_eq!(logbook.comment_all(report.id, "Approved.").unwrap(), 2);
    let weeks = logbook.weeks(report.id).unwrap();
    assert!(weeks.iter().all(|w| w.supervisor_comment == "Approved." && w.version == 1));

    let err = logbook
        .update_comment(weeks[0].id, "Changed my mind.", Some(0))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LogbookError>(),
        Some(LogbookError::VersionConflict { .. })
    ));
    let ok = logbook.update_comment(weeks[0].id, "Changed my mind.", Some(1)).unwrap();
    assert_eq!(ok.version, 2);

    let preview = logbook.preview(report.id).unwrap();
    assert_eq!(preview.weeks[0].supervisor_comment, "Changed my mind.");
}

#[test]
fn empty_week_comment_skips_the_service() {
    let stub = healthy();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let report = logbook
        .store()
        .create_report("J. Otieno", "", vec![logbook::report::NewWeek {
            week_ending: d("2025-06-08"),
            tasks_summary: String::new(),
            tasks: Vec::new(),
            problems: String::new(),
            solutions: String::new(),
        }])
        .unwrap();
    let week = logbook.generate_comment(report.weeks[0].id).unwrap();
    assert_eq!(week.supervisor_comment, COMMENT_NO_TASKS);
    assert_eq!(stub.count(Ask::Comment), 0);
}

#[test]
fn validation_and_not_found() {
    let stub = healthy();
    let logbook = Logbook::new(&Config::default(), &stub, MemoryStore::new());
    let bytes = upload_bytes(TASKS, ACTIVITIES);

    let err = logbook.upload(&bytes, "x", "2025/06/02", "2025-06-08").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LogbookError>(),
        Some(LogbookError::InvalidDateFormat { .. })
    ));
    let err = logbook.upload(&bytes, "x", "2025-06-09", "2025-06-02").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LogbookError>(),
        Some(LogbookError::InvalidRange { .. })
    ));

    assert!(is_not_found(&logbook.preview(42).unwrap_err()));
    assert!(is_not_found(&logbook.submit(42).unwrap_err()));
    assert!(is_not_found(&logbook.download(42).unwrap_err()));
    assert!(is_not_found(&logbook.generate_comment(42).unwrap_err()));
    assert!(is_not_found(&logbook.comment_all(42, "x").unwrap_err()));
    assert!(is_not_found(&logbook.finalize(42, PNG_1X1).unwrap_err()));
    assert!(logbook.health().unwrap().reachable);
}
