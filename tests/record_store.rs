mod common;

use common::d;
use logbook::error::{is_not_found, LogbookError};
use logbook::model::TaskEntry;
use logbook::report::{NewWeek, ReportStatus};
use logbook::store::{JsonFileStore, MemoryStore, RecordStore};

fn new_weeks() -> Vec<NewWeek> {
    vec![
        NewWeek {
            week_ending: d("2025-06-08"),
            tasks_summary: "- Site survey\n".into(),
            tasks: vec![TaskEntry::new(d("2025-06-03"), "Site survey", "1.2, 2.1")],
            problems: "p".into(),
            solutions: "s".into(),
        },
        NewWeek {
            week_ending: d("2025-06-15"),
            tasks_summary: "- Panel wiring\n".into(),
            tasks: vec![TaskEntry::new(d("2025-06-10"), "Panel wiring", "N/A")],
            problems: "p2".into(),
            solutions: "s2".into(),
        },
    ]
}

fn exercise(store: &dyn RecordStore) {
    let report = store.create_report("J. Otieno", "abc123", new_weeks()).unwrap();
    assert_eq!(report.status, ReportStatus::Draft);
    assert_eq!(report.weeks.len(), 2);
    assert!(report.weeks.iter().all(|w| w.report_id == report.id && w.version == 0));

    let second = store.create_report("K. Achieng", "def456", Vec::new()).unwrap();
    assert_ne!(second.id, report.id);

    store.set_status(report.id, ReportStatus::Submitted).unwrap();
    let submitted = store.reports(Some(ReportStatus::Submitted)).unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].id, report.id);
    assert_eq!(store.reports(None).unwrap().len(), 2);

    let week_id = report.weeks[0].id;
    let v1 = store.set_comment(week_id, "Keep it up.", Some(0)).unwrap();
    assert_eq!(v1.version, 1);

    let stale = store.set_comment(week_id, "Overwrite", Some(0)).unwrap_err();
    assert_eq!(
        stale.downcast_ref::<LogbookError>(),
        Some(&LogbookError::VersionConflict {
            week_id,
            expected: 0,
            found: 1
        })
    );
    assert_eq!(store.week(week_id).unwrap().supervisor_comment, "Keep it up.");

    let v2 = store.set_comment(week_id, "Last write wins.", None).unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(store.report(report.id).unwrap().weeks[0].supervisor_comment, "Last write wins.");

    assert!(is_not_found(&store.report(999).unwrap_err()));
    assert!(is_not_found(&store.week(999).unwrap_err()));
    assert!(is_not_found(&store.set_status(999, ReportStatus::Completed).unwrap_err()));
    assert!(is_not_found(&store.set_comment(999, "x", None).unwrap_err()));

    let both = vec![
        (report.weeks[0].id, "Batch one.".to_string()),
        (report.weeks[1].id, "Batch two.".to_string()),
    ];
    let updated = store.set_comments(&both).unwrap();
    assert_eq!(updated.iter().map(|w| w.version).collect::<Vec<_>>(), vec![3, 1]);

    // one unknown week and nothing is written
    let partial = vec![(report.weeks[1].id, "Lost.".to_string()), (999, "x".to_string())];
    assert!(is_not_found(&store.set_comments(&partial).unwrap_err()));
    let second_week = store.week(report.weeks[1].id).unwrap();
    assert_eq!(second_week.supervisor_comment, "Batch two.");
    assert_eq!(second_week.version, 1);
}

#[test]
fn memory_store_workflow() {
    exercise(&MemoryStore::new());
}

#[test]
fn json_store_workflow() {
    let dir = tempfile::tempdir().unwrap();
    exercise(&JsonFileStore::open(dir.path().join("store.json")));
}

#[test]
fn json_store_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let id = {
        let store = JsonFileStore::open(&path);
        store.create_report("J. Otieno", "abc123", new_weeks()).unwrap().id
    };

    let reopened = JsonFileStore::open(&path);
    let report = reopened.report(id).unwrap();
    assert_eq!(report.source_digest, "abc123");
    assert_eq!(report.weeks[1].tasks[0].description, "Panel wiring");

    let mut names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["store.json", "store.json.lock"]);
}

#[test]
fn json_store_checks_versions_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let week_id = JsonFileStore::open(&path)
        .create_report("J. Otieno", "abc123", new_weeks())
        .unwrap()
        .weeks[0]
        .id;

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let store = JsonFileStore::open(&path);
            std::thread::spawn(move || store.set_comment(week_id, &format!("comment {i}"), Some(0)))
        })
        .collect();
    let results: Vec<_> = writers.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.downcast_ref::<LogbookError>(),
            Some(LogbookError::VersionConflict { expected: 0, found: 1, .. })
        ));
    }

    let stored = JsonFileStore::open(&path).week(week_id).unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.supervisor_comment, winners[0].supervisor_comment);
}
