#![forbid(unsafe_code)]

//! Replays fixtures end to end and checks the final board.

use std::path::Path;
use std::time::Duration;

use scoreboard_harness::{Fixture, FixtureError, RunOptions, ScriptedEvent, run};

fn demo() -> Fixture {
    Fixture::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo.json")).unwrap()
}

fn options() -> RunOptions {
    RunOptions::default().with_timeout(Duration::from_secs(5))
}

#[test]
fn demo_fixture_replays_to_default_view() {
    let report = run(&demo(), &options()).unwrap();

    assert_eq!(
        report.keys(),
        vec![
            "domXssChallenge",
            "loginAdminChallenge",
            "privacyPolicyChallenge",
            "scoreBoardChallenge",
            "nosqlManipulationChallenge",
            "xxeDosChallenge",
        ]
    );
    // One load plus five recomputing events, plus the initial parameters
    // when they arrive after the load.
    assert!(report.revision >= 6);
    assert_eq!(
        report.query,
        "showDisabledChallenges=true&sortBy=difficulty&sortDirection=asc"
    );

    let progress = &report.progress;
    assert_eq!((progress.hacking_solved, progress.hacking_total), (2, 6));
    assert_eq!((progress.coding_points, progress.coding_points_available), (1, 6));
    assert!(progress.tutorial_mode);
    assert_eq!(progress.disabled, 1);

    assert_eq!(report.notifications, vec!["Score%20Board"]);
    assert_eq!(report.dialogs, vec!["domXssChallenge"]);
}

#[test]
fn navigation_filters_by_category() {
    let mut fixture = demo();
    fixture
        .events
        .retain(|e| matches!(e, ScriptedEvent::Navigate { .. }));
    let report = run(&fixture, &options()).unwrap();

    assert_eq!(
        report.keys(),
        vec![
            "domXssChallenge",
            "loginAdminChallenge",
            "nosqlManipulationChallenge"
        ]
    );
    // Navigation came from outside; the board itself never navigated.
    assert!(report.query.is_empty());
}

#[test]
fn initial_query_hides_disabled_challenges() {
    let mut fixture = demo();
    fixture.events.clear();
    let report = run(&fixture, &options()).unwrap();

    assert!(!report.keys().contains(&"xxeDosChallenge"));
    assert_eq!(report.rows.len(), 5);
    assert_eq!(
        report.keys()[..3],
        ["domXssChallenge", "scoreBoardChallenge", "loginAdminChallenge"]
    );
    assert_eq!(report.rows[1].tags, vec!["Tutorial", "Code Analysis"]);
}

#[test]
fn escaped_descriptions_keep_markup_out() {
    let mut fixture = demo();
    fixture.events.clear();
    let report = run(&fixture, &options().with_escape_markup(true)).unwrap();

    let board = report
        .rows
        .iter()
        .find(|r| r.key == "scoreBoardChallenge")
        .unwrap();
    assert_eq!(
        board.description,
        "Find the carefully hidden &lt;em&gt;Score Board&lt;/em&gt; page."
    );
}

#[test]
fn failing_source_times_out() {
    let mut fixture = demo();
    fixture.load_error = Some("connection refused".into());
    let err = run(
        &fixture,
        &RunOptions::default().with_timeout(Duration::from_millis(200)),
    )
    .unwrap_err();
    assert!(matches!(&err, FixtureError::Timeout(what) if what == "the initial load"));
}

#[test]
fn text_report_lists_rows() {
    let report = run(&demo(), &options()).unwrap();
    let text = report.render_text();
    assert!(text.starts_with(&format!("revision {}  hacking 2/6 (33%)", report.revision)));
    assert!(text.contains("tutorial mode"));
    assert!(text.contains("1 challenge(s) unavailable"));
    assert!(text.contains("[x] *      Score Board"));
    assert!(text.ends_with(
        "query: ?showDisabledChallenges=true&sortBy=difficulty&sortDirection=asc\n"
    ));
}
