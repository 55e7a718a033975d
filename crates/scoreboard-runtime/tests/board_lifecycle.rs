#![forbid(unsafe_code)]

//! End-to-end lifecycle tests for the score board on real threads.
//!
//! Each test wires a [`ScoreBoard`] to in-memory sources and push channels,
//! runs it through a [`Program`], and checks what the derived view looks like
//! after the inputs have been delivered.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use scoreboard_core::{
    ChallengeSolved, CodeChallengeSolved, CodingChallengeStatus, Configuration, FilterSetting,
    ParamMap, RawChallenge, encode,
};
use scoreboard_runtime::{
    BoardInputs, BoardMsg, Effects, Navigator, Phase, Program, PushSender, ScoreBoard,
    ServiceError, ServiceResult, push_channel,
};
use tracing_subscriber::layer::SubscriberExt;

const WAIT: Duration = Duration::from_secs(3);

// ============================================================================
// Test Infrastructure
// ============================================================================

fn sample() -> Vec<RawChallenge> {
    let mut board = RawChallenge::new("scoreBoardChallenge", "Score Board", 1);
    board.tutorial_order = Some(1);
    let mut xss = RawChallenge::new("localXssChallenge", "DOM XSS", 1);
    xss.has_coding_challenge = true;
    vec![
        board,
        RawChallenge::new("sqlInjectionChallenge", "Login Admin", 2),
        xss,
    ]
}

struct Wiring {
    params: PushSender<ParamMap>,
    solved: PushSender<ChallengeSolved>,
    code_solved: PushSender<CodeChallengeSolved>,
    inputs: BoardInputs,
}

fn wire(
    challenges: impl Fn(&str) -> ServiceResult<Vec<RawChallenge>> + Send + Sync + 'static,
) -> Wiring {
    let (params, params_stream) = push_channel();
    let (solved, solved_stream) = push_channel();
    let (code_solved, code_stream) = push_channel();
    let configuration = || -> ServiceResult<Configuration> { Ok(Configuration::default()) };
    let inputs = BoardInputs::new(
        Arc::new(challenges),
        Arc::new(configuration),
        params_stream,
        solved_stream,
        code_stream,
    )
    .with_poll(Duration::from_millis(2));
    Wiring {
        params,
        solved,
        code_solved,
        inputs,
    }
}

fn ready_program(wiring: &Wiring, effects: Effects) -> Program<ScoreBoard> {
    let mut program = Program::new(ScoreBoard::new(wiring.inputs.clone()), effects);
    program.activate().unwrap();
    assert!(program.pump_until(WAIT, ScoreBoard::is_ready).unwrap());
    program
}

/// Navigator that writes straight back into the parameter stream.
struct LoopbackRouter(PushSender<ParamMap>);

impl Navigator for LoopbackRouter {
    fn navigate(&self, params: ParamMap) -> ServiceResult<()> {
        if self.0.send(params) {
            Ok(())
        } else {
            Err(ServiceError::Transport("parameter stream closed".into()))
        }
    }
}

/// Layer recording `(level, message)` of every event.
#[derive(Clone, Default)]
struct EventCapture(Arc<Mutex<Vec<(tracing::Level, String)>>>);

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), message));
    }
}

impl EventCapture {
    fn at(&self, level: tracing::Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn bulk_load_reaches_ready() {
    let wiring = wire(|_| Ok(sample()));
    let (effects, _) = Effects::recording();
    let program = ready_program(&wiring, effects);

    let view = program.model().derived_view().unwrap();
    assert_eq!(view.revision, 1);
    assert_eq!(
        view.keys(),
        vec!["scoreBoardChallenge", "localXssChallenge", "sqlInjectionChallenge"]
    );
}

#[test]
fn source_receives_sort_spec() {
    let seen = Arc::new(Mutex::new(String::new()));
    let seen_by_source = Arc::clone(&seen);
    let wiring = wire(move |sort| {
        *seen_by_source.lock().unwrap() = sort.to_owned();
        Ok(sample())
    });
    let (effects, _) = Effects::recording();
    let _program = ready_program(&wiring, effects);
    assert_eq!(*seen.lock().unwrap(), "name");
}

#[test]
fn event_before_load_is_tolerated() {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let gate = Mutex::new(gate_rx);
    let wiring = wire(move |_| {
        let _ = gate.lock().unwrap().recv_timeout(WAIT);
        Ok(sample())
    });
    let (effects, _) = Effects::recording();
    let mut program = Program::new(ScoreBoard::new(wiring.inputs.clone()), effects);
    program.activate().unwrap();

    assert!(wiring.solved.send(ChallengeSolved::for_key("sqlInjectionChallenge")));
    let deadline = Instant::now() + WAIT;
    while program.handled() < 1 && Instant::now() < deadline {
        program.pump().unwrap();
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(program.handled(), 1);
    assert_eq!(program.model().phase(), Phase::Loading);

    gate_tx.send(()).unwrap();
    assert!(program.pump_until(WAIT, ScoreBoard::is_ready).unwrap());
    assert!(program.model().challenges().iter().all(|c| !c.solved));
}

#[test]
fn push_events_update_view_in_delivery_order() {
    let wiring = wire(|_| Ok(sample()));
    let (effects, _) = Effects::recording();
    let mut program = ready_program(&wiring, effects);

    for status in [
        CodingChallengeStatus::InProgress,
        CodingChallengeStatus::Solved,
        CodingChallengeStatus::InProgress,
    ] {
        assert!(
            wiring
                .code_solved
                .send(CodeChallengeSolved::new("localXssChallenge", status))
        );
    }
    assert!(wiring.solved.send(ChallengeSolved::for_key("scoreBoardChallenge")));

    assert!(
        program
            .pump_until(WAIT, |m| m.revision() == 5)
            .unwrap()
    );
    let view = program.model().derived_view().unwrap();
    assert_eq!(view.progress.coding_points, 1);
    assert_eq!(view.progress.hacking_solved, 1);
}

#[test]
fn filter_edit_round_trips_through_parameter_stream() {
    let wiring = wire(|_| Ok(sample()));
    let (recording, recorder) = Effects::recording();
    let effects = Effects::new(
        Arc::new(LoopbackRouter(wiring.params.clone())),
        recording.dialog.clone(),
        recording.notifications.clone(),
    );
    let mut program = ready_program(&wiring, effects);

    let filter = FilterSetting::default().with_search("admin");
    program.dispatch(BoardMsg::FilterEdited(filter.clone())).unwrap();
    assert!(program.model().filter().is_default());

    assert!(
        program
            .pump_until(WAIT, |m| m.filter() == &filter)
            .unwrap()
    );
    assert_eq!(
        program.model().derived_view().unwrap().keys(),
        vec!["sqlInjectionChallenge"]
    );
    assert!(recorder.navigations().is_empty());
}

#[test]
fn initial_parameters_shape_first_view() {
    let wiring = wire(|_| Ok(sample()));
    let filter = FilterSetting::default().with_search("xss");
    assert!(wiring.params.send(encode(&filter)));

    let (effects, _) = Effects::recording();
    let mut program = Program::new(ScoreBoard::new(wiring.inputs.clone()), effects);
    program.activate().unwrap();
    assert!(
        program
            .pump_until(WAIT, |m| m.is_ready() && m.filter() == &filter)
            .unwrap()
    );
    assert_eq!(
        program.model().derived_view().unwrap().keys(),
        vec!["localXssChallenge"]
    );
}

#[test]
fn repeat_notification_failure_reaches_caller() {
    let wiring = wire(|_| Ok(sample()));
    let (effects, recorder) = Effects::recording();
    let mut program = ready_program(&wiring, effects);

    program
        .dispatch(BoardMsg::RepeatNotification("scoreBoardChallenge".into()))
        .unwrap();
    assert_eq!(recorder.notifications(), vec!["Score%20Board"]);

    recorder.fail_notifications_with(ServiceError::Rejected("503".into()));
    let err = program
        .dispatch(BoardMsg::RepeatNotification("scoreBoardChallenge".into()))
        .unwrap_err();
    assert_eq!(err, ServiceError::Rejected("503".into()));
}

#[test]
fn open_coding_dialog_reaches_dialog() {
    let wiring = wire(|_| Ok(sample()));
    let (effects, recorder) = Effects::recording();
    let mut program = ready_program(&wiring, effects);

    program
        .dispatch(BoardMsg::OpenCodingDialog("localXssChallenge".into()))
        .unwrap();
    let dialogs = recorder.dialogs();
    assert_eq!(dialogs.len(), 1);
    assert_eq!(dialogs[0].name, "DOM XSS");
}

#[test]
fn load_failure_is_logged_and_view_stays_hidden() {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let wiring = wire(|_| Err(ServiceError::Transport("connection refused".into())));
        let (effects, _) = Effects::recording();
        let mut program = Program::new(ScoreBoard::new(wiring.inputs.clone()), effects);
        program.activate().unwrap();
        assert!(
            !program
                .pump_until(Duration::from_millis(200), ScoreBoard::is_ready)
                .unwrap()
        );
        assert_eq!(program.model().phase(), Phase::Loading);
        assert!(program.model().derived_view().is_none());
    });

    let warnings = capture.at(tracing::Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("loading challenges failed"));
}

#[test]
fn deactivation_discards_buffered_events() {
    let wiring = wire(|_| Ok(sample()));
    let (effects, _) = Effects::recording();
    let mut program = ready_program(&wiring, effects);
    let revision = program.model().revision();

    for key in ["scoreBoardChallenge", "sqlInjectionChallenge", "localXssChallenge"] {
        let _ = wiring.solved.send(ChallengeSolved::for_key(key));
    }
    // Let the forwarder move them into the program's queue.
    thread::sleep(Duration::from_millis(50));

    program.deactivate();
    assert!(!program.is_active());
    assert!(program.active_subscriptions().is_empty());
    assert_eq!(program.pump().unwrap(), 0);
    assert!(
        !program
            .pump_until(Duration::from_millis(50), |m| m.revision() > revision)
            .unwrap()
    );
    assert_eq!(program.model().revision(), revision);
    assert!(program.model().challenges().iter().all(|c| !c.solved));
}

#[test]
fn deactivation_before_ready_releases_everything() {
    let (_gate_tx, gate_rx) = mpsc::channel::<()>();
    let gate = Mutex::new(gate_rx);
    let wiring = wire(move |_| {
        let _ = gate.lock().unwrap().recv_timeout(Duration::from_millis(300));
        Ok(sample())
    });
    let (effects, _) = Effects::recording();
    let mut program = Program::new(ScoreBoard::new(wiring.inputs.clone()), effects);
    program.activate().unwrap();
    assert_eq!(program.active_subscriptions().len(), 4);

    program.deactivate();
    assert!(program.active_subscriptions().is_empty());
    thread::sleep(Duration::from_millis(350));
    assert_eq!(program.pump().unwrap(), 0);
    assert_eq!(program.model().phase(), Phase::Loading);
}
