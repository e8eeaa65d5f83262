//! FrontService against a scripted link and keypad.
//!
//! The link replays the back controller's verdict bytes; the keypad
//! replays key presses.  Timers are synchronous.

use crate::mock_hw::{MockDisplay, RecordingSink};

use doorlock::Error;
use doorlock::adapters::console::ScriptedKeypad;
use doorlock::adapters::timer::StepTimer;
use doorlock::app::events::{LockEvent, Role};
use doorlock::app::ports::Prompt;
use doorlock::app::service::FrontService;
use doorlock::config::LockConfig;
use doorlock::fsm::front::Screen;
use doorlock::link::SliceLink;
use doorlock::protocol::{MATCH_BYTE, MISMATCH_BYTE};

type Front<'a> = FrontService<SliceLink<'a>, ScriptedKeypad, MockDisplay, StepTimer, RecordingSink>;

fn make_front<'a>(verdicts: &'a [u8], keys: &str) -> (Front<'a>, MockDisplay, RecordingSink) {
    let display = MockDisplay::default();
    let sink = RecordingSink::default();
    let mut front = FrontService::new(
        SliceLink::new(verdicts),
        ScriptedKeypad::new(keys),
        display.clone(),
        StepTimer::new(),
        sink.clone(),
        LockConfig::default(),
    );
    front.start();
    (front, display, sink)
}

#[test]
fn starts_on_create_screen() {
    let (front, _, sink) = make_front(&[], "");
    assert_eq!(front.screen(), Screen::CreatePassword);
    assert!(sink.contains(&LockEvent::Started {
        role: Role::Front,
        state: "CreatePassword",
    }));
}

#[test]
fn provisioning_then_open_runs_control_screen() {
    let (mut front, display, sink) = make_front(&[MATCH_BYTE, MATCH_BYTE], "12345=12345=+12345=");

    front.step().unwrap();
    assert_eq!(front.screen(), Screen::MainOptions);
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::Control);
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::MainOptions);

    assert_eq!(
        display.prompts(),
        vec![
            Prompt::EnterPassword,
            Prompt::ConfirmPassword,
            Prompt::MainOptions,
            Prompt::EnterPassword,
            Prompt::DoorUnlocking,
            Prompt::DoorUnlocked,
            Prompt::DoorLocking,
        ]
    );
    assert_eq!(display.masks(), 15);
    assert_eq!(front.context().timer.delivered(), 33);
    assert_eq!(
        front.context().link.sent,
        vec![
            0x10, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5, //
            0x11, 1, 2, 3, 4, 5,
        ]
    );
    assert!(sink.contains(&LockEvent::StateChanged {
        role: Role::Front,
        from: "Control",
        to: "MainOptions",
    }));
}

#[test]
fn create_mismatch_stays_without_fault() {
    let (mut front, _, sink) = make_front(&[MISMATCH_BYTE], "11111=22222=");
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::CreatePassword);
    assert_eq!(front.faults().count(), 0);
    assert_eq!(sink.count(|e| matches!(e, LockEvent::StateChanged { .. })), 0);
}

#[test]
fn mixed_failures_lock_out_then_recover() {
    let (mut front, display, sink) = make_front(
        &[MATCH_BYTE, MISMATCH_BYTE, MISMATCH_BYTE, MISMATCH_BYTE],
        "12345=12345=+00000=-00000=+00000=",
    );

    front.step().unwrap(); // create
    front.step().unwrap(); // open fails
    front.step().unwrap(); // change fails
    assert_eq!(front.faults().count(), 2);
    assert_eq!(front.screen(), Screen::MainOptions);

    front.step().unwrap(); // open fails, third
    assert_eq!(front.screen(), Screen::Error);
    assert!(sink.contains(&LockEvent::LockoutStarted));

    front.step().unwrap(); // lockout runs
    assert_eq!(front.screen(), Screen::MainOptions);
    assert_eq!(front.faults().count(), 0);
    assert_eq!(front.context().timer.delivered(), 60);
    assert!(sink.contains(&LockEvent::LockoutEnded));
    assert_eq!(display.prompts().last(), Some(&Prompt::Lockout));
}

#[test]
fn change_success_returns_to_create() {
    let (mut front, _, _) = make_front(&[MATCH_BYTE, MATCH_BYTE, MATCH_BYTE], "12345=12345=-12345=54321=54321=");
    front.step().unwrap();
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::CreatePassword);
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::MainOptions);
    assert_eq!(
        &front.context().link.sent[17..],
        &[0x10, 5, 4, 3, 2, 1, 5, 4, 3, 2, 1]
    );
}

#[test]
fn unknown_verdict_byte_counts_as_mismatch() {
    let display = MockDisplay::default();
    let sink = RecordingSink::default();
    let verdicts = [0x7F];
    let mut front = FrontService::new(
        SliceLink::new(&verdicts),
        ScriptedKeypad::new("+12345="),
        display,
        StepTimer::new(),
        sink.clone(),
        LockConfig::default(),
    );
    front.start_from(Screen::MainOptions);
    front.step().unwrap();
    assert_eq!(front.screen(), Screen::MainOptions);
    assert_eq!(front.faults().count(), 1);
    assert!(sink.contains(&LockEvent::FaultRecorded {
        role: Role::Front,
        count: 1,
    }));
}

#[test]
fn run_ends_when_keys_run_out() {
    let (mut front, _, _) = make_front(&[MATCH_BYTE], "12345=12345=");
    assert_eq!(front.run(), Error::InputClosed);
    assert_eq!(front.screen(), Screen::MainOptions);
}
