//! Both controllers over an in-memory link, each on its own thread.
//!
//! The front runs a key script to exhaustion, then drops its end of the
//! link, which ends the back's loop.  Assertions run after both stopped.

use std::thread;

use crate::mock_hw::{ActuatorCall, MockActuator, MockDisplay, RecordingSink};

use doorlock::Error;
use doorlock::adapters::console::ScriptedKeypad;
use doorlock::adapters::eeprom::MemoryEeprom;
use doorlock::adapters::timer::StepTimer;
use doorlock::app::events::{LockEvent, Role};
use doorlock::app::ports::{CredentialStore, Prompt};
use doorlock::app::service::{BackService, FrontService};
use doorlock::config::LockConfig;
use doorlock::credential::Verdict;
use doorlock::error::LinkError;
use doorlock::fsm::front::Screen;
use doorlock::link::MemoryLink;
use doorlock::protocol::Command;

const BASE: u16 = 0x0311;

type Front = FrontService<MemoryLink, ScriptedKeypad, MockDisplay, StepTimer, RecordingSink>;
type Back = BackService<MemoryLink, MemoryEeprom, StepTimer, MockActuator, RecordingSink>;

struct Outcome {
    front: Front,
    back: Back,
    display: MockDisplay,
    front_events: RecordingSink,
    back_events: RecordingSink,
    actuator: MockActuator,
}

fn run_pair(keys: &str, store: MemoryEeprom, first_screen: Screen) -> Outcome {
    let (front_link, back_link) = MemoryLink::pair();
    let actuator = MockActuator::default();
    let back_events = RecordingSink::default();

    let back_thread = {
        let actuator = actuator.clone();
        let sink = back_events.clone();
        thread::spawn(move || {
            let mut back = BackService::new(
                back_link,
                store,
                StepTimer::new(),
                actuator,
                sink,
                LockConfig::default(),
            )
            .unwrap();
            back.start();
            let end = back.run();
            (back, end)
        })
    };

    let display = MockDisplay::default();
    let front_events = RecordingSink::default();
    let mut front = FrontService::new(
        front_link,
        ScriptedKeypad::new(keys),
        display.clone(),
        StepTimer::new(),
        front_events.clone(),
        LockConfig::default(),
    );
    front.start_from(first_screen);
    assert_eq!(front.run(), Error::InputClosed);

    // Closing the front's end releases the back.
    let front = close_link(front);
    let (back, end) = back_thread.join().expect("back thread panicked");
    assert_eq!(end, Error::Link(LinkError::Closed));

    Outcome {
        front,
        back,
        display,
        front_events,
        back_events,
        actuator,
    }
}

/// Swap the front's link for a dead one so the back sees the peer leave.
fn close_link(mut front: Front) -> Front {
    let (dead, _) = MemoryLink::pair();
    drop(std::mem::replace(&mut front.context_mut().link, dead));
    front
}

fn provisioned(secret: [u8; 5]) -> MemoryEeprom {
    let mut store = MemoryEeprom::new();
    for (addr, b) in (BASE..).zip(secret) {
        store.write_byte(addr, b).unwrap();
    }
    store
}

fn stored(back: &Back) -> Vec<u8> {
    (BASE..BASE + 5)
        .map(|a| back.context().credentials.store().peek(a))
        .collect()
}

#[test]
fn create_then_open_runs_one_actuation() {
    let o = run_pair("12345=12345=+12345=", MemoryEeprom::new(), Screen::CreatePassword);

    assert_eq!(stored(&o.back), vec![1, 2, 3, 4, 5]);
    assert_eq!(o.back.context().timer.delivered(), 33);
    assert_eq!(o.front.context().timer.delivered(), 33);
    assert_eq!(
        o.actuator.calls.snapshot(),
        vec![
            ActuatorCall::Stop,
            ActuatorCall::AlarmOff,
            ActuatorCall::Forward,
            ActuatorCall::Stop,
            ActuatorCall::Reverse,
            ActuatorCall::Stop,
        ]
    );
    assert!(o.front_events.contains(&LockEvent::VerdictReceived {
        command: Command::OpenDoor,
        verdict: Verdict::Match,
    }));
    assert!(o.display.prompts().contains(&Prompt::DoorUnlocked));
    assert_eq!(o.front.screen(), Screen::MainOptions);
}

#[test]
fn three_wrong_opens_escalate_on_both_sides() {
    let o = run_pair(
        "12345=12345=+00000=+00000=+00000=+00000=",
        MemoryEeprom::new(),
        Screen::CreatePassword,
    );

    // Both sides escalated once and started counting again from 1.
    assert_eq!(o.back_events.count(|e| *e == LockEvent::AlarmRaised), 1);
    assert_eq!(o.back_events.count(|e| *e == LockEvent::AlarmCleared), 1);
    assert_eq!(o.front_events.count(|e| *e == LockEvent::LockoutStarted), 1);
    assert_eq!(o.back.context().timer.delivered(), 60);
    assert_eq!(o.front.context().timer.delivered(), 60);
    assert_eq!(o.back.faults().count(), 1);
    assert_eq!(o.front.faults().count(), 1);
    assert!(!o.actuator.calls.snapshot().contains(&ActuatorCall::Forward));
    assert_eq!(
        o.back_events.count(|e| matches!(e, LockEvent::FaultRecorded { role: Role::Back, .. })),
        4
    );
}

#[test]
fn unreadable_store_fails_closed() {
    let mut store = provisioned([1, 2, 3, 4, 5]);
    store.fail_reads_at(BASE + 2);
    let o = run_pair("+12345=", store, Screen::MainOptions);

    assert!(o.front_events.contains(&LockEvent::VerdictReceived {
        command: Command::OpenDoor,
        verdict: Verdict::Mismatch,
    }));
    assert!(!o.actuator.calls.snapshot().contains(&ActuatorCall::Forward));
    assert_eq!(o.front.faults().count(), 1);
}

#[test]
fn change_keeps_attempt_then_create_sets_new_credential() {
    let o = run_pair(
        "+99999=-12345=67890=67890=+67890=+12345=",
        provisioned([1, 2, 3, 4, 5]),
        Screen::MainOptions,
    );

    // Wrong open, then a correct change clears both counters.
    assert!(o.back_events.contains(&LockEvent::VerdictSent {
        command: Command::ChangePassword,
        verdict: Verdict::Match,
    }));
    assert_eq!(stored(&o.back), vec![6, 7, 8, 9, 0]);
    assert_eq!(o.back_events.count(|e| *e == LockEvent::CredentialStored), 2);
    assert_eq!(
        o.actuator
            .calls
            .snapshot()
            .iter()
            .filter(|c| **c == ActuatorCall::Forward)
            .count(),
        1
    );
    // Only the final attempt with the old secret is counted.
    assert_eq!(o.back.faults().count(), 1);
    assert_eq!(o.front.faults().count(), 1);
}
