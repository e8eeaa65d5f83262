//! BackService against scripted request bytes.

use crate::mock_hw::{ActuatorCall, MockActuator, RecordingSink};

use doorlock::Error;
use doorlock::adapters::eeprom::MemoryEeprom;
use doorlock::adapters::timer::StepTimer;
use doorlock::app::events::{LockEvent, Role};
use doorlock::app::ports::CredentialStore;
use doorlock::app::service::BackService;
use doorlock::config::LockConfig;
use doorlock::error::LinkError;
use doorlock::fsm::back::BackState;
use doorlock::link::SliceLink;
use doorlock::protocol::{MATCH_BYTE, MISMATCH_BYTE};
use doorlock::sequencer::ActuationPhase;

type Back<'a> = BackService<SliceLink<'a>, MemoryEeprom, StepTimer, MockActuator, RecordingSink>;

const BASE: u16 = 0x0311;

fn make_back(input: &[u8], store: MemoryEeprom) -> (Back<'_>, MockActuator, RecordingSink) {
    let actuator = MockActuator::default();
    let sink = RecordingSink::default();
    let mut back = BackService::new(
        SliceLink::new(input),
        store,
        StepTimer::new(),
        actuator.clone(),
        sink.clone(),
        LockConfig::default(),
    )
    .unwrap();
    back.start();
    actuator.calls.clear();
    (back, actuator, sink)
}

/// Step until one request has been fully handled.
fn handle(back: &mut Back<'_>) {
    back.step().unwrap();
    while back.state() != BackState::AwaitingCommand {
        back.step().unwrap();
    }
}

fn stored(back: &Back<'_>) -> Vec<u8> {
    (BASE..BASE + 5)
        .map(|a| back.context().credentials.store().peek(a))
        .collect()
}

#[test]
fn start_parks_outputs() {
    let actuator = MockActuator::default();
    let mut back = BackService::new(
        SliceLink::new(&[]),
        MemoryEeprom::new(),
        StepTimer::new(),
        actuator.clone(),
        RecordingSink::default(),
        LockConfig::default(),
    )
    .unwrap();
    back.start();
    assert_eq!(actuator.calls.snapshot(), vec![ActuatorCall::Stop, ActuatorCall::AlarmOff]);
    assert_eq!(back.state(), BackState::AwaitingCommand);
}

#[test]
fn create_then_open_actuates_for_33_ticks() {
    let input = [
        0x10, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5, //
        0x11, 1, 2, 3, 4, 5,
    ];
    let (mut back, actuator, sink) = make_back(&input, MemoryEeprom::new());

    handle(&mut back);
    assert_eq!(stored(&back), vec![1, 2, 3, 4, 5]);
    handle(&mut back);

    assert_eq!(back.context().link.sent, vec![MATCH_BYTE, MATCH_BYTE]);
    assert_eq!(back.context().timer.delivered(), 33);
    assert_eq!(
        actuator.calls.snapshot(),
        vec![
            ActuatorCall::Forward,
            ActuatorCall::Stop,
            ActuatorCall::Reverse,
            ActuatorCall::Stop,
        ]
    );
    let phases: Vec<_> = sink
        .events
        .snapshot()
        .into_iter()
        .filter_map(|e| match e {
            LockEvent::Actuation(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            ActuationPhase::Unlocking,
            ActuationPhase::HoldOpen,
            ActuationPhase::Locking,
            ActuationPhase::Idle,
        ]
    );
}

#[test]
fn three_wrong_opens_raise_alarm_then_count_restarts() {
    let mut store = MemoryEeprom::new();
    for (a, b) in (BASE..).zip([1, 2, 3, 4, 5]) {
        store.write_byte(a, b).unwrap();
    }
    let input = [
        0x11, 0, 0, 0, 0, 0, //
        0x11, 0, 0, 0, 0, 1, //
        0x11, 0, 0, 0, 0, 2, //
        0x11, 0, 0, 0, 0, 3,
    ];
    let (mut back, actuator, sink) = make_back(&input, store);

    handle(&mut back);
    handle(&mut back);
    assert_eq!(back.faults().count(), 2);
    handle(&mut back);
    assert_eq!(back.faults().count(), 0);
    assert_eq!(back.context().timer.delivered(), 60);
    assert_eq!(
        actuator.calls.snapshot(),
        vec![ActuatorCall::AlarmOn, ActuatorCall::AlarmOff]
    );
    assert!(sink.contains(&LockEvent::StateChanged {
        role: Role::Back,
        from: "Alarm",
        to: "AwaitingCommand",
    }));

    handle(&mut back);
    assert_eq!(back.faults().count(), 1);
    assert_eq!(back.context().link.sent, vec![MISMATCH_BYTE; 4]);
}

#[test]
fn store_read_failure_never_opens() {
    let mut store = MemoryEeprom::new();
    for (a, b) in (BASE..).zip([1, 2, 3, 4, 5]) {
        store.write_byte(a, b).unwrap();
    }
    store.fail_reads_at(BASE);
    let input = [0x11, 1, 2, 3, 4, 5];
    let (mut back, actuator, _) = make_back(&input, store);

    handle(&mut back);
    assert_eq!(back.context().link.sent, vec![MISMATCH_BYTE]);
    assert!(actuator.calls.snapshot().is_empty());
    assert_eq!(back.faults().count(), 1);
}

#[test]
fn change_with_correct_attempt_persists_it_and_clears() {
    let input = [
        0x10, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5, //
        0x11, 9, 9, 9, 9, 9, //
        0x12, 1, 2, 3, 4, 5,
    ];
    let (mut back, actuator, sink) = make_back(&input, MemoryEeprom::new());

    handle(&mut back);
    handle(&mut back);
    assert_eq!(back.faults().count(), 1);
    handle(&mut back);

    assert_eq!(back.context().link.sent, vec![MATCH_BYTE, MISMATCH_BYTE, MATCH_BYTE]);
    assert_eq!(back.faults().count(), 0);
    assert_eq!(stored(&back), vec![1, 2, 3, 4, 5]);
    assert!(actuator.calls.snapshot().is_empty());
    assert_eq!(sink.count(|e| *e == LockEvent::CredentialStored), 2);
}

#[test]
fn unknown_bytes_count_toward_alarm_without_reply() {
    let input = [0x00, 0xAA, 0x20];
    let (mut back, actuator, sink) = make_back(&input, MemoryEeprom::new());

    back.step().unwrap();
    back.step().unwrap();
    assert_eq!(back.faults().count(), 2);
    back.step().unwrap();
    assert_eq!(back.state(), BackState::Alarm);
    back.step().unwrap();
    assert_eq!(back.state(), BackState::AwaitingCommand);

    assert!(back.context().link.sent.is_empty());
    assert_eq!(sink.count(|e| matches!(e, LockEvent::UnknownCommand(_))), 3);
    assert_eq!(
        actuator.calls.snapshot(),
        vec![ActuatorCall::AlarmOn, ActuatorCall::AlarmOff]
    );
}

#[test]
fn run_stops_when_link_closes() {
    let (mut back, _, _) = make_back(&[0x11, 1], MemoryEeprom::new());
    assert_eq!(back.run(), Error::Link(LinkError::Closed));
    assert_eq!(back.state(), BackState::AwaitingCommand);
}

#[test]
fn credential_region_past_address_space_is_refused() {
    let input = [
        0x10, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5, //
        0x11, 0, 0, 0, 0, 0,
    ];
    for base in [0x07FC, 0xFFFD] {
        let built = BackService::new(
            SliceLink::new(&input),
            MemoryEeprom::new(),
            StepTimer::new(),
            MockActuator::default(),
            RecordingSink::default(),
            LockConfig {
                credential_base_addr: base,
                ..LockConfig::default()
            },
        );
        assert!(matches!(built, Err(Error::Config(_))), "base 0x{base:04X}");
    }
}
