use std::time::Duration;

use tactics_core::{Event, GamePhase};
use tactics_system_telemetry::{
    Connectivity, MatchResult, PostMatchAction, RecordingSink, Telemetry,
};

#[test]
fn full_session_is_forwarded_in_order() {
    let mut telemetry = Telemetry::new(RecordingSink::default());
    telemetry.session_started();
    telemetry.match_started(Connectivity::Online);
    telemetry.handle(&[
        Event::PhaseChanged {
            phase: GamePhase::Action,
        },
        Event::TimeAdvanced {
            dt: Duration::from_secs(12),
        },
        Event::PhaseChanged {
            phase: GamePhase::Preparation,
        },
    ]);
    telemetry.match_ended(Connectivity::Online, MatchResult::Lose);
    telemetry.post_match_action(
        PostMatchAction::ReturnToLoadout,
        Connectivity::Online,
        MatchResult::Lose,
        Duration::from_millis(2_500),
    );
    telemetry.session_ended();

    assert_eq!(
        telemetry.sink().names(),
        vec![
            "session:start",
            "match:start:online",
            "round:1:action",
            "round:1:preparation",
            "match:end:online:lose",
            "postmatch:returntoloadout:lose:online",
            "session:end",
        ]
    );

    let values: Vec<Option<f32>> = telemetry
        .sink()
        .events()
        .iter()
        .map(|event| event.value)
        .collect();
    assert_eq!(values[4], Some(12.0));
    assert_eq!(values[5], Some(2.5));
}

#[test]
fn ending_without_a_start_reports_zero_duration() {
    let mut telemetry = Telemetry::new(RecordingSink::default());
    telemetry.match_ended(Connectivity::Offline, MatchResult::Win);
    assert_eq!(telemetry.sink().events()[0].value, Some(0.0));
}
