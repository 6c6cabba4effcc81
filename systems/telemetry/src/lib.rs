#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fire-and-forget design telemetry.
//!
//! Session, match and post-match milestones are rendered as colon separated
//! design event names and handed to a [`TelemetrySink`]. Round transitions are
//! derived from world events. Nothing here feeds back into the simulation.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tactics_core::{Event, GamePhase};
use tracing::info;

/// Whether a match is played against a remote opponent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Networked match.
    Online,
    /// Local match.
    #[default]
    Offline,
}

/// Outcome of a match from the local player's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    /// The local player won.
    Win,
    /// The local player lost.
    Lose,
    /// The match ended before a result was decided.
    Terminated,
}

/// Reason a match was terminated early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminateReason {
    /// A player quit.
    Quit,
    /// The network connection timed out.
    NetworkTimedOut,
    /// The opponent disconnected.
    Disconnected,
}

/// Choice made on the post-match screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostMatchAction {
    /// Play again with the same setup.
    Rematch,
    /// Go back to the loadout screen.
    ReturnToLoadout,
}

macro_rules! token_display {
    ($($ty:ty => { $($variant:ident => $token:literal),+ $(,)? })+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    match self {
                        $(Self::$variant => f.write_str($token),)+
                    }
                }
            }
        )+
    };
}

token_display! {
    Connectivity => { Online => "online", Offline => "offline" }
    MatchResult => { Win => "win", Lose => "lose", Terminated => "terminated" }
    TerminateReason => {
        Quit => "quit",
        NetworkTimedOut => "networktimedout",
        Disconnected => "disconnected",
    }
    PostMatchAction => { Rematch => "rematch", ReturnToLoadout => "returntoloadout" }
}

/// A single design event.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignEvent {
    /// Colon separated event name.
    pub name: String,
    /// Optional numeric payload, durations are in seconds.
    pub value: Option<f32>,
}

/// Destination of design events.
pub trait TelemetrySink {
    /// Records a design event.
    fn record(&mut self, event: DesignEvent);
}

/// Sink writing design events to the `telemetry` tracing target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&mut self, event: DesignEvent) {
        match event.value {
            Some(value) => info!(target: "telemetry", name = %event.name, value, "design_event"),
            None => info!(target: "telemetry", name = %event.name, "design_event"),
        }
    }
}

/// Sink collecting design events in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Vec<DesignEvent>,
}

impl RecordingSink {
    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[DesignEvent] {
        &self.events
    }

    /// Names of the events recorded so far.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|event| event.name.as_str()).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn record(&mut self, event: DesignEvent) {
        self.events.push(event);
    }
}

/// Forwards match milestones to a sink.
#[derive(Debug)]
pub struct Telemetry<S> {
    sink: S,
    enabled: bool,
    clock: Duration,
    match_started_at: Option<Duration>,
    round: u32,
}

impl<S: TelemetrySink> Telemetry<S> {
    /// Creates an enabled forwarder writing to `sink`.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            enabled: true,
            clock: Duration::ZERO,
            match_started_at: None,
            round: 0,
        }
    }

    /// Enables or disables forwarding.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Borrows the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Simulation time observed so far.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Marks the beginning of a play session.
    pub fn session_started(&mut self) {
        self.send("session:start".to_owned(), None);
    }

    /// Marks the end of a play session.
    pub fn session_ended(&mut self) {
        self.send("session:end".to_owned(), None);
    }

    /// Marks the beginning of a match and starts its duration clock.
    pub fn match_started(&mut self, connectivity: Connectivity) {
        self.match_started_at = Some(self.clock);
        self.round = 0;
        self.send(format!("match:start:{connectivity}"), None);
    }

    /// Marks a decided match; the value is the match duration in seconds.
    pub fn match_ended(&mut self, connectivity: Connectivity, result: MatchResult) {
        let duration = self.take_match_duration();
        self.send(format!("match:end:{connectivity}:{result}"), Some(duration));
    }

    /// Marks an aborted match; the value is the match duration in seconds.
    pub fn match_terminated(&mut self, connectivity: Connectivity, reason: TerminateReason) {
        let duration = self.take_match_duration();
        self.send(
            format!(
                "match:end:{connectivity}:{}:{reason}",
                MatchResult::Terminated
            ),
            Some(duration),
        );
    }

    /// Records the post-match choice and how long it took.
    pub fn post_match_action(
        &mut self,
        action: PostMatchAction,
        connectivity: Connectivity,
        result: MatchResult,
        decision_time: Duration,
    ) {
        self.send(
            format!("postmatch:{action}:{result}:{connectivity}"),
            Some(decision_time.as_secs_f32()),
        );
    }

    /// Consumes world events, tracking simulation time and round transitions.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.clock = self.clock.saturating_add(*dt),
                Event::PhaseChanged { phase } => {
                    if *phase == GamePhase::Action {
                        self.round = self.round.saturating_add(1);
                    }
                    let name = format!("round:{}:{}", self.round, phase.token());
                    self.send(name, None);
                }
                _ => {}
            }
        }
    }

    fn take_match_duration(&mut self) -> f32 {
        self.match_started_at
            .take()
            .map_or(0.0, |start| self.clock.saturating_sub(start).as_secs_f32())
    }

    fn send(&mut self, name: String, value: Option<f32>) {
        if self.enabled {
            self.sink.record(DesignEvent { name, value });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Connectivity, MatchResult, PostMatchAction, RecordingSink, Telemetry, TerminateReason,
    };
    use std::time::Duration;
    use tactics_core::{Event, GamePhase};

    #[test]
    fn tokens_are_lowercase_variant_names() {
        assert_eq!(TerminateReason::NetworkTimedOut.to_string(), "networktimedout");
        assert_eq!(PostMatchAction::ReturnToLoadout.to_string(), "returntoloadout");
        assert_eq!(Connectivity::Online.to_string(), "online");
    }

    #[test]
    fn match_end_reports_duration_from_simulation_time() {
        let mut telemetry = Telemetry::new(RecordingSink::default());
        telemetry.match_started(Connectivity::Offline);
        telemetry.handle(&[
            Event::TimeAdvanced {
                dt: Duration::from_secs(30),
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(500),
            },
        ]);
        telemetry.match_ended(Connectivity::Offline, MatchResult::Win);

        let events = telemetry.sink().events();
        assert_eq!(events[0].name, "match:start:offline");
        assert_eq!(events[1].name, "match:end:offline:win");
        assert_eq!(events[1].value, Some(30.5));
    }

    #[test]
    fn terminated_matches_carry_the_reason() {
        let mut telemetry = Telemetry::new(RecordingSink::default());
        telemetry.match_started(Connectivity::Online);
        telemetry.match_terminated(Connectivity::Online, TerminateReason::Disconnected);
        assert_eq!(
            telemetry.sink().names(),
            vec!["match:start:online", "match:end:online:terminated:disconnected"]
        );
    }

    #[test]
    fn rounds_are_counted_on_action_entry() {
        let mut telemetry = Telemetry::new(RecordingSink::default());
        telemetry.handle(&[
            Event::PhaseChanged {
                phase: GamePhase::Action,
            },
            Event::PhaseChanged {
                phase: GamePhase::Preparation,
            },
            Event::PhaseChanged {
                phase: GamePhase::Action,
            },
        ]);
        assert_eq!(
            telemetry.sink().names(),
            vec!["round:1:action", "round:1:preparation", "round:2:action"]
        );
    }

    #[test]
    fn disabled_telemetry_forwards_nothing() {
        let mut telemetry = Telemetry::new(RecordingSink::default());
        telemetry.set_enabled(false);
        telemetry.session_started();
        telemetry.post_match_action(
            PostMatchAction::Rematch,
            Connectivity::Offline,
            MatchResult::Lose,
            Duration::from_secs(3),
        );
        assert!(telemetry.sink().events().is_empty());
    }
}
