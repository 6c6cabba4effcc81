//! Extension point invoked when a character reaches a waypoint carrying an action.

use std::fmt;

use tactics_core::{ActionId, CharacterId};
use tracing::info;

/// Outcome of triggering an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionStatus {
    /// The action resolved within the triggering call.
    Finished,
    /// The action continues; completion is reported with
    /// `Command::ReportActionFinished`.
    InProgress,
}

/// Strategy executing the concrete effect of waypoint actions.
pub trait ActionHandler: fmt::Debug {
    /// Invokes `action` on behalf of `character`.
    fn trigger(&mut self, character: CharacterId, action: &ActionId) -> ActionStatus;
}

/// Default handler that records the invocation and finishes immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingActionHandler;

impl ActionHandler for LoggingActionHandler {
    fn trigger(&mut self, character: CharacterId, action: &ActionId) -> ActionStatus {
        info!(%character, %action, "action_triggered");
        ActionStatus::Finished
    }
}
