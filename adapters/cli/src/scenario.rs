//! TOML match configuration and scripted scenarios.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use tactics_system_drag::DragConfig;
use tactics_system_telemetry::{Connectivity, MatchResult};
use tactics_world::config::WorldConfig;

/// Tunables loaded from `--config`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct MatchConfig {
    /// Simulation tunables.
    pub(crate) world: WorldConfig,
    /// Pointer gesture tunables.
    pub(crate) drag: DragConfig,
}

impl MatchConfig {
    /// Reads and validates a configuration file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .world
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}

/// Scripted match played by the command-line adapter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct Scenario {
    /// Match level settings.
    #[serde(default, rename = "match")]
    pub(crate) settings: MatchSettings,
    /// Characters joining the match, in spawn order.
    pub(crate) characters: Vec<CharacterPlan>,
}

impl Scenario {
    /// Reads a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(raw)?;
        anyhow::ensure!(
            !scenario.characters.is_empty(),
            "scenario must declare at least one character"
        );
        Ok(scenario)
    }
}

/// Match level settings of a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct MatchSettings {
    /// Connectivity reported to telemetry.
    pub(crate) connectivity: Connectivity,
    /// Result reported when the round resolves.
    pub(crate) result: MatchResult,
    /// Height of the ground plane pointer rays hit.
    pub(crate) ground_height: f32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Offline,
            result: MatchResult::Win,
            ground_height: 0.0,
        }
    }
}

/// A character and the input it performs during preparation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct CharacterPlan {
    /// Spawn position.
    pub(crate) position: Vec3,
    /// Initial regular energy.
    #[serde(default)]
    pub(crate) energy: u32,
    /// Initial buffer energy.
    #[serde(default)]
    pub(crate) buffer_energy: u32,
    /// Input steps, applied in order.
    #[serde(default)]
    pub(crate) plan: Vec<PlanStep>,
}

/// One scripted input step. Screen coordinates map onto the ground plane.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum PlanStep {
    /// Click on the ground to request a movement waypoint.
    Click {
        /// Screen position of the click.
        at: Vec2,
    },
    /// Drag from `from` to `to`; a card id turns the drag into a card drag.
    Drag {
        /// Screen position where the gesture starts.
        from: Vec2,
        /// Screen position where the gesture ends.
        to: Vec2,
        /// Card carried by the drag.
        #[serde(default)]
        card: Option<String>,
    },
    /// Cancel the most recent waypoint.
    Cancel,
    /// Give the card waypoint at `index` a different card.
    Swap {
        /// Path index of the card waypoint.
        index: usize,
        /// Card the waypoint carries from now on.
        card: String,
    },
}
