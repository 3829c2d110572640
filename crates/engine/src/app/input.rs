use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionName {
    Jump,
    Left,
    Right,
    Shoot,
    Pause,
    Quit,
    ToggleTexture,
    ToggleCollision,
    ToggleGrid,
    Up,
    Down,
    Play,
}

impl ActionName {
    pub const ALL: [ActionName; 12] = [
        ActionName::Jump,
        ActionName::Left,
        ActionName::Right,
        ActionName::Shoot,
        ActionName::Pause,
        ActionName::Quit,
        ActionName::ToggleTexture,
        ActionName::ToggleCollision,
        ActionName::ToggleGrid,
        ActionName::Up,
        ActionName::Down,
        ActionName::Play,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jump => "JUMP",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Shoot => "SHOOT",
            Self::Pause => "PAUSE",
            Self::Quit => "QUIT",
            Self::ToggleTexture => "TOGGLE_TEXTURE",
            Self::ToggleCollision => "TOGGLE_COLLISION",
            Self::ToggleGrid => "TOGGLE_GRID",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Play => "PLAY",
        }
    }
}

impl FromStr for ActionName {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == raw)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionPhase {
    Start,
    End,
}

impl ActionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
        }
    }
}

impl FromStr for ActionPhase {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "START" => Ok(Self::Start),
            "END" => Ok(Self::End),
            _ => Err(()),
        }
    }
}

/// A discrete, already-translated input event delivered to the active scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    pub name: ActionName,
    pub phase: ActionPhase,
}

impl Action {
    pub fn start(name: ActionName) -> Self {
        Self {
            name,
            phase: ActionPhase::Start,
        }
    }

    pub fn end(name: ActionName) -> Self {
        Self {
            name,
            phase: ActionPhase::End,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name.as_str(), self.phase.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input script line {line}: expected '<tick> <ACTION> <START|END>', got '{text}'")]
    Malformed { line: usize, text: String },
    #[error("input script line {line}: invalid tick '{value}'")]
    InvalidTick { line: usize, value: String },
    #[error("input script line {line}: unknown action '{value}'")]
    UnknownAction { line: usize, value: String },
    #[error("input script line {line}: unknown phase '{value}' (expected START or END)")]
    UnknownPhase { line: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScriptEntry {
    tick: u64,
    action: Action,
}

/// Tick-stamped action stream, one `<tick> <ACTION> <START|END>` per line.
///
/// Entries are kept sorted by tick; entries sharing a tick keep file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    entries: Vec<ScriptEntry>,
}

impl InputScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ScriptError> {
        let mut entries = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let line_number = index + 1;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let fields = text.split_whitespace().collect::<Vec<_>>();
            let [tick, name, phase] = fields.as_slice() else {
                return Err(ScriptError::Malformed {
                    line: line_number,
                    text: text.to_string(),
                });
            };
            let tick = tick.parse::<u64>().map_err(|_| ScriptError::InvalidTick {
                line: line_number,
                value: (*tick).to_string(),
            })?;
            let name = name
                .parse::<ActionName>()
                .map_err(|_| ScriptError::UnknownAction {
                    line: line_number,
                    value: (*name).to_string(),
                })?;
            let phase = phase
                .parse::<ActionPhase>()
                .map_err(|_| ScriptError::UnknownPhase {
                    line: line_number,
                    value: (*phase).to_string(),
                })?;
            entries.push(ScriptEntry {
                tick,
                action: Action { name, phase },
            });
        }

        entries.sort_by_key(|entry| entry.tick);
        Ok(Self { entries })
    }

    pub fn from_actions(actions: impl IntoIterator<Item = (u64, Action)>) -> Self {
        let mut entries = actions
            .into_iter()
            .map(|(tick, action)| ScriptEntry { tick, action })
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.tick);
        Self { entries }
    }

    /// Actions scheduled for `tick`, in script order.
    pub fn actions_at(&self, tick: u64) -> impl Iterator<Item = Action> + '_ {
        let start = self.entries.partition_point(|entry| entry.tick < tick);
        self.entries[start..]
            .iter()
            .take_while(move |entry| entry.tick == tick)
            .map(|entry| entry.action)
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.entries.last().map(|entry| entry.tick)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
