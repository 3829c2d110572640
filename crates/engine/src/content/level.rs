use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

/// Player parameters carried by a level's `Player` line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub grid_x: f32,
    pub grid_y: f32,
    pub collision_width: f32,
    pub collision_height: f32,
    pub speed: f32,
    pub jump: f32,
    pub max_speed: f32,
    pub gravity: f32,
    pub weapon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnDirective {
    Tile {
        animation: String,
        grid_x: i32,
        grid_y: i32,
    },
    Dec {
        animation: String,
        grid_x: i32,
        grid_y: i32,
    },
    Player(PlayerConfig),
    Enemy {
        animation: String,
        grid_x: i32,
        grid_y: i32,
        speed: f32,
    },
}

impl SpawnDirective {
    pub fn animation_name(&self) -> Option<&str> {
        match self {
            Self::Tile { animation, .. }
            | Self::Dec { animation, .. }
            | Self::Enemy { animation, .. } => Some(animation),
            Self::Player(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelWarningKind {
    UnknownKeyword,
    WrongFieldCount,
    InvalidNumber,
    UnknownAnimation,
}

/// A skipped level line. Loading carries on with the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelWarning {
    pub line: usize,
    pub kind: LevelWarningKind,
    pub message: String,
}

impl fmt::Display for LevelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelLine {
    pub line: usize,
    pub directive: SpawnDirective,
}

/// Ordered spawn directives of one level plus the lines that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelDescription {
    pub lines: Vec<LevelLine>,
    pub warnings: Vec<LevelWarning>,
}

impl LevelDescription {
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw))
    }

    pub fn parse(raw: &str) -> Self {
        let mut description = Self::default();
        for (index, text) in raw.lines().enumerate() {
            let line = index + 1;
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            match parse_line(text) {
                Ok(directive) => description.lines.push(LevelLine { line, directive }),
                Err((kind, message)) => description.push_warning(line, kind, message),
            }
        }
        description
    }

    /// Moves every directive whose animation `is_known` rejects into the warnings.
    pub fn retain_known_animations(&mut self, is_known: impl Fn(&str) -> bool) {
        let mut kept = Vec::with_capacity(self.lines.len());
        for entry in std::mem::take(&mut self.lines) {
            match entry.directive.animation_name() {
                Some(name) if !is_known(name) => {
                    let message = format!("unknown animation '{name}'");
                    self.push_warning(entry.line, LevelWarningKind::UnknownAnimation, message);
                }
                _ => kept.push(entry),
            }
        }
        self.lines = kept;
        self.warnings.sort_by_key(|warning| warning.line);
    }

    pub fn directives(&self) -> impl Iterator<Item = &SpawnDirective> {
        self.lines.iter().map(|entry| &entry.directive)
    }

    /// The last `Player` line wins when a level declares several.
    pub fn player(&self) -> Option<&PlayerConfig> {
        self.directives()
            .filter_map(|directive| match directive {
                SpawnDirective::Player(config) => Some(config),
                _ => None,
            })
            .last()
    }

    fn push_warning(&mut self, line: usize, kind: LevelWarningKind, message: String) {
        warn!(line, kind = ?kind, message = %message, "level_warning");
        self.warnings.push(LevelWarning {
            line,
            kind,
            message,
        });
    }
}

type LineError = (LevelWarningKind, String);

fn parse_line(text: &str) -> Result<SpawnDirective, LineError> {
    let fields = text.split_whitespace().collect::<Vec<_>>();
    let (keyword, args) = fields
        .split_first()
        .map(|(keyword, args)| (*keyword, args))
        .unwrap_or(("", &[]));

    match keyword {
        "Tile" | "Dec" => {
            let [animation, grid_x, grid_y] = expect_fields::<3>(keyword, args)?;
            let animation = animation.to_string();
            let grid_x = number(keyword, "gridX", grid_x)?;
            let grid_y = number(keyword, "gridY", grid_y)?;
            Ok(if keyword == "Tile" {
                SpawnDirective::Tile {
                    animation,
                    grid_x,
                    grid_y,
                }
            } else {
                SpawnDirective::Dec {
                    animation,
                    grid_x,
                    grid_y,
                }
            })
        }
        "Player" => {
            let [gx, gy, cw, ch, speed, jump, max_speed, gravity, weapon] =
                expect_fields::<9>(keyword, args)?;
            Ok(SpawnDirective::Player(PlayerConfig {
                grid_x: number(keyword, "gridX", gx)?,
                grid_y: number(keyword, "gridY", gy)?,
                collision_width: number(keyword, "collisionWidth", cw)?,
                collision_height: number(keyword, "collisionHeight", ch)?,
                speed: number(keyword, "speed", speed)?,
                jump: number(keyword, "jump", jump)?,
                max_speed: number(keyword, "maxSpeed", max_speed)?,
                gravity: number(keyword, "gravity", gravity)?,
                weapon: weapon.to_string(),
            }))
        }
        "Enemy" => {
            let [animation, grid_x, grid_y, speed] = expect_fields::<4>(keyword, args)?;
            Ok(SpawnDirective::Enemy {
                animation: animation.to_string(),
                grid_x: number(keyword, "gridX", grid_x)?,
                grid_y: number(keyword, "gridY", grid_y)?,
                speed: number(keyword, "speed", speed)?,
            })
        }
        other => Err((
            LevelWarningKind::UnknownKeyword,
            format!("unknown entity keyword '{other}'"),
        )),
    }
}

fn expect_fields<'a, const N: usize>(
    keyword: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], LineError> {
    <[&str; N]>::try_from(args).map_err(|_| {
        (
            LevelWarningKind::WrongFieldCount,
            format!("{keyword} expects {N} fields, found {}", args.len()),
        )
    })
}

fn number<T: FromStr>(keyword: &str, field: &str, raw: &str) -> Result<T, LineError> {
    raw.parse::<T>().map_err(|_| {
        (
            LevelWarningKind::InvalidNumber,
            format!("{keyword} field {field} has invalid value '{raw}'"),
        )
    })
}
