mod catalog;
mod level;

pub use catalog::{AssetCatalog, ContentCompileError, ContentErrorCode, SourceLocation};
pub use level::{
    LevelDescription, LevelError, LevelLine, LevelWarning, LevelWarningKind, PlayerConfig,
    SpawnDirective,
};
