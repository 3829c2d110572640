use std::path::PathBuf;
use std::rc::Rc;

use engine::sim::{
    physics, Animation, AnimationBinding, BoundingBox, Gravity, Input, Lifespan, LocomotionState,
    Pose, Transform,
};
use engine::{
    Action, ActionName, ActionPhase, AssetCatalog, DebugToggles, EntityId, EntityManager,
    EntityTag, LevelDescription, LevelFactory, MenuView, PlayerConfig, RenderSnapshot, Scene,
    SceneCommand, SceneKey, SceneLoadError, SpawnDirective, Vec2,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

const MENU_TITLE: &str = "Not Mario";
const BUILTIN_ANIMATION_NAMES: [&str; 7] =
    ["Stand", "Run", "Air", "Buster", "Explosion", "Question2", "Coin"];

include!("types.rs");
include!("spawn.rs");
include!("systems.rs");
include!("scene_impl.rs");
include!("menu.rs");

/// Builds the menu over `levels` and a factory that loads `levels[index]` into a
/// fresh play scene on demand.
pub(crate) fn build_scenes(
    catalog: Rc<AssetCatalog>,
    levels: Vec<PathBuf>,
    config: PlayConfig,
) -> (Box<dyn Scene>, LevelFactory) {
    let names = (1..=levels.len()).map(level_display_name).collect::<Vec<_>>();
    let menu = Box::new(MenuScene::new(names));
    let level_factory: LevelFactory =
        Box::new(move |index: usize| load_play_scene(&catalog, &levels, &config, index));
    (menu, level_factory)
}

fn load_play_scene(
    catalog: &Rc<AssetCatalog>,
    levels: &[PathBuf],
    config: &PlayConfig,
    index: usize,
) -> Result<Box<dyn Scene>, SceneLoadError> {
    let path = levels.get(index).ok_or(SceneLoadError::UnknownLevel {
        index,
        available: levels.len(),
    })?;
    let mut level = LevelDescription::load(path)?;
    level.retain_known_animations(|name| catalog.has_animation(name));
    let scene = PlayScene::new(index, Rc::clone(catalog), level, config.clone())?;
    Ok(Box::new(scene))
}

fn level_display_name(number: usize) -> String {
    format!("Level  {number}")
}
