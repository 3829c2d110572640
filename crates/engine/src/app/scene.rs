use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sim::{EntityManager, EntitySnapshot};

use super::input::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SceneKey {
    Menu,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Replace the play scene with a freshly built level.
    StartLevel(usize),
    /// Leave the active scene. Play returns to the menu; the menu quits.
    EndScene,
    Quit,
}

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("no level at index {index} ({available} available)")]
    UnknownLevel { index: usize, available: usize },
    #[error("animation '{name}' is not defined in the asset catalog")]
    MissingAnimation { name: String },
    #[error(transparent)]
    Level(#[from] crate::content::LevelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebugToggles {
    pub draw_textures: bool,
    pub draw_collision: bool,
    pub draw_grid: bool,
}

impl Default for DebugToggles {
    fn default() -> Self {
        Self {
            draw_textures: true,
            draw_collision: false,
            draw_grid: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuView {
    pub title: String,
    pub items: Vec<String>,
    pub selected: usize,
}

/// Everything a presentation layer needs to draw one frame. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub scene: SceneKey,
    pub tick: u64,
    pub paused: bool,
    pub lives: Option<u32>,
    pub toggles: DebugToggles,
    pub view_center_x: f32,
    pub menu: Option<MenuView>,
    pub entities: Vec<EntitySnapshot>,
}

impl RenderSnapshot {
    pub fn empty(scene: SceneKey) -> Self {
        Self {
            scene,
            tick: 0,
            paused: false,
            lives: None,
            toggles: DebugToggles::default(),
            view_center_x: 0.0,
            menu: None,
            entities: Vec::new(),
        }
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut EntityManager);
    fn do_action(&mut self, action: Action, world: &mut EntityManager) -> SceneCommand;
    fn update(&mut self, world: &mut EntityManager) -> SceneCommand;
    fn render(&self, world: &EntityManager) -> RenderSnapshot;
    fn unload(&mut self, world: &mut EntityManager);
    fn debug_title(&self, _world: &EntityManager) -> Option<String> {
        None
    }
}

pub type LevelFactory = Box<dyn FnMut(usize) -> Result<Box<dyn Scene>, SceneLoadError>>;

struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: EntityManager,
    is_loaded: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: EntityManager::default(),
            is_loaded: false,
        }
    }

    fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        let (scene, world) = (&mut self.scene, &mut self.world);
        scene.load(world);
        world.update();
        self.is_loaded = true;
    }

    fn unload(&mut self) {
        if self.is_loaded {
            let (scene, world) = (&mut self.scene, &mut self.world);
            scene.unload(world);
            world.clear();
            self.is_loaded = false;
        }
    }
}

/// Scene-selection shell: owns the menu and, while a level runs, the play scene.
pub struct SceneMachine {
    menu: SceneRuntime,
    play: Option<SceneRuntime>,
    level_factory: LevelFactory,
    active_scene: SceneKey,
    running: bool,
}

impl SceneMachine {
    pub fn new(menu: Box<dyn Scene>, level_factory: LevelFactory) -> Self {
        Self {
            menu: SceneRuntime::new(menu),
            play: None,
            level_factory,
            active_scene: SceneKey::Menu,
            running: true,
        }
    }

    pub fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn load_active(&mut self) {
        self.active_runtime_mut().load();
    }

    /// Returns true when the action switched scenes.
    pub fn handle_action(&mut self, action: Action) -> bool {
        if !self.running {
            return false;
        }
        let runtime = self.active_runtime_mut();
        let command = runtime.scene.do_action(action, &mut runtime.world);
        self.apply_command(command)
    }

    pub fn update_active(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let runtime = self.active_runtime_mut();
        let command = runtime.scene.update(&mut runtime.world);
        self.apply_command(command)
    }

    pub fn render_active(&self) -> RenderSnapshot {
        let runtime = self.active_runtime_ref();
        runtime.scene.render(&runtime.world)
    }

    pub fn active_world(&self) -> &EntityManager {
        &self.active_runtime_ref().world
    }

    #[cfg(test)]
    pub(crate) fn active_world_mut(&mut self) -> &mut EntityManager {
        &mut self.active_runtime_mut().world
    }

    pub fn debug_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.debug_title(&runtime.world)
    }

    pub fn apply_command(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::StartLevel(index) => self.start_level(index),
            SceneCommand::EndScene => match self.active_scene {
                SceneKey::Play => self.return_to_menu(),
                SceneKey::Menu => {
                    self.stop("menu_ended");
                    false
                }
            },
            SceneCommand::Quit => {
                self.stop("quit");
                false
            }
        }
    }

    pub fn shutdown_all(&mut self) {
        if let Some(mut play) = self.play.take() {
            play.unload();
        }
        self.menu.unload();
        self.running = false;
    }

    fn start_level(&mut self, index: usize) -> bool {
        let scene = match (self.level_factory)(index) {
            Ok(scene) => scene,
            Err(error) => {
                warn!(level = index, error = %error, "level_start_failed");
                return false;
            }
        };

        if let Some(mut previous) = self.play.take() {
            previous.unload();
        }
        let mut runtime = SceneRuntime::new(scene);
        runtime.load();
        self.play = Some(runtime);
        self.active_scene = SceneKey::Play;
        info!(
            scene = ?self.active_scene,
            level = index,
            entity_count = self.active_world().entity_count(),
            "scene_switched"
        );
        true
    }

    fn return_to_menu(&mut self) -> bool {
        if let Some(mut play) = self.play.take() {
            play.unload();
        }
        self.menu.unload();
        self.menu.load();
        self.active_scene = SceneKey::Menu;
        info!(scene = ?self.active_scene, "scene_switched");
        true
    }

    fn stop(&mut self, reason: &'static str) {
        if self.running {
            debug!(reason, scene = ?self.active_scene, "scene_machine_stopping");
        }
        self.running = false;
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        match (self.active_scene, self.play.as_mut()) {
            (SceneKey::Play, Some(play)) => play,
            _ => &mut self.menu,
        }
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        match (self.active_scene, self.play.as_ref()) {
            (SceneKey::Play, Some(play)) => play,
            _ => &self.menu,
        }
    }
}
