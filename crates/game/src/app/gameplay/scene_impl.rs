/// One running level: spawns the level's entities on load and advances them
/// through movement, collision, lifespan and animation every unpaused tick.
pub(crate) struct PlayScene {
    level_index: usize,
    catalog: Rc<AssetCatalog>,
    level: LevelDescription,
    config: PlayConfig,
    animations: BuiltinAnimations,
    player_config: Option<PlayerConfig>,
    player: Option<EntityId>,
    lives: u32,
    paused: bool,
    toggles: DebugToggles,
    current_frame: u64,
    pending_end: Option<LevelEnd>,
}

impl PlayScene {
    pub(crate) fn new(
        level_index: usize,
        catalog: Rc<AssetCatalog>,
        level: LevelDescription,
        config: PlayConfig,
    ) -> Result<Self, SceneLoadError> {
        let animations = BuiltinAnimations::resolve(&catalog)?;
        Ok(Self {
            level_index,
            catalog,
            level,
            lives: config.starting_lives,
            config,
            animations,
            player_config: None,
            player: None,
            paused: false,
            toggles: DebugToggles::default(),
            current_frame: 0,
            pending_end: None,
        })
    }

    /// The controlled entity, unless it has been destroyed this tick.
    fn live_player(&self, world: &EntityManager) -> Option<EntityId> {
        self.player.filter(|&player| world.is_alive(player))
    }

    fn request_end(&mut self, end: LevelEnd) {
        if self.pending_end.is_some() {
            return;
        }
        match end {
            LevelEnd::Completed => info!(
                level = self.level_index,
                tick = self.current_frame,
                lives = self.lives,
                "level_complete"
            ),
            LevelEnd::GameOver => info!(
                level = self.level_index,
                tick = self.current_frame,
                "game_over"
            ),
        }
        self.pending_end = Some(end);
    }

    /// Destroys `player` and respawns it, or ends the level on the last life.
    fn lose_life(&mut self, world: &mut EntityManager, player: EntityId, cause: &'static str) {
        self.lives = self.lives.saturating_sub(1);
        world.destroy(player);
        info!(lives = self.lives, cause, tick = self.current_frame, "player_died");
        if self.lives == 0 {
            self.player = None;
            self.request_end(LevelEnd::GameOver);
        } else {
            self.spawn_player(world);
        }
    }

    fn set_input(&self, world: &mut EntityManager, apply: impl FnOnce(&mut Input)) {
        if let Some(input) = self.player.and_then(|player| world.get_mut::<Input>(player)) {
            apply(input);
        }
    }

    fn view_center_x(&self, world: &EntityManager) -> f32 {
        let half_width = self.config.world_size.x / 2.0;
        self.player
            .and_then(|player| world.get::<Transform>(player))
            .map_or(half_width, |transform| half_width.max(transform.position.x))
    }
}

impl Scene for PlayScene {
    fn load(&mut self, world: &mut EntityManager) {
        self.player = None;
        self.player_config = None;
        self.lives = self.config.starting_lives;
        self.paused = false;
        self.toggles = DebugToggles::default();
        self.current_frame = 0;
        self.pending_end = None;

        let directives = self.level.directives().cloned().collect::<Vec<_>>();
        for directive in &directives {
            self.spawn_directive(world, directive);
        }
        if self.player.is_none() {
            warn!(level = self.level_index, "level_without_player");
        }
        info!(
            level = self.level_index,
            entity_count = world.pending_count(),
            skipped_lines = self.level.warnings.len(),
            lives = self.lives,
            "level_loaded"
        );
    }

    fn do_action(&mut self, action: Action, world: &mut EntityManager) -> SceneCommand {
        match action.phase {
            ActionPhase::Start => match action.name {
                ActionName::ToggleTexture => {
                    self.toggles.draw_textures = !self.toggles.draw_textures;
                }
                ActionName::ToggleCollision => {
                    self.toggles.draw_collision = !self.toggles.draw_collision;
                }
                ActionName::ToggleGrid => self.toggles.draw_grid = !self.toggles.draw_grid,
                ActionName::Pause => {
                    self.paused = !self.paused;
                    info!(paused = self.paused, tick = self.current_frame, "paused_toggled");
                }
                ActionName::Quit => return SceneCommand::EndScene,
                ActionName::Jump => self.set_input(world, |input| input.jump = true),
                ActionName::Left => self.set_input(world, |input| input.left = true),
                ActionName::Right => self.set_input(world, |input| input.right = true),
                ActionName::Shoot => {
                    self.spawn_bullet(world);
                    self.set_input(world, |input| {
                        input.shoot = true;
                        input.can_shoot = false;
                    });
                }
                ActionName::Up | ActionName::Down | ActionName::Play => {}
            },
            ActionPhase::End => match action.name {
                ActionName::Jump => self.set_input(world, |input| input.jump = false),
                ActionName::Left => self.set_input(world, |input| input.left = false),
                ActionName::Right => self.set_input(world, |input| input.right = false),
                ActionName::Shoot => self.set_input(world, |input| {
                    input.shoot = false;
                    input.can_shoot = true;
                }),
                _ => {}
            },
        }
        SceneCommand::None
    }

    fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
        if self.paused {
            return SceneCommand::None;
        }

        world.update();
        if let Some(intent) = self.movement_system(world) {
            trace!(tick = self.current_frame, x = intent.x, y = intent.y, "player_intent");
        }
        self.collision_system(world);
        self.lifespan_system(world);
        self.animation_system(world);
        self.current_frame += 1;

        match self.pending_end {
            Some(_) => SceneCommand::EndScene,
            None => SceneCommand::None,
        }
    }

    fn render(&self, world: &EntityManager) -> RenderSnapshot {
        RenderSnapshot {
            scene: SceneKey::Play,
            tick: self.current_frame,
            paused: self.paused,
            lives: Some(self.lives),
            toggles: self.toggles,
            view_center_x: self.view_center_x(world),
            menu: None,
            entities: world.snapshot(),
        }
    }

    fn unload(&mut self, _world: &mut EntityManager) {
        self.player = None;
        debug!(level = self.level_index, tick = self.current_frame, "level_unloaded");
    }

    fn debug_title(&self, world: &EntityManager) -> Option<String> {
        Some(format!(
            "{} | lives {} | tick {} | entities {}",
            level_display_name(self.level_index + 1),
            self.lives,
            self.current_frame,
            world.entity_count()
        ))
    }
}
