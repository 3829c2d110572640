impl PlayScene {
    fn spawn_directive(&mut self, world: &mut EntityManager, directive: &SpawnDirective) {
        match directive {
            SpawnDirective::Tile {
                animation,
                grid_x,
                grid_y,
            } => {
                self.spawn_tile(world, EntityTag::Tile, animation, *grid_x, *grid_y);
            }
            SpawnDirective::Dec {
                animation,
                grid_x,
                grid_y,
            } => {
                self.spawn_tile(world, EntityTag::Dec, animation, *grid_x, *grid_y);
            }
            SpawnDirective::Player(config) => {
                if let Some(previous) = self.player.take() {
                    warn!(level = self.level_index, "duplicate_player_line");
                    world.destroy(previous);
                }
                self.player_config = Some(config.clone());
                self.spawn_player(world);
            }
            SpawnDirective::Enemy {
                animation,
                grid_x,
                grid_y,
                speed,
            } => {
                let Some(animation) = self.level_animation(animation) else {
                    return;
                };
                let size = animation.size();
                let position = self
                    .config
                    .grid_to_mid_pixel(*grid_x as f32, *grid_y as f32, size);
                let enemy = world.add_entity(EntityTag::Enemy);
                world.add_component(enemy, AnimationBinding::new(animation, true));
                world.add_component(
                    enemy,
                    Transform {
                        velocity: Vec2::new(*speed, 0.0),
                        ..Transform::at(position)
                    },
                );
                world.add_component(enemy, BoundingBox::new(size));
            }
        }
    }

    /// Tiles collide with a box the size of their frame; decorations only draw.
    fn spawn_tile(
        &mut self,
        world: &mut EntityManager,
        tag: EntityTag,
        animation: &str,
        grid_x: i32,
        grid_y: i32,
    ) {
        let Some(animation) = self.level_animation(animation) else {
            return;
        };
        let size = animation.size();
        let position = self
            .config
            .grid_to_mid_pixel(grid_x as f32, grid_y as f32, size);
        let tile = world.add_entity(tag);
        world.add_component(tile, AnimationBinding::new(animation, true));
        world.add_component(tile, Transform::at(position));
        if tag == EntityTag::Tile {
            world.add_component(tile, BoundingBox::new(size));
        }
    }

    fn level_animation(&self, name: &str) -> Option<Animation> {
        let animation = self.catalog.animation(name);
        if animation.is_none() {
            warn!(level = self.level_index, animation = name, "level_animation_missing");
        }
        animation
    }

    /// Places a fresh player at the configured spawn cell. Without a `Player`
    /// line in the level there is nothing to spawn.
    fn spawn_player(&mut self, world: &mut EntityManager) -> Option<EntityId> {
        let config = self.player_config.as_ref()?;
        let stand = self.animations.stand.clone();
        let position = self
            .config
            .grid_to_mid_pixel(config.grid_x, config.grid_y, stand.size());
        let bounds = BoundingBox::new(Vec2::new(config.collision_width, config.collision_height));
        let gravity = Gravity {
            gravity: config.gravity,
        };

        let player = world.add_entity(EntityTag::Player);
        world.add_component(player, AnimationBinding::new(stand, true));
        world.add_component(player, Transform::at(position));
        world.add_component(player, Input::default());
        world.add_component(player, bounds);
        world.add_component(player, gravity);
        world.add_component(player, LocomotionState::default());
        self.player = Some(player);
        debug!(entity = %player, x = position.x, y = position.y, "player_spawned");
        Some(player)
    }

    fn spawn_bullet(&mut self, world: &mut EntityManager) {
        let Some(player) = self.player else {
            return;
        };
        if !world.get::<Input>(player).is_some_and(|input| input.can_shoot) {
            return;
        }
        let Some(shooter) = world.get::<Transform>(player).copied() else {
            return;
        };

        let speed = if shooter.scale.x == 1.0 {
            self.config.bullet_speed
        } else {
            -self.config.bullet_speed
        };
        let buster = self.animations.buster.clone();
        let size = buster.size();
        let bullet = world.add_entity(EntityTag::Bullet);
        world.add_component(bullet, AnimationBinding::new(buster, true));
        world.add_component(
            bullet,
            Transform {
                velocity: Vec2::new(speed, 0.0),
                ..Transform::at(shooter.position)
            },
        );
        world.add_component(bullet, BoundingBox::new(size));
        world.add_component(
            bullet,
            Lifespan::new(self.config.bullet_lifespan_ticks, self.current_frame),
        );
        debug!(entity = %bullet, velocity_x = speed, "bullet_spawned");
    }

    fn spawn_explosion(&self, world: &mut EntityManager, position: Vec2) {
        let boom = world.add_entity(EntityTag::Boom);
        world.add_component(boom, AnimationBinding::new(self.animations.explosion.clone(), false));
        world.add_component(boom, Transform::at(position));
    }

    fn spawn_coin(&self, world: &mut EntityManager, position: Vec2) {
        let coin = world.add_entity(EntityTag::Coin);
        world.add_component(coin, AnimationBinding::new(self.animations.coin.clone(), false));
        world.add_component(coin, Transform::at(position));
    }
}
