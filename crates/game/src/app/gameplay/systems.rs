impl PlayScene {
    /// Integrates every transform and rebuilds the player's velocity from input.
    ///
    /// Returns the player's intended velocity after the max-speed clamp. The
    /// clamp only touches this local value inside the gravity branch; the
    /// velocity written to the transform stays unclamped.
    fn movement_system(&mut self, world: &mut EntityManager) -> Option<Vec2> {
        let player = self.live_player(world);
        let mut intent = None;
        if let (Some(player), Some(config)) = (player, self.player_config.as_ref()) {
            let input = world.get::<Input>(player).copied().unwrap_or_default();
            let airborne = world
                .get::<LocomotionState>(player)
                .is_some_and(|state| state.air);
            let vertical = world
                .get::<Transform>(player)
                .map_or(0.0, |transform| transform.velocity.y);

            let mut velocity = Vec2::new(0.0, vertical);
            let mut facing = None;
            // Left and right together add up to zero x velocity; right still sets facing.
            if input.left {
                velocity.x -= config.speed;
                facing = Some(-1.0);
            }
            if input.right {
                velocity.x += config.speed;
                facing = Some(1.0);
            }
            if input.jump && !airborne {
                velocity.y = config.jump;
            }

            if let Some(state) = world.get_mut::<LocomotionState>(player) {
                state.run = facing.is_some();
            }
            if let Some(transform) = world.get_mut::<Transform>(player) {
                transform.velocity = velocity;
                if let Some(facing) = facing {
                    transform.scale.x = facing;
                }
            }
            intent = Some(velocity);
        }

        let max_speed = self.player_config.as_ref().map(|config| config.max_speed);
        for id in world.entities().to_vec() {
            let gravity = world.get::<Gravity>(id).map(|gravity| gravity.gravity);
            let Some(transform) = world.get_mut::<Transform>(id) else {
                continue;
            };
            transform.previous_position = transform.position;
            if let Some(gravity) = gravity {
                transform.velocity.y += gravity;
                if let (Some(intent), Some(max_speed)) = (intent.as_mut(), max_speed) {
                    *intent = clamp_each_axis(*intent, max_speed);
                }
            }
            let velocity = transform.velocity;
            transform.position += velocity;
        }
        intent
    }

    /// Bullets, then enemies against tiles, then the player against tiles and
    /// enemies, then the fall and left-edge checks. Each category sees the
    /// destructions of the ones before it only through the alive flag.
    fn collision_system(&mut self, world: &mut EntityManager) {
        let player = self.live_player(world);
        if let Some(state) = player.and_then(|id| world.get_mut::<LocomotionState>(id)) {
            state.air = true;
            state.stand = false;
        }

        let tiles = world.entities_with_tag(EntityTag::Tile).to_vec();
        let enemies = world.entities_with_tag(EntityTag::Enemy).to_vec();
        self.bullet_collisions(world, &tiles, &enemies);
        enemy_tile_collisions(world, &tiles, &enemies);

        let Some(player) = player else {
            return;
        };
        self.player_tile_collisions(world, player, &tiles);
        if self.player_enemy_collisions(world, player, &enemies) {
            return;
        }

        let Some(position) = position_of(world, player) else {
            return;
        };
        if position.y > self.config.level_height() {
            self.lose_life(world, player, "fell_out_of_world");
            return;
        }

        let left_edge = world.get::<BoundingBox>(player).map(|bounds| bounds.half_size.x);
        if let (Some(left_edge), Some(transform)) = (left_edge, world.get_mut::<Transform>(player))
        {
            if transform.position.x < left_edge {
                transform.position.x = left_edge;
            }
        }
    }

    fn bullet_collisions(
        &self,
        world: &mut EntityManager,
        tiles: &[EntityId],
        enemies: &[EntityId],
    ) {
        for bullet in world.entities_with_tag(EntityTag::Bullet).to_vec() {
            if let Some(tile) = first_intersecting(world, bullet, tiles) {
                world.destroy(bullet);
                if TileKind::of(world, tile) == TileKind::Brick {
                    self.break_brick(world, tile);
                }
            }

            if let Some(enemy) = first_intersecting(world, bullet, enemies) {
                world.destroy(bullet);
                world.destroy(enemy);
                if let Some(position) = position_of(world, enemy) {
                    self.spawn_explosion(world, position);
                }
                debug!(bullet = %bullet, enemy = %enemy, "enemy_shot");
            }
        }
    }

    fn player_tile_collisions(
        &mut self,
        world: &mut EntityManager,
        player: EntityId,
        tiles: &[EntityId],
    ) {
        for &tile in tiles {
            let overlap = physics::overlap(world, player, tile);
            if !physics::intersects(overlap) {
                continue;
            }
            let previous = physics::previous_overlap(world, player, tile);
            let (Some(tile_position), Some(previous_position)) = (
                position_of(world, tile),
                world
                    .get::<Transform>(player)
                    .map(|transform| transform.previous_position),
            ) else {
                continue;
            };
            let kind = TileKind::of(world, tile);

            if kind == TileKind::Pole {
                self.request_end(LevelEnd::Completed);
            }

            if previous.x > 0.0 && previous.y == 0.0 {
                // Already overlapping on x last tick, so the contact is vertical.
                if previous_position.y < tile_position.y {
                    with_player(world, player, |transform, state| {
                        transform.position.y -= overlap.y;
                        state.stand = true;
                        state.air = false;
                    });
                } else {
                    with_player(world, player, |transform, _| {
                        transform.position.y += overlap.y;
                    });
                    match kind {
                        TileKind::Brick => self.break_brick(world, tile),
                        TileKind::Question => self.open_question_block(world, tile, tile_position),
                        TileKind::Pole | TileKind::Solid => {}
                    }
                }
                with_player(world, player, |transform, _| transform.velocity.y = 0.0);
            } else if previous.x == 0.0 && previous.y > 0.0 {
                with_player(world, player, |transform, _| {
                    if previous_position.x < tile_position.x {
                        transform.position.x -= overlap.x;
                    } else {
                        transform.position.x += overlap.x;
                    }
                    transform.velocity.x = 0.0;
                });
            } else {
                self.resolve_diagonal_entry(world, player, tiles);
            }
        }
    }

    /// Entered a tile corner-first: probe the horizontal move alone, then the
    /// vertical move, backing out whichever axis still overlaps.
    fn resolve_diagonal_entry(
        &self,
        world: &mut EntityManager,
        player: EntityId,
        tiles: &[EntityId],
    ) {
        let Some(transform) = world.get::<Transform>(player).copied() else {
            return;
        };
        let previous = transform.previous_position;
        let intended_y = transform.position.y;

        with_player(world, player, |transform, _| transform.position.y = previous.y);
        if first_intersecting(world, player, tiles).is_some() {
            with_player(world, player, |transform, _| transform.position.x = previous.x);
        }

        with_player(world, player, |transform, _| transform.position.y = intended_y);
        if let Some(tile) = first_intersecting(world, player, tiles) {
            let landed = position_of(world, tile).is_some_and(|tile| previous.y < tile.y);
            with_player(world, player, |transform, state| {
                transform.position.y = previous.y;
                if landed {
                    state.stand = true;
                    state.air = false;
                }
            });
        }
    }

    /// Returns true when the player was killed and replaced.
    fn player_enemy_collisions(
        &mut self,
        world: &mut EntityManager,
        player: EntityId,
        enemies: &[EntityId],
    ) -> bool {
        let Some(enemy) = first_intersecting(world, player, enemies) else {
            return false;
        };

        let falling = world
            .get::<Transform>(player)
            .is_some_and(|transform| transform.velocity.y > 0.0);
        if !falling {
            self.lose_life(world, player, "enemy_contact");
            return true;
        }

        world.destroy(enemy);
        if let Some(position) = position_of(world, enemy) {
            self.spawn_explosion(world, position);
        }
        let bounce = self
            .player_config
            .as_ref()
            .map_or(0.0, |config| -config.max_speed / self.config.stomp_bounce_divisor);
        with_player(world, player, |transform, _| transform.velocity.y = bounce);
        debug!(enemy = %enemy, velocity_y = bounce, "enemy_stomped");
        false
    }

    fn lifespan_system(&self, world: &mut EntityManager) {
        for id in world.entities().to_vec() {
            let Some(lifespan) = world.get_mut::<Lifespan>(id) else {
                continue;
            };
            lifespan.remaining = lifespan.remaining.saturating_sub(1);
            if lifespan.remaining <= 0 {
                world.destroy(id);
            }
        }
    }

    fn animation_system(&mut self, world: &mut EntityManager) {
        if let Some(player) = self.live_player(world) {
            let pose = world
                .get::<LocomotionState>(player)
                .and_then(LocomotionState::pose);
            if let Some(pose) = pose {
                let playing = world
                    .get::<AnimationBinding>(player)
                    .is_some_and(|binding| binding.animation.name() == pose.animation_name());
                if !playing {
                    let animation = self.animations.for_pose(pose).clone();
                    world.add_component(player, AnimationBinding::new(animation, true));
                }
            }
        }

        for id in world.entities().to_vec() {
            let Some(binding) = world.get_mut::<AnimationBinding>(id) else {
                continue;
            };
            binding.animation.update();
            if binding.animation.has_ended() && !binding.repeat {
                world.destroy(id);
            }
        }
    }

    fn break_brick(&self, world: &mut EntityManager, tile: EntityId) {
        world.destroy(tile);
        if let Some(position) = position_of(world, tile) {
            self.spawn_explosion(world, position);
        }
        debug!(tile = %tile, "brick_broken");
    }

    fn open_question_block(&self, world: &mut EntityManager, tile: EntityId, position: Vec2) {
        world.add_component(
            tile,
            AnimationBinding::new(self.animations.question_used.clone(), true),
        );
        self.spawn_coin(world, Vec2::new(position.x, position.y - self.config.grid_size.y));
        debug!(tile = %tile, "question_block_opened");
    }
}

/// Mutates the player's transform and locomotion flags together.
fn with_player(
    world: &mut EntityManager,
    player: EntityId,
    apply: impl FnOnce(&mut Transform, &mut LocomotionState),
) {
    let mut state = world
        .get::<LocomotionState>(player)
        .copied()
        .unwrap_or_default();
    if let Some(transform) = world.get_mut::<Transform>(player) {
        apply(transform, &mut state);
    }
    if let Some(slot) = world.get_mut::<LocomotionState>(player) {
        *slot = state;
    }
}

fn enemy_tile_collisions(world: &mut EntityManager, tiles: &[EntityId], enemies: &[EntityId]) {
    for &enemy in enemies {
        let Some(tile) = first_intersecting(world, enemy, tiles) else {
            continue;
        };
        let overlap = physics::overlap(world, enemy, tile);
        let Some(tile_x) = position_of(world, tile).map(|position| position.x) else {
            continue;
        };
        if let Some(transform) = world.get_mut::<Transform>(enemy) {
            if transform.previous_position.x < tile_x {
                transform.position.x -= overlap.x;
            } else {
                transform.position.x += overlap.x;
            }
            transform.velocity.x *= -1.0;
        }
    }
}

/// First of `candidates`, in order, whose box currently intersects `entity`.
fn first_intersecting(
    world: &EntityManager,
    entity: EntityId,
    candidates: &[EntityId],
) -> Option<EntityId> {
    candidates
        .iter()
        .copied()
        .find(|&candidate| physics::intersects(physics::overlap(world, entity, candidate)))
}

fn position_of(world: &EntityManager, id: EntityId) -> Option<Vec2> {
    world.get::<Transform>(id).map(|transform| transform.position)
}

/// Caps each component's magnitude at `max` without flipping its sign.
fn clamp_each_axis(value: Vec2, max: f32) -> Vec2 {
    let clamp = |component: f32| {
        if component.abs() > max {
            max.copysign(component)
        } else {
            component
        }
    };
    Vec2::new(clamp(value.x), clamp(value.y))
}
