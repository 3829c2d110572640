/// Level-independent tuning. Every field may be overridden from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayConfig {
    pub(crate) grid_size: Vec2,
    /// Height doubles as the level height used for grid placement and the fall check.
    pub(crate) world_size: Vec2,
    pub(crate) starting_lives: u32,
    pub(crate) bullet_speed: f32,
    pub(crate) bullet_lifespan_ticks: i32,
    pub(crate) stomp_bounce_divisor: f32,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            grid_size: Vec2::new(64.0, 64.0),
            world_size: Vec2::new(1280.0, 768.0),
            starting_lives: 3,
            bullet_speed: 10.0,
            bullet_lifespan_ticks: 45,
            stomp_bounce_divisor: 1.5,
        }
    }
}

impl PlayConfig {
    pub(crate) fn from_json(raw: &str) -> Result<Self, String> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, PlayConfig>(&mut deserializer) {
            Ok(config) => Ok(config),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(format!("parse play config: {source}"))
                } else {
                    Err(format!("parse play config at {path}: {source}"))
                }
            }
        }
    }

    fn level_height(&self) -> f32 {
        self.world_size.y
    }

    /// Pixel centre of a sprite of `frame_size` whose bottom-left cell is
    /// (`grid_x`, `grid_y`). Grid rows count up from the bottom of the level.
    fn grid_to_mid_pixel(&self, grid_x: f32, grid_y: f32, frame_size: Vec2) -> Vec2 {
        Vec2::new(
            grid_x * self.grid_size.x + frame_size.x / 2.0,
            self.level_height() - grid_y * self.grid_size.y - frame_size.y / 2.0,
        )
    }
}

/// Animations the play scene spawns on its own, resolved once so ticks never
/// perform a fallible lookup.
#[derive(Debug, Clone)]
struct BuiltinAnimations {
    stand: Animation,
    run: Animation,
    air: Animation,
    buster: Animation,
    explosion: Animation,
    question_used: Animation,
    coin: Animation,
}

impl BuiltinAnimations {
    fn resolve(catalog: &AssetCatalog) -> Result<Self, SceneLoadError> {
        let [stand, run, air, buster, explosion, question_used, coin] =
            BUILTIN_ANIMATION_NAMES.map(|name| catalog.animation(name));
        let require = |animation: Option<Animation>, name: &str| {
            animation.ok_or_else(|| SceneLoadError::MissingAnimation {
                name: name.to_string(),
            })
        };
        Ok(Self {
            stand: require(stand, "Stand")?,
            run: require(run, "Run")?,
            air: require(air, "Air")?,
            buster: require(buster, "Buster")?,
            explosion: require(explosion, "Explosion")?,
            question_used: require(question_used, "Question2")?,
            coin: require(coin, "Coin")?,
        })
    }

    fn for_pose(&self, pose: Pose) -> &Animation {
        match pose {
            Pose::Air => &self.air,
            Pose::Run => &self.run,
            Pose::Stand => &self.stand,
        }
    }
}

/// Tile behaviour keyed off the tile's current animation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileKind {
    Brick,
    Question,
    Pole,
    Solid,
}

impl TileKind {
    fn of(world: &EntityManager, tile: EntityId) -> Self {
        let name = world
            .get::<AnimationBinding>(tile)
            .map(|binding| binding.animation.name());
        match name {
            Some("Brick") => Self::Brick,
            Some("Question") => Self::Question,
            Some("Pole") => Self::Pole,
            _ => Self::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelEnd {
    Completed,
    GameOver,
}
