/// Level picker. Selection wraps at both ends; quitting here quits the game.
pub(crate) struct MenuScene {
    items: Vec<String>,
    selected: usize,
    ticks: u64,
}

impl MenuScene {
    pub(crate) fn new(items: Vec<String>) -> Self {
        Self {
            items,
            selected: 0,
            ticks: 0,
        }
    }

    fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = if self.selected > 0 {
            self.selected - 1
        } else {
            self.items.len() - 1
        };
    }

    fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }
}

impl Scene for MenuScene {
    fn load(&mut self, _world: &mut EntityManager) {
        self.selected = 0;
        self.ticks = 0;
        debug!(items = self.items.len(), "menu_loaded");
    }

    fn do_action(&mut self, action: Action, _world: &mut EntityManager) -> SceneCommand {
        if action.phase != ActionPhase::Start {
            return SceneCommand::None;
        }
        match action.name {
            ActionName::Up => self.select_previous(),
            ActionName::Down => self.select_next(),
            ActionName::Play if !self.items.is_empty() => {
                return SceneCommand::StartLevel(self.selected);
            }
            ActionName::Quit => return SceneCommand::EndScene,
            _ => {}
        }
        SceneCommand::None
    }

    fn update(&mut self, world: &mut EntityManager) -> SceneCommand {
        world.update();
        self.ticks += 1;
        SceneCommand::None
    }

    fn render(&self, _world: &EntityManager) -> RenderSnapshot {
        RenderSnapshot {
            tick: self.ticks,
            menu: Some(MenuView {
                title: MENU_TITLE.to_string(),
                items: self.items.clone(),
                selected: self.selected,
            }),
            ..RenderSnapshot::empty(SceneKey::Menu)
        }
    }

    fn unload(&mut self, _world: &mut EntityManager) {}

    fn debug_title(&self, _world: &EntityManager) -> Option<String> {
        self.items.get(self.selected).cloned()
    }
}
