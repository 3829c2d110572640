use serde::{Deserialize, Serialize};

use super::Vec2;

/// A texture reference plus the pixel size of the whole sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub texture: String,
    pub size: Vec2,
}

impl SpriteSheet {
    pub fn new(texture: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            texture: texture.into(),
            size: Vec2::new(width, height),
        }
    }
}

/// Pixel region of the sheet that is currently visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Frame-strip animation advanced once per tick.
///
/// The shown frame is `elapsed / speed % frame_count`. A multi-frame animation
/// has "ended" once `elapsed >= frame_count * speed`; a single-frame animation
/// never ends. Reassigning a fresh value is the only way to restart playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    name: String,
    sheet: SpriteSheet,
    frame_count: usize,
    speed: usize,
    elapsed: usize,
    frame_size: Vec2,
    region: FrameRect,
}

impl Animation {
    /// A single static frame covering the whole sheet.
    pub fn new(name: impl Into<String>, sheet: SpriteSheet) -> Self {
        Self::with_frames(name, sheet, 1, 0)
    }

    pub fn with_frames(
        name: impl Into<String>,
        sheet: SpriteSheet,
        frame_count: usize,
        speed: usize,
    ) -> Self {
        let frame_count = frame_count.max(1);
        let frame_size = Vec2::new(sheet.size.x / frame_count as f32, sheet.size.y);
        let mut animation = Self {
            name: name.into(),
            sheet,
            frame_count,
            speed,
            elapsed: 0,
            frame_size,
            region: FrameRect::default(),
        };
        animation.region = animation.region_for_frame(0);
        animation
    }

    pub fn update(&mut self) {
        if self.frame_count <= 1 {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(1);
        self.region = self.region_for_frame(self.current_frame());
    }

    pub fn has_ended(&self) -> bool {
        if self.frame_count <= 1 {
            return false;
        }
        self.elapsed >= self.frame_count * self.ticks_per_frame()
    }

    pub fn current_frame(&self) -> usize {
        if self.frame_count <= 1 {
            return 0;
        }
        self.elapsed / self.ticks_per_frame() % self.frame_count
    }

    /// A zero speed on a strip plays at one tick per frame.
    fn ticks_per_frame(&self) -> usize {
        self.speed.max(1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet(&self) -> &SpriteSheet {
        &self.sheet
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn speed(&self) -> usize {
        self.speed
    }

    pub fn elapsed(&self) -> usize {
        self.elapsed
    }

    /// Size of a single frame in pixels.
    pub fn size(&self) -> Vec2 {
        self.frame_size
    }

    pub fn region(&self) -> FrameRect {
        self.region
    }

    fn region_for_frame(&self, frame: usize) -> FrameRect {
        let width = self.frame_size.x as i32;
        FrameRect {
            x: frame as i32 * width,
            y: 0,
            width,
            height: self.frame_size.y as i32,
        }
    }
}
