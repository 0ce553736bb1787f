//! Spritesheets shared between entities.
//!
//! The registry keeps one [`Spritesheet`] per image filename; entities refer
//! to theirs by [`SpritesheetId`]. Sheets are never mutated after loading and
//! outlive the entities that use them.

use serde::{Deserialize, Serialize};

/// Index into the registry's spritesheet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpritesheetId(pub usize);

/// A loaded spritesheet image: its filename and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spritesheet {
    pub filename: String,
    pub image_width: u32,
    pub image_height: u32,
}

impl Spritesheet {
    pub fn new(filename: impl Into<String>, image_width: u32, image_height: u32) -> Self {
        Self {
            filename: filename.into(),
            image_width,
            image_height,
        }
    }
}

/// Pixel rectangle of one frame within a spritesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    /// Locate frame `member` of `frame_width x frame_height` frames laid out
    /// row-major across a sheet `sheet_width` pixels wide.
    ///
    /// Returns `None` for a zero-width sheet.
    pub fn for_frame(member: u32, frame_width: u32, frame_height: u32, sheet_width: u32) -> Option<Self> {
        if sheet_width == 0 {
            return None;
        }
        let offset = member as u64 * frame_width as u64;
        let sheet = sheet_width as u64;
        Some(Self {
            x: (offset % sheet) as u32,
            y: ((offset / sheet) * frame_height as u64) as u32,
            width: frame_width,
            height: frame_height,
        })
    }
}
