//! Transform and marker messages published by the collision viewer.

use crate::{Header, Orientation, Position};
use serde::{Deserialize, Serialize};

/// Frame every viewer message is anchored to.
pub const COMMON_WORLD_FRAME: &str = "common_world";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStamped {
    /// Parent frame and stamp.
    pub header: Header,
    pub child_frame_id: String,
    pub translation: Position,
    pub rotation: Orientation,
}

impl TransformStamped {
    pub fn identity(header: Header, child_frame_id: impl Into<String>) -> Self {
        Self {
            header,
            child_frame_id: child_frame_id.into(),
            translation: Position::default(),
            rotation: Orientation::identity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    Sphere,
    TextViewFacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Scale {
    pub fn uniform(s: f64) -> Self {
        Self { x: s, y: s, z: s }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub header: Header,
    pub ns: String,
    pub id: i32,
    pub marker_type: MarkerType,
    pub action: MarkerAction,
    pub position: Position,
    pub orientation: Orientation,
    pub scale: Scale,
    pub color: ColorRgba,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Marker {
    pub fn new(header: Header, marker_type: MarkerType) -> Self {
        Self {
            header,
            ns: String::new(),
            id: 0,
            marker_type,
            action: MarkerAction::Add,
            position: Position::default(),
            orientation: Orientation::identity(),
            scale: Scale::uniform(1.0),
            color: ColorRgba::new(0.0, 0.0, 0.0, 0.0),
            text: String::new(),
        }
    }
}
