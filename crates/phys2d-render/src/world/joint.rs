use glam::Vec2;

use super::PointerCursor;

/// Travel configuration shared by prismatic and wheel joints.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TravelLimits {
    /// Sliding axis in body A's local space. Need not be normalized.
    pub local_axis: Vec2,
    /// Lower travel limit; `None` means unlimited (drawn from zero).
    pub min: Option<f32>,
    /// Upper travel limit; infinite means unlimited.
    pub max: f32,
}

impl Default for TravelLimits {
    fn default() -> Self {
        Self {
            local_axis: Vec2::X,
            min: None,
            max: f32::INFINITY,
        }
    }
}

/// Joint kind together with the configuration needed to draw it.
#[derive(Debug, Clone)]
pub enum JointKind {
    Revolute,
    Weld,
    Motor,
    Spring,
    Distance { distance: f32 },
    Prismatic(TravelLimits),
    Wheel(TravelLimits),
    /// Pointer constraint; the target is read from `cursor` every frame.
    Mouse { cursor: PointerCursor },
    Unsupported { kind: String },
}

impl JointKind {
    pub fn name(&self) -> &str {
        match self {
            JointKind::Revolute => "revolute",
            JointKind::Weld => "weld",
            JointKind::Motor => "motor",
            JointKind::Spring => "spring",
            JointKind::Distance { .. } => "distance",
            JointKind::Prismatic(_) => "prismatic",
            JointKind::Wheel(_) => "wheel",
            JointKind::Mouse { .. } => "mouse",
            JointKind::Unsupported { kind } => kind,
        }
    }
}
