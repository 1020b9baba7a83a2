use bitflags::bitflags;

use crate::world::JointKind;

bitflags! {
    /// Selects which layers [`super::WorldRenderer::render`] draws.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct RenderMask: u32 {
        const AXES = 0x1;
        const BODY = 0x2;
        const REVOLUTE_JOINT = 0x4;
        const WELD_JOINT = 0x8;
        const MOUSE_JOINT = 0x10;
        const MOTOR_JOINT = 0x20;
        const SPRING = 0x40;
        const DISTANCE_JOINT = 0x80;
        const PRISMATIC_JOINT = 0x100;
        const WHEEL_JOINT = 0x200;
        const CONTACT = 0x400;

        const JOINT = Self::REVOLUTE_JOINT.bits()
            | Self::WELD_JOINT.bits()
            | Self::MOUSE_JOINT.bits()
            | Self::MOTOR_JOINT.bits()
            | Self::SPRING.bits()
            | Self::DISTANCE_JOINT.bits()
            | Self::PRISMATIC_JOINT.bits()
            | Self::WHEEL_JOINT.bits();

        const ALL = Self::AXES.bits() | Self::BODY.bits() | Self::JOINT.bits() | Self::CONTACT.bits();
        const DEFAULT = Self::AXES.bits() | Self::BODY.bits() | Self::JOINT.bits();
    }
}

impl Default for RenderMask {
    fn default() -> Self {
        RenderMask::DEFAULT
    }
}

impl RenderMask {
    /// Layer bit controlling a joint kind; `None` for unsupported kinds.
    pub fn for_joint(kind: &JointKind) -> Option<RenderMask> {
        let bit = match kind {
            JointKind::Revolute => RenderMask::REVOLUTE_JOINT,
            JointKind::Weld => RenderMask::WELD_JOINT,
            JointKind::Motor => RenderMask::MOTOR_JOINT,
            JointKind::Spring => RenderMask::SPRING,
            JointKind::Distance { .. } => RenderMask::DISTANCE_JOINT,
            JointKind::Prismatic(_) => RenderMask::PRISMATIC_JOINT,
            JointKind::Wheel(_) => RenderMask::WHEEL_JOINT,
            JointKind::Mouse { .. } => RenderMask::MOUSE_JOINT,
            JointKind::Unsupported { .. } => return None,
        };
        Some(bit)
    }
}
