// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element types, type masks, and transform slot types.

use core::ops::{BitOr, BitOrAssign};

/// The closed set of element variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    /// Skeleton bone. Single parent.
    Bone,
    /// Locator / space. Multi parent.
    Null,
    /// Animatable control with offset and shape transforms. Multi parent.
    Control,
    /// Scalar curve. No transform, no parent.
    Curve,
    /// Physics proxy. Single parent.
    Physics,
    /// Reference to an external transform source. Multi parent.
    Reference,
    /// Modular rig connector. Single parent.
    Connector,
    /// Attachment socket. Single parent.
    Socket,
}

/// How many parents an element type may have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentArity {
    /// Never parented.
    None,
    /// Zero or one parent.
    Single,
    /// An ordered list of weighted parent constraints.
    Multi,
}

impl ElementType {
    /// Number of variants.
    pub const COUNT: usize = 8;

    /// Every variant, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Bone,
        Self::Null,
        Self::Control,
        Self::Curve,
        Self::Physics,
        Self::Reference,
        Self::Connector,
        Self::Socket,
    ];

    /// Position of this type in [`ALL`](Self::ALL).
    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether elements of this type carry pose storage.
    #[inline]
    #[must_use]
    pub const fn has_transform(self) -> bool {
        !matches!(self, Self::Curve)
    }

    /// Parent arity for this type.
    #[inline]
    #[must_use]
    pub const fn parent_arity(self) -> ParentArity {
        match self {
            Self::Curve => ParentArity::None,
            Self::Null | Self::Control | Self::Reference => ParentArity::Multi,
            Self::Bone | Self::Physics | Self::Connector | Self::Socket => ParentArity::Single,
        }
    }

    /// The mask bit for this type.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> ElementTypeMask {
        ElementTypeMask(1 << self as u8)
    }
}

/// A set of [`ElementType`]s used to filter queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementTypeMask(pub u8);

impl ElementTypeMask {
    /// No types.
    pub const NONE: Self = Self(0);
    /// Every type.
    pub const ALL: Self = Self(0xff);
    /// Every type that carries a transform.
    pub const TRANSFORMS: Self = Self(0xff & !(1 << ElementType::Curve as u8));

    /// Returns `true` if `kind` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ElementType) -> bool {
        self.0 & (1 << kind as u8) != 0
    }
}

impl Default for ElementTypeMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for ElementTypeMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ElementTypeMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<ElementType> for ElementTypeMask {
    fn from(kind: ElementType) -> Self {
        kind.mask()
    }
}

/// One of the four cached transforms per element.
///
/// The discriminant doubles as the slot position inside
/// pose storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformType {
    /// Rest pose, relative to the effective parent.
    InitialLocal = 0,
    /// Animated pose, relative to the effective parent.
    CurrentLocal = 1,
    /// Rest pose, in rig space.
    InitialGlobal = 2,
    /// Animated pose, in rig space.
    CurrentGlobal = 3,
}

impl TransformType {
    /// Every transform type, in slot order.
    pub const ALL: [Self; 4] = [
        Self::InitialLocal,
        Self::CurrentLocal,
        Self::InitialGlobal,
        Self::CurrentGlobal,
    ];

    /// Slot position.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Builds a transform type from its two flags.
    #[inline]
    #[must_use]
    pub const fn from_flags(initial: bool, local: bool) -> Self {
        match (initial, local) {
            (true, true) => Self::InitialLocal,
            (false, true) => Self::CurrentLocal,
            (true, false) => Self::InitialGlobal,
            (false, false) => Self::CurrentGlobal,
        }
    }

    /// `true` for the two local types.
    #[inline]
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::InitialLocal | Self::CurrentLocal)
    }

    /// `true` for the two global types.
    #[inline]
    #[must_use]
    pub const fn is_global(self) -> bool {
        !self.is_local()
    }

    /// `true` for the two initial types.
    #[inline]
    #[must_use]
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::InitialLocal | Self::InitialGlobal)
    }

    /// Local becomes global and vice versa; initial/current is preserved.
    #[inline]
    #[must_use]
    pub const fn swap_local_and_global(self) -> Self {
        Self::from_flags(self.is_initial(), !self.is_local())
    }

    /// Initial becomes current and vice versa; local/global is preserved.
    #[inline]
    #[must_use]
    pub const fn swap_initial_and_current(self) -> Self {
        Self::from_flags(!self.is_initial(), self.is_local())
    }

    /// The local type with the same initial/current flag.
    #[inline]
    #[must_use]
    pub const fn make_local(self) -> Self {
        Self::from_flags(self.is_initial(), true)
    }

    /// The global type with the same initial/current flag.
    #[inline]
    #[must_use]
    pub const fn make_global(self) -> Self {
        Self::from_flags(self.is_initial(), false)
    }

    /// The initial type with the same local/global flag.
    #[inline]
    #[must_use]
    pub const fn make_initial(self) -> Self {
        Self::from_flags(true, self.is_local())
    }

    /// The current type with the same local/global flag.
    #[inline]
    #[must_use]
    pub const fn make_current(self) -> Self {
        Self::from_flags(false, self.is_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_local_and_global_round_trips() {
        for ty in TransformType::ALL {
            assert_eq!(ty.swap_local_and_global().swap_local_and_global(), ty);
            assert_ne!(ty.swap_local_and_global().is_local(), ty.is_local());
            assert_eq!(ty.swap_local_and_global().is_initial(), ty.is_initial());
        }
    }

    #[test]
    fn slots_are_distinct() {
        let slots: [usize; 4] = TransformType::ALL.map(TransformType::slot);
        assert_eq!(slots, [0, 1, 2, 3]);
    }

    #[test]
    fn mask_filters_types() {
        let mask = ElementType::Bone.mask() | ElementType::Control.mask();
        assert!(mask.contains(ElementType::Bone));
        assert!(mask.contains(ElementType::Control));
        assert!(!mask.contains(ElementType::Null));
        assert!(!ElementTypeMask::TRANSFORMS.contains(ElementType::Curve));
        assert!(ElementTypeMask::TRANSFORMS.contains(ElementType::Socket));
    }

    #[test]
    fn parent_arity_by_type() {
        assert_eq!(ElementType::Bone.parent_arity(), ParentArity::Single);
        assert_eq!(ElementType::Null.parent_arity(), ParentArity::Multi);
        assert_eq!(ElementType::Control.parent_arity(), ParentArity::Multi);
        assert_eq!(ElementType::Reference.parent_arity(), ParentArity::Multi);
        assert_eq!(ElementType::Curve.parent_arity(), ParentArity::None);
    }
}
