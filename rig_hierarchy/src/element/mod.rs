// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identity, typing, and per-element payloads.
//!
//! Elements are stored struct-of-arrays inside a
//! [`Hierarchy`](crate::hierarchy::Hierarchy) and addressed by
//! [`ElementIndex`] handles. The payload of each element is a closed
//! [`ElementData`] enum: transform elements own one four-slot transform set,
//! controls own three (pose, offset, shape), curves own a scalar.

mod control;
mod id;
mod kind;
mod weight;

use alloc::boxed::Box;
use alloc::vec::Vec;

pub use control::{
    AnimationType, AxisLimits, ControlLimits, ControlSettings, ControlType, PreferredEulerAngles,
};
pub use id::{ElementIndex, ElementKey, INVALID};
pub use kind::{ElementType, ElementTypeMask, ParentArity, TransformType};
pub use weight::{ElementWeight, ParentConstraint};

use crate::math::Transform;
use crate::storage::{RelinkMap, SlotIndex, TransformStorage};

/// Storage handles of one four-slot transform set and its dirty flags.
///
/// Slots are indexed by [`TransformType::slot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PoseSlots {
    pub(crate) transform: [SlotIndex; 4],
    pub(crate) dirty: [SlotIndex; 4],
}

impl PoseSlots {
    /// Allocates four identity transforms, all clean.
    pub(crate) fn allocate(storage: &mut TransformStorage) -> Self {
        let t = storage.transforms.allocate(4, Transform::IDENTITY);
        let d = storage.dirty.allocate(4, false);
        Self {
            transform: [t[0], t[1], t[2], t[3]],
            dirty: [d[0], d[1], d[2], d[3]],
        }
    }

    /// Returns all eight slots to the pools.
    pub(crate) fn release(&self, storage: &mut TransformStorage) {
        storage.transforms.deallocate(&self.transform);
        storage.dirty.deallocate(&self.dirty);
    }

    /// Rewrites every handle after compaction.
    pub(crate) fn relink(&mut self, transforms: &RelinkMap, dirty: &RelinkMap) {
        for slot in &mut self.transform {
            *slot = transforms.relink(*slot);
        }
        for slot in &mut self.dirty {
            *slot = dirty.relink(*slot);
        }
    }

    #[inline]
    pub(crate) fn get(&self, storage: &TransformStorage, ty: TransformType) -> Transform {
        storage.transforms[self.transform[ty.slot()]]
    }

    #[inline]
    pub(crate) fn set(&self, storage: &mut TransformStorage, ty: TransformType, value: Transform) {
        storage.transforms[self.transform[ty.slot()]] = value;
    }

    #[inline]
    pub(crate) fn is_dirty(&self, storage: &TransformStorage, ty: TransformType) -> bool {
        storage.dirty[self.dirty[ty.slot()]]
    }

    #[inline]
    pub(crate) fn set_dirty(&self, storage: &mut TransformStorage, ty: TransformType, dirty: bool) {
        storage.dirty[self.dirty[ty.slot()]] = dirty;
    }
}

/// Extra state carried by controls.
#[derive(Clone, Debug)]
pub(crate) struct ControlData {
    pub(crate) pose: PoseSlots,
    pub(crate) offset: PoseSlots,
    pub(crate) shape: PoseSlots,
    pub(crate) settings: ControlSettings,
    pub(crate) preferred: PreferredEulerAngles,
}

/// Scalar payload of a curve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurveData {
    /// Current value.
    pub value: f32,
    /// Whether the value was set since the last reset.
    pub is_set: bool,
}

/// Per-element payload, dispatched by pattern matching.
#[derive(Clone, Debug)]
pub(crate) enum ElementData {
    /// Bones, nulls, physics, references, connectors, sockets.
    Transform(PoseSlots),
    /// Controls.
    Control(Box<ControlData>),
    /// Curves.
    Curve(CurveData),
}

impl ElementData {
    /// Allocates the payload an element of `kind` needs.
    pub(crate) fn allocate(
        kind: ElementType,
        settings: ControlSettings,
        storage: &mut TransformStorage,
    ) -> Self {
        match kind {
            ElementType::Curve => Self::Curve(CurveData::default()),
            ElementType::Control => Self::Control(Box::new(ControlData {
                pose: PoseSlots::allocate(storage),
                offset: PoseSlots::allocate(storage),
                shape: PoseSlots::allocate(storage),
                preferred: PreferredEulerAngles::new(settings.preferred_rotation_order),
                settings,
            })),
            _ => Self::Transform(PoseSlots::allocate(storage)),
        }
    }

    /// Returns every storage slot to the pools.
    pub(crate) fn release(&self, storage: &mut TransformStorage) {
        for slots in self.slot_sets() {
            slots.release(storage);
        }
    }

    /// The pose slots, if this element has a transform.
    #[inline]
    pub(crate) fn pose(&self) -> Option<&PoseSlots> {
        match self {
            Self::Transform(slots) => Some(slots),
            Self::Control(control) => Some(&control.pose),
            Self::Curve(_) => None,
        }
    }

    #[inline]
    pub(crate) fn control(&self) -> Option<&ControlData> {
        match self {
            Self::Control(control) => Some(control),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn control_mut(&mut self) -> Option<&mut ControlData> {
        match self {
            Self::Control(control) => Some(control),
            _ => None,
        }
    }

    /// Every slot set owned by this element, pose first.
    pub(crate) fn slot_sets(&self) -> Vec<PoseSlots> {
        match self {
            Self::Transform(slots) => alloc::vec![*slots],
            Self::Control(control) => alloc::vec![control.pose, control.offset, control.shape],
            Self::Curve(_) => Vec::new(),
        }
    }

    /// Rewrites every slot handle after compaction.
    pub(crate) fn relink(&mut self, transforms: &RelinkMap, dirty: &RelinkMap) {
        match self {
            Self::Transform(slots) => slots.relink(transforms, dirty),
            Self::Control(control) => {
                control.pose.relink(transforms, dirty);
                control.offset.relink(transforms, dirty);
                control.shape.relink(transforms, dirty);
            }
            Self::Curve(_) => {}
        }
    }
}

/// Parent links of one element.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Parents {
    /// Curves.
    None,
    /// Zero or one parent.
    Single(Option<ElementIndex>),
    /// Weighted constraint list.
    Multi(Vec<ParentConstraint>),
}

impl Parents {
    pub(crate) fn for_arity(arity: ParentArity) -> Self {
        match arity {
            ParentArity::None => Self::None,
            ParentArity::Single => Self::Single(None),
            ParentArity::Multi => Self::Multi(Vec::new()),
        }
    }

    /// Every parent, in constraint order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = ElementIndex> + '_ {
        let (single, multi): (Option<ElementIndex>, &[ParentConstraint]) = match self {
            Self::None => (None, &[]),
            Self::Single(parent) => (*parent, &[]),
            Self::Multi(constraints) => (None, constraints.as_slice()),
        };
        single.into_iter().chain(multi.iter().map(|c| c.parent))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::None | Self::Single(None) => 0,
            Self::Single(Some(_)) => 1,
            Self::Multi(constraints) => constraints.len(),
        }
    }

    #[inline]
    pub(crate) fn constraints(&self) -> &[ParentConstraint] {
        match self {
            Self::Multi(constraints) => constraints,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_slots_round_trip_values_and_flags() {
        let mut storage = TransformStorage::default();
        let slots = PoseSlots::allocate(&mut storage);
        let t = Transform::from_translation(crate::math::Vec3::new(1.0, 2.0, 3.0));
        slots.set(&mut storage, TransformType::CurrentGlobal, t);
        slots.set_dirty(&mut storage, TransformType::CurrentLocal, true);
        assert_eq!(slots.get(&storage, TransformType::CurrentGlobal), t);
        assert_eq!(
            slots.get(&storage, TransformType::InitialGlobal),
            Transform::IDENTITY
        );
        assert!(slots.is_dirty(&storage, TransformType::CurrentLocal));
        assert!(!slots.is_dirty(&storage, TransformType::CurrentGlobal));
    }

    #[test]
    fn control_payload_owns_three_slot_sets() {
        let mut storage = TransformStorage::default();
        let data = ElementData::allocate(
            ElementType::Control,
            ControlSettings::default(),
            &mut storage,
        );
        assert_eq!(data.slot_sets().len(), 3);
        assert_eq!(storage.transforms.len(), 12);
        data.release(&mut storage);
        assert_eq!(storage.transforms.num_free(), 12);
    }

    #[test]
    fn curve_payload_owns_no_storage() {
        let mut storage = TransformStorage::default();
        let data = ElementData::allocate(ElementType::Curve, ControlSettings::default(), &mut storage);
        assert!(data.pose().is_none());
        assert!(storage.transforms.is_empty());
    }

    #[test]
    fn parents_iterate_in_order() {
        let a = ElementIndex {
            idx: 0,
            generation: 0,
        };
        let b = ElementIndex {
            idx: 1,
            generation: 0,
        };
        let multi = Parents::Multi(alloc::vec![
            ParentConstraint {
                parent: a,
                weight: ElementWeight::FULL,
                initial_weight: ElementWeight::FULL,
            },
            ParentConstraint {
                parent: b,
                weight: ElementWeight::ZERO,
                initial_weight: ElementWeight::ZERO,
            },
        ]);
        let parents: Vec<_> = multi.iter().collect();
        assert_eq!(parents, alloc::vec![a, b]);
        assert_eq!(Parents::Single(Some(b)).len(), 1);
        assert_eq!(Parents::None.len(), 0);
    }
}
