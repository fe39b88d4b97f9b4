// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted multi-parent constraint solving.
//!
//! [`effective_parent`] blends the transforms of several weighted parents into
//! one parent transform. [`solve`] composes a child's local pose and offset on
//! top of it to produce the child's global transform, and [`inverse_solve`]
//! maps a global transform back into the child's local space under the same
//! blend, so the two are exact inverses whenever the blended scale has no
//! zero axis.
//!
//! Each channel (location, rotation, scale) is blended independently:
//!
//! | active constraints | location / scale         | rotation                  |
//! |--------------------|--------------------------|---------------------------|
//! | 0                  | identity                 | identity                  |
//! | 1                  | copied from the parent   | copied from the parent    |
//! | 2                  | lerp by `wB / (wA + wB)` | slerp by `wB / (wA + wB)` |
//! | N                  | weighted sum             | hemisphere-corrected sum  |
//!
//! A constraint is active on a channel when its clamped weight on that
//! channel exceeds [`SMALL_NUMBER`]. Parent transforms are fetched through
//! the caller's `parent_of` callback at most once per constraint per call.

use alloc::vec;
use alloc::vec::Vec;

use crate::element::{ElementIndex, ElementWeight, ParentConstraint, TransformType};
use crate::math::{Quat, SMALL_NUMBER, Transform, Vec3};

/// Lerp factor between two weights, `0` when both vanish.
#[inline]
#[must_use]
pub fn weight_for_lerp(a: f64, b: f64) -> f64 {
    let (a, b) = (a.max(0.0), b.max(0.0));
    let sum = a + b;
    if sum <= SMALL_NUMBER { 0.0 } else { b / sum }
}

// ---------------------------------------------------------------------------
// Channel bookkeeping
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Location,
    Rotation,
    Scale,
}

impl Channel {
    const ALL: [Self; 3] = [Self::Location, Self::Rotation, Self::Scale];

    fn of(self, w: &ElementWeight) -> f64 {
        match self {
            Self::Location => w.location,
            Self::Rotation => w.rotation,
            Self::Scale => w.scale,
        }
    }
}

/// Active count, first two active constraints, and weight total of one
/// channel.
#[derive(Clone, Copy, Debug, Default)]
struct ChannelStats {
    count: usize,
    first: Option<usize>,
    second: Option<usize>,
    total: f64,
}

impl ChannelStats {
    fn collect(weights: &[ElementWeight], channel: Channel) -> Self {
        let mut stats = Self::default();
        for (i, weight) in weights.iter().enumerate() {
            let w = channel.of(weight);
            if w <= SMALL_NUMBER {
                continue;
            }
            stats.count += 1;
            stats.total += w;
            if stats.first.is_none() {
                stats.first = Some(i);
            } else if stats.second.is_none() {
                stats.second = Some(i);
            }
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Per-call constraint cache
// ---------------------------------------------------------------------------

/// Memoizes each constraint's parent transform for one solve call.
struct ConstraintCache<'a, F> {
    constraints: &'a [ParentConstraint],
    ty: TransformType,
    cache: Vec<Option<Transform>>,
    parent_of: F,
}

impl<'a, F> ConstraintCache<'a, F>
where
    F: FnMut(ElementIndex, TransformType) -> Transform,
{
    fn new(constraints: &'a [ParentConstraint], ty: TransformType, parent_of: F) -> Self {
        Self {
            constraints,
            ty,
            cache: vec![None; constraints.len()],
            parent_of,
        }
    }

    fn get(&mut self, i: usize) -> Transform {
        if let Some(t) = self.cache[i] {
            return t;
        }
        let t = (self.parent_of)(self.constraints[i].parent, self.ty).normalized();
        self.cache[i] = Some(t);
        t
    }
}

/// Accumulates a weighted quaternion sum, flipping samples that lie in the
/// opposite hemisphere from the first one.
#[derive(Clone, Copy, Debug)]
struct QuatAccumulator {
    first: Option<Quat>,
    sum: Quat,
}

impl QuatAccumulator {
    fn new() -> Self {
        Self {
            first: None,
            sum: Quat::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    fn add(&mut self, rotation: Quat, weight: f64) {
        let rotation = rotation.normalized();
        let weight = match self.first {
            None => {
                self.first = Some(rotation);
                weight
            }
            Some(first) if rotation.dot(first) < 0.0 => -weight,
            Some(_) => weight,
        };
        self.sum = self.sum + rotation.scaled(weight);
    }

    fn finish(self) -> Quat {
        self.sum.normalized()
    }
}

// ---------------------------------------------------------------------------
// Solve
// ---------------------------------------------------------------------------

/// Blends the parents of a multi-parent element into one transform of type
/// `ty`.
///
/// With no active constraint on any channel the result is the identity.
pub fn effective_parent<F>(
    constraints: &[ParentConstraint],
    ty: TransformType,
    parent_of: F,
) -> Transform
where
    F: FnMut(ElementIndex, TransformType) -> Transform,
{
    let initial = ty.is_initial();
    let weights: Vec<ElementWeight> = constraints
        .iter()
        .map(|c| c.weight_for(initial).clamped())
        .collect();
    let mut cache = ConstraintCache::new(constraints, ty, parent_of);

    let stats = Channel::ALL.map(|channel| ChannelStats::collect(&weights, channel));

    // Single constraint driving every channel.
    if stats.iter().all(|s| s.count == 1) && stats.iter().all(|s| s.first == stats[0].first) {
        if let Some(i) = stats[0].first {
            return cache.get(i);
        }
    }

    let mut result = Transform::IDENTITY;
    for (channel, s) in Channel::ALL.into_iter().zip(stats) {
        match channel {
            Channel::Location => {
                result.translation = match (s.count, s.first, s.second) {
                    (0, ..) => Vec3::ZERO,
                    (1, Some(a), _) => cache.get(a).translation,
                    (2, Some(a), Some(b)) => {
                        let t = weight_for_lerp(weights[a].location, weights[b].location);
                        cache.get(a).translation.lerp(cache.get(b).translation, t)
                    }
                    _ => {
                        let mut sum = Vec3::ZERO;
                        for (i, w) in weights.iter().enumerate() {
                            if w.affects_location() {
                                sum += cache.get(i).translation * (w.location / s.total);
                            }
                        }
                        sum
                    }
                };
            }
            Channel::Rotation => {
                result.rotation = match (s.count, s.first, s.second) {
                    (0, ..) => Quat::IDENTITY,
                    (1, Some(a), _) => cache.get(a).rotation,
                    (2, Some(a), Some(b)) => {
                        let t = weight_for_lerp(weights[a].rotation, weights[b].rotation);
                        cache.get(a).rotation.slerp(cache.get(b).rotation, t)
                    }
                    _ => {
                        let mut acc = QuatAccumulator::new();
                        for (i, w) in weights.iter().enumerate() {
                            if w.affects_rotation() {
                                acc.add(cache.get(i).rotation, w.rotation / s.total);
                            }
                        }
                        acc.finish()
                    }
                };
            }
            Channel::Scale => {
                result.scale = match (s.count, s.first, s.second) {
                    (0, ..) => Vec3::ONE,
                    (1, Some(a), _) => cache.get(a).scale,
                    (2, Some(a), Some(b)) => {
                        let t = weight_for_lerp(weights[a].scale, weights[b].scale);
                        cache.get(a).scale.lerp(cache.get(b).scale, t)
                    }
                    _ => {
                        let mut sum = Vec3::ZERO;
                        for (i, w) in weights.iter().enumerate() {
                            if w.affects_scale() {
                                sum += cache.get(i).scale * (w.scale / s.total);
                            }
                        }
                        sum
                    }
                };
            }
        }
    }

    result.normalized()
}

/// Computes a child's transform of type `ty` from its weighted parents as
/// `pose * (offset * parent)`.
///
/// For a global `ty` with `pose` set to the child's local transform, the
/// result is the child's global transform; with neither `offset` nor `pose`
/// it is the [`effective_parent`].
pub fn solve<F>(
    constraints: &[ParentConstraint],
    ty: TransformType,
    offset: Option<&Transform>,
    pose: Option<&Transform>,
    parent_of: F,
) -> Transform
where
    F: FnMut(ElementIndex, TransformType) -> Transform,
{
    let mut result = effective_parent(constraints, ty, parent_of);
    if let Some(offset) = offset {
        result = *offset * result;
    }
    if let Some(pose) = pose {
        result = *pose * result;
    }
    result.normalized()
}

/// Maps `global` back into the child's local space:
/// `global.relative_to(offset * parent)`.
///
/// Only the initial/current flag of `ty` selects the weights and parent
/// transforms.
///
/// # Panics
///
/// Panics if `ty` is a local transform type.
pub fn inverse_solve<F>(
    global: &Transform,
    constraints: &[ParentConstraint],
    ty: TransformType,
    offset: Option<&Transform>,
    parent_of: F,
) -> Transform
where
    F: FnMut(ElementIndex, TransformType) -> Transform,
{
    assert!(
        ty.is_global(),
        "inverse_solve expects a global transform type"
    );
    let mut parent = effective_parent(constraints, ty, parent_of);
    if let Some(offset) = offset {
        parent = *offset * parent;
    }
    global.relative_to(&parent).normalized()
}
