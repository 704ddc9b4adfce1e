//! Spatial transform with lazily cached world matrices.
//!
//! [`Transform`] stores scale, pitch/yaw/roll Euler angles, and translation
//! as plain values, and derives two groups of cached data from them:
//!
//! - the world matrix and its inverse transpose (for transforming normals
//!   under non-uniform scale), guarded by one dirty flag;
//! - the local right/up/forward basis vectors, guarded by a second,
//!   independent dirty flag.
//!
//! Mutators only raise flags; the matrices are recomputed on the next read
//! that needs them. A transform that is mutated many times per frame pays
//! for exactly one recomposition when the renderer reads it.
//!
//! # Conventions
//!
//! Left-handed, +Z forward, +Y up. The world matrix composes as Scale,
//! then Rotate, then Translate (SRT). Rotation applies yaw around Y, then
//! pitch around X, then roll around Z — the same orientation you get from
//! rotating the canonical axes by [`Transform::orientation`].

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, rotation, and scale with cached derived matrices.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use glint::Transform;
///
/// let mut t = Transform::new();
/// t.set_translation(Vec3::new(0.0, 2.0, -5.0));
/// t.rotate(Vec3::new(0.0, 0.3, 0.0));
///
/// let world = t.world_matrix(); // recomputed here, then cached
/// ```
#[derive(Clone, Debug)]
pub struct Transform {
    scale: Vec3,
    pitch_yaw_roll: Vec3,
    translation: Vec3,

    world: Mat4,
    world_inverse_transpose: Mat4,
    world_dirty: bool,

    right: Vec3,
    up: Vec3,
    forward: Vec3,
    basis_dirty: bool,

    recompute_count: u32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            pitch_yaw_roll: Vec3::ZERO,
            translation: Vec3::ZERO,
            world: Mat4::IDENTITY,
            world_inverse_transpose: Mat4::IDENTITY,
            world_dirty: false,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
            basis_dirty: false,
            recompute_count: 0,
        }
    }
}

impl Transform {
    /// Creates an identity transform (origin, no rotation, unit scale).
    ///
    /// The cached matrices are valid immediately; no recomputation happens
    /// until after the first mutation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Euler angles in radians: pitch around X, yaw around Y, roll around Z.
    pub fn pitch_yaw_roll(&self) -> Vec3 {
        self.pitch_yaw_roll
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// The orientation quaternion built from the current Euler angles.
    ///
    /// Yaw is applied first, then pitch, then roll.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.pitch_yaw_roll.y,
            self.pitch_yaw_roll.x,
            self.pitch_yaw_roll.z,
        )
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.world_dirty = true;
    }

    pub fn set_pitch_yaw_roll(&mut self, pitch_yaw_roll: Vec3) {
        self.pitch_yaw_roll = pitch_yaw_roll;
        self.world_dirty = true;
        self.basis_dirty = true;
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.world_dirty = true;
    }

    /// Multiplies the current scale component-wise.
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.world_dirty = true;
    }

    /// Accumulates Euler angles by raw addition.
    ///
    /// This is not quaternion composition: angles add independently per
    /// axis, so setter/getter round-trips stay exact and the camera's
    /// pitch clamp can operate on the stored angles directly.
    pub fn rotate(&mut self, pitch_yaw_roll: Vec3) {
        self.pitch_yaw_roll += pitch_yaw_roll;
        self.world_dirty = true;
        self.basis_dirty = true;
    }

    /// Moves along the world axes, ignoring orientation.
    pub fn move_absolute(&mut self, offset: Vec3) {
        self.translation += offset;
        self.world_dirty = true;
    }

    /// Moves along the transform's own axes.
    ///
    /// The offset is rotated by the current orientation before being added
    /// to the translation, so `(0, 0, 1)` moves along the local forward
    /// vector wherever the transform is facing.
    pub fn move_relative(&mut self, offset: Vec3) {
        self.translation += self.orientation() * offset;
        self.world_dirty = true;
    }

    /// The world matrix, recomputed only if a mutation happened since the
    /// last read.
    pub fn world_matrix(&mut self) -> Mat4 {
        self.refresh_world();
        self.world
    }

    /// Inverse transpose of the world matrix, for normal transformation.
    ///
    /// Kept in lockstep with [`world_matrix`](Self::world_matrix): both are
    /// recomputed together under the same dirty flag.
    pub fn world_inverse_transpose(&mut self) -> Mat4 {
        self.refresh_world();
        self.world_inverse_transpose
    }

    /// The local +X axis in world orientation.
    pub fn right(&mut self) -> Vec3 {
        self.refresh_basis();
        self.right
    }

    /// The local +Y axis in world orientation.
    pub fn up(&mut self) -> Vec3 {
        self.refresh_basis();
        self.up
    }

    /// The local +Z axis in world orientation (left-handed forward).
    pub fn forward(&mut self) -> Vec3 {
        self.refresh_basis();
        self.forward
    }

    /// How many times the world matrix has been recomputed.
    ///
    /// Surfaced by the debug overlay to show how well the lazy cache is
    /// holding up against per-frame mutation patterns.
    pub fn recompute_count(&self) -> u32 {
        self.recompute_count
    }

    fn refresh_world(&mut self) {
        if !self.world_dirty {
            return;
        }
        self.world =
            Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.translation);
        self.world_inverse_transpose = self.world.inverse().transpose();
        self.world_dirty = false;
        self.recompute_count += 1;
    }

    fn refresh_basis(&mut self) {
        if !self.basis_dirty {
            return;
        }
        // All three axes rebuilt in one pass; they share the flag.
        let q = self.orientation();
        self.right = q * Vec3::X;
        self.up = q * Vec3::Y;
        self.forward = q * Vec3::Z;
        self.basis_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn fresh_world(t: &Transform) -> Mat4 {
        Mat4::from_scale_rotation_translation(t.scale(), t.orientation(), t.translation())
    }

    #[test]
    fn cached_world_matches_fresh_recomposition() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(2.0, 1.0, 0.5));
        t.rotate(Vec3::new(0.1, 0.2, 0.3));
        t.move_absolute(Vec3::new(1.0, -2.0, 3.0));
        t.move_relative(Vec3::new(0.0, 0.0, 1.0));
        t.scale_by(Vec3::new(1.0, 3.0, 1.0));

        let expected = fresh_world(&t);
        assert_eq!(t.world_matrix(), expected);
    }

    #[test]
    fn world_read_is_idempotent() {
        let mut t = Transform::new();
        t.set_translation(Vec3::new(4.0, 5.0, 6.0));

        let first = t.world_matrix();
        assert_eq!(t.recompute_count(), 1);

        // Repeated reads return the identical matrix without recomputing.
        let second = t.world_matrix();
        let wit = t.world_inverse_transpose();
        assert_eq!(first, second);
        assert_eq!(t.recompute_count(), 1);
        assert_eq!(wit, t.world_inverse_transpose());
    }

    #[test]
    fn construction_needs_no_recompute() {
        let mut t = Transform::new();
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
        assert_eq!(t.recompute_count(), 0);
    }

    #[test]
    fn every_mutator_raises_the_world_flag() {
        let mutators: Vec<Box<dyn Fn(&mut Transform)>> = vec![
            Box::new(|t| t.set_scale(Vec3::splat(2.0))),
            Box::new(|t| t.set_pitch_yaw_roll(Vec3::new(0.1, 0.0, 0.0))),
            Box::new(|t| t.set_translation(Vec3::X)),
            Box::new(|t| t.scale_by(Vec3::splat(0.5))),
            Box::new(|t| t.rotate(Vec3::new(0.0, 0.1, 0.0))),
            Box::new(|t| t.move_absolute(Vec3::Y)),
            Box::new(|t| t.move_relative(Vec3::Z)),
        ];

        for mutate in &mutators {
            let mut t = Transform::new();
            t.world_matrix();
            let before = t.recompute_count();
            mutate(&mut t);
            t.world_matrix();
            assert_eq!(t.recompute_count(), before + 1);
        }
    }

    #[test]
    fn move_relative_with_no_rotation_equals_move_absolute() {
        let mut a = Transform::new();
        let mut b = Transform::new();
        a.move_relative(Vec3::new(1.0, 2.0, 3.0));
        b.move_absolute(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(a.translation(), b.translation());
    }

    #[test]
    fn move_relative_follows_yaw() {
        // Facing 90 degrees right: local forward is world +X.
        let mut t = Transform::new();
        t.set_pitch_yaw_roll(Vec3::new(0.0, FRAC_PI_2, 0.0));
        t.move_relative(Vec3::new(0.0, 0.0, 1.0));

        let p = t.translation();
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn basis_vectors_follow_orientation() {
        let mut t = Transform::new();
        assert_eq!(t.forward(), Vec3::Z);
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.up(), Vec3::Y);

        t.set_pitch_yaw_roll(Vec3::new(0.0, FRAC_PI_2, 0.0));
        let f = t.forward();
        assert_abs_diff_eq!(f.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.z, 0.0, epsilon = 1e-6);

        let r = t.right();
        assert_abs_diff_eq!(r.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn basis_flag_is_independent_of_world_flag() {
        let mut t = Transform::new();
        // Translation dirties the world matrix but not the basis.
        t.set_translation(Vec3::new(7.0, 0.0, 0.0));
        assert_eq!(t.forward(), Vec3::Z);
        assert_eq!(t.recompute_count(), 0);
        t.world_matrix();
        assert_eq!(t.recompute_count(), 1);
    }

    #[test]
    fn rotation_accumulates_by_addition() {
        let mut t = Transform::new();
        t.rotate(Vec3::new(FRAC_PI_4, 0.0, 0.0));
        t.rotate(Vec3::new(FRAC_PI_4, 0.1, 0.0));
        assert_abs_diff_eq!(t.pitch_yaw_roll().x, FRAC_PI_2, epsilon = 1e-6);
        assert_abs_diff_eq!(t.pitch_yaw_roll().y, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn scaled_rotated_translated_point_lands_where_expected() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(2.0, 1.0, 1.0));
        t.set_pitch_yaw_roll(Vec3::new(0.0, FRAC_PI_2, 0.0));
        t.set_translation(Vec3::new(5.0, 0.0, 0.0));

        // Local (1,0,0) scales to (2,0,0), yaws onto -Z, translates to (5,0,-2).
        let p = t.world_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(p.x, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn inverse_transpose_preserves_normals_under_nonuniform_scale() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(4.0, 1.0, 1.0));

        // A normal on a surface slanted in X must not be stretched along X.
        let n = Vec3::new(1.0, 1.0, 0.0).normalize();
        let transformed = t
            .world_inverse_transpose()
            .transform_vector3(n)
            .normalize();
        let naive = t.world_matrix().transform_vector3(n).normalize();

        assert!(transformed.x < naive.x);
        assert_abs_diff_eq!(transformed.length(), 1.0, epsilon = 1e-6);
    }
}
