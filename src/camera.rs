//! First-person camera with cached view and projection matrices.
//!
//! The camera owns a [`Transform`] for its pose and derives a left-handed
//! view matrix from it each time the pose changes. The projection matrix is
//! only rebuilt when [`Camera::update_projection`] is called with a new
//! aspect ratio, which the app does on window resize.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::input::Input;
use crate::transform::Transform;

/// Which projection the camera builds on [`Camera::update_projection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// A free-flying camera driven by WASD + mouse look.
///
/// # Controls
///
/// - `W`/`A`/`S`/`D` — move relative to the camera's orientation
/// - `E`/`Q` — move straight up/down in world space
/// - `Shift` — 5x movement speed, `Ctrl` — half speed
/// - Left mouse drag — look around; pitch is clamped to ±90° and roll is
///   forced to zero so the horizon stays level
///
/// # View convention
///
/// The view matrix looks along the transform's forward vector with the
/// world up axis `(0, 1, 0)`, so roll on the transform never tilts the
/// view. Left-handed throughout.
pub struct Camera {
    /// The camera's pose. Public so scene setup can place it directly.
    pub transform: Transform,
    /// World units per second at base speed.
    pub move_speed: f32,
    /// Radians per pixel of mouse movement.
    pub look_speed: f32,

    projection: Projection,
    fov_radians: f32,
    near: f32,
    far: f32,
    ortho_width: f32,
    aspect: f32,

    view: Mat4,
    proj: Mat4,
}

impl Camera {
    pub const DEFAULT_FOV_RADIANS: f32 = std::f32::consts::FRAC_PI_4;
    pub const DEFAULT_NEAR: f32 = 0.0001;
    pub const DEFAULT_FAR: f32 = 1000.0;
    pub const DEFAULT_MOVE_SPEED: f32 = 1.0;
    pub const DEFAULT_LOOK_SPEED: f32 = 0.005;
    pub const DEFAULT_ORTHO_WIDTH: f32 = 10.0;

    /// Creates a perspective camera at `position` with default parameters.
    ///
    /// Both matrices are computed immediately, so the camera is valid for
    /// rendering before the first [`update`](Self::update) call.
    pub fn new(position: Vec3, aspect: f32) -> Self {
        let mut transform = Transform::new();
        transform.set_translation(position);

        let mut camera = Self {
            transform,
            move_speed: Self::DEFAULT_MOVE_SPEED,
            look_speed: Self::DEFAULT_LOOK_SPEED,
            projection: Projection::Perspective,
            fov_radians: Self::DEFAULT_FOV_RADIANS,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            ortho_width: Self::DEFAULT_ORTHO_WIDTH,
            aspect,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };
        camera.refresh_view();
        camera.update_projection(aspect);
        camera
    }

    /// Sets the vertical field of view and rebuilds the projection.
    pub fn set_fov(&mut self, fov_radians: f32) {
        self.fov_radians = fov_radians;
        self.update_projection(self.aspect);
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_radians
    }

    pub fn projection_kind(&self) -> Projection {
        self.projection
    }

    /// Switches between perspective and orthographic projection.
    pub fn set_projection_kind(&mut self, projection: Projection) {
        self.projection = projection;
        self.update_projection(self.aspect);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    /// Applies one frame of keyboard movement and mouse look, then
    /// refreshes the view matrix.
    pub fn update(&mut self, input: &Input, dt: f32) {
        let mut speed = self.move_speed;
        if input.key_down(KeyCode::ShiftLeft) || input.key_down(KeyCode::ShiftRight) {
            speed *= 5.0;
        }
        if input.key_down(KeyCode::ControlLeft) || input.key_down(KeyCode::ControlRight) {
            speed *= 0.5;
        }
        let step = speed * dt;

        // Horizontal movement is relative to the camera's orientation.
        if input.key_down(KeyCode::KeyW) {
            self.transform.move_relative(Vec3::new(0.0, 0.0, step));
        }
        if input.key_down(KeyCode::KeyS) {
            self.transform.move_relative(Vec3::new(0.0, 0.0, -step));
        }
        if input.key_down(KeyCode::KeyD) {
            self.transform.move_relative(Vec3::new(step, 0.0, 0.0));
        }
        if input.key_down(KeyCode::KeyA) {
            self.transform.move_relative(Vec3::new(-step, 0.0, 0.0));
        }

        // Vertical movement is absolute.
        if input.key_down(KeyCode::KeyE) {
            self.transform.move_absolute(Vec3::new(0.0, step, 0.0));
        }
        if input.key_down(KeyCode::KeyQ) {
            self.transform.move_absolute(Vec3::new(0.0, -step, 0.0));
        }

        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.transform.rotate(Vec3::new(
                delta.y * self.look_speed,
                delta.x * self.look_speed,
                0.0,
            ));

            // Clamp pitch so the camera can't flip over, and zero out any
            // roll that crept in.
            let angles = self.transform.pitch_yaw_roll();
            self.transform.set_pitch_yaw_roll(Vec3::new(
                angles.x.clamp(-FRAC_PI_2, FRAC_PI_2),
                angles.y,
                0.0,
            ));
        }

        self.refresh_view();
    }

    /// Rebuilds the projection matrix for a new aspect ratio.
    ///
    /// Only called on explicit demand (window resize); a degenerate aspect
    /// ratio is passed through unvalidated.
    pub fn update_projection(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.proj = match self.projection {
            Projection::Perspective => {
                Mat4::perspective_lh(self.fov_radians, aspect, self.near, self.far)
            }
            Projection::Orthographic => {
                let half_width = self.ortho_width * 0.5;
                let half_height = half_width / aspect;
                Mat4::orthographic_lh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        };
    }

    fn refresh_view(&mut self) {
        let eye = self.transform.translation();
        let forward = self.transform.forward();
        // Look-to with the world up axis: roll never affects the view.
        self.view = Mat4::look_to_lh(eye, forward, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn camera_is_valid_immediately_after_construction() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, -5.0), 16.0 / 9.0);
        assert_ne!(camera.view_matrix(), Mat4::IDENTITY);
        assert_ne!(camera.projection_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn view_matrix_moves_world_opposite_to_camera() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, -5.0), 1.0);
        // A point at the origin should sit 5 units in front of the camera.
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_abs_diff_eq!(p.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn view_is_invariant_to_roll() {
        let mut a = Camera::new(Vec3::new(1.0, 2.0, 3.0), 1.0);
        let mut b = Camera::new(Vec3::new(1.0, 2.0, 3.0), 1.0);

        a.transform
            .set_pitch_yaw_roll(Vec3::new(0.2, 0.7, 0.0));
        b.transform
            .set_pitch_yaw_roll(Vec3::new(0.2, 0.7, 1.3));
        a.refresh_view();
        b.refresh_view();

        let va = a.view_matrix().to_cols_array();
        let vb = b.view_matrix().to_cols_array();
        for (x, y) in va.iter().zip(vb.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-5);
        }
    }

    #[test]
    fn projection_only_rebuilds_on_explicit_call() {
        let mut camera = Camera::new(Vec3::ZERO, 2.0);
        let before = camera.projection_matrix();

        // Pose changes must not touch the projection.
        camera.transform.set_translation(Vec3::new(9.0, 9.0, 9.0));
        camera.refresh_view();
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection(1.0);
        assert_ne!(camera.projection_matrix(), before);
    }

    #[test]
    fn perspective_projection_matches_glam() {
        let camera = Camera::new(Vec3::ZERO, 1.5);
        let expected = Mat4::perspective_lh(
            FRAC_PI_4,
            1.5,
            Camera::DEFAULT_NEAR,
            Camera::DEFAULT_FAR,
        );
        assert_eq!(camera.projection_matrix(), expected);
    }

    #[test]
    fn orthographic_projection_uses_aspect_for_height() {
        let mut camera = Camera::new(Vec3::ZERO, 2.0);
        camera.set_projection_kind(Projection::Orthographic);
        let expected = Mat4::orthographic_lh(
            -5.0,
            5.0,
            -2.5,
            2.5,
            Camera::DEFAULT_NEAR,
            Camera::DEFAULT_FAR,
        );
        assert_eq!(camera.projection_matrix(), expected);
    }
}
