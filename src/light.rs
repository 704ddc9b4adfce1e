//! Light sources and their GPU representation.
//!
//! [`Light`] is one plain-old-data record shared by all three light kinds,
//! distinguished by a type tag. The layout is the shader-side layout: 64
//! bytes, with every scalar packed against the preceding `[f32; 3]` so each
//! 16-byte row is fully used. The fragment shader indexes an array of these
//! directly, so the byte layout here is a contract with `shaders/mesh.wgsl`.

use glam::Vec3;

pub const LIGHT_TYPE_DIRECTIONAL: i32 = 0;
pub const LIGHT_TYPE_POINT: i32 = 1;
pub const LIGHT_TYPE_SPOT: i32 = 2;

/// Maximum number of lights uploaded per frame.
pub const MAX_LIGHTS: usize = 8;

/// A single light source, in the exact layout the fragment shader reads.
///
/// Constructors zero every field their light kind does not use, so two
/// lights built from the same arguments are bytewise identical.
///
/// The spot cone angles are a convention, not an enforced invariant: the
/// shader assumes `spot_inner_angle < spot_outer_angle` and callers are
/// expected to keep it that way.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Light {
    /// One of the `LIGHT_TYPE_*` constants.
    pub kind: i32,
    /// Direction the light points, for directional and spot lights.
    pub direction: [f32; 3],
    /// Maximum attenuation range for point and spot lights.
    pub range: f32,
    /// World-space position for point and spot lights.
    pub position: [f32; 3],
    /// Brightness multiplier, used by all kinds.
    pub intensity: f32,
    /// Light color, used by all kinds.
    pub color: [f32; 3],
    /// Inside this cone angle (radians) a spot light is at full intensity.
    pub spot_inner_angle: f32,
    /// Outside this cone angle (radians) a spot light contributes nothing.
    pub spot_outer_angle: f32,
    /// Pads the record to a 16-byte boundary for the shader array stride.
    pub _padding: [f32; 2],
}

impl Light {
    pub const DEFAULT_RANGE: f32 = 5.0;
    pub const DEFAULT_SPOT_INNER: f32 = 0.1;
    pub const DEFAULT_SPOT_OUTER: f32 = 0.5;

    /// A light infinitely far away, shining along `direction`.
    pub fn directional(direction: Vec3, intensity: f32, color: Vec3) -> Self {
        Self {
            kind: LIGHT_TYPE_DIRECTIONAL,
            direction: direction.to_array(),
            intensity,
            color: color.to_array(),
            ..bytemuck::Zeroable::zeroed()
        }
    }

    /// An omnidirectional light at `position` attenuating out to `range`.
    pub fn point(position: Vec3, intensity: f32, color: Vec3, range: f32) -> Self {
        Self {
            kind: LIGHT_TYPE_POINT,
            position: position.to_array(),
            range,
            intensity,
            color: color.to_array(),
            ..bytemuck::Zeroable::zeroed()
        }
    }

    /// A cone of light at `position` pointing along `direction`.
    pub fn spot(
        direction: Vec3,
        position: Vec3,
        intensity: f32,
        color: Vec3,
        range: f32,
        inner_angle: f32,
        outer_angle: f32,
    ) -> Self {
        Self {
            kind: LIGHT_TYPE_SPOT,
            direction: direction.to_array(),
            position: position.to_array(),
            range,
            intensity,
            color: color.to_array(),
            spot_inner_angle: inner_angle,
            spot_outer_angle: outer_angle,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_is_64_bytes() {
        // The fragment shader reads an array with a 64-byte stride.
        assert_eq!(std::mem::size_of::<Light>(), 64);
        assert_eq!(std::mem::offset_of!(Light, range), 16);
        assert_eq!(std::mem::offset_of!(Light, intensity), 32);
        assert_eq!(std::mem::offset_of!(Light, spot_inner_angle), 48);
    }

    #[test]
    fn directional_zeroes_unused_fields() {
        let light = Light::directional(Vec3::new(0.0, -1.0, 0.0), 1.0, Vec3::ONE);
        assert_eq!(light.kind, LIGHT_TYPE_DIRECTIONAL);
        assert_eq!(light.position, [0.0; 3]);
        assert_eq!(light.range, 0.0);
        assert_eq!(light.spot_inner_angle, 0.0);
        assert_eq!(light.spot_outer_angle, 0.0);
        assert_eq!(light._padding, [0.0; 2]);
    }

    #[test]
    fn point_zeroes_unused_fields() {
        let light = Light::point(Vec3::new(1.0, 2.0, 3.0), 0.5, Vec3::X, 7.0);
        assert_eq!(light.kind, LIGHT_TYPE_POINT);
        assert_eq!(light.direction, [0.0; 3]);
        assert_eq!(light.spot_inner_angle, 0.0);
        assert_eq!(light.range, 7.0);
    }

    #[test]
    fn constructors_round_trip_exactly() {
        let light = Light::spot(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            2.0,
            Vec3::new(1.0, 0.9, 0.8),
            Light::DEFAULT_RANGE,
            Light::DEFAULT_SPOT_INNER,
            Light::DEFAULT_SPOT_OUTER,
        );
        assert_eq!(light.direction, [0.0, -1.0, 0.0]);
        assert_eq!(light.position, [0.0, 4.0, 0.0]);
        assert_eq!(light.intensity, 2.0);
        assert_eq!(light.color, [1.0, 0.9, 0.8]);
        assert_eq!(light.range, 5.0);
        assert_eq!(light.spot_inner_angle, 0.1);
        assert_eq!(light.spot_outer_angle, 0.5);

        // Identical arguments produce bytewise-identical lights.
        let again = Light::spot(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            2.0,
            Vec3::new(1.0, 0.9, 0.8),
            Light::DEFAULT_RANGE,
            Light::DEFAULT_SPOT_INNER,
            Light::DEFAULT_SPOT_OUTER,
        );
        assert_eq!(bytemuck::bytes_of(&light), bytemuck::bytes_of(&again));
    }
}
