use std::process::ExitCode;

use glint::{
    AppConfig, Camera, Color, Entity, Light, SLOT_ALBEDO, Vec2, Vec3, run_with_config,
};
use log::error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new()
        .title("Glint Demo")
        .size(1280, 720)
        .entity_budget(64);

    let result = run_with_config(config, |ctx| {
        let cube = ctx.mesh_cube();
        let sphere = ctx.mesh_sphere(32, 16);
        let plane = ctx.mesh_plane(12.0);

        let checker = ctx.texture_checkerboard(256, 8, [220, 220, 220], [60, 60, 70]);
        let checker = ctx.scene.texture(checker).clone();

        let floor_material = ctx.material(Color::WHITE);
        ctx.scene.material_mut(floor_material).set_roughness(0.9);
        ctx.scene
            .material_mut(floor_material)
            .add_texture(SLOT_ALBEDO, checker);
        ctx.scene
            .material_mut(floor_material)
            .set_uv_scale(Vec2::splat(3.0));

        let orange = ctx.material(Color::rgb(1.0, 0.45, 0.15));
        ctx.scene.material_mut(orange).set_roughness(0.3);
        let blue = ctx.material(Color::rgb(0.25, 0.5, 1.0));

        let floor = ctx.scene.add_entity(Entity::new(plane, floor_material));
        ctx.scene.entities_mut()[floor]
            .transform
            .set_translation(Vec3::new(0.0, -1.0, 0.0));

        let spinner = ctx.scene.add_entity(Entity::new(cube, orange));
        ctx.scene.entities_mut()[spinner]
            .transform
            .set_translation(Vec3::new(-1.5, 0.0, 0.0));

        // The two spheres share one material, so tint changes below affect
        // both.
        let orbiter = ctx.scene.add_entity(Entity::new(sphere, blue));
        let bobber = ctx.scene.add_entity(Entity::new(sphere, blue));
        ctx.scene.entities_mut()[bobber]
            .transform
            .set_translation(Vec3::new(1.5, 0.0, 0.0));

        ctx.scene.add_light(Light::directional(
            Vec3::new(0.3, -1.0, 0.5),
            0.8,
            Vec3::ONE,
        ));
        ctx.scene.add_light(Light::point(
            Vec3::new(0.0, 1.5, -1.0),
            1.2,
            Vec3::new(1.0, 0.85, 0.6),
            8.0,
        ));
        ctx.scene.add_light(Light::spot(
            Vec3::NEG_Y,
            Vec3::new(1.5, 3.0, 0.0),
            2.0,
            Vec3::new(0.4, 0.9, 1.0),
            10.0,
            0.2,
            0.5,
        ));

        let aspect = ctx.aspect();
        ctx.scene
            .add_camera(Camera::new(Vec3::new(0.0, 1.0, -6.0), aspect));
        let mut top_down = Camera::new(Vec3::new(0.0, 8.0, -0.01), aspect);
        top_down
            .transform
            .set_pitch_yaw_roll(Vec3::new(std::f32::consts::FRAC_PI_2 * 0.95, 0.0, 0.0));
        ctx.scene.add_camera(top_down);

        move |frame| {
            let t = frame.time;

            frame.scene.entities_mut()[spinner]
                .transform
                .rotate(Vec3::new(frame.dt * 0.7, frame.dt, 0.0));

            frame.scene.entities_mut()[orbiter]
                .transform
                .set_translation(Vec3::new(t.cos() * 3.0, 0.5, t.sin() * 3.0));

            frame.scene.entities_mut()[bobber]
                .transform
                .set_translation(Vec3::new(1.5, (t * 2.0).sin() * 0.5, 0.0));

            // Shared material: both spheres pulse together.
            let pulse = 0.75 + 0.25 * (t * 3.0).sin();
            frame
                .scene
                .material_mut(blue)
                .set_tint(Color::rgb(0.25 * pulse, 0.5 * pulse, pulse));
        }
    });

    if let Err(err) = result {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
