//! Window lifecycle and the per-frame driver loop.
//!
//! [`run`] owns the winit event loop. The caller provides a setup closure
//! that builds the scene and returns a frame closure; the frame closure is
//! invoked once per redraw with mutable access to the scene and overlay.
//!
//! Built-in bindings, handled before the frame closure sees input:
//! `Escape` exits, `F1` toggles the debug overlay, and `1`-`9` switch the
//! active camera.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::Error;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::overlay::{Color, Overlay};
use crate::renderer::Renderer;
use crate::scene::{MaterialId, MeshId, Scene, TextureId};
use crate::texture::Texture;

const CAMERA_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Configuration for the app window and renderer.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Most entities a single frame may draw; sizes the uniform ring.
    pub entity_budget: u32,
    /// TTF/OTF file for overlay text. Without one the overlay draws
    /// rectangles only.
    pub font_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Glint".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            entity_budget: 256,
            font_path: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn entity_budget(mut self, entity_budget: u32) -> Self {
        self.entity_budget = entity_budget;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }
}

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a mut Scene,
    renderer: &'a Renderer,
}

impl SetupContext<'_> {
    /// Aspect ratio of the window, for placing cameras.
    pub fn aspect(&self) -> f32 {
        self.gpu.aspect()
    }

    pub fn mesh_cube(&mut self) -> MeshId {
        self.scene.add_mesh(Mesh::cube(self.gpu))
    }

    pub fn mesh_sphere(&mut self, segments: u32, rings: u32) -> MeshId {
        self.scene.add_mesh(Mesh::sphere(self.gpu, segments, rings))
    }

    pub fn mesh_plane(&mut self, size: f32) -> MeshId {
        self.scene.add_mesh(Mesh::plane(self.gpu, size))
    }

    /// Creates a material bound to the shared mesh pipeline.
    pub fn material(&mut self, tint: Color) -> MaterialId {
        self.scene
            .add_material(Material::new(self.renderer.pipeline(), tint))
    }

    pub fn texture_from_file(&mut self, path: &str) -> Result<TextureId, Error> {
        let texture = Texture::from_file(self.gpu, path)?;
        Ok(self.scene.add_texture(Arc::new(texture)))
    }

    pub fn texture_checkerboard(
        &mut self,
        size: u32,
        cells: u32,
        light: [u8; 3],
        dark: [u8; 3],
    ) -> TextureId {
        let texture = Texture::checkerboard(self.gpu, size, cells, light, dark);
        self.scene.add_texture(Arc::new(texture))
    }
}

/// Context provided each frame, after input handling and before rendering.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a mut Scene,
    pub overlay: &'a mut Overlay,
    pub input: &'a Input,
    /// Seconds since the app started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

impl Frame<'_> {
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }
}

/// Run an application with the default configuration.
pub fn run<S, F>(setup: S) -> Result<(), Error>
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Run an application with custom configuration.
///
/// # Example
/// ```ignore
/// glint::run_with_config(
///     AppConfig::new().title("Spinning Cube").size(1280, 720),
///     |ctx| {
///         let cube = ctx.mesh_cube();
///         let material = ctx.material(Color::WHITE);
///         let entity = ctx.scene.add_entity(Entity::new(cube, material));
///
///         move |frame| {
///             frame.scene.entities_mut()[entity]
///                 .transform
///                 .rotate(Vec3::new(0.0, frame.dt, 0.0));
///         }
///     },
/// )
/// ```
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), Error>
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GlintApp::Pending {
        config,
        setup: Some(Box::new(move |gpu, renderer, scene| {
            let mut ctx = SetupContext {
                gpu,
                scene,
                renderer,
            };
            let frame_fn = setup(&mut ctx);
            Box::new(frame_fn) as Box<dyn FnMut(&mut Frame)>
        })),
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}

type SetupFn =
    Box<dyn FnOnce(&GpuContext, &Renderer, &mut Scene) -> Box<dyn FnMut(&mut Frame)>>;

enum GlintApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        renderer: Renderer,
        overlay: Overlay,
        scene: Scene,
        input: Input,
        frame_fn: Box<dyn FnMut(&mut Frame)>,
        start_time: Instant,
        last_frame: Instant,
    },
}

impl GlintApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Error> {
        let GlintApp::Pending { config, setup } = self else {
            return Ok(());
        };

        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone(), config.vsync)?;
        let renderer = Renderer::new(&gpu, config.entity_budget)?;
        let overlay = Overlay::new(&gpu, config.font_path.as_deref());

        let mut scene = Scene::new();
        let setup_fn = setup.take().unwrap();
        let frame_fn = setup_fn(&gpu, &renderer, &mut scene);

        *self = GlintApp::Running {
            window,
            gpu,
            renderer,
            overlay,
            scene,
            input: Input::new(),
            frame_fn,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        };
        Ok(())
    }
}

impl ApplicationHandler for GlintApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.start(event_loop) {
            error!("startup failed: {err}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let GlintApp::Running {
            window,
            gpu,
            renderer,
            overlay,
            scene,
            input,
            frame_fn,
            start_time,
            last_frame,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                let aspect = gpu.aspect();
                for camera in scene.cameras_mut() {
                    camera.update_projection(aspect);
                }
            }
            WindowEvent::RedrawRequested => {
                if input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                if input.key_pressed(KeyCode::F1) {
                    overlay.toggle();
                }
                for (i, key) in CAMERA_KEYS.iter().enumerate() {
                    if input.key_pressed(*key) && i < scene.camera_count() {
                        scene.set_active_camera(i);
                    }
                }

                let now = Instant::now();
                let time = start_time.elapsed().as_secs_f32();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                overlay.clear();

                let mut frame = Frame {
                    gpu,
                    scene: &mut *scene,
                    overlay: &mut *overlay,
                    input,
                    time,
                    dt,
                };
                frame_fn(&mut frame);
                let fps = frame.fps();

                if let Some(camera) = scene.active_camera_mut() {
                    camera.update(input, dt);
                }

                if overlay.visible() {
                    overlay.panel(10.0, 10.0, &stats_lines(scene, renderer, fps, dt));
                }

                let output = match gpu.surface.get_current_texture() {
                    Ok(output) => output,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        // Reconfigure with the current size and try again next
                        // frame.
                        gpu.resize(gpu.width(), gpu.height());
                        window.request_redraw();
                        return;
                    }
                    Err(err) => {
                        error!("failed to acquire frame: {err}");
                        event_loop.exit();
                        return;
                    }
                };
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let mut encoder =
                    gpu.device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Frame Encoder"),
                        });

                renderer.render(gpu, &mut encoder, &view, scene, time);
                overlay.render(gpu, &mut encoder, &view);

                gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn stats_lines(scene: &Scene, renderer: &Renderer, fps: f32, dt: f32) -> Vec<String> {
    let mut lines = vec![
        format!("fps: {:.0} ({:.2} ms)", fps, dt * 1000.0),
        format!(
            "entities: {}  lights: {}  draws: {}",
            scene.entities().len(),
            scene.lights().len(),
            renderer.draw_count(),
        ),
        format!(
            "ring: {} / {} bytes",
            renderer.ring_offset(),
            renderer.ring_capacity(),
        ),
        format!("world matrix recomputes: {}", scene.transform_recompute_total()),
    ];
    if !scene.meshes().is_empty() {
        let names: Vec<&str> = scene.meshes().iter().map(|m| m.name()).collect();
        lines.push(format!("meshes: {}", names.join(", ")));
    }
    if let Some(camera) = scene.active_camera() {
        let p = camera.transform.translation();
        lines.push(format!(
            "camera {}/{} at ({:.2}, {:.2}, {:.2})",
            scene.active_camera_index() + 1,
            scene.camera_count(),
            p.x,
            p.y,
            p.z,
        ));
    }
    lines
}
