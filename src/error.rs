use thiserror::Error;

/// Errors raised while creating rendering resources.
///
/// Per-frame rendering deliberately does not produce errors; everything
/// fallible happens at startup or during scene setup, and is reported
/// through this enum so `main` can log a diagnostic and exit non-zero.
#[derive(Debug, Error)]
pub enum Error {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to decode image: {0}")]
    DecodeImage(#[from] image::ImageError),

    #[error("failed to load font from {path}: {reason}")]
    LoadFont { path: String, reason: String },

    #[error(
        "uniform ring capacity {capacity} bytes cannot hold a worst-case frame of {frame} bytes"
    )]
    RingCapacity { capacity: u64, frame: u64 },
}
