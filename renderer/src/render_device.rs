use anyhow::{Context, Result};
use log::info;

/// A device and its queue, not bound to any surface.
#[derive(Debug, Clone)]
pub struct RenderDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl RenderDevice {
    pub async fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let adapter = get_headless_adapter(&instance).await?;

        let info = adapter.get_info();
        info!("GPU Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = get_device_and_queue_from_adapter(adapter).await?;

        let limits = device.limits();
        info!(
            "- Max texture dimension: {}",
            limits.max_texture_dimension_2d
        );
        info!(
            "- Max texture array layers: {}",
            limits.max_texture_array_layers
        );

        Ok(Self { device, queue })
    }
}

async fn get_device_and_queue_from_adapter(
    adapter: wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            label: None,
            memory_hints: Default::default(),
            trace: Default::default(),
        })
        .await
        .context("Requesting device")
}

async fn get_headless_adapter(instance: &wgpu::Instance) -> Result<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::None,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("GPU Adapter not found")
}
