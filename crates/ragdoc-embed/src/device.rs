use candle_core::Device;

/// Prefer an accelerator compiled in via features, fall back to CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) { return dev; }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) { return dev; }
    }
    Device::Cpu
}
