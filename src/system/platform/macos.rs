use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn accelerator_supported() -> bool {
        // ioreg only exposes AGXAccelerator statistics on Apple Silicon.
        cfg!(target_arch = "aarch64")
    }
}
