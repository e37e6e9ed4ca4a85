use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn accelerator_supported() -> bool {
        false
    }
}
