//! Per-OS capability checks. Everything that needs `target_os` lives here.

pub trait PlatformExtensions {
    /// Whether the integrated accelerator can be probed at all on this host.
    fn accelerator_supported() -> bool;
}

#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(target_os = "macos"))]
mod other;

#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(target_os = "macos"))]
use other as platform_impl;

pub fn accelerator_supported() -> bool {
    platform_impl::Platform::accelerator_supported()
}
