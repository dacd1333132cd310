//! Process-wide library state.
//!
//! The processing core is initialised once per process, on first use or by
//! an explicit [`init`] call at startup. Later calls are no-ops. There is no
//! teardown; the state lives as long as the process.

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::info;

/// Image backend the processor delegates filtering to.
const IMAGE_BACKEND: &str = "image + imageproc";

static LIBRARY_INFO: OnceLock<LibraryInfo> = OnceLock::new();

/// Build and platform details of the processing core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub arch: &'static str,
    pub os: &'static str,
    pub image_backend: &'static str,
}

impl LibraryInfo {
    fn detect() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            arch: std::env::consts::ARCH,
            os: std::env::consts::OS,
            image_backend: IMAGE_BACKEND,
        }
    }
}

impl fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.version)?;
        writeln!(f, "- Architecture: {}", self.arch)?;
        writeln!(f, "- OS: {}", self.os)?;
        write!(f, "- Image backend: {}", self.image_backend)
    }
}

/// Initialise the library. Only the first call does any work.
pub fn init() -> &'static LibraryInfo {
    LIBRARY_INFO.get_or_init(|| {
        let info = LibraryInfo::detect();
        info!(
            "initialised {} {} ({}/{}, {})",
            info.name, info.version, info.os, info.arch, info.image_backend
        );
        info
    })
}

/// Whether [`init`] has run in this process.
pub fn is_initialised() -> bool {
    LIBRARY_INFO.get().is_some()
}

/// Library details, initialising on first use.
pub fn library_info() -> &'static LibraryInfo {
    init()
}
