//! Plugin loading - shared-library sources behind a seam

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::application::errors::PluginError;
use crate::plugins::Plugin;

/// Entry point every plugin library exports.
///
/// The function hands ownership of a heap-allocated [`Plugin`] to the
/// host. Plugin crates must be built with the same compiler and crate
/// version as the host binary.
pub type PluginCreateFn = unsafe extern "C" fn() -> *mut Plugin;

/// Exported symbol name of the entry point.
pub const PLUGIN_ENTRY: &[u8] = b"ferric_plugin_create";

/// Where plugins come from.
///
/// The registry only sees this seam, so tests and built-in plugins can
/// bypass the filesystem entirely.
pub trait PluginSource {
    fn load(&mut self, directory: &Path, identifier: &str) -> Result<Plugin, PluginError>;
}

/// Loads plugins from shared libraries on disk.
#[derive(Default)]
pub struct DylibSource {
    // Keeps plugin code mapped for as long as any handler may run.
    libraries: Vec<Library>,
}

impl DylibSource {
    pub fn new() -> Self {
        Self {
            libraries: Vec::new(),
        }
    }

    /// Resolve an identifier to a library path under `directory`.
    ///
    /// An identifier with an extension is taken verbatim; otherwise the
    /// platform shared-library prefix and suffix are applied, so `greeter`
    /// becomes `libgreeter.so` on Linux and `greeter.dll` on Windows.
    fn resolve(directory: &Path, identifier: &str) -> PathBuf {
        let direct = directory.join(identifier);
        if direct.extension().is_some() {
            direct
        } else {
            directory.join(format!(
                "{}{}{}",
                std::env::consts::DLL_PREFIX,
                identifier,
                std::env::consts::DLL_SUFFIX
            ))
        }
    }
}

impl PluginSource for DylibSource {
    fn load(&mut self, directory: &Path, identifier: &str) -> Result<Plugin, PluginError> {
        let path = Self::resolve(directory, identifier);
        if !path.exists() {
            return Err(PluginError::Load(format!("{} not found", path.display())));
        }

        let library = unsafe { Library::new(&path)? };
        let plugin = unsafe {
            let create: Symbol<PluginCreateFn> = library.get(PLUGIN_ENTRY)?;
            let raw = create();
            if raw.is_null() {
                return Err(PluginError::Load(format!(
                    "{} entry point returned null",
                    path.display()
                )));
            }
            *Box::from_raw(raw)
        };

        self.libraries.push(library);
        Ok(plugin)
    }
}
