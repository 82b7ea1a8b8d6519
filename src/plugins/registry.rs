//! Plugin registry - ordered collection with skip-on-failure loading

use std::path::Path;

use crate::application::messaging::{harness, BotContext};
use crate::domain::entities::EventName;
use crate::plugins::loader::PluginSource;
use crate::plugins::Plugin;

/// The loaded plugins, in load order.
///
/// Registration order is dispatch order and stays fixed for the life of
/// the process; nothing is unloaded or reordered after startup.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Load `identifiers` from `directory` through `source`.
    ///
    /// Entries that fail to load are logged and skipped; the rest keep
    /// their requested order. Each survivor's init handler runs before the
    /// next entry is attempted.
    pub fn load(
        identifiers: &[String],
        directory: &Path,
        source: &mut dyn PluginSource,
        context: &BotContext,
    ) -> Self {
        let mut registry = Self::new();

        for identifier in identifiers {
            tracing::debug!(
                "Resolving plugin {} under {}",
                identifier,
                directory.display()
            );

            let plugin = match source.load(directory, identifier) {
                Ok(plugin) => plugin,
                Err(e) => {
                    tracing::error!("Module {} load error: {}", identifier, e);
                    continue;
                }
            };

            tracing::info!("Module: {} loaded", identifier);
            registry.register_with_init(plugin, context);
        }

        if registry.is_empty() {
            tracing::warn!("No module of {} loaded", identifiers.len());
        } else {
            tracing::info!("Loaded {} modules of {}", registry.len(), identifiers.len());
        }

        registry
    }

    /// Append an already-built plugin and run its init handler.
    pub fn register_with_init(&mut self, mut plugin: Plugin, context: &BotContext) {
        if let Some(handler) = plugin.handlers.init.as_mut() {
            harness::invoke(&plugin.name, EventName::Init, || handler(context));
        }
        self.plugins.push(plugin);
    }

    /// Append without touching the init handler.
    pub fn register(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registered names, registry order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Plugin> {
        self.plugins.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::PluginError;
    use crate::plugins::loader::PluginSource;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use tracing_subscriber::fmt::MakeWriter;

    struct StubSource;

    impl PluginSource for StubSource {
        fn load(&mut self, _directory: &Path, identifier: &str) -> Result<Plugin, PluginError> {
            if identifier.starts_with("bad") {
                Err(PluginError::Load(format!("{} refuses to load", identifier)))
            } else {
                Ok(Plugin::new(identifier))
            }
        }
    }

    fn context() -> BotContext {
        let (tx, _rx) = mpsc::unbounded_channel();
        BotContext::new("ferric", tx)
    }

    fn idents(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run a load with log output captured, so the summary lines can be
    /// asserted on.
    fn load_capturing_logs(identifiers: &[&str]) -> (PluginRegistry, String) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let ctx = context();
        let registry = tracing::subscriber::with_default(subscriber, || {
            PluginRegistry::load(
                &idents(identifiers),
                Path::new("plugins"),
                &mut StubSource,
                &ctx,
            )
        });

        let logged = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        (registry, logged)
    }

    #[test]
    fn failed_loads_are_skipped_and_order_kept() {
        let ctx = context();
        let registry = PluginRegistry::load(
            &idents(&["first", "bad-apple", "second"]),
            Path::new("plugins"),
            &mut StubSource,
            &ctx,
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[test]
    fn all_failing_leaves_an_empty_registry() {
        let ctx = context();
        let registry = PluginRegistry::load(
            &idents(&["bad-1", "bad-2"]),
            Path::new("plugins"),
            &mut StubSource,
            &ctx,
        );

        assert!(registry.is_empty());
    }

    #[test]
    fn empty_registry_emits_the_no_module_warning() {
        let (registry, logged) = load_capturing_logs(&["bad-1", "bad-2"]);

        assert!(registry.is_empty());
        assert!(logged.contains("No module of 2 loaded"), "got: {}", logged);
        assert!(!logged.contains("Loaded"));
    }

    #[test]
    fn summary_counts_survivors_against_configured() {
        let (registry, logged) = load_capturing_logs(&["first", "bad-apple", "second"]);

        assert_eq!(registry.len(), 2);
        assert!(logged.contains("Loaded 2 modules of 3"), "got: {}", logged);
        assert!(!logged.contains("No module"));
    }

    #[test]
    fn init_runs_once_per_registered_plugin() {
        let ctx = context();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let plugin = Plugin::new("counter").on_init(move |_bot| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut registry = PluginRegistry::new();
        registry.register_with_init(plugin, &ctx);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn panicking_init_still_registers() {
        let ctx = context();
        let plugin = Plugin::new("grenade").on_init(|_bot| panic!("init blew up"));

        let mut registry = PluginRegistry::new();
        registry.register_with_init(plugin, &ctx);

        assert_eq!(registry.names(), vec!["grenade"]);
    }
}
