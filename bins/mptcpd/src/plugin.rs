//! In-process plugin registry (§6.3, §4.7 supplement). Rust has no stable
//! ABI for `dlopen`-style loading, so plugins are `Box<dyn Plugin>` trait
//! objects resolved from a fixed name table rather than loaded from
//! `plugin_dir` as shared objects — see `DESIGN.md`.

use tracing::{info, warn};

use crate::error::Result;
use crate::policy::PluginVtable;
use crate::supervisor::PathManager;

/// A connection-event plugin. `init` builds this plugin's callback
/// vtable and registers it with the path manager; called once, in
/// priority order, during [`load_plugins`].
pub trait Plugin: Send {
    fn name(&self) -> &'static str;
    fn init(&self, pm: &mut PathManager, priority: u32, is_default: bool) -> Result<()>;
}

/// Reference plugin: logs every connection-lifecycle event it sees.
/// Demonstrates the plugin contract rather than implementing a real
/// path-selection policy.
pub struct LoggerPlugin;

impl Plugin for LoggerPlugin {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn init(&self, pm: &mut PathManager, priority: u32, is_default: bool) -> Result<()> {
        pm.register_plugin(
            self.name(),
            priority,
            is_default,
            PluginVtable {
                new_connection: Some(Box::new(|_: &mut PathManager, token: u32| {
                    info!(token, "new connection");
                })),
                connection_established: Some(Box::new(|_: &mut PathManager, token: u32| {
                    info!(token, "connection established");
                })),
                connection_closed: Some(Box::new(|_: &mut PathManager, token: u32| {
                    info!(token, "connection closed");
                })),
                new_subflow: Some(Box::new(|_: &mut PathManager, token: u32| {
                    info!(token, "new subflow");
                })),
                subflow_closed: Some(Box::new(|_: &mut PathManager, token: u32| {
                    info!(token, "subflow closed");
                })),
                ..Default::default()
            },
        )
    }
}

/// Name → constructor table `load_plugins` config entries resolve
/// against. Extend this when a new built-in plugin is added.
fn plugin_table() -> Vec<(&'static str, fn() -> Box<dyn Plugin>)> {
    vec![("logger", || Box::new(LoggerPlugin) as Box<dyn Plugin>)]
}

/// Resolves each `load_plugins` name against [`plugin_table`] in order,
/// assigning descending priority so earlier config entries run first,
/// and initializes it against `pm`. A name with no table entry, or whose
/// `init` fails, is logged and skipped rather than aborting the daemon
/// (plugin load failures are non-fatal per spec).
pub fn load_plugins(pm: &mut PathManager, load_plugins: &[String], default_plugin: Option<&str>) {
    let table = plugin_table();
    let count = load_plugins.len() as u32;

    for (index, name) in load_plugins.iter().enumerate() {
        let Some((_, ctor)) = table.iter().find(|(n, _)| n == name) else {
            warn!(%name, "no such plugin in the built-in table, skipping");
            continue;
        };

        let plugin = ctor();
        let priority = count - index as u32;
        let is_default = default_plugin == Some(name.as_str());
        if let Err(err) = plugin.init(pm, priority, is_default) {
            warn!(%name, %err, "plugin registration failed, continuing without it");
        }
    }
}
