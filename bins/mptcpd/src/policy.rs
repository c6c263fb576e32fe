//! Policy dispatcher (§4.7): plugin registry, connection-event routing by
//! token, and network-event broadcast.
//!
//! The registry is generic over the context type `Ctx` handed to every
//! callback (the supervisor's `PathManager` in production, a lightweight
//! stand-in in tests) so this module has no dependency on the concrete
//! shape of `PathManager`.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::{Error, Result};

type TokenCb<Ctx> = Box<dyn FnMut(&mut Ctx, u32) + Send>;
type TokenIdCb<Ctx> = Box<dyn FnMut(&mut Ctx, u32, u8) + Send>;
type TokenBoolCb<Ctx> = Box<dyn FnMut(&mut Ctx, u32, bool) + Send>;
type AddrCb<Ctx> = Box<dyn FnMut(&mut Ctx, SocketAddr) + Send>;
type IfindexCb<Ctx> = Box<dyn FnMut(&mut Ctx, u32) + Send>;

/// Any subset of these may be set per plugin (§6.3); unset fields are
/// no-ops.
#[derive(Default)]
pub struct PluginVtable<Ctx> {
    pub new_connection: Option<TokenCb<Ctx>>,
    pub connection_established: Option<TokenCb<Ctx>>,
    pub connection_closed: Option<TokenCb<Ctx>>,
    pub new_subflow: Option<TokenCb<Ctx>>,
    pub subflow_closed: Option<TokenCb<Ctx>>,
    pub subflow_priority: Option<TokenBoolCb<Ctx>>,
    pub new_address: Option<TokenIdCb<Ctx>>,
    pub address_removed: Option<TokenIdCb<Ctx>>,
    pub listener_created: Option<AddrCb<Ctx>>,
    pub listener_closed: Option<AddrCb<Ctx>>,
    pub new_interface: Option<IfindexCb<Ctx>>,
    pub update_interface: Option<IfindexCb<Ctx>>,
    pub delete_interface: Option<IfindexCb<Ctx>>,
    pub new_local_address: Option<AddrCb<Ctx>>,
    pub delete_local_address: Option<AddrCb<Ctx>>,
}

impl<Ctx> PluginVtable<Ctx> {
    pub fn is_empty(&self) -> bool {
        self.new_connection.is_none()
            && self.connection_established.is_none()
            && self.connection_closed.is_none()
            && self.new_subflow.is_none()
            && self.subflow_closed.is_none()
            && self.subflow_priority.is_none()
            && self.new_address.is_none()
            && self.address_removed.is_none()
            && self.listener_created.is_none()
            && self.listener_closed.is_none()
            && self.new_interface.is_none()
            && self.update_interface.is_none()
            && self.delete_interface.is_none()
            && self.new_local_address.is_none()
            && self.delete_local_address.is_none()
    }
}

struct PluginEntry<Ctx> {
    name: String,
    priority: u32,
    vtable: PluginVtable<Ctx>,
}

/// Plugin registry plus token→plugin routing table.
pub struct PolicyDispatcher<Ctx> {
    plugins: Vec<PluginEntry<Ctx>>,
    default_name: Option<String>,
    token_routes: HashMap<u32, String>,
}

impl<Ctx> Default for PolicyDispatcher<Ctx> {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            default_name: None,
            token_routes: HashMap::new(),
        }
    }
}

impl<Ctx> PolicyDispatcher<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin's vtable. Plugins are kept sorted by priority
    /// (highest first) to satisfy "initialized/dispatched in registration
    /// order" once all plugins for a load pass are registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        priority: u32,
        is_default: bool,
        vtable: PluginVtable<Ctx>,
    ) -> Result<()> {
        let name = name.into();
        if vtable.is_empty() {
            return Err(Error::EmptyPluginVtable(name));
        }

        if is_default {
            self.default_name = Some(name.clone());
        }

        self.plugins.push(PluginEntry {
            name,
            priority,
            vtable,
        });
        self.plugins.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(())
    }

    fn plugin_mut(&mut self, name: &str) -> Option<&mut PluginEntry<Ctx>> {
        self.plugins.iter_mut().find(|p| p.name == name)
    }

    /// Dispatches `new_connection`, binding `token` to whichever plugin
    /// name is resolved (explicit `name_hint`, falling back to the
    /// default plugin). Every subsequent connection event for this token
    /// routes to the same plugin until `connection_closed`.
    pub fn new_connection(&mut self, ctx: &mut Ctx, token: u32, name_hint: Option<&str>) {
        let Some(name) = name_hint
            .map(str::to_string)
            .or_else(|| self.default_name.clone())
        else {
            return;
        };

        self.token_routes.insert(token, name.clone());
        if let Some(plugin) = self.plugin_mut(&name)
            && let Some(cb) = plugin.vtable.new_connection.as_mut()
        {
            cb(ctx, token);
        }
    }

    fn routed_plugin(&mut self, token: u32) -> Option<&mut PluginEntry<Ctx>> {
        let name = self.token_routes.get(&token)?.clone();
        self.plugin_mut(&name)
    }

    pub fn connection_established(&mut self, ctx: &mut Ctx, token: u32) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.connection_established.as_mut()
        {
            cb(ctx, token);
        }
    }

    pub fn new_subflow(&mut self, ctx: &mut Ctx, token: u32) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.new_subflow.as_mut()
        {
            cb(ctx, token);
        }
    }

    pub fn subflow_closed(&mut self, ctx: &mut Ctx, token: u32) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.subflow_closed.as_mut()
        {
            cb(ctx, token);
        }
    }

    pub fn subflow_priority(&mut self, ctx: &mut Ctx, token: u32, backup: bool) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.subflow_priority.as_mut()
        {
            cb(ctx, token, backup);
        }
    }

    pub fn new_address(&mut self, ctx: &mut Ctx, token: u32, id: u8) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.new_address.as_mut()
        {
            cb(ctx, token, id);
        }
    }

    pub fn address_removed(&mut self, ctx: &mut Ctx, token: u32, id: u8) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.address_removed.as_mut()
        {
            cb(ctx, token, id);
        }
    }

    /// Dispatches `connection_closed` and then forgets the token's route.
    pub fn connection_closed(&mut self, ctx: &mut Ctx, token: u32) {
        if let Some(plugin) = self.routed_plugin(token)
            && let Some(cb) = plugin.vtable.connection_closed.as_mut()
        {
            cb(ctx, token);
        }
        self.token_routes.remove(&token);
    }

    /// Listener events carry an explicit plugin name rather than routing
    /// through the token table.
    pub fn listener_created(&mut self, ctx: &mut Ctx, name: &str, addr: SocketAddr) {
        if let Some(plugin) = self.plugin_mut(name)
            && let Some(cb) = plugin.vtable.listener_created.as_mut()
        {
            cb(ctx, addr);
        }
    }

    pub fn listener_closed(&mut self, ctx: &mut Ctx, name: &str, addr: SocketAddr) {
        if let Some(plugin) = self.plugin_mut(name)
            && let Some(cb) = plugin.vtable.listener_closed.as_mut()
        {
            cb(ctx, addr);
        }
    }

    /// Broadcasts a network event to every registered plugin, in
    /// registration (priority-sorted) order.
    pub fn new_interface(&mut self, ctx: &mut Ctx, ifindex: u32) {
        for plugin in &mut self.plugins {
            if let Some(cb) = plugin.vtable.new_interface.as_mut() {
                cb(ctx, ifindex);
            }
        }
    }

    pub fn update_interface(&mut self, ctx: &mut Ctx, ifindex: u32) {
        for plugin in &mut self.plugins {
            if let Some(cb) = plugin.vtable.update_interface.as_mut() {
                cb(ctx, ifindex);
            }
        }
    }

    pub fn delete_interface(&mut self, ctx: &mut Ctx, ifindex: u32) {
        for plugin in &mut self.plugins {
            if let Some(cb) = plugin.vtable.delete_interface.as_mut() {
                cb(ctx, ifindex);
            }
        }
    }

    pub fn new_local_address(&mut self, ctx: &mut Ctx, addr: SocketAddr) {
        for plugin in &mut self.plugins {
            if let Some(cb) = plugin.vtable.new_local_address.as_mut() {
                cb(ctx, addr);
            }
        }
    }

    pub fn delete_local_address(&mut self, ctx: &mut Ctx, addr: SocketAddr) {
        for plugin in &mut self.plugins {
            if let Some(cb) = plugin.vtable.delete_local_address.as_mut() {
                cb(ctx, addr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingCtx {
        events: Vec<String>,
    }

    fn vtable_recording(tag: &'static str) -> PluginVtable<RecordingCtx> {
        PluginVtable {
            connection_established: Some(Box::new(move |ctx, token| {
                ctx.events.push(format!("{tag}:established:{token}"));
            })),
            new_local_address: Some(Box::new(move |ctx, addr| {
                ctx.events.push(format!("{tag}:new_local_address:{addr}"));
            })),
            ..Default::default()
        }
    }

    #[test]
    fn empty_vtable_is_rejected() {
        let mut dispatcher: PolicyDispatcher<RecordingCtx> = PolicyDispatcher::new();
        let err = dispatcher
            .register("noop", 0, false, PluginVtable::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPluginVtable(_)));
    }

    #[test]
    fn s5_plugin_routing() {
        let mut dispatcher: PolicyDispatcher<RecordingCtx> = PolicyDispatcher::new();
        dispatcher
            .register("p1", 10, false, vtable_recording("p1"))
            .unwrap();
        dispatcher
            .register("p2", 0, true, vtable_recording("p2"))
            .unwrap();

        let mut ctx = RecordingCtx { events: Vec::new() };

        dispatcher.new_connection(&mut ctx, 42, Some("p2"));
        dispatcher.connection_established(&mut ctx, 42);
        assert_eq!(ctx.events, vec!["p2:established:42"]);

        ctx.events.clear();
        dispatcher.new_local_address(&mut ctx, "10.0.0.1:0".parse().unwrap());
        assert_eq!(
            ctx.events,
            vec![
                "p1:new_local_address:10.0.0.1:0",
                "p2:new_local_address:10.0.0.1:0",
            ]
        );
    }

    #[test]
    fn connection_closed_forgets_route() {
        let mut dispatcher: PolicyDispatcher<RecordingCtx> = PolicyDispatcher::new();
        dispatcher
            .register("p1", 0, true, vtable_recording("p1"))
            .unwrap();
        let mut ctx = RecordingCtx { events: Vec::new() };

        dispatcher.new_connection(&mut ctx, 7, None);
        dispatcher.connection_closed(&mut ctx, 7);
        ctx.events.clear();

        dispatcher.connection_established(&mut ctx, 7);
        assert!(ctx.events.is_empty());
    }
}
