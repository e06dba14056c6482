//! A client session: the owner of variables, user functions, the event log
//! and the (lazily created) Lua context.
//!
//! Sessions are single-threaded and handed around as `Rc<Session>`; all
//! mutable state sits behind `RefCell`/`Cell` so that host functions called
//! from inside a running script can reach back into the session.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use mlua::Lua;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::lua::{self, LuaContext};
use crate::var::VarStore;

/// Prefix put in front of every message on the error sink.
pub const ERROR_PREFIX: &str = "\x1b[1;31m#ERROR: ";

// ── SessionEvent ──────────────────────────────────────────────────────────

/// Something the session produced, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A line for the user's screen.
    Output(String),
    /// A line for the user's screen reporting a failure.
    Error(String),
    /// A line sent to the world.
    Sent(String),
}

// ── Session ───────────────────────────────────────────────────────────────

pub struct Session {
    name: String,
    config: BridgeConfig,
    vars: RefCell<VarStore>,
    functions: RefCell<BTreeMap<String, String>>,
    events: RefCell<Vec<SessionEvent>>,
    lua: RefCell<Option<LuaContext>>,
    script_depth: Cell<usize>,
    closed: Cell<bool>,
}

impl Session {
    pub fn new(name: impl Into<String>, config: BridgeConfig) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            config,
            vars: RefCell::new(VarStore::new()),
            functions: RefCell::new(BTreeMap::new()),
            events: RefCell::new(Vec::new()),
            lua: RefCell::new(None),
            script_depth: Cell::new(0),
            closed: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ── Sinks ─────────────────────────────────────────────────────────────

    /// Show a line to the user.
    pub fn puts(&self, text: &str) {
        self.events.borrow_mut().push(SessionEvent::Output(text.to_owned()));
    }

    /// Show a failure to the user.
    pub fn show_error(&self, text: &str) {
        self.events
            .borrow_mut()
            .push(SessionEvent::Error(format!("{ERROR_PREFIX}{text}")));
    }

    /// Send a line to the world.
    pub fn send_line(&self, text: &str) {
        self.events.borrow_mut().push(SessionEvent::Sent(text.to_owned()));
    }

    /// Take every event produced so far.
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn output(&self) -> Vec<String> {
        self.collect(|e| match e {
            SessionEvent::Output(s) => Some(s),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            SessionEvent::Error(s) => Some(s),
            _ => None,
        })
    }

    pub fn sent(&self) -> Vec<String> {
        self.collect(|e| match e {
            SessionEvent::Sent(s) => Some(s),
            _ => None,
        })
    }

    fn collect(&self, pick: impl Fn(&SessionEvent) -> Option<&String>) -> Vec<String> {
        self.events.borrow().iter().filter_map(pick).cloned().collect()
    }

    // ── Variables and functions ───────────────────────────────────────────

    pub fn set_var(&self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.borrow_mut().set(name, value);
    }

    pub fn var(&self, name: &str) -> Option<String> {
        self.vars.borrow().get(name).map(str::to_owned)
    }

    pub fn unset_var(&self, name: &str) -> bool {
        self.vars.borrow_mut().unset(name)
    }

    /// Copy `vars` into the session, e.g. the ones a config file defines.
    pub fn import_vars(&self, vars: &VarStore) {
        self.vars.borrow_mut().merge(vars);
    }

    pub fn vars_snapshot(&self) -> VarStore {
        self.vars.borrow().clone()
    }

    pub fn set_function(&self, name: impl Into<String>, body: impl Into<String>) {
        self.functions.borrow_mut().insert(name.into(), body.into());
    }

    pub fn function(&self, name: &str) -> Option<String> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn unset_function(&self, name: &str) -> bool {
        self.functions.borrow_mut().remove(name).is_some()
    }

    // ── Lua context ───────────────────────────────────────────────────────

    pub fn has_lua_context(&self) -> bool {
        self.lua.borrow().is_some()
    }

    /// A handle to the session's engine, if it has one.
    pub fn lua_handle(&self) -> Option<Lua> {
        self.lua.borrow().as_ref().map(|ctx| ctx.lua().clone())
    }

    pub fn with_lua_context<R>(&self, f: impl FnOnce(&LuaContext) -> R) -> Option<R> {
        self.lua.borrow().as_ref().map(f)
    }

    pub(crate) fn install_lua_context(&self, ctx: LuaContext) {
        *self.lua.borrow_mut() = Some(ctx);
    }

    pub(crate) fn take_lua_context(&self) -> Option<LuaContext> {
        self.lua.borrow_mut().take()
    }

    /// Stage `src` through buffer `slot` of this session's context and
    /// return the staged text.
    pub(crate) fn stage_text(&self, func: &'static str, slot: usize, src: &[u8]) -> BridgeResult<String> {
        let mut guard = self.lua.borrow_mut();
        let ctx = guard.as_mut().ok_or(BridgeError::SessionUnbound { func })?;
        Ok(ctx.buffers_mut().stage(slot, src))
    }

    pub fn script_depth(&self) -> usize {
        self.script_depth.get()
    }

    pub(crate) fn set_script_depth(&self, depth: usize) {
        self.script_depth.set(depth);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// End the session: release the Lua context and ignore further input.
    pub fn close(&self) {
        if !self.closed.replace(true) {
            lua::destroy(self);
            tracing::debug!(session = %self.name, "session closed");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("lua", &self.has_lua_context())
            .field("script_depth", &self.script_depth.get())
            .field("closed", &self.closed.get())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
