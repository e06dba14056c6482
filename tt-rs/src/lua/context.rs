//! Per-session engine context: one Lua state plus its staging buffers.

use std::rc::Rc;

use mlua::{Lua, LuaOptions, StdLib};

use super::buffer::BufferPool;
use super::{api, binding};
use crate::error::{BridgeError, BridgeResult};
use crate::session::Session;

/// Everything a session needs to run `#LUA`: created on first use, dropped
/// when the session closes.
pub struct LuaContext {
    lua: Lua,
    buffers: BufferPool,
}

impl LuaContext {
    /// Build a context bound to `session`.
    ///
    /// Nothing is attached to the session here; on error every partial
    /// allocation is simply dropped.
    fn create(session: &Rc<Session>) -> BridgeResult<Self> {
        let config = session.config();
        let buffers = BufferPool::try_new(config.buffer_size)?;

        // SAFETY: scripts are trusted user input; loading `debug` and C
        // modules gives them the full standard library.
        let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL, LuaOptions::new()) };
        if let Some(limit) = config.memory_limit {
            lua.set_memory_limit(limit).map_err(engine_error)?;
        }

        binding::bind(&lua, session);
        api::register(&lua).map_err(engine_error)?;

        Ok(Self { lua, buffers })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferPool {
        &mut self.buffers
    }
}

fn engine_error(e: mlua::Error) -> BridgeError {
    match e {
        mlua::Error::MemoryError(_) => BridgeError::OutOfMemory { what: "lua engine" },
        other => BridgeError::EngineSetup(other.to_string()),
    }
}

/// Give `session` a context unless it already has one, and return a handle
/// to its engine.
pub fn ensure_initialized(session: &Rc<Session>) -> BridgeResult<Lua> {
    if let Some(lua) = session.lua_handle() {
        return Ok(lua);
    }
    let ctx = LuaContext::create(session)?;
    let lua = ctx.lua.clone();
    session.install_lua_context(ctx);
    tracing::debug!(session = session.name(), "lua context created");
    Ok(lua)
}

/// Release the session's context, if any.  Safe to call repeatedly.
pub fn destroy(session: &Session) {
    if let Some(ctx) = session.take_lua_context() {
        drop(ctx);
        tracing::debug!(session = session.name(), "lua context destroyed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
