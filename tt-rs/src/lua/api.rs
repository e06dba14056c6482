//! The host functions scripts can call, published as the `tt` table.
//!
//! | Lua call         | Effect                                             |
//! |------------------|----------------------------------------------------|
//! | `tt.print(text)` | Show `text` in the session's output                |
//! | `tt.send(text)`  | Run `text` as a command line for the same session  |
//!
//! Each call stages its argument through buffer slot 0 (truncating to the
//! buffer capacity) and forwards an owned copy of the staged text.

use mlua::{FromLua, Lua, Value};

use super::binding;
use super::buffer::TEXT_SLOT;
use crate::command;
use crate::error::{BridgeError, BridgeResult};
use crate::session::Session;

/// Global name of the capability table.
pub const API_TABLE_NAME: &str = "tt";

// ── Argument marshalling ──────────────────────────────────────────────────

/// A single string-like argument.
///
/// Strings are taken as raw bytes and numbers are coerced the way Lua's own
/// string functions coerce them.  Anything else, including a missing
/// argument, is remembered by type name so the host function can report it.
#[derive(Debug)]
pub enum TextArg {
    Text(Vec<u8>),
    Invalid(&'static str),
}

impl FromLua for TextArg {
    fn from_lua(value: Value, lua: &Lua) -> mlua::Result<Self> {
        let type_name = value.type_name();
        Ok(match lua.coerce_string(value)? {
            Some(s) => TextArg::Text(s.as_bytes().to_vec()),
            None => TextArg::Invalid(type_name),
        })
    }
}

impl TextArg {
    fn into_bytes(self, func: &'static str) -> BridgeResult<Vec<u8>> {
        match self {
            TextArg::Text(bytes) => Ok(bytes),
            TextArg::Invalid(got) => Err(BridgeError::ArgumentType { func, got }),
        }
    }
}

// ── Host functions ────────────────────────────────────────────────────────

/// Resolve the calling session, check the argument and stage it.
fn stage_call(lua: &Lua, func: &'static str, arg: TextArg) -> BridgeResult<(std::rc::Rc<Session>, String)> {
    let ses = binding::resolve(lua).ok_or(BridgeError::SessionUnbound { func })?;
    let bytes = arg.into_bytes(func)?;
    let text = ses.stage_text(func, TEXT_SLOT, &bytes)?;
    Ok((ses, text))
}

fn host_print(lua: &Lua, arg: TextArg) -> mlua::Result<()> {
    let (ses, text) = stage_call(lua, "print", arg).map_err(mlua::Error::external)?;
    tracing::trace!(session = ses.name(), len = text.len(), "tt.print");
    ses.puts(&text);
    Ok(())
}

fn host_send(lua: &Lua, arg: TextArg) -> mlua::Result<()> {
    let (ses, text) = stage_call(lua, "send", arg).map_err(mlua::Error::external)?;
    tracing::trace!(session = ses.name(), command = %text, "tt.send");
    command::script_driver(&ses, &text);
    Ok(())
}

/// Create the `tt` table and publish it as a global.
pub fn register(lua: &Lua) -> mlua::Result<()> {
    let api = lua.create_table()?;
    api.set("print", lua.create_function(host_print)?)?;
    api.set("send", lua.create_function(host_send)?)?;
    lua.globals().set(API_TABLE_NAME, api)
}

// ── Tests ─────────────────────────────────────────────────────────────────
