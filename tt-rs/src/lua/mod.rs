//! Embedded Lua 5.4 via the `mlua` crate.
//!
//! Each session gets at most one Lua state, created the first time `#LUA`
//! runs and closed with the session.
//!
//! # Commands
//!
//! | Command            | Rust entry point        |
//! |--------------------|-------------------------|
//! | `#LUA {script}`    | [`do_lua`]              |
//! | `#ZAP`             | [`destroy`] (via close) |
//!
//! # Lua API
//!
//! | Lua function       | Effect                                    |
//! |--------------------|-------------------------------------------|
//! | `tt.print(text)`   | Show `text` in the session                |
//! | `tt.send(text)`    | Execute `text` as a session command line  |
//!
//! Arguments are staged through a [`BUFFER_SIZE`]-byte buffer, so longer
//! strings are cut to `BUFFER_SIZE - 1` bytes.
//!
//! # Limitations
//!
//! A script runs to completion on the session's own thread.  There is no
//! timeout or cancellation: `while true do end` blocks the session for good.
//! Nested `#LUA` through `tt.send` is allowed up to
//! [`BridgeConfig::max_script_depth`](crate::config::BridgeConfig) levels.

pub mod api;
pub mod binding;
pub mod buffer;
pub mod context;
pub mod exec;

pub use api::API_TABLE_NAME;
pub use buffer::{Buffer, BufferPool, BUFFER_SIZE, LUA_BUFFER_BLOCKS};
pub use context::{destroy, ensure_initialized, LuaContext};
pub use exec::{do_lua, run_snippet};
