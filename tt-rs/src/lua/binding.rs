//! Session binding: how a host function finds the session that owns the
//! engine it was called from.
//!
//! The reference lives in the engine's application-data store rather than in
//! a Lua global, so no script can read, enumerate, overwrite or forge it.
//! It is a [`Weak`] pointer: the engine never keeps its session alive.

use std::rc::{Rc, Weak};

use mlua::Lua;

use crate::session::Session;

/// Opaque back-reference from an engine to its owning session.
pub struct SessionBinding(Weak<Session>);

/// Point `lua` at `session`.  Rebinding replaces the previous session.
pub fn bind(lua: &Lua, session: &Rc<Session>) {
    lua.set_app_data(SessionBinding(Rc::downgrade(session)));
}

/// The session `lua` is bound to, or `None` if it was never bound or the
/// session is gone.
pub fn resolve(lua: &Lua) -> Option<Rc<Session>> {
    lua.app_data_ref::<SessionBinding>()?.0.upgrade()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    #[test]
    fn unbound_engine_resolves_to_none() {
        let lua = Lua::new();
        assert!(resolve(&lua).is_none());
    }

    #[test]
    fn bound_engine_resolves_to_its_session() {
        let lua = Lua::new();
        let ses = Session::new("gts", BridgeConfig::default());
        bind(&lua, &ses);
        let found = resolve(&lua).unwrap();
        assert!(Rc::ptr_eq(&found, &ses));
    }

    #[test]
    fn dropped_session_no_longer_resolves() {
        let lua = Lua::new();
        let ses = Session::new("gts", BridgeConfig::default());
        bind(&lua, &ses);
        drop(ses);
        assert!(resolve(&lua).is_none());
    }

    #[test]
    fn binding_is_not_a_lua_global() {
        const LIST_GLOBALS: &str =
            "local t = {} for k in pairs(_G) do t[#t + 1] = tostring(k) end table.sort(t) return t";
        let lua = Lua::new();
        let before: Vec<String> = lua.load(LIST_GLOBALS).eval().unwrap();
        let ses = Session::new("gts", BridgeConfig::default());
        bind(&lua, &ses);
        let after: Vec<String> = lua.load(LIST_GLOBALS).eval().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn foreign_app_data_does_not_resolve() {
        let lua = Lua::new();
        lua.set_app_data(String::from("not a session"));
        assert!(resolve(&lua).is_none());
    }
}
