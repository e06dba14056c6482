//! The `#LUA {script}` command.

use std::rc::Rc;

use super::context;
use crate::args::get_arg_in_braces;
use crate::error::{BridgeError, BridgeResult};
use crate::session::Session;
use crate::substitute::{substitute, SubFlags};

/// Chunk name shown in Lua diagnostics and tracebacks.
const CHUNK_NAME: &str = "=#LUA";

/// Entry point for `#LUA`.  Failures are reported on the session's error
/// sink; the command itself never fails.
pub fn do_lua(ses: &Rc<Session>, arg: &str) {
    let (snippet, _) = get_arg_in_braces(arg);

    let code = substitute(&**ses, &snippet, SubFlags::VAR | SubFlags::FUN);
    let code = substitute(&**ses, &code, SubFlags::COL | SubFlags::ESC);

    if let Err(e) = run_snippet(ses, &snippet, &code) {
        tracing::warn!(session = ses.name(), error = %e, "#LUA failed");
        ses.show_error(&e.to_string());
    }
}

/// Compile and run already-substituted `code` in the session's engine.
///
/// `snippet` is the text as the user typed it, before substitution.  Error
/// reports quote it rather than `code`, so a failure points at what was
/// typed even when a variable expanded into the broken part.
pub fn run_snippet(ses: &Rc<Session>, snippet: &str, code: &str) -> BridgeResult<()> {
    let lua = context::ensure_initialized(ses).map_err(|source| BridgeError::EngineInit {
        snippet: snippet.to_owned(),
        source: Box::new(source),
    })?;

    let _frame = ScriptFrame::enter(ses).ok_or_else(|| BridgeError::RecursionLimit {
        snippet: snippet.to_owned(),
        limit: ses.config().max_script_depth,
    })?;

    let chunk = lua
        .load(code)
        .set_name(CHUNK_NAME)
        .into_function()
        .map_err(|e| BridgeError::Compile {
            snippet: snippet.to_owned(),
            message: match e {
                mlua::Error::SyntaxError { message, .. } => message,
                other => other.to_string(),
            },
        })?;

    chunk.call::<()>(()).map_err(|e| BridgeError::Runtime {
        snippet: snippet.to_owned(),
        message: e.to_string(),
    })
}

// ── ScriptFrame ───────────────────────────────────────────────────────────

/// One level of `#LUA` nesting.  Entering records the session's depth;
/// dropping restores it, on every exit path.
struct ScriptFrame<'a> {
    ses: &'a Session,
    baseline: usize,
}

impl<'a> ScriptFrame<'a> {
    fn enter(ses: &'a Session) -> Option<Self> {
        let baseline = ses.script_depth();
        if baseline >= ses.config().max_script_depth {
            return None;
        }
        ses.set_script_depth(baseline + 1);
        Some(Self { ses, baseline })
    }
}

impl Drop for ScriptFrame<'_> {
    fn drop(&mut self) {
        self.ses.set_script_depth(self.baseline);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;

    fn session() -> Rc<Session> {
        Session::new("gts", BridgeConfig::default())
    }

    #[test]
    fn empty_snippet_succeeds_silently() {
        let ses = session();
        do_lua(&ses, "{}");
        assert!(ses.errors().is_empty());
        assert!(ses.output().is_empty());
        assert!(ses.has_lua_context());
    }

    #[test]
    fn compile_error_names_the_snippet() {
        let ses = session();
        let err = run_snippet(&ses, "tt.print(", "tt.print(").unwrap_err();
        match err {
            BridgeError::Compile { snippet, message } => {
                assert_eq!(snippet, "tt.print(");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(ses.script_depth(), 0);
    }

    #[test]
    fn runtime_error_carries_a_traceback() {
        let ses = session();
        let err = run_snippet(&ses, "undefined_fn()", "undefined_fn()").unwrap_err();
        match err {
            BridgeError::Runtime { message, .. } => {
                assert!(message.contains("undefined_fn"), "{message}");
                assert!(message.contains("stack traceback"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(ses.script_depth(), 0);
    }

    #[test]
    fn substitution_runs_before_compilation() {
        let ses = session();
        ses.set_var("who", "world");
        do_lua(&ses, r#"{tt.print("hello $who")}"#);
        assert_eq!(ses.output(), vec!["hello world"]);
    }

    #[test]
    fn errors_report_the_typed_snippet() {
        let ses = session();
        ses.set_var("bad", "(");
        do_lua(&ses, "{tt.print$bad}");
        let errors = ses.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("#LUA {tt.print$bad} failed to load"), "{}", errors[0]);
    }

    #[test]
    fn init_failure_is_reported_and_nothing_runs() {
        let ses = Session::new("gts", BridgeConfig { buffer_size: usize::MAX, ..BridgeConfig::default() });
        do_lua(&ses, r#"{tt.print("hi")}"#);
        assert!(ses.output().is_empty());
        let errors = ses.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("failed to init lua VM"), "{}", errors[0]);
        assert!(!ses.has_lua_context());
    }

    #[test]
    fn depth_is_restored_on_every_path() {
        let ses = session();
        for code in ["x = 1", "x = ", "error('boom')"] {
            let _ = run_snippet(&ses, code, code);
            assert_eq!(ses.script_depth(), 0, "after {code:?}");
        }
    }

    #[test]
    fn nested_invocations_are_bounded() {
        let ses = Session::new("gts", BridgeConfig { max_script_depth: 4, ..BridgeConfig::default() });
        do_lua(&ses, r##"{function again() depth = (depth or 0) + 1 tt.send("#lua {again()}") end}"##);
        do_lua(&ses, "{again()}");

        let errors = ses.errors();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("nested script limit of 4"), "{}", errors[0]);
        assert_eq!(ses.script_depth(), 0);

        let depth: i64 = ses.lua_handle().unwrap().load("return depth").eval().unwrap();
        assert_eq!(depth, 4);
    }
}
