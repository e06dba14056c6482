//! Error types for the Lua bridge.
//!
//! Every variant is recovered at the `#LUA` boundary and reported through the
//! session's error sink; none of them ends the session.

use thiserror::Error;

/// Failures raised by the engine context, the host API, or the executor.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An allocation for the context, a staging buffer, or the engine failed.
    #[error("{what}: out of memory")]
    OutOfMemory { what: &'static str },

    /// The engine refused a setup call (library load, table registration).
    #[error("engine setup failed: {0}")]
    EngineSetup(String),

    /// `#LUA` could not bring up the engine for this session.
    #[error("#LUA {{{snippet}}} failed to init lua VM: {source}")]
    EngineInit {
        snippet: String,
        #[source]
        source: Box<BridgeError>,
    },

    /// The snippet did not compile.
    #[error("#LUA {{{snippet}}} failed to load: {message}")]
    Compile { snippet: String, message: String },

    /// The snippet compiled but raised while running.
    #[error("#LUA {{{snippet}}} failed to call: {message}")]
    Runtime { snippet: String, message: String },

    /// Nested `#LUA` invocations (through `tt.send`) went deeper than allowed.
    #[error("#LUA {{{snippet}}} exceeds the nested script limit of {limit}")]
    RecursionLimit { snippet: String, limit: usize },

    /// A host function was called with a missing or non-string argument.
    #[error("bad argument #1 to '{func}' (string expected, got {got})")]
    ArgumentType { func: &'static str, got: &'static str },

    /// A host function could not find the session that owns the engine.
    #[error("{func}: NULL session access")]
    SessionUnbound { func: &'static str },
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_message_keeps_snippet_and_diagnostic() {
        let e = BridgeError::Compile {
            snippet: "tt.print(".into(),
            message: "unexpected symbol near <eof>".into(),
        };
        assert_eq!(
            e.to_string(),
            "#LUA {tt.print(} failed to load: unexpected symbol near <eof>"
        );
    }

    #[test]
    fn engine_init_wraps_cause() {
        let e = BridgeError::EngineInit {
            snippet: "x = 1".into(),
            source: Box::new(BridgeError::OutOfMemory { what: "lua buffer" }),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("#LUA {x = 1} failed to init lua VM"));
        assert!(msg.ends_with("lua buffer: out of memory"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn argument_type_message() {
        let e = BridgeError::ArgumentType { func: "print", got: "nil" };
        assert_eq!(e.to_string(), "bad argument #1 to 'print' (string expected, got nil)");
    }
}
