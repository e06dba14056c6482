//! A TinTin++-style session core with an embedded Lua bridge.
//!
//! ```rust
//! use tt::config::BridgeConfig;
//! use tt::command::script_driver;
//! use tt::session::Session;
//!
//! let ses = Session::new("gts", BridgeConfig::default());
//! script_driver(&ses, r#"#lua {tt.print("hi")}"#);
//! assert_eq!(ses.output(), vec!["hi"]);
//! ```

pub mod args;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod lua;
pub mod session;
pub mod substitute;
pub mod var;

pub use error::{BridgeError, BridgeResult};
pub use session::{Session, SessionEvent};
