//! Command dispatch.
//!
//! An input line is split at top-level `;` into commands.  A command that
//! starts with `#` is looked up in [`COMMANDS`] (case-insensitive, any unique
//! prefix works, first match in table order wins); anything else is
//! substituted and sent to the world.
//!
//! | Command                     | Effect                                 |
//! |-----------------------------|----------------------------------------|
//! | `#FUNCTION {name} {body}`   | Define `@name{…}` for substitution     |
//! | `#LUA {script}`             | Run a Lua snippet                      |
//! | `#NOP …`                    | Ignore the rest of the command         |
//! | `#SHOWME {text}`            | Show text in the session               |
//! | `#UNFUNCTION {name}`        | Remove a function                      |
//! | `#UNVARIABLE {name}`        | Remove a variable                      |
//! | `#VARIABLE [{name} {value}]`| Set a variable, or list all of them    |
//! | `#ZAP`                      | Close the session                      |

use std::rc::Rc;

use crate::args::{get_arg_in_braces, get_arg_stop_spaces, is_abbrev, split_commands};
use crate::lua;
use crate::session::Session;
use crate::substitute::{substitute, SubFlags};

type CommandFn = fn(&Rc<Session>, &str);

/// One entry of the command table.
pub struct Command {
    pub name: &'static str,
    func: CommandFn,
}

/// Every `#` command, in lookup order.
pub static COMMANDS: &[Command] = &[
    Command { name: "FUNCTION",   func: do_function },
    Command { name: "LUA",        func: lua::do_lua },
    Command { name: "NOP",        func: do_nop },
    Command { name: "SHOWME",     func: do_showme },
    Command { name: "UNFUNCTION", func: do_unfunction },
    Command { name: "UNVARIABLE", func: do_unvariable },
    Command { name: "VARIABLE",   func: do_variable },
    Command { name: "ZAP",        func: do_zap },
];

/// Find the command `word` names: an exact match first, then the first
/// entry `word` abbreviates.
pub fn find_command(word: &str) -> Option<&'static Command> {
    COMMANDS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(word))
        .or_else(|| COMMANDS.iter().find(|c| is_abbrev(word, c.name)))
}

/// Run one line of input for `ses`, synchronously.
///
/// This is also the path `tt.send` takes, so a command here may start a
/// nested `#LUA` before the caller's script returns.
pub fn script_driver(ses: &Rc<Session>, line: &str) {
    if ses.is_closed() {
        tracing::trace!(session = ses.name(), "input ignored, session closed");
        return;
    }
    for cmd in split_commands(line) {
        if ses.is_closed() {
            break;
        }
        match cmd.strip_prefix('#') {
            Some(body) => run_command(ses, body),
            None => {
                let text = substitute(&**ses, cmd, SubFlags::VAR | SubFlags::FUN | SubFlags::ESC);
                ses.send_line(&text);
            }
        }
    }
}

fn run_command(ses: &Rc<Session>, body: &str) {
    let end = body
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(body.len());
    let (word, arg) = body.split_at(end);

    match find_command(word) {
        Some(cmd) => {
            tracing::trace!(session = ses.name(), command = cmd.name, "dispatch");
            (cmd.func)(ses, arg);
        }
        None => ses.show_error(&format!("UNKNOWN TINTIN-COMMAND '{word}'.")),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────

fn do_nop(_ses: &Rc<Session>, _arg: &str) {}

fn do_showme(ses: &Rc<Session>, arg: &str) {
    let (text, _) = get_arg_in_braces(arg);
    let flags = SubFlags::VAR | SubFlags::FUN | SubFlags::COL | SubFlags::ESC;
    ses.puts(&substitute(&**ses, &text, flags));
}

fn do_variable(ses: &Rc<Session>, arg: &str) {
    let (name, rest) = get_arg_stop_spaces(arg);
    if name.is_empty() {
        let vars = ses.vars_snapshot();
        for (k, v) in vars.iter() {
            ses.puts(&format!("#VARIABLE {{{k}}}={{{v}}}"));
        }
        return;
    }
    let (value, _) = get_arg_in_braces(rest);
    let value = substitute(&**ses, &value, SubFlags::VAR | SubFlags::FUN);
    ses.set_var(name, value);
}

fn do_unvariable(ses: &Rc<Session>, arg: &str) {
    let (name, _) = get_arg_stop_spaces(arg);
    if !ses.unset_var(&name) {
        ses.puts(&format!("#UNVARIABLE: NO MATCHES FOUND FOR {{{name}}}."));
    }
}

fn do_function(ses: &Rc<Session>, arg: &str) {
    let (name, rest) = get_arg_stop_spaces(arg);
    if name.is_empty() {
        ses.show_error("SYNTAX: #FUNCTION {name} {body}");
        return;
    }
    let (body, _) = get_arg_in_braces(rest);
    ses.set_function(name, body);
}

fn do_unfunction(ses: &Rc<Session>, arg: &str) {
    let (name, _) = get_arg_stop_spaces(arg);
    if !ses.unset_function(&name) {
        ses.puts(&format!("#UNFUNCTION: NO MATCHES FOUND FOR {{{name}}}."));
    }
}

fn do_zap(ses: &Rc<Session>, _arg: &str) {
    ses.close();
}

// ── Tests ─────────────────────────────────────────────────────────────────
