//! Text substitution applied to command arguments before they run.
//!
//! | Flag  | Sequence        | Meaning                                        |
//! |-------|-----------------|------------------------------------------------|
//! | `VAR` | `$name`         | Value of variable `name`                       |
//! | `VAR` | `${name}`       | Same, braced form                              |
//! | `VAR` | `$$`            | Literal `$`                                    |
//! | `FUN` | `@name{a;b}`    | Body of user function `name`, `%1`=`a`, `%2`=`b`, `%0`=`a;b` |
//! | `COL` | `<abc>`         | ANSI color: a=attribute, b=foreground, c=background, `9`=keep |
//! | `ESC` | `\e` `\a`       | ESC and BEL                                    |
//! | `ESC` | `\xHH`          | The character with hex code `HH` (below `80`)  |
//! | `ESC` | `\\`            | Kept as is, so `\\e` is not an escape          |
//!
//! Anything that does not resolve (unknown variable or function, malformed
//! sequence) is copied through unchanged.

use std::ops::BitOr;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::args;
use crate::session::Session;

/// Which substitution passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubFlags(u8);

impl SubFlags {
    pub const VAR: Self = Self(0x01);
    pub const FUN: Self = Self(0x02);
    pub const COL: Self = Self(0x04);
    pub const ESC: Self = Self(0x08);

        #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for SubFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Lookups the substitution passes need.
pub trait SubContext {
    fn lookup_var(&self, name: &str) -> Option<String>;
    fn lookup_function(&self, name: &str) -> Option<String>;
}

impl SubContext for Session {
    fn lookup_var(&self, name: &str) -> Option<String> {
        self.var(name)
    }

    fn lookup_function(&self, name: &str) -> Option<String> {
        self.function(name)
    }
}

/// Run the passes selected by `flags` over `text`.
pub fn substitute(ctx: &dyn SubContext, text: &str, flags: SubFlags) -> String {
    let mut out = if flags.intersects(SubFlags::VAR | SubFlags::FUN) {
        expand_names(ctx, text, flags)
    } else {
        text.to_owned()
    };
    if flags.contains(SubFlags::COL) {
        out = expand_colors(&out);
    }
    if flags.contains(SubFlags::ESC) {
        out = expand_escapes(&out);
    }
    out
}

// ── VAR / FUN ─────────────────────────────────────────────────────────────

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Length in bytes of the identifier at the start of `s` (0 if none).
fn ident_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if is_ident_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|&(_, c)| !is_ident_continue(c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn expand_names(ctx: &dyn SubContext, text: &str, flags: SubFlags) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(|c: char| c == '$' || c == '@') {
        out.push_str(&rest[..pos]);
        let sigil = &rest[pos..pos + 1];
        let after = &rest[pos + 1..];

        let consumed = match sigil {
            "$" if flags.contains(SubFlags::VAR) => expand_var(ctx, after, &mut out),
            "@" if flags.contains(SubFlags::FUN) => expand_function(ctx, after, &mut out),
            _ => None,
        };
        match consumed {
            Some(n) => rest = &after[n..],
            None => {
                out.push_str(sigil);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Expand the variable reference following a `$`.  Returns how many bytes of
/// `after` were consumed, or `None` to leave the `$` as it is.
fn expand_var(ctx: &dyn SubContext, after: &str, out: &mut String) -> Option<usize> {
    if after.starts_with('$') {
        out.push('$');
        return Some(1);
    }
    if let Some(body) = after.strip_prefix('{') {
        let close = body.find('}')?;
        let value = ctx.lookup_var(&body[..close])?;
        out.push_str(&value);
        return Some(close + 2);
    }
    let n = ident_len(after);
    if n == 0 {
        return None;
    }
    let value = ctx.lookup_var(&after[..n])?;
    out.push_str(&value);
    Some(n)
}

/// Expand a `name{args}` call following an `@`.
fn expand_function(ctx: &dyn SubContext, after: &str, out: &mut String) -> Option<usize> {
    let n = ident_len(after);
    if n == 0 || !after[n..].starts_with('{') {
        return None;
    }
    let body = ctx.lookup_function(&after[..n])?;
    let (arg_text, tail) = args::get_arg_in_braces(&after[n..]);
    let call_args: Vec<&str> = arg_text.split(';').map(str::trim).collect();

    let mut expanded = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('%', Some(d @ '0'..='9')) => {
                chars.next();
                if d == '0' {
                    expanded.push_str(&arg_text);
                } else {
                    let idx = d as usize - '1' as usize;
                    expanded.push_str(call_args.get(idx).copied().unwrap_or(""));
                }
            }
            _ => expanded.push(c),
        }
    }
    out.push_str(&expanded);
    Some(after.len() - tail.len())
}

// ── COL ───────────────────────────────────────────────────────────────────

fn color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([0-9])([0-9])([0-9])>").expect("color pattern is valid"))
}

fn expand_colors(text: &str) -> String {
    color_regex()
        .replace_all(text, |caps: &Captures| {
            let digit = |i: usize| caps[i].as_bytes()[0] - b'0';
            let mut codes = Vec::with_capacity(3);
            match digit(1) {
                9 => {}
                a => codes.push(a.to_string()),
            }
            match digit(2) {
                fg @ 0..=7 => codes.push((30 + fg).to_string()),
                _ => {}
            }
            match digit(3) {
                bg @ 0..=7 => codes.push((40 + bg).to_string()),
                _ => {}
            }
            if codes.is_empty() {
                String::new()
            } else {
                format!("\x1b[{}m", codes.join(";"))
            }
        })
        .into_owned()
}

// ── ESC ───────────────────────────────────────────────────────────────────

fn expand_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('\\') {
            out.push_str("\\\\");
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('e') {
            out.push('\x1b');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('a') {
            out.push('\x07');
            rest = tail;
        } else if let Some(byte) = after
            .strip_prefix('x')
            .and_then(|h| h.get(..2))
            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .filter(u8::is_ascii)
        {
            out.push(char::from(byte));
            rest = &after[3..];
        } else {
            out.push('\\');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────
