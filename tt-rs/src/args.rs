//! Command-argument extraction.
//!
//! Arguments are either a single word or a `{braced group}`; groups nest, so
//! `{a {b} c}` is one argument `a {b} c`.  A group that is never closed runs
//! to the end of the input.

/// Skip leading whitespace and return the next argument plus the remaining
/// input.  An unbraced argument takes the whole remaining input, trimmed.
pub fn get_arg_in_braces(input: &str) -> (String, &str) {
    let s = input.trim_start();
    match s.strip_prefix('{') {
        Some(body) => take_group(body),
        None => (s.trim_end().to_owned(), ""),
    }
}

/// Like [`get_arg_in_braces`], but an unbraced argument stops at the first
/// whitespace character.
pub fn get_arg_stop_spaces(input: &str) -> (String, &str) {
    let s = input.trim_start();
    if let Some(body) = s.strip_prefix('{') {
        return take_group(body);
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (s[..end].to_owned(), &s[end..])
}

/// Split `body` (just past an opening `{`) at its matching `}`.
fn take_group(body: &str) -> (String, &str) {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (body[..i].to_owned(), &body[i + 1..]);
                }
            }
            _ => {}
        }
    }
    (body.to_owned(), "")
}

/// Split an input line into commands at `;` characters outside any brace
/// group.  Empty pieces are dropped.
pub fn split_commands(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                out.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&line[start..]);
    out.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// `true` if `word` is a non-empty, case-insensitive prefix of `full`.
pub fn is_abbrev(word: &str, full: &str) -> bool {
    !word.is_empty()
        && word.len() <= full.len()
        && full.is_char_boundary(word.len())
        && full[..word.len()].eq_ignore_ascii_case(word)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braced_argument() {
        let (arg, rest) = get_arg_in_braces("  {tt.print(\"hi\")} tail");
        assert_eq!(arg, "tt.print(\"hi\")");
        assert_eq!(rest, " tail");
    }

    #[test]
    fn nested_braces() {
        let (arg, rest) = get_arg_in_braces("{t = {1, {2}}}");
        assert_eq!(arg, "t = {1, {2}}");
        assert_eq!(rest, "");
    }

    #[test]
    fn unbalanced_group_takes_the_rest() {
        let (arg, rest) = get_arg_in_braces("{x = {1");
        assert_eq!(arg, "x = {1");
        assert_eq!(rest, "");
    }

    #[test]
    fn unbraced_takes_everything() {
        let (arg, rest) = get_arg_in_braces("  x = 1 + 2  ");
        assert_eq!(arg, "x = 1 + 2");
        assert_eq!(rest, "");
    }

    #[test]
    fn empty_input() {
        assert_eq!(get_arg_in_braces(""), (String::new(), ""));
        assert_eq!(get_arg_in_braces("{}"), (String::new(), ""));
    }

    #[test]
    fn stop_spaces_word() {
        let (arg, rest) = get_arg_stop_spaces(" hp 100");
        assert_eq!(arg, "hp");
        assert_eq!(rest, " 100");
    }

    #[test]
    fn stop_spaces_group() {
        let (arg, rest) = get_arg_stop_spaces("{BUFFER SIZE} {64}");
        assert_eq!(arg, "BUFFER SIZE");
        assert_eq!(get_arg_stop_spaces(rest).0, "64");
    }

    #[test]
    fn split_respects_braces() {
        assert_eq!(
            split_commands("north;#lua {a = 1; b = 2};  ;south"),
            vec!["north", "#lua {a = 1; b = 2}", "south"]
        );
    }

    #[test]
    fn abbreviations() {
        assert!(is_abbrev("lu", "LUA"));
        assert!(is_abbrev("LUA", "lua"));
        assert!(!is_abbrev("luax", "lua"));
        assert!(!is_abbrev("", "lua"));
    }
}
