use proptest::prelude::*;
use tt::args::{get_arg_in_braces, get_arg_stop_spaces, split_commands};
use tt::command::script_driver;
use tt::config::BridgeConfig;
use tt::lua::Buffer;
use tt::substitute::{substitute, SubContext, SubFlags};
use tt::Session;

/// A context with nothing defined.
struct Empty;

impl SubContext for Empty {
    fn lookup_var(&self, _name: &str) -> Option<String> {
        None
    }

    fn lookup_function(&self, _name: &str) -> Option<String> {
        None
    }
}

fn all_flags() -> SubFlags {
    SubFlags::VAR | SubFlags::FUN | SubFlags::COL | SubFlags::ESC
}

proptest! {
    /// A write of `L` bytes into a buffer of capacity `C` keeps
    /// `min(L, C-1)` bytes, leaving room for the terminator.
    #[test]
    fn buffer_write_truncates(data in proptest::collection::vec(any::<u8>(), 0..300), cap in 1usize..200) {
        let mut buf = Buffer::try_new(cap).unwrap();
        let kept = buf.write(&data).to_vec();
        let expect = data.len().min(cap - 1);
        prop_assert_eq!(kept.len(), expect);
        prop_assert_eq!(&kept[..], &data[..expect]);
        prop_assert_eq!(buf.as_bytes(), &data[..expect]);
        prop_assert_eq!(buf.len(), expect);
        prop_assert!(buf.len() < buf.capacity());
    }
}

proptest! {
    #[test]
    fn argument_parsers_do_not_panic(s in "\\PC*") {
        let _ = get_arg_in_braces(&s);
        let _ = get_arg_stop_spaces(&s);
        let _ = split_commands(&s);
    }
}

proptest! {
    /// Split pieces never contain a top-level `;` and are trimmed.
    #[test]
    fn split_pieces_are_trimmed(s in "[a-z ;]*") {
        for piece in split_commands(&s) {
            prop_assert!(!piece.is_empty());
            prop_assert!(!piece.contains(';'));
            prop_assert_eq!(piece, piece.trim());
        }
    }
}

proptest! {
    /// Text without any marker character comes back unchanged.
    #[test]
    fn marker_free_text_is_untouched(s in "[^$@<\\\\]*") {
        prop_assert_eq!(substitute(&Empty, &s, all_flags()), s);
    }
}

proptest! {
    /// Undefined variables and functions are left exactly as typed.
    #[test]
    fn undefined_names_pass_through(name in "[a-z_][a-z0-9_]{0,10}") {
        let text = format!("${name} ${{{name}}} @{name}{{x}}");
        prop_assert_eq!(substitute(&Empty, &text, SubFlags::VAR | SubFlags::FUN), text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever a script prints arrives intact, up to the buffer capacity.
    #[test]
    fn printed_text_round_trips(text in "[a-zA-Z0-9 .,!?]{0,120}") {
        let ses = Session::new("gts", BridgeConfig { buffer_size: 100, ..BridgeConfig::default() });
        let lua = tt::lua::ensure_initialized(&ses).unwrap();
        lua.globals().set("payload", text.as_str()).unwrap();
        script_driver(&ses, "#LUA {tt.print(payload)}");
        let expect: String = text.chars().take(99).collect();
        prop_assert_eq!(ses.output(), vec![expect]);
        prop_assert_eq!(ses.script_depth(), 0);
    }
}
