//! Property-based tests for shell quoting
//!
//! For any argument text, the quoted form reaches the command as exactly
//! one word with its bytes unchanged.

#![cfg(unix)]

use std::process::Command;

use docraster_extract::{shell_escape, shell_join};
use proptest::prelude::*;

/// Run `script` through `/bin/sh -c` and return its stdout
fn sh(script: &str) -> String {
    let out = Command::new("/bin/sh")
        .arg("-c")
        .arg(script)
        .output()
        .expect("sh should run");
    assert!(out.status.success(), "script failed: {script}");
    String::from_utf8(out.stdout).expect("utf-8 output")
}

/// Argument text with shell metacharacters, quotes and spaces; no NUL
fn argument_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,24}",
        r#"[a-z '"$`\\;&|*?\[\]()<>!#~%-]{0,24}"#,
        "\\PC{0,12}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_escaped_argument_survives_the_shell(arg in argument_strategy()) {
        let printed = sh(&format!("printf %s {}", shell_escape(&arg)));
        prop_assert_eq!(printed, arg);
    }

    #[test]
    fn prop_joined_tokens_stay_separate(args in prop::collection::vec(argument_strategy(), 1..5)) {
        let mut tokens = vec!["printf".to_string(), "%s\\0".to_string()];
        tokens.extend(args.iter().cloned());

        let printed = sh(&shell_join(&tokens));
        let words: Vec<&str> = printed.split('\0').collect();

        prop_assert_eq!(words.len(), args.len() + 1);
        prop_assert_eq!(&words[..args.len()], &args.iter().map(String::as_str).collect::<Vec<_>>()[..]);
    }
}
