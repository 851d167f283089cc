//! # Pattern
//!
//! Compiles a Redis-style glob pattern (`KEYS pattern` in the engine's
//! command surface) into an anchored [`regex::Regex`].
//!
//! Only `*` and `?` are treated as wildcards; every other character is
//! matched literally, including characters that are regex metacharacters
//! (`. + ^ $ { } ( ) | [ ] \`) — those are escaped before compilation so a
//! key like `"a.b"` only matches the literal pattern `"a.b"`, not `"aXb"`.
//!
//! ## Example
//!
//! ```rust
//! use pattern::Pattern;
//!
//! let p = Pattern::compile("user:*");
//! assert!(p.matches("user:42"));
//! assert!(!p.matches("session:42"));
//!
//! let all = Pattern::compile("*");
//! assert!(all.matches("anything"));
//! ```

use regex::Regex;

/// A compiled glob pattern over keys.
///
/// Compilation happens once (in [`Pattern::compile`]); [`Pattern::matches`]
/// is cheap to call repeatedly, which matters for `KEYS` scanning every
/// entry in the memtable and every run.
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles `glob` into a matcher.
    ///
    /// `*` matches any run of characters (including none), `?` matches
    /// exactly one character, and every other character is literal.
    #[must_use]
    pub fn compile(glob: &str) -> Self {
        let mut out = String::with_capacity(glob.len() * 2 + 2);
        out.push('^');
        for c in glob.chars() {
            match c {
                '*' => out.push_str(".*"),
                '?' => out.push('.'),
                '.' | '+' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\' => {
                    out.push('\\');
                    out.push(c);
                }
                other => out.push(other),
            }
        }
        out.push('$');

        // The escaping above guarantees a well-formed pattern; any remaining
        // failure would be a bug in this function, not bad user input.
        #[allow(clippy::expect_used)]
        let regex = Regex::new(&out).expect("generated pattern regex is always valid");
        Self { regex }
    }

    /// Compiles an optional glob; `None` matches every key.
    #[must_use]
    pub fn compile_opt(glob: Option<&str>) -> Self {
        match glob {
            Some(g) => Self::compile(g),
            None => Self::compile("*"),
        }
    }

    /// Returns `true` if `key` matches this pattern.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}
