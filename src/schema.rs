//! Locating the declared version in CodeGame event schema (`.cge`) sources.
//!
//! Only the `version` field is extracted; the rest of the file is never
//! parsed. Leading whitespace and comments are skipped first:
//!
//! ```text
//! // line comments
//! /* block comments /* which nest */ */
//! name my_game
//! version 0.4
//! ```
//!
//! then the token following the first `version` word is returned.

use crate::error::{CgError, Result};

/// Scan state over the decoded characters of a schema.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    index: usize,
    depth: usize,
}

impl Cursor {
    /// Move past leading whitespace and comments.
    ///
    /// An unterminated block comment keeps `depth` above zero and swallows
    /// the rest of the input. `//` runs to the end of the line at any depth,
    /// so a `*/` after it never closes a block.
    fn skip_trivia(&mut self, chars: &[char]) {
        while let Some(&current) = chars.get(self.index) {
            let next = chars.get(self.index + 1).copied();

            match (current, next) {
                ('/', Some('/')) => {
                    while chars.get(self.index).is_some_and(|&c| c != '\n') {
                        self.index += 1;
                    }
                }
                ('/', Some('*')) => {
                    self.depth += 1;
                    self.index += 2;
                }
                ('*', Some('/')) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.index += 2;
                }
                _ if self.depth > 0 || current.is_whitespace() => self.index += 1,
                _ => break,
            }
        }
    }
}

/// The version token declared in `source`.
///
/// # Errors
///
/// [`CgError::InvalidSchema`] if no `version` word followed by a value
/// remains after skipping leading comments.
///
/// # Examples
///
/// ```
/// let source = "// comment\n/* nested /* still nested */ still */ version 0.4";
/// assert_eq!(cgkit::schema::extract_version(source).unwrap(), "0.4");
/// ```
pub fn extract_version(source: &str) -> Result<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut cursor = Cursor::default();
    cursor.skip_trivia(&chars);

    let rest: String = chars[cursor.index..].iter().collect();
    let words: Vec<&str> = rest.split_whitespace().collect();

    words
        .windows(2)
        .find(|pair| pair[0] == "version")
        .map(|pair| pair[1].to_string())
        .ok_or(CgError::InvalidSchema)
}
