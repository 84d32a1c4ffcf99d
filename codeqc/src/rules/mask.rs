//! Comment/string masking ahead of pattern matching.
//!
//! A byte-level tokenizer walks the source once and blanks out comment bodies
//! (and, in [`MaskMode::CommentsAndStrings`], string literal contents). Masked
//! bytes become spaces, newlines are kept, so byte offsets, line numbers and
//! columns in the masked text match the original exactly.
//!
//! Delimiters are ASCII, so UTF-8 continuation bytes never trigger a state
//! transition and every character is masked or copied as a whole.

use serde::{Deserialize, Serialize};

/// Source language, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    /// TypeScript and JavaScript (incl. JSX/TSX)
    Script,
    Python,
    /// C, C++, C#, Java, Go, Kotlin, Swift
    CFamily,
    /// Shell, TOML, YAML and other `#`-comment formats
    Hash,
    Other,
}

impl Language {
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "rs" => Self::Rust,
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => Self::Script,
            "py" | "pyi" => Self::Python,
            "c" | "h" | "cc" | "cpp" | "hpp" | "cs" | "java" | "go" | "kt" | "kts" | "swift" => {
                Self::CFamily
            }
            "sh" | "bash" | "toml" | "yaml" | "yml" | "rb" | "ps1" => Self::Hash,
            _ => Self::Other,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Self::Rust => Syntax {
                line_comments: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: b"\"'",
                multiline_quotes: b"\"",
                raw_strings: true,
                triple_quotes: false,
            },
            Self::Script => Syntax {
                line_comments: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: b"\"'`",
                multiline_quotes: b"`",
                raw_strings: false,
                triple_quotes: false,
            },
            Self::Python => Syntax {
                line_comments: &["#"],
                block_comment: None,
                quotes: b"\"'",
                multiline_quotes: b"",
                raw_strings: false,
                triple_quotes: true,
            },
            Self::CFamily => Syntax {
                line_comments: &["//"],
                block_comment: Some(("/*", "*/")),
                quotes: b"\"'",
                multiline_quotes: b"",
                raw_strings: false,
                triple_quotes: false,
            },
            Self::Hash => Syntax {
                line_comments: &["#"],
                block_comment: None,
                quotes: b"\"'",
                multiline_quotes: b"",
                raw_strings: false,
                triple_quotes: false,
            },
            Self::Other => Syntax {
                line_comments: &[],
                block_comment: None,
                quotes: b"",
                multiline_quotes: b"",
                raw_strings: false,
                triple_quotes: false,
            },
        }
    }
}

/// What to blank out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Comment bodies only; string literals stay visible.
    Comments,
    /// Comment bodies and string literal contents.
    CommentsAndStrings,
}

/// Tokenizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskState {
    Normal,
    LineComment,
    BlockComment,
    StringLiteral { quote: u8, triple: bool },
    RawStringLiteral { hashes: usize },
}

struct Syntax {
    line_comments: &'static [&'static str],
    block_comment: Option<(&'static str, &'static str)>,
    quotes: &'static [u8],
    multiline_quotes: &'static [u8],
    raw_strings: bool,
    triple_quotes: bool,
}

/// Mask `source` according to the syntax of `language`.
pub fn mask(source: &str, language: Language, mode: MaskMode) -> String {
    if language == Language::Other {
        return source.to_string();
    }

    let syntax = language.syntax();
    let bytes = source.as_bytes();
    let mask_strings = mode == MaskMode::CommentsAndStrings;
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut state = MaskState::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let rest = &bytes[i..];

        match state {
            MaskState::Normal => {
                if let Some(open) = syntax
                    .line_comments
                    .iter()
                    .find(|open| rest.starts_with(open.as_bytes()))
                {
                    out.extend(std::iter::repeat(b' ').take(open.len()));
                    i += open.len();
                    state = MaskState::LineComment;
                } else if let Some((open, _)) = syntax
                    .block_comment
                    .filter(|(open, _)| rest.starts_with(open.as_bytes()))
                {
                    out.extend(std::iter::repeat(b' ').take(open.len()));
                    i += open.len();
                    state = MaskState::BlockComment;
                } else if let Some((prefix_len, hashes)) =
                    raw_string_open(bytes, i).filter(|_| syntax.raw_strings)
                {
                    out.extend_from_slice(&bytes[i..i + prefix_len]);
                    i += prefix_len;
                    state = MaskState::RawStringLiteral { hashes };
                } else if syntax.quotes.contains(&b) && opens_string(language, source, i) {
                    let triple = syntax.triple_quotes && rest.starts_with(&[b, b, b]);
                    let width = if triple { 3 } else { 1 };
                    out.extend_from_slice(&bytes[i..i + width]);
                    i += width;
                    state = MaskState::StringLiteral { quote: b, triple };
                } else {
                    out.push(b);
                    i += 1;
                }
            }
            MaskState::LineComment => {
                if b == b'\n' {
                    state = MaskState::Normal;
                }
                out.push(blank(b));
                i += 1;
            }
            MaskState::BlockComment => {
                let close = syntax.block_comment.map(|(_, close)| close).unwrap_or("*/");
                if rest.starts_with(close.as_bytes()) {
                    out.extend(std::iter::repeat(b' ').take(close.len()));
                    i += close.len();
                    state = MaskState::Normal;
                } else {
                    out.push(blank(b));
                    i += 1;
                }
            }
            MaskState::StringLiteral { quote, triple } => {
                if b == b'\\' && i + 1 < bytes.len() {
                    out.push(string_byte(b, mask_strings));
                    out.push(string_byte(bytes[i + 1], mask_strings));
                    i += 2;
                } else if triple && rest.starts_with(&[quote, quote, quote]) {
                    out.extend_from_slice(&rest[..3]);
                    i += 3;
                    state = MaskState::Normal;
                } else if !triple && b == quote {
                    out.push(b);
                    i += 1;
                    state = MaskState::Normal;
                } else if b == b'\n' && !triple && !syntax.multiline_quotes.contains(&quote) {
                    // Unterminated single-line literal; recover at end of line.
                    out.push(b);
                    i += 1;
                    state = MaskState::Normal;
                } else {
                    out.push(string_byte(b, mask_strings));
                    i += 1;
                }
            }
            MaskState::RawStringLiteral { hashes } => {
                if b == b'"' && closes_raw(rest, hashes) {
                    out.extend_from_slice(&rest[..1 + hashes]);
                    i += 1 + hashes;
                    state = MaskState::Normal;
                } else {
                    out.push(string_byte(b, mask_strings));
                    i += 1;
                }
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn blank(b: u8) -> u8 {
    if b == b'\n' {
        b'\n'
    } else {
        b' '
    }
}

fn string_byte(b: u8, mask_strings: bool) -> u8 {
    if mask_strings {
        blank(b)
    } else {
        b
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Detect a Rust raw string opener (`r"`, `r#"`, `br##"`) at `i`.
///
/// Returns the opener length and the number of `#` delimiters.
fn raw_string_open(bytes: &[u8], i: usize) -> Option<(usize, usize)> {
    let mut j = i;
    if bytes.get(j) == Some(&b'b') {
        j += 1;
    }
    if bytes.get(j) != Some(&b'r') {
        return None;
    }
    if i > 0 && is_ident_byte(bytes[i - 1]) {
        return None;
    }
    j += 1;
    let mut hashes = 0;
    while bytes.get(j) == Some(&b'#') {
        hashes += 1;
        j += 1;
    }
    if bytes.get(j) == Some(&b'"') {
        Some((j + 1 - i, hashes))
    } else {
        None
    }
}

fn closes_raw(rest: &[u8], hashes: usize) -> bool {
    rest.len() > hashes && rest[1..=hashes].iter().all(|b| *b == b'#')
}

/// Whether the quote at `i` opens a literal. Only Rust needs care: `'a` is a
/// lifetime or label unless it is a complete char literal.
fn opens_string(language: Language, source: &str, i: usize) -> bool {
    let bytes = source.as_bytes();
    if language != Language::Rust || bytes[i] != b'\'' {
        return true;
    }
    match bytes.get(i + 1) {
        Some(b'\\') => true,
        Some(_) => source
            .get(i + 1..)
            .and_then(|tail| tail.chars().next())
            .map(|c| bytes.get(i + 1 + c.len_utf8()) == Some(&b'\''))
            .unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path("src/lib.rs"), Language::Rust);
        assert_eq!(Language::from_path("web/App.TSX"), Language::Script);
        assert_eq!(Language::from_path("tool/run.py"), Language::Python);
        assert_eq!(Language::from_path("cmd/main.go"), Language::CFamily);
        assert_eq!(Language::from_path("Cargo.toml"), Language::Hash);
        assert_eq!(Language::from_path("README"), Language::Other);
    }

    #[test]
    fn test_line_comment_masked_length_preserved() {
        let src = "let x = 1; // eval(secret)\nlet y = 2;";
        let masked = mask(src, Language::Rust, MaskMode::Comments);
        assert_eq!(masked.len(), src.len());
        assert!(!masked.contains("eval"));
        assert!(masked.contains("let y = 2;"));
        assert_eq!(masked.lines().count(), 2);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let src = "a /* one\ntwo */ b";
        let masked = mask(src, Language::CFamily, MaskMode::Comments);
        assert_eq!(masked, "a       \n       b");
    }

    #[test]
    fn test_strings_kept_in_comment_mode() {
        let src = r#"let p = "hunter2"; // note"#;
        let masked = mask(src, Language::Rust, MaskMode::Comments);
        assert!(masked.contains("\"hunter2\""));
        assert!(!masked.contains("note"));
    }

    #[test]
    fn test_strings_blanked_in_full_mode() {
        let src = r#"call("eval(x)"); eval(y)"#;
        let masked = mask(src, Language::Script, MaskMode::CommentsAndStrings);
        assert_eq!(masked.matches("eval").count(), 1);
        assert!(masked.starts_with("call(\"       \")"));
    }

    #[test]
    fn test_comment_marker_inside_string_is_not_a_comment() {
        let src = r#"let url = "http://example.com"; let z = 3;"#;
        let masked = mask(src, Language::Rust, MaskMode::Comments);
        assert_eq!(masked, src);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let src = r#"x = "a\"b // c"; y"#;
        let masked = mask(src, Language::Script, MaskMode::Comments);
        assert_eq!(masked, src);
    }

    #[test]
    fn test_rust_raw_string_with_hashes() {
        let src = "let s = r#\"a \"quoted\" // b\"#; // gone";
        let masked = mask(src, Language::Rust, MaskMode::Comments);
        assert!(masked.contains("r#\"a \"quoted\" // b\"#;"));
        assert!(!masked.contains("gone"));

        let blanked = mask(src, Language::Rust, MaskMode::CommentsAndStrings);
        assert!(!blanked.contains("quoted"));
        assert!(blanked.contains("r#\""));
        assert!(blanked.contains("\"#;"));
    }

    #[test]
    fn test_rust_lifetime_is_not_a_char_literal() {
        let src = "fn f<'a>(x: &'a str) -> char { 'x' } // tail";
        let masked = mask(src, Language::Rust, MaskMode::CommentsAndStrings);
        assert!(masked.contains("fn f<'a>(x: &'a str)"));
        assert!(masked.contains("' '"));
        assert!(!masked.contains("tail"));
    }

    #[test]
    fn test_python_hash_comment_and_triple_quotes() {
        let src = "x = 1  # eval(a)\n\"\"\"doc\neval(b)\n\"\"\"\ny = 2";
        let masked = mask(src, Language::Python, MaskMode::CommentsAndStrings);
        assert!(!masked.contains("eval"));
        assert!(masked.contains("y = 2"));
        assert_eq!(masked.lines().count(), src.lines().count());
    }

    #[test]
    fn test_unterminated_string_recovers_at_newline() {
        let src = "a = 'oops\nb = eval(x)";
        let masked = mask(src, Language::Script, MaskMode::CommentsAndStrings);
        assert!(masked.contains("eval(x)"));
    }

    #[test]
    fn test_multibyte_content_preserves_offsets() {
        let src = "let s = \"héllo\"; // ünïcode\nnext";
        let masked = mask(src, Language::Rust, MaskMode::CommentsAndStrings);
        assert_eq!(masked.len(), src.len());
        assert!(masked.ends_with("\nnext"));
    }

    #[test]
    fn test_other_language_untouched() {
        let src = "// not a comment here";
        assert_eq!(mask(src, Language::Other, MaskMode::CommentsAndStrings), src);
    }
}
