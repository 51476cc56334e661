/// Everything from this marker to the end of the line is a comment.
pub const COMMENT_MARKER: char = '#';

/// Tokens of a single config line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    pub tokens: Vec<&'a str>,
}

impl Line<'_> {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Splits `line` on whitespace, dropping everything from the comment marker
/// onwards. The marker may start mid-token, in which case the part of the
/// token before it is kept.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for token in line.split_whitespace() {
        if let Some(at) = token.find(COMMENT_MARKER) {
            let before = &token[..at];
            if !before.is_empty() {
                tokens.push(before);
            }
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Lazily tokenizes every line of `input`. Blank and comment-only lines are
/// still yielded (with no tokens) so that line numbers stay accurate.
pub fn lines(input: &str) -> impl Iterator<Item = Line<'_>> {
    input.lines().enumerate().map(|(index, line)| Line {
        number: index + 1,
        tokens: tokenize(line),
    })
}
