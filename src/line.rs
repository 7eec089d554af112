//! Line normalisation and wire framing.
//!
//! Every transmitted unit must occupy exactly one line on the wire, so
//! trailing line endings are trimmed and interior ones are rewritten to the
//! Unicode line separator before the token and style are attached.

use crate::style::Style;

/// Unicode line separator substituted for embedded newlines.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// A queued log line. Immutable once enqueued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    text: String,
    style: Option<Style>,
}

impl LogLine {
    /// Create a line, trimming trailing `\r`/`\n` characters.
    pub fn new(text: &str, style: Option<Style>) -> Self {
        Self {
            text: trim_line_endings(text).to_owned(),
            style,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }
}

/// Remove trailing carriage returns and line feeds only.
pub fn trim_line_endings(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Produce the single-line form of `line`.
///
/// Trailing line endings are dropped; every interior `\r\n`, `\n`, or `\r`
/// becomes one [`LINE_SEPARATOR`].
pub fn normalise(line: &str) -> String {
    let trimmed = trim_line_endings(line);
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(LINE_SEPARATOR);
            }
            '\n' => out.push(LINE_SEPARATOR),
            other => out.push(other),
        }
    }
    out
}

/// How a transport expects frames to be laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `token ++ style ++ line ++ "\n"` pushed onto a persistent stream.
    Stream,
    /// `style ++ line` sent as a request body; the token travels in the URL.
    Http,
}

/// A fully composed payload ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    token: String,
    body: Vec<u8>,
}

impl Frame {
    /// Compose the payload for `line` in the given wire format.
    pub fn compose(format: WireFormat, token: &str, line: &LogLine) -> Self {
        let style = line.style().map(Style::render).unwrap_or_default();
        let body = match format {
            WireFormat::Stream => {
                let text = normalise(line.text());
                let mut out = String::with_capacity(token.len() + style.len() + text.len() + 1);
                out.push_str(token);
                out.push_str(&style);
                out.push_str(&text);
                out.push('\n');
                out
            }
            WireFormat::Http => format!("{style}{}", normalise(line.text().trim())),
        };
        Self {
            token: token.to_owned(),
            body: body.into_bytes(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
