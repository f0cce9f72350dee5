use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Diagnostic produced while parsing
///
/// The parser recovers from all of these; they are reported alongside a
/// complete tree rather than instead of one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid token {lexeme:?} at {line}:{column}")]
    InvalidToken {
        line: usize,
        column: usize,
        lexeme: String,
    },

    #[error("Unclosed {construct} at {line}:{column}")]
    Unclosed {
        line: usize,
        column: usize,
        construct: String,
    },
}

impl ParseError {
    pub fn invalid_token(line: usize, column: usize, lexeme: impl Into<String>) -> Self {
        Self::InvalidToken {
            line,
            column,
            lexeme: lexeme.into(),
        }
    }

    pub fn unclosed(line: usize, column: usize, construct: impl Into<String>) -> Self {
        Self::Unclosed {
            line,
            column,
            construct: construct.into(),
        }
    }

    /// 0-based `(line, column)` where the problem starts
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::InvalidToken { line, column, .. } => (*line, *column),
            ParseError::Unclosed { line, column, .. } => (*line, *column),
        }
    }

    #[cfg_attr(not(feature = "pretty-errors"), allow(dead_code))]
    fn width(&self) -> usize {
        match self {
            ParseError::InvalidToken { lexeme, .. } => lexeme.chars().count().max(1),
            ParseError::Unclosed { .. } => 1,
        }
    }
}

/// Char offset of a 0-based `(line, column)` position in `source`
#[cfg_attr(not(feature = "pretty-errors"), allow(dead_code))]
fn char_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index == line {
            return offset + column.min(text.chars().count());
        }
        offset += text.chars().count();
    }
    offset
}

/// Pretty-print errors with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, filename: &str, errors: &[ParseError]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for error in errors {
        let (line, column) = error.position();
        let start = char_offset(source, line, column);
        let end = start + error.width();

        let label = match error {
            ParseError::InvalidToken { .. } => "not part of ABC notation".to_string(),
            ParseError::Unclosed { construct, .. } => format!("this {} is never closed", construct),
        };

        let report = Report::build(ReportKind::Error, filename, start)
            .with_message(error.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Red)
                    .with_message(label),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            output.extend_from_slice(error.to_string().as_bytes());
            output.push(b'\n');
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_offset() {
        let source = "X:1\nK:C\nC#D\n";
        assert_eq!(char_offset(source, 0, 0), 0);
        assert_eq!(char_offset(source, 2, 1), 9);
    }

    #[test]
    fn test_error_messages() {
        let error = ParseError::invalid_token(2, 1, "#");
        assert_eq!(error.to_string(), "Invalid token \"#\" at 2:1");
        assert_eq!(error.position(), (2, 1));
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_errors_mentions_message() {
        let source = "X:1\nK:C\nC#D\n";
        let errors = vec![ParseError::invalid_token(2, 1, "#")];
        let rendered = format_errors(source, "tune.abc", &errors);
        assert!(rendered.contains("Invalid token"));
    }
}
