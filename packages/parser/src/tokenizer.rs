use crate::id_generator::{IdGenerator, NodeId};
use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token subtypes for ABC notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Pitch and music elements
    Accidental,
    NoteLetter,
    Octave,
    Rest,
    Tie,
    Decoration,
    Slur,
    Barline,

    // Rhythm
    RhythmNumerator,
    RhythmSeparator,
    RhythmDenominator,
    BrokenRhythm,
    Tuplet,

    // Structural brackets
    ChordLeftBracket,
    ChordRightBracket,
    GraceGroupLeftBrace,
    GraceGroupRightBrace,
    GraceGroupSlash,
    InlineFieldLeftBracket,
    InlineFieldRightBracket,
    GroupingLeftParen,
    GroupingRightParen,

    // Information fields
    Annotation,
    InfoHeader,
    InfoString,
    Symbol,
    Comment,
    Directive,

    // Utility
    VoiceOverlay,
    LineContinuation,
    SystemBreak,
    Spacer,

    // Structural
    Whitespace,
    Eol,
    SectionBreak,
    FreeText,
    Invalid,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Accidental => "accidental",
            TokenKind::NoteLetter => "note letter",
            TokenKind::Octave => "octave",
            TokenKind::Rest => "rest",
            TokenKind::Tie => "tie",
            TokenKind::Decoration => "decoration",
            TokenKind::Slur => "slur",
            TokenKind::Barline => "barline",
            TokenKind::RhythmNumerator => "rhythm numerator",
            TokenKind::RhythmSeparator => "rhythm separator",
            TokenKind::RhythmDenominator => "rhythm denominator",
            TokenKind::BrokenRhythm => "broken rhythm",
            TokenKind::Tuplet => "tuplet",
            TokenKind::ChordLeftBracket => "[",
            TokenKind::ChordRightBracket => "]",
            TokenKind::GraceGroupLeftBrace => "{",
            TokenKind::GraceGroupRightBrace => "}",
            TokenKind::GraceGroupSlash => "acciaccatura slash",
            TokenKind::InlineFieldLeftBracket => "inline field [",
            TokenKind::InlineFieldRightBracket => "inline field ]",
            TokenKind::GroupingLeftParen => "(",
            TokenKind::GroupingRightParen => ")",
            TokenKind::Annotation => "annotation",
            TokenKind::InfoHeader => "info header",
            TokenKind::InfoString => "info string",
            TokenKind::Symbol => "symbol",
            TokenKind::Comment => "comment",
            TokenKind::Directive => "directive",
            TokenKind::VoiceOverlay => "voice overlay",
            TokenKind::LineContinuation => "line continuation",
            TokenKind::SystemBreak => "system break",
            TokenKind::Spacer => "spacer",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Eol => "end of line",
            TokenKind::SectionBreak => "section break",
            TokenKind::FreeText => "free text",
            TokenKind::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// A lexeme with its subtype, identity and source position
///
/// `line` and `column` are 0-based; columns count characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: NodeId,
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        id: NodeId,
        kind: TokenKind,
        lexeme: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            id,
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// Exclusive end position as `(line, column)`
    pub fn end(&self) -> (usize, usize) {
        let mut line = self.line;
        let mut column = self.column;
        for c in self.lexeme.chars() {
            if c == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        (line, column)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Lexemes recognized inside a music line
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum MusicLexeme {
    #[regex(r"\^\^|\^|__|_|=")]
    Accidental,

    #[regex(r"[a-gA-G]")]
    NoteLetter,

    #[regex(r"[',]+")]
    Octave,

    #[regex(r"[zZxX]")]
    Rest,

    #[token("-")]
    Tie,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"/+")]
    Slash,

    #[regex(r"[<>]+")]
    BrokenRhythm,

    #[regex(r"[.~HLMOPRSTuv]")]
    Decoration,

    #[regex(r"![^!\n]*!")]
    #[regex(r"\+[^+\n]*\+")]
    Symbol,

    #[regex(r#""[^"\n]*""#)]
    Annotation,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[regex(r"\[[A-Za-z]:[^\]\n]*\]")]
    InlineField,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[regex(r"\([0-9]+(:[0-9]*)?(:[0-9]*)?")]
    Tuplet,

    #[regex(r":*\|[\|\]]?:*[0-9]*")]
    #[regex(r"\[\|:*")]
    #[token("::")]
    Barline,

    #[token("&")]
    VoiceOverlay,

    #[token("\\")]
    LineContinuation,

    #[token("$")]
    SystemBreak,

    #[regex(r"[y`]")]
    Spacer,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"%[^\n]*")]
    Comment,
}

impl MusicLexeme {
    fn kind(self) -> TokenKind {
        match self {
            MusicLexeme::Accidental => TokenKind::Accidental,
            MusicLexeme::NoteLetter => TokenKind::NoteLetter,
            MusicLexeme::Octave => TokenKind::Octave,
            MusicLexeme::Rest => TokenKind::Rest,
            MusicLexeme::Tie => TokenKind::Tie,
            // The parser re-tags numbers that follow a separator
            MusicLexeme::Number => TokenKind::RhythmNumerator,
            MusicLexeme::Slash => TokenKind::RhythmSeparator,
            MusicLexeme::BrokenRhythm => TokenKind::BrokenRhythm,
            MusicLexeme::Decoration => TokenKind::Decoration,
            MusicLexeme::Symbol => TokenKind::Symbol,
            MusicLexeme::Annotation => TokenKind::Annotation,
            MusicLexeme::LeftBracket => TokenKind::ChordLeftBracket,
            MusicLexeme::RightBracket => TokenKind::ChordRightBracket,
            MusicLexeme::InlineField => TokenKind::InlineFieldLeftBracket,
            MusicLexeme::LeftBrace => TokenKind::GraceGroupLeftBrace,
            MusicLexeme::RightBrace => TokenKind::GraceGroupRightBrace,
            MusicLexeme::LeftParen | MusicLexeme::RightParen => TokenKind::Slur,
            MusicLexeme::Tuplet => TokenKind::Tuplet,
            MusicLexeme::Barline => TokenKind::Barline,
            MusicLexeme::VoiceOverlay => TokenKind::VoiceOverlay,
            MusicLexeme::LineContinuation => TokenKind::LineContinuation,
            MusicLexeme::SystemBreak => TokenKind::SystemBreak,
            MusicLexeme::Spacer => TokenKind::Spacer,
            MusicLexeme::Whitespace => TokenKind::Whitespace,
            MusicLexeme::Comment => TokenKind::Comment,
        }
    }
}

/// Where the line scanner currently is in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Outside,
    TuneHeader,
    TuneBody,
}

struct LineScanner<'a> {
    ids: &'a mut IdGenerator,
    tokens: Vec<Token>,
    line: usize,
    column: usize,
}

impl<'a> LineScanner<'a> {
    fn push(&mut self, kind: TokenKind, lexeme: &str) {
        let id = self.ids.new_id();
        self.tokens.push(Token::new(id, kind, lexeme, self.line, self.column));
        self.column += lexeme.chars().count();
    }

    fn scan_info_line(&mut self, content: &str) {
        // Header letter and colon are both ASCII
        self.push(TokenKind::InfoHeader, &content[..2]);
        if content.len() > 2 {
            self.push(TokenKind::InfoString, &content[2..]);
        }
    }

    fn scan_music_line(&mut self, content: &str) {
        let mut lexer = MusicLexeme::lexer(content);
        while let Some(result) = lexer.next() {
            let slice = lexer.slice();
            match result {
                Ok(MusicLexeme::InlineField) => self.scan_inline_field(slice),
                Ok(lexeme) => self.push(lexeme.kind(), slice),
                Err(()) => self.push(TokenKind::Invalid, slice),
            }
        }
    }

    /// `[K:value]` becomes bracket, header, optional value, bracket
    fn scan_inline_field(&mut self, slice: &str) {
        let inner_end = slice.len() - 1;
        self.push(TokenKind::InlineFieldLeftBracket, &slice[..1]);
        self.push(TokenKind::InfoHeader, &slice[1..3]);
        if inner_end > 3 {
            self.push(TokenKind::InfoString, &slice[3..inner_end]);
        }
        self.push(TokenKind::InlineFieldRightBracket, &slice[inner_end..]);
    }
}

/// True when a line opens an information field such as `K:C`
pub fn is_info_line(content: &str) -> bool {
    let mut chars = content.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(letter), Some(':'), next) => {
            letter.is_ascii_alphabetic() && !matches!(next, Some('|') | Some(':'))
        }
        _ => false,
    }
}

/// Tokenize a source string
///
/// Tokenization never fails: unrecognized characters become
/// [`TokenKind::Invalid`] tokens so the token stream always covers the
/// whole input.
pub fn tokenize(source: &str, ids: &mut IdGenerator) -> Vec<Token> {
    let mut scanner = LineScanner {
        ids,
        tokens: Vec::new(),
        line: 0,
        column: 0,
    };
    let mut region = Region::Outside;

    for raw in source.split_inclusive('\n') {
        scanner.column = 0;

        let (content, eol) = split_eol(raw);

        if content.trim().is_empty() {
            scanner.push(TokenKind::SectionBreak, raw);
            region = Region::Outside;
            scanner.line += 1;
            continue;
        }

        if content.starts_with("%%") {
            scanner.push(TokenKind::Directive, content);
        } else if content.starts_with('%') {
            scanner.push(TokenKind::Comment, content);
        } else if is_info_line(content) {
            let key = content.as_bytes()[0];
            scanner.scan_info_line(content);
            region = match (region, key) {
                (Region::Outside, b'X') => Region::TuneHeader,
                (Region::TuneHeader, b'K') => Region::TuneBody,
                (current, _) => current,
            };
        } else {
            match region {
                Region::Outside => scanner.push(TokenKind::FreeText, content),
                Region::TuneHeader | Region::TuneBody => {
                    region = Region::TuneBody;
                    scanner.scan_music_line(content);
                }
            }
        }

        if !eol.is_empty() {
            scanner.push(TokenKind::Eol, eol);
        }
        scanner.line += 1;
    }

    scanner.tokens
}

fn split_eol(raw: &str) -> (&str, &str) {
    if let Some(stripped) = raw.strip_suffix("\r\n") {
        (stripped, &raw[stripped.len()..])
    } else if let Some(stripped) = raw.strip_suffix('\n') {
        (stripped, &raw[stripped.len()..])
    } else {
        (raw, "")
    }
}
