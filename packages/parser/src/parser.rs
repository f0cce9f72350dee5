use crate::ast::*;
use crate::error::ParseError;
use crate::id_generator::IdGenerator;
use crate::tokenizer::{tokenize, Token, TokenKind};

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub file: File,
    pub errors: Vec<ParseError>,
    /// Generator that issued every identity in `file`
    pub ids: IdGenerator,
}

/// Parser for ABC notation
///
/// The parser is error tolerant: every token ends up somewhere in the tree,
/// and problems are collected as diagnostics.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    id_generator: IdGenerator,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(source: &str, mut id_generator: IdGenerator) -> Self {
        let tokens = tokenize(source, &mut id_generator);
        let errors = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Invalid)
            .map(|t| ParseError::invalid_token(t.line, t.column, t.lexeme.clone()))
            .collect();

        Self {
            tokens,
            pos: 0,
            id_generator,
            errors,
        }
    }

    /// Parse a complete document
    pub fn parse_file(mut self) -> ParseOutput {
        let mut contents = Vec::new();
        let mut first_section = true;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::SectionBreak => {
                    let token = self.advance();
                    contents.push(FileItem::Token(token));
                }
                TokenKind::InfoHeader if is_tune_start(token) => {
                    contents.push(FileItem::Tune(self.parse_tune()));
                    first_section = false;
                }
                _ if first_section => {
                    let items = self.parse_file_header_items();
                    contents.push(FileItem::Header(FileHeader {
                        id: self.id_generator.new_id(),
                        items,
                    }));
                    first_section = false;
                }
                // Free text between tunes stays at file level
                _ => {
                    while self.peek().is_some_and(|t| !ends_free_section(t)) {
                        contents.push(FileItem::Token(self.advance()));
                    }
                }
            }
        }

        let file = File {
            id: self.id_generator.new_id(),
            contents,
        };

        ParseOutput {
            file,
            errors: self.errors,
            ids: self.id_generator,
        }
    }

    fn parse_file_header_items(&mut self) -> Vec<Expr> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if ends_free_section(token) {
                break;
            }
            if token.kind == TokenKind::InfoHeader {
                items.push(Expr::InfoLine(self.parse_info_line()));
            } else {
                items.push(Expr::Token(self.advance()));
            }
        }
        items
    }

    fn parse_tune(&mut self) -> Tune {
        let mut items = Vec::new();

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::InfoHeader => {
                    let line = self.parse_info_line();
                    let is_key = line.field() == Some('K');
                    items.push(Expr::InfoLine(line));
                    if self.check(TokenKind::Eol) {
                        items.push(Expr::Token(self.advance()));
                    }
                    if is_key {
                        break;
                    }
                }
                TokenKind::Comment | TokenKind::Directive | TokenKind::Eol => {
                    items.push(Expr::Token(self.advance()));
                }
                _ => break,
            }
        }

        let header = TuneHeader {
            id: self.id_generator.new_id(),
            items,
        };

        let body = match self.peek() {
            None => None,
            Some(token) if token.kind == TokenKind::SectionBreak => None,
            Some(_) => Some(self.parse_tune_body()),
        };

        Tune {
            id: self.id_generator.new_id(),
            header,
            body,
        }
    }

    fn parse_tune_body(&mut self) -> TuneBody {
        let mut systems = Vec::new();
        let mut current = Vec::new();

        while let Some(token) = self.peek() {
            if token.kind == TokenKind::SectionBreak {
                break;
            }
            let Some(expr) = self.parse_music_expr() else {
                break;
            };
            let ends_system = expr.is_token(TokenKind::Eol);
            current.push(expr);
            if ends_system {
                systems.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            systems.push(current);
        }

        TuneBody {
            id: self.id_generator.new_id(),
            systems,
        }
    }

    /// Parse one element of a music line, consuming at least one token
    fn parse_music_expr(&mut self) -> Option<Expr> {
        let kind = self.peek()?.kind;

        let expr = match kind {
            TokenKind::NoteLetter => Expr::Note(self.parse_note()),
            TokenKind::Accidental if self.check_at(1, TokenKind::NoteLetter) => {
                Expr::Note(self.parse_note())
            }
            TokenKind::Rest => Expr::Rest(self.parse_rest()),
            TokenKind::ChordLeftBracket => Expr::Chord(self.parse_chord()),
            TokenKind::GraceGroupLeftBrace => Expr::GraceGroup(self.parse_grace_group()),
            TokenKind::InlineFieldLeftBracket => self.parse_inline_field(),
            TokenKind::Slur => match self.find_matching_paren() {
                Some(close) => Expr::Grouping(self.parse_grouping(close)),
                None => Expr::Token(self.advance()),
            },
            TokenKind::Tuplet => {
                let marker = self.advance();
                Expr::Tuplet(Tuplet {
                    id: self.id_generator.new_id(),
                    marker,
                })
            }
            TokenKind::Barline => {
                let barline = self.advance();
                Expr::BarLine(BarLine {
                    id: self.id_generator.new_id(),
                    barline,
                })
            }
            TokenKind::InfoHeader => Expr::InfoLine(self.parse_info_line()),
            _ => Expr::Token(self.advance()),
        };
        Some(expr)
    }

    fn parse_info_line(&mut self) -> InfoLine {
        let key = self.advance();
        let value = self.take_if(TokenKind::InfoString);
        InfoLine {
            id: self.id_generator.new_id(),
            key,
            value,
        }
    }

    fn parse_pitch(&mut self) -> Pitch {
        let alteration = self.take_if(TokenKind::Accidental);
        let letter = self.advance();
        let octave = self.take_if(TokenKind::Octave);
        Pitch {
            id: self.id_generator.new_id(),
            alteration,
            letter,
            octave,
        }
    }

    fn parse_note(&mut self) -> Note {
        let pitch = self.parse_pitch();
        let rhythm = self.parse_rhythm();
        let tie = self.take_if(TokenKind::Tie);
        Note {
            id: self.id_generator.new_id(),
            pitch,
            rhythm,
            tie,
        }
    }

    fn parse_rest(&mut self) -> Rest {
        let rest = self.advance();
        let rhythm = self.parse_rhythm();
        Rest {
            id: self.id_generator.new_id(),
            rest,
            rhythm,
        }
    }

    /// `[numerator] [separator [denominator]] [broken]`
    fn parse_rhythm(&mut self) -> Option<Rhythm> {
        let numerator = self.take_if(TokenKind::RhythmNumerator);
        let separator = self.take_if(TokenKind::RhythmSeparator);
        let denominator = match separator {
            Some(_) => self.take_if(TokenKind::RhythmNumerator).map(|mut token| {
                token.kind = TokenKind::RhythmDenominator;
                token
            }),
            None => None,
        };
        let broken = self.take_if(TokenKind::BrokenRhythm);

        if numerator.is_none() && separator.is_none() && broken.is_none() {
            return None;
        }

        Some(Rhythm {
            id: self.id_generator.new_id(),
            numerator,
            separator,
            denominator,
            broken,
        })
    }

    fn parse_chord(&mut self) -> Chord {
        let left_bracket = self.advance();
        let mut contents = Vec::new();
        let mut right_bracket = None;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::ChordRightBracket => {
                    right_bracket = Some(self.advance());
                    break;
                }
                TokenKind::NoteLetter => contents.push(Expr::Note(self.parse_note())),
                TokenKind::Accidental if self.check_at(1, TokenKind::NoteLetter) => {
                    contents.push(Expr::Note(self.parse_note()))
                }
                TokenKind::Annotation
                | TokenKind::Decoration
                | TokenKind::Symbol
                | TokenKind::Whitespace => contents.push(Expr::Token(self.advance())),
                _ => break,
            }
        }

        let (rhythm, tie) = match right_bracket {
            Some(_) => (self.parse_rhythm(), self.take_if(TokenKind::Tie)),
            None => {
                self.errors.push(ParseError::unclosed(
                    left_bracket.line,
                    left_bracket.column,
                    "chord",
                ));
                (None, None)
            }
        };

        Chord {
            id: self.id_generator.new_id(),
            left_bracket,
            contents,
            right_bracket,
            rhythm,
            tie,
        }
    }

    fn parse_grace_group(&mut self) -> GraceGroup {
        let left_brace = self.advance();
        let slash = self.take_if(TokenKind::RhythmSeparator).map(|mut token| {
            token.kind = TokenKind::GraceGroupSlash;
            token
        });
        let mut contents = Vec::new();
        let mut right_brace = None;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::GraceGroupRightBrace => {
                    right_brace = Some(self.advance());
                    break;
                }
                TokenKind::NoteLetter => contents.push(Expr::Note(self.parse_note())),
                TokenKind::Accidental if self.check_at(1, TokenKind::NoteLetter) => {
                    contents.push(Expr::Note(self.parse_note()))
                }
                TokenKind::ChordLeftBracket => contents.push(Expr::Chord(self.parse_chord())),
                TokenKind::Decoration | TokenKind::Whitespace => {
                    contents.push(Expr::Token(self.advance()))
                }
                _ => break,
            }
        }

        if right_brace.is_none() {
            self.errors.push(ParseError::unclosed(
                left_brace.line,
                left_brace.column,
                "grace group",
            ));
        }

        GraceGroup {
            id: self.id_generator.new_id(),
            left_brace,
            slash,
            contents,
            right_brace,
        }
    }

    /// `[` header, optional value, `]`, as split by the tokenizer
    fn parse_inline_field(&mut self) -> Expr {
        let well_formed = self.check_at(1, TokenKind::InfoHeader)
            && (self.check_at(2, TokenKind::InlineFieldRightBracket)
                || (self.check_at(2, TokenKind::InfoString)
                    && self.check_at(3, TokenKind::InlineFieldRightBracket)));
        if !well_formed {
            return Expr::Token(self.advance());
        }

        let left_bracket = self.advance();
        let key = self.advance();
        let value = self.take_if(TokenKind::InfoString);
        let right_bracket = self.advance();
        Expr::InlineField(InlineField {
            id: self.id_generator.new_id(),
            left_bracket,
            key,
            value,
            right_bracket,
        })
    }

    /// Index of the `)` closing the `(` at the cursor, on the same line
    fn find_matching_paren(&self) -> Option<usize> {
        if self.peek().map(|t| t.lexeme.as_str()) != Some("(") {
            return None;
        }
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match (token.kind, token.lexeme.as_str()) {
                (TokenKind::Slur, "(") => depth += 1,
                (TokenKind::Slur, ")") => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.pos + offset);
                    }
                }
                (TokenKind::Eol, _) | (TokenKind::SectionBreak, _) => return None,
                _ => {}
            }
        }
        None
    }

    fn parse_grouping(&mut self, close: usize) -> Grouping {
        let mut left_paren = self.advance();
        left_paren.kind = TokenKind::GroupingLeftParen;

        let mut contents = Vec::new();
        while self.pos < close {
            match self.parse_music_expr() {
                Some(expr) => contents.push(expr),
                None => break,
            }
        }

        let mut right_paren = self.advance();
        right_paren.kind = TokenKind::GroupingRightParen;

        Grouping {
            id: self.id_generator.new_id(),
            left_paren,
            contents,
            right_paren,
        }
    }

    // Token cursor helpers

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.check_at(0, kind)
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind == kind)
            .unwrap_or(false)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn take_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }
}

fn is_tune_start(token: &Token) -> bool {
    token.lexeme.starts_with('X')
}

fn ends_free_section(token: &Token) -> bool {
    match token.kind {
        TokenKind::SectionBreak => true,
        TokenKind::InfoHeader => is_tune_start(token),
        _ => false,
    }
}

/// Parse a document with a fresh identity space
pub fn parse(source: &str) -> ParseOutput {
    Parser::new(source, IdGenerator::new()).parse_file()
}

/// Parse a document, continuing an existing identity space
pub fn parse_with_ids(source: &str, ids: IdGenerator) -> ParseOutput {
    Parser::new(source, ids).parse_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_tune(source: &str) -> Tune {
        let output = parse(source);
        let tune = output.file.tunes().next().cloned().expect("expected a tune");
        tune
    }

    fn body_exprs(tune: &Tune) -> Vec<Expr> {
        tune.body
            .as_ref()
            .map(|b| b.systems.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_simple_tune() {
        let tune = first_tune("X:1\nT:Test\nK:C\nCDE|\n");
        assert_eq!(tune.header.items.len(), 6);
        let body = body_exprs(&tune);
        assert!(matches!(body[0], Expr::Note(_)));
        assert!(matches!(body[3], Expr::BarLine(_)));
    }

    #[test]
    fn test_parse_note_with_rhythm_and_tie() {
        let tune = first_tune("X:1\nK:C\n^c'3/4-\n");
        let body = body_exprs(&tune);
        let Expr::Note(note) = &body[0] else {
            panic!("Expected note");
        };
        assert_eq!(note.pitch.alteration.as_ref().unwrap().lexeme, "^");
        assert_eq!(note.pitch.letter.lexeme, "c");
        assert_eq!(note.pitch.octave.as_ref().unwrap().lexeme, "'");
        let rhythm = note.rhythm.as_ref().unwrap();
        assert_eq!(rhythm.numerator.as_ref().unwrap().lexeme, "3");
        assert_eq!(
            rhythm.denominator.as_ref().unwrap().kind,
            TokenKind::RhythmDenominator
        );
        assert!(note.tie.is_some());
    }

    #[test]
    fn test_parse_chord() {
        let tune = first_tune("X:1\nK:C\n[CEG]2 C2|\n");
        let body = body_exprs(&tune);
        let Expr::Chord(chord) = &body[0] else {
            panic!("Expected chord");
        };
        assert_eq!(chord.contents.len(), 3);
        assert!(chord.right_bracket.is_some());
        assert_eq!(
            chord.rhythm.as_ref().unwrap().numerator.as_ref().unwrap().lexeme,
            "2"
        );
    }

    #[test]
    fn test_parse_grace_group_with_slash() {
        let tune = first_tune("X:1\nK:C\n{/ab}c\n");
        let body = body_exprs(&tune);
        let Expr::GraceGroup(group) = &body[0] else {
            panic!("Expected grace group");
        };
        assert_eq!(group.slash.as_ref().unwrap().kind, TokenKind::GraceGroupSlash);
        assert_eq!(group.contents.len(), 2);
    }

    #[test]
    fn test_parse_grouping_and_unmatched_slur() {
        let tune = first_tune("X:1\nK:C\n(AB) (c\n");
        let body = body_exprs(&tune);
        let Expr::Grouping(grouping) = &body[0] else {
            panic!("Expected grouping");
        };
        assert_eq!(grouping.contents.len(), 2);
        assert!(body[2].is_token(TokenKind::Slur));
    }

    #[test]
    fn test_parse_inline_field() {
        let tune = first_tune("X:1\nK:C\nC[K:G]D\n");
        let body = body_exprs(&tune);
        let Expr::InlineField(field) = &body[1] else {
            panic!("Expected inline field");
        };
        assert_eq!(field.key.lexeme, "K:");
        assert_eq!(field.value.as_ref().unwrap().lexeme, "G");
    }

    #[test]
    fn test_systems_split_at_line_ends() {
        let tune = first_tune("X:1\nK:C\nCD|\nEF|\n");
        assert_eq!(tune.body.unwrap().systems.len(), 2);
    }

    #[test]
    fn test_file_header_and_multiple_tunes() {
        let output = parse("%%abc-2.1\nR:reel\n\nX:1\nK:C\nC\n\nX:2\nK:D\nD\n");
        assert!(matches!(output.file.contents[0], FileItem::Header(_)));
        assert_eq!(output.file.tunes().count(), 2);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_unclosed_chord_is_reported() {
        let output = parse("X:1\nK:C\n[CE\n");
        assert!(output
            .errors
            .iter()
            .any(|e| matches!(e, ParseError::Unclosed { construct, .. } if construct == "chord")));
    }

    #[test]
    fn test_identities_are_unique() {
        let output = parse("X:1\nK:C\n[CEG]2 C2 D2|\n");
        let json = serde_json::to_value(&output.file).unwrap();
        let mut ids = Vec::new();
        collect_ids(&json, &mut ids);
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    fn collect_ids(value: &serde_json::Value, out: &mut Vec<u64>) {
        match value {
            serde_json::Value::Object(map) => {
                if let Some(id) = map.get("id").and_then(|v| v.as_u64()) {
                    out.push(id);
                }
                for v in map.values() {
                    collect_ids(v, out);
                }
            }
            serde_json::Value::Array(items) => items.iter().for_each(|v| collect_ids(v, out)),
            _ => {}
        }
    }
}
