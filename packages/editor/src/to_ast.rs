//! Tree to AST conversion
//!
//! Builders redistribute a node's flat child list back into the named AST
//! fields. Optional tokens are recognized by their kind rather than their
//! position, so transforms may add or drop them freely.

use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::errors::TreeError;
use abc_parser::ast::*;
use abc_parser::{Token, TokenKind};

type BuildResult<T> = Result<T, TreeError>;

impl CsTree {
    /// Rebuild the typed AST; tune bodies come back as a single system
    pub fn to_file(&self) -> BuildResult<File> {
        let root = self.root();
        self.expect_tag(root, NodeTag::File)?;

        let mut contents = Vec::new();
        for child in self.children(root) {
            let item = match self.tag(child) {
                NodeTag::FileHeader => FileItem::Header(FileHeader {
                    id: self.id(child),
                    items: self.exprs(child)?,
                }),
                NodeTag::Tune => FileItem::Tune(self.build_tune(child)?),
                NodeTag::Token => FileItem::Token(self.build_token(child)?),
                other => return Err(self.unexpected(root, format!("{:?} at file level", other))),
            };
            contents.push(item);
        }

        Ok(File {
            id: self.id(root),
            contents,
        })
    }

    /// Rebuild a single music or header element
    pub fn to_expr(&self, idx: NodeIdx) -> BuildResult<Expr> {
        let expr = match self.tag(idx) {
            NodeTag::Token => Expr::Token(self.build_token(idx)?),
            NodeTag::InfoLine => Expr::InfoLine(self.build_info_line(idx)?),
            NodeTag::Note => Expr::Note(self.build_note(idx)?),
            NodeTag::Rest => Expr::Rest(self.build_rest(idx)?),
            NodeTag::Chord => Expr::Chord(self.build_chord(idx)?),
            NodeTag::GraceGroup => Expr::GraceGroup(self.build_grace_group(idx)?),
            NodeTag::InlineField => Expr::InlineField(self.build_inline_field(idx)?),
            NodeTag::Grouping => Expr::Grouping(self.build_grouping(idx)?),
            NodeTag::BarLine => Expr::BarLine(BarLine {
                id: self.id(idx),
                barline: self.single_token(idx)?,
            }),
            NodeTag::Tuplet => Expr::Tuplet(Tuplet {
                id: self.id(idx),
                marker: self.single_token(idx)?,
            }),
            other => return Err(self.unexpected(idx, format!("{:?} is not an element", other))),
        };
        Ok(expr)
    }

    fn exprs(&self, idx: NodeIdx) -> BuildResult<Vec<Expr>> {
        self.children(idx).map(|child| self.to_expr(child)).collect()
    }

    fn build_tune(&self, idx: NodeIdx) -> BuildResult<Tune> {
        let children = self.child_vec(idx);
        let (header_idx, body_idx) = match children.as_slice() {
            [header] => (*header, None),
            [header, body] => (*header, Some(*body)),
            _ => return Err(self.unexpected(idx, "expected a header and an optional body")),
        };
        self.expect_tag(header_idx, NodeTag::TuneHeader)?;

        let header = TuneHeader {
            id: self.id(header_idx),
            items: self.exprs(header_idx)?,
        };

        let body = match body_idx {
            Some(body_idx) => {
                self.expect_tag(body_idx, NodeTag::TuneBody)?;
                Some(TuneBody {
                    id: self.id(body_idx),
                    systems: vec![self.exprs(body_idx)?],
                })
            }
            None => None,
        };

        Ok(Tune {
            id: self.id(idx),
            header,
            body,
        })
    }

    fn build_info_line(&self, idx: NodeIdx) -> BuildResult<InfoLine> {
        let mut key = None;
        let mut value = None;
        for child in self.children(idx) {
            let token = self.build_token(child)?;
            match token.kind {
                TokenKind::InfoHeader if key.is_none() => key = Some(token),
                TokenKind::InfoString if value.is_none() => value = Some(token),
                other => return Err(self.unexpected(idx, format!("stray {} token", other))),
            }
        }
        Ok(InfoLine {
            id: self.id(idx),
            key: key.ok_or_else(|| self.unexpected(idx, "missing info header"))?,
            value,
        })
    }

    fn build_pitch(&self, idx: NodeIdx) -> BuildResult<Pitch> {
        self.expect_tag(idx, NodeTag::Pitch)?;
        let mut alteration = None;
        let mut letter = None;
        let mut octave = None;
        for child in self.children(idx) {
            let token = self.build_token(child)?;
            match token.kind {
                TokenKind::Accidental => alteration = Some(token),
                TokenKind::NoteLetter => letter = Some(token),
                TokenKind::Octave => octave = Some(token),
                other => return Err(self.unexpected(idx, format!("stray {} token", other))),
            }
        }
        Ok(Pitch {
            id: self.id(idx),
            alteration,
            letter: letter.ok_or_else(|| self.unexpected(idx, "missing note letter"))?,
            octave,
        })
    }

    fn build_rhythm(&self, idx: NodeIdx) -> BuildResult<Rhythm> {
        let mut rhythm = Rhythm {
            id: self.id(idx),
            numerator: None,
            separator: None,
            denominator: None,
            broken: None,
        };
        for child in self.children(idx) {
            let token = self.build_token(child)?;
            match token.kind {
                TokenKind::RhythmNumerator => rhythm.numerator = Some(token),
                TokenKind::RhythmSeparator => rhythm.separator = Some(token),
                TokenKind::RhythmDenominator => rhythm.denominator = Some(token),
                TokenKind::BrokenRhythm => rhythm.broken = Some(token),
                other => return Err(self.unexpected(idx, format!("stray {} token", other))),
            }
        }
        Ok(rhythm)
    }

    fn build_note(&self, idx: NodeIdx) -> BuildResult<Note> {
        let mut pitch = None;
        let mut rhythm = None;
        let mut tie = None;
        for child in self.children(idx) {
            match self.tag(child) {
                NodeTag::Pitch => pitch = Some(self.build_pitch(child)?),
                NodeTag::Rhythm => rhythm = Some(self.build_rhythm(child)?),
                NodeTag::Token if self.node(child).is_token(TokenKind::Tie) => {
                    tie = Some(self.build_token(child)?)
                }
                other => return Err(self.unexpected(idx, format!("stray {:?} child", other))),
            }
        }
        Ok(Note {
            id: self.id(idx),
            pitch: pitch.ok_or_else(|| self.unexpected(idx, "missing pitch"))?,
            rhythm,
            tie,
        })
    }

    fn build_rest(&self, idx: NodeIdx) -> BuildResult<Rest> {
        let mut rest = None;
        let mut rhythm = None;
        for child in self.children(idx) {
            match self.tag(child) {
                NodeTag::Rhythm => rhythm = Some(self.build_rhythm(child)?),
                NodeTag::Token if self.node(child).is_token(TokenKind::Rest) => {
                    rest = Some(self.build_token(child)?)
                }
                other => return Err(self.unexpected(idx, format!("stray {:?} child", other))),
            }
        }
        Ok(Rest {
            id: self.id(idx),
            rest: rest.ok_or_else(|| self.unexpected(idx, "missing rest token"))?,
            rhythm,
        })
    }

    fn build_chord(&self, idx: NodeIdx) -> BuildResult<Chord> {
        let mut children = self.children(idx);
        let left_bracket = match children.next() {
            Some(first) if self.node(first).is_token(TokenKind::ChordLeftBracket) => {
                self.build_token(first)?
            }
            _ => return Err(self.unexpected(idx, "missing left bracket")),
        };

        let mut chord = Chord {
            id: self.id(idx),
            left_bracket,
            contents: Vec::new(),
            right_bracket: None,
            rhythm: None,
            tie: None,
        };
        for child in children {
            let node = self.node(child);
            if node.is_token(TokenKind::ChordRightBracket) {
                chord.right_bracket = Some(self.build_token(child)?);
            } else if node.tag == NodeTag::Rhythm {
                chord.rhythm = Some(self.build_rhythm(child)?);
            } else if node.is_token(TokenKind::Tie) {
                chord.tie = Some(self.build_token(child)?);
            } else {
                chord.contents.push(self.to_expr(child)?);
            }
        }
        Ok(chord)
    }

    fn build_grace_group(&self, idx: NodeIdx) -> BuildResult<GraceGroup> {
        let mut children = self.children(idx);
        let left_brace = match children.next() {
            Some(first) if self.node(first).is_token(TokenKind::GraceGroupLeftBrace) => {
                self.build_token(first)?
            }
            _ => return Err(self.unexpected(idx, "missing left brace")),
        };

        let mut group = GraceGroup {
            id: self.id(idx),
            left_brace,
            slash: None,
            contents: Vec::new(),
            right_brace: None,
        };
        for child in children {
            let node = self.node(child);
            if node.is_token(TokenKind::GraceGroupSlash) {
                group.slash = Some(self.build_token(child)?);
            } else if node.is_token(TokenKind::GraceGroupRightBrace) {
                group.right_brace = Some(self.build_token(child)?);
            } else {
                group.contents.push(self.to_expr(child)?);
            }
        }
        Ok(group)
    }

    fn build_inline_field(&self, idx: NodeIdx) -> BuildResult<InlineField> {
        let mut left_bracket = None;
        let mut key = None;
        let mut value = None;
        let mut right_bracket = None;
        for child in self.children(idx) {
            let token = self.build_token(child)?;
            match token.kind {
                TokenKind::InlineFieldLeftBracket => left_bracket = Some(token),
                TokenKind::InfoHeader => key = Some(token),
                TokenKind::InfoString => value = Some(token),
                TokenKind::InlineFieldRightBracket => right_bracket = Some(token),
                other => return Err(self.unexpected(idx, format!("stray {} token", other))),
            }
        }
        match (left_bracket, key, right_bracket) {
            (Some(left_bracket), Some(key), Some(right_bracket)) => Ok(InlineField {
                id: self.id(idx),
                left_bracket,
                key,
                value,
                right_bracket,
            }),
            _ => Err(self.unexpected(idx, "missing bracket or header")),
        }
    }

    fn build_grouping(&self, idx: NodeIdx) -> BuildResult<Grouping> {
        let children = self.child_vec(idx);
        let (first, last) = match children.as_slice() {
            [first, .., last] => (*first, *last),
            _ => return Err(self.unexpected(idx, "missing parentheses")),
        };
        if !self.node(first).is_token(TokenKind::GroupingLeftParen)
            || !self.node(last).is_token(TokenKind::GroupingRightParen)
        {
            return Err(self.unexpected(idx, "missing parentheses"));
        }

        let contents = children[1..children.len() - 1]
            .iter()
            .map(|&child| self.to_expr(child))
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(Grouping {
            id: self.id(idx),
            left_paren: self.build_token(first)?,
            contents,
            right_paren: self.build_token(last)?,
        })
    }

    fn single_token(&self, idx: NodeIdx) -> BuildResult<Token> {
        let children = self.child_vec(idx);
        match children.as_slice() {
            [only] => self.build_token(*only),
            _ => Err(self.unexpected(idx, "expected exactly one token")),
        }
    }

    fn build_token(&self, idx: NodeIdx) -> BuildResult<Token> {
        let node = self.node(idx);
        match &node.data {
            Some(data) => Ok(Token::new(
                node.id,
                data.kind,
                data.lexeme.clone(),
                data.line,
                data.column,
            )),
            None => Err(self.unexpected(idx, "expected a token")),
        }
    }

    fn expect_tag(&self, idx: NodeIdx, tag: NodeTag) -> BuildResult<()> {
        if self.tag(idx) == tag {
            Ok(())
        } else {
            Err(self.unexpected(idx, format!("expected {:?}", tag)))
        }
    }

    fn unexpected(&self, idx: NodeIdx, detail: impl Into<String>) -> TreeError {
        TreeError::shape(self.tag(idx), self.id(idx), detail)
    }
}
