use crate::id_generator::NodeId;
use crate::tokenizer::{Token, TokenKind};
use serde::{Deserialize, Serialize};

/// One line of music, terminated by its end-of-line token when present
pub type System = Vec<Expr>;

/// Root document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: NodeId,
    pub contents: Vec<FileItem>,
}

/// Top-level section of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileItem {
    Header(FileHeader),
    Tune(Tune),
    /// Section breaks and free text between tunes
    Token(Token),
}

/// Info lines and directives before the first tune
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHeader {
    pub id: NodeId,
    pub items: Vec<Expr>,
}

/// A tune, from its `X:` line to the next section break
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tune {
    pub id: NodeId,
    pub header: TuneHeader,
    pub body: Option<TuneBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneHeader {
    pub id: NodeId,
    pub items: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneBody {
    pub id: NodeId,
    pub systems: Vec<System>,
}

/// Information field line (`K:C`, `V:T1 clef=bass`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoLine {
    pub id: NodeId,
    pub key: Token,
    pub value: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NodeId,
    pub pitch: Pitch,
    pub rhythm: Option<Rhythm>,
    pub tie: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    pub id: NodeId,
    pub alteration: Option<Token>,
    pub letter: Token,
    pub octave: Option<Token>,
}

/// Duration written after a note, rest or chord (`3/4`, `/`, `2>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rhythm {
    pub id: NodeId,
    pub numerator: Option<Token>,
    pub separator: Option<Token>,
    pub denominator: Option<Token>,
    pub broken: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rest {
    pub id: NodeId,
    pub rest: Token,
    pub rhythm: Option<Rhythm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub id: NodeId,
    pub left_bracket: Token,
    pub contents: Vec<Expr>,
    pub right_bracket: Option<Token>,
    pub rhythm: Option<Rhythm>,
    pub tie: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraceGroup {
    pub id: NodeId,
    pub left_brace: Token,
    pub slash: Option<Token>,
    pub contents: Vec<Expr>,
    pub right_brace: Option<Token>,
}

/// Bracketed field inside music (`[K:G]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineField {
    pub id: NodeId,
    pub left_bracket: Token,
    pub key: Token,
    pub value: Option<Token>,
    pub right_bracket: Token,
}

/// Balanced parentheses around music on one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    pub id: NodeId,
    pub left_paren: Token,
    pub contents: Vec<Expr>,
    pub right_paren: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLine {
    pub id: NodeId,
    pub barline: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuplet {
    pub id: NodeId,
    pub marker: Token,
}

/// Header and music elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Token(Token),
    InfoLine(InfoLine),
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    GraceGroup(GraceGroup),
    InlineField(InlineField),
    Grouping(Grouping),
    BarLine(BarLine),
    Tuplet(Tuplet),
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Token(token) => token.id,
            Expr::InfoLine(line) => line.id,
            Expr::Note(note) => note.id,
            Expr::Rest(rest) => rest.id,
            Expr::Chord(chord) => chord.id,
            Expr::GraceGroup(group) => group.id,
            Expr::InlineField(field) => field.id,
            Expr::Grouping(grouping) => grouping.id,
            Expr::BarLine(barline) => barline.id,
            Expr::Tuplet(tuplet) => tuplet.id,
        }
    }

    pub fn is_token(&self, kind: TokenKind) -> bool {
        matches!(self, Expr::Token(token) if token.kind == kind)
    }
}

impl InfoLine {
    /// Field letter without the colon (`'K'` for `K:C`)
    pub fn field(&self) -> Option<char> {
        self.key.lexeme.chars().next()
    }
}

impl File {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            contents: Vec::new(),
        }
    }

    pub fn tunes(&self) -> impl Iterator<Item = &Tune> {
        self.contents.iter().filter_map(|item| match item {
            FileItem::Tune(tune) => Some(tune),
            _ => None,
        })
    }
}
