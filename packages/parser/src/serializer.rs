use crate::ast::*;
use crate::tokenizer::Token;

/// Serializer converts AST back to source text
///
/// Output is lossless: every token lexeme is written in tree order, so
/// whitespace, comments and invalid characters all survive a roundtrip.
pub struct Serializer {
    output: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    pub fn write_file(&mut self, file: &File) {
        for item in &file.contents {
            match item {
                FileItem::Header(header) => self.write_exprs(&header.items),
                FileItem::Tune(tune) => self.write_tune(tune),
                FileItem::Token(token) => self.write_token(token),
            }
        }
    }

    pub fn write_tune(&mut self, tune: &Tune) {
        self.write_exprs(&tune.header.items);
        if let Some(body) = &tune.body {
            for system in &body.systems {
                self.write_exprs(system);
            }
        }
    }

    pub fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Token(token) => self.write_token(token),
            Expr::InfoLine(line) => {
                self.write_token(&line.key);
                self.write_opt(&line.value);
            }
            Expr::Note(note) => self.write_note(note),
            Expr::Rest(rest) => {
                self.write_token(&rest.rest);
                self.write_rhythm(&rest.rhythm);
            }
            Expr::Chord(chord) => {
                self.write_token(&chord.left_bracket);
                self.write_exprs(&chord.contents);
                self.write_opt(&chord.right_bracket);
                self.write_rhythm(&chord.rhythm);
                self.write_opt(&chord.tie);
            }
            Expr::GraceGroup(group) => {
                self.write_token(&group.left_brace);
                self.write_opt(&group.slash);
                self.write_exprs(&group.contents);
                self.write_opt(&group.right_brace);
            }
            Expr::InlineField(field) => {
                self.write_token(&field.left_bracket);
                self.write_token(&field.key);
                self.write_opt(&field.value);
                self.write_token(&field.right_bracket);
            }
            Expr::Grouping(grouping) => {
                self.write_token(&grouping.left_paren);
                self.write_exprs(&grouping.contents);
                self.write_token(&grouping.right_paren);
            }
            Expr::BarLine(barline) => self.write_token(&barline.barline),
            Expr::Tuplet(tuplet) => self.write_token(&tuplet.marker),
        }
    }

    fn write_exprs(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.write_expr(expr);
        }
    }

    fn write_note(&mut self, note: &Note) {
        self.write_opt(&note.pitch.alteration);
        self.write_token(&note.pitch.letter);
        self.write_opt(&note.pitch.octave);
        self.write_rhythm(&note.rhythm);
        self.write_opt(&note.tie);
    }

    fn write_rhythm(&mut self, rhythm: &Option<Rhythm>) {
        if let Some(rhythm) = rhythm {
            self.write_opt(&rhythm.numerator);
            self.write_opt(&rhythm.separator);
            self.write_opt(&rhythm.denominator);
            self.write_opt(&rhythm.broken);
        }
    }

    fn write_opt(&mut self, token: &Option<Token>) {
        if let Some(token) = token {
            self.write_token(token);
        }
    }

    fn write_token(&mut self, token: &Token) {
        self.output.push_str(&token.lexeme);
    }
}

/// Convenience function to serialize a file
pub fn stringify(file: &File) -> String {
    let mut serializer = Serializer::new();
    serializer.write_file(file);
    serializer.finish()
}

/// Serialize a single element
pub fn stringify_expr(expr: &Expr) -> String {
    let mut serializer = Serializer::new();
    serializer.write_expr(expr);
    serializer.finish()
}
