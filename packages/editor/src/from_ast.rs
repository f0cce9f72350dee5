//! AST to tree conversion
//!
//! Each AST node becomes one tree node whose children are its fields
//! flattened in source order. Absent optional fields produce no child.

use crate::cstree::{CsNode, CsTree, NodeIdx, NodeTag, TokenData};
use abc_parser::ast::*;
use abc_parser::{NodeId, Token};
use la_arena::Arena;
use std::collections::HashMap;

impl CsTree {
    pub fn from_file(file: &File) -> CsTree {
        let mut builder = TreeBuilder::default();
        let root = builder.file(file);
        CsTree::from_parts(builder.arena, root, builder.index)
    }
}

#[derive(Default)]
struct TreeBuilder {
    arena: Arena<CsNode>,
    index: HashMap<NodeId, NodeIdx>,
}

impl TreeBuilder {
    fn node(&mut self, tag: NodeTag, id: NodeId, children: Vec<NodeIdx>) -> NodeIdx {
        let idx = self.arena.alloc(CsNode {
            tag,
            id,
            data: None,
            first_child: children.first().copied(),
            next_sibling: None,
        });
        for pair in children.windows(2) {
            self.arena[pair[0]].next_sibling = Some(pair[1]);
        }
        self.index.insert(id, idx);
        idx
    }

    fn token(&mut self, token: &Token) -> NodeIdx {
        let idx = self.arena.alloc(CsNode {
            tag: NodeTag::Token,
            id: token.id,
            data: Some(TokenData::from_token(token)),
            first_child: None,
            next_sibling: None,
        });
        self.index.insert(token.id, idx);
        idx
    }

    fn opt_token(&mut self, token: &Option<Token>, out: &mut Vec<NodeIdx>) {
        if let Some(token) = token {
            out.push(self.token(token));
        }
    }

    fn file(&mut self, file: &File) -> NodeIdx {
        let children = file
            .contents
            .iter()
            .map(|item| match item {
                FileItem::Header(header) => {
                    let items = self.exprs(&header.items);
                    self.node(NodeTag::FileHeader, header.id, items)
                }
                FileItem::Tune(tune) => self.tune(tune),
                FileItem::Token(token) => self.token(token),
            })
            .collect();
        self.node(NodeTag::File, file.id, children)
    }

    fn tune(&mut self, tune: &Tune) -> NodeIdx {
        let header_items = self.exprs(&tune.header.items);
        let mut children = vec![self.node(NodeTag::TuneHeader, tune.header.id, header_items)];

        if let Some(body) = &tune.body {
            // Systems are flattened; their Eol tokens keep the line breaks
            let items: Vec<NodeIdx> = body
                .systems
                .iter()
                .flatten()
                .map(|expr| self.expr(expr))
                .collect();
            children.push(self.node(NodeTag::TuneBody, body.id, items));
        }

        self.node(NodeTag::Tune, tune.id, children)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Vec<NodeIdx> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn expr(&mut self, expr: &Expr) -> NodeIdx {
        match expr {
            Expr::Token(token) => self.token(token),
            Expr::InfoLine(line) => {
                let mut children = vec![self.token(&line.key)];
                self.opt_token(&line.value, &mut children);
                self.node(NodeTag::InfoLine, line.id, children)
            }
            Expr::Note(note) => self.note(note),
            Expr::Rest(rest) => {
                let mut children = vec![self.token(&rest.rest)];
                self.opt_rhythm(&rest.rhythm, &mut children);
                self.node(NodeTag::Rest, rest.id, children)
            }
            Expr::Chord(chord) => {
                let mut children = vec![self.token(&chord.left_bracket)];
                children.extend(self.exprs(&chord.contents));
                self.opt_token(&chord.right_bracket, &mut children);
                self.opt_rhythm(&chord.rhythm, &mut children);
                self.opt_token(&chord.tie, &mut children);
                self.node(NodeTag::Chord, chord.id, children)
            }
            Expr::GraceGroup(group) => {
                let mut children = vec![self.token(&group.left_brace)];
                self.opt_token(&group.slash, &mut children);
                children.extend(self.exprs(&group.contents));
                self.opt_token(&group.right_brace, &mut children);
                self.node(NodeTag::GraceGroup, group.id, children)
            }
            Expr::InlineField(field) => {
                let mut children = vec![self.token(&field.left_bracket), self.token(&field.key)];
                self.opt_token(&field.value, &mut children);
                children.push(self.token(&field.right_bracket));
                self.node(NodeTag::InlineField, field.id, children)
            }
            Expr::Grouping(grouping) => {
                let mut children = vec![self.token(&grouping.left_paren)];
                children.extend(self.exprs(&grouping.contents));
                children.push(self.token(&grouping.right_paren));
                self.node(NodeTag::Grouping, grouping.id, children)
            }
            Expr::BarLine(barline) => {
                let children = vec![self.token(&barline.barline)];
                self.node(NodeTag::BarLine, barline.id, children)
            }
            Expr::Tuplet(tuplet) => {
                let children = vec![self.token(&tuplet.marker)];
                self.node(NodeTag::Tuplet, tuplet.id, children)
            }
        }
    }

    fn note(&mut self, note: &Note) -> NodeIdx {
        let pitch = &note.pitch;
        let mut pitch_children = Vec::new();
        self.opt_token(&pitch.alteration, &mut pitch_children);
        pitch_children.push(self.token(&pitch.letter));
        self.opt_token(&pitch.octave, &mut pitch_children);

        let mut children = vec![self.node(NodeTag::Pitch, pitch.id, pitch_children)];
        self.opt_rhythm(&note.rhythm, &mut children);
        self.opt_token(&note.tie, &mut children);
        self.node(NodeTag::Note, note.id, children)
    }

    fn opt_rhythm(&mut self, rhythm: &Option<Rhythm>, out: &mut Vec<NodeIdx>) {
        if let Some(rhythm) = rhythm {
            let mut children = Vec::new();
            self.opt_token(&rhythm.numerator, &mut children);
            self.opt_token(&rhythm.separator, &mut children);
            self.opt_token(&rhythm.denominator, &mut children);
            self.opt_token(&rhythm.broken, &mut children);
            out.push(self.node(NodeTag::Rhythm, rhythm.id, children));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abc_parser::parse;

    #[test]
    fn test_every_ast_identity_is_indexed() {
        let output = parse("X:1\nK:C\n[CEG]2 {/g}a (3abc [K:D] z/|\n");
        let tree = CsTree::from_file(&output.file);
        assert_eq!(tree.root_id(), output.file.id);
        for idx in tree.preorder() {
            assert_eq!(tree.lookup(tree.id(idx)), Some(idx));
        }
    }

    #[test]
    fn test_note_children_follow_field_order() {
        let output = parse("X:1\nK:C\n^c'3/4-\n");
        let tree = CsTree::from_file(&output.file);
        let note = tree
            .preorder()
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::Note)
            .unwrap();
        let tags: Vec<NodeTag> = tree.children(note).map(|c| tree.tag(c)).collect();
        assert_eq!(tags, vec![NodeTag::Pitch, NodeTag::Rhythm, NodeTag::Token]);

        let pitch = tree.child_with_tag(note, NodeTag::Pitch).unwrap();
        let lexemes: Vec<&str> = tree
            .children(pitch)
            .filter_map(|c| tree.node(c).lexeme())
            .collect();
        assert_eq!(lexemes, vec!["^", "c", "'"]);
    }

    #[test]
    fn test_body_systems_are_flattened() {
        let output = parse("X:1\nK:C\nCD|\nEF|\n");
        let tree = CsTree::from_file(&output.file);
        let body = tree
            .preorder()
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::TuneBody)
            .unwrap();
        assert_eq!(tree.children(body).count(), 8);
    }
}
