//! # Concrete syntax tree
//!
//! A uniform tag-plus-children view of the ABC AST. Nodes live in an arena
//! and are linked first-child/next-sibling; there are no parent links, so
//! walks that need an ancestor carry it down the recursion instead.

use crate::position::{Position, Range};
use abc_parser::{NodeId, Token, TokenKind};
use la_arena::{Arena, Idx};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type NodeIdx = Idx<CsNode>;

/// Node kinds mirroring the AST types, plus `Token` for leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTag {
    File,
    FileHeader,
    Tune,
    TuneHeader,
    TuneBody,
    InfoLine,
    Note,
    Pitch,
    Rhythm,
    Rest,
    Chord,
    GraceGroup,
    InlineField,
    Grouping,
    BarLine,
    Tuplet,
    Token,
}

/// Payload of a leaf node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub lexeme: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl TokenData {
    pub fn from_token(token: &Token) -> Self {
        Self {
            lexeme: token.lexeme.clone(),
            kind: token.kind,
            line: token.line,
            column: token.column,
        }
    }

    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Exclusive end, moving to the next line after a newline
    pub fn end(&self) -> Position {
        let mut end = self.start();
        for c in self.lexeme.chars() {
            if c == '\n' {
                end.line += 1;
                end.character = 0;
            } else {
                end.character += 1;
            }
        }
        end
    }
}

#[derive(Debug, Clone)]
pub struct CsNode {
    pub tag: NodeTag,
    pub id: NodeId,
    /// Present exactly when `tag` is `Token`
    pub data: Option<TokenData>,
    pub first_child: Option<NodeIdx>,
    pub next_sibling: Option<NodeIdx>,
}

impl CsNode {
    pub fn is_token(&self, kind: TokenKind) -> bool {
        matches!(&self.data, Some(data) if data.kind == kind)
    }

    pub fn lexeme(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.lexeme.as_str())
    }
}

/// Arena-backed tree
///
/// Nodes detached by a transform stay allocated but are no longer reachable
/// from the root; reachability is what counts everywhere.
#[derive(Debug, Clone)]
pub struct CsTree {
    arena: Arena<CsNode>,
    root: NodeIdx,
    index: HashMap<NodeId, NodeIdx>,
}

impl CsTree {
    pub(crate) fn from_parts(
        arena: Arena<CsNode>,
        root: NodeIdx,
        index: HashMap<NodeId, NodeIdx>,
    ) -> Self {
        Self { arena, root, index }
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn root_id(&self) -> NodeId {
        self.arena[self.root].id
    }

    pub fn node(&self, idx: NodeIdx) -> &CsNode {
        &self.arena[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut CsNode {
        &mut self.arena[idx]
    }

    pub fn tag(&self, idx: NodeIdx) -> NodeTag {
        self.arena[idx].tag
    }

    pub fn id(&self, idx: NodeIdx) -> NodeId {
        self.arena[idx].id
    }

    /// Arena slot of an identity, reachable or not
    pub fn lookup(&self, id: NodeId) -> Option<NodeIdx> {
        self.index.get(&id).copied()
    }

    pub fn children(&self, idx: NodeIdx) -> Children<'_> {
        Children {
            tree: self,
            next: self.arena[idx].first_child,
        }
    }

    pub fn child_vec(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        self.children(idx).collect()
    }

    /// First direct child with the given tag
    pub fn child_with_tag(&self, idx: NodeIdx, tag: NodeTag) -> Option<NodeIdx> {
        self.children(idx).find(|&child| self.tag(child) == tag)
    }

    /// First direct token child of the given kind
    pub fn token_child(&self, idx: NodeIdx, kind: TokenKind) -> Option<NodeIdx> {
        self.children(idx)
            .find(|&child| self.arena[child].is_token(kind))
    }

    /// Replace the child list of `parent`, relinking the sibling chain
    pub fn set_children(&mut self, parent: NodeIdx, children: &[NodeIdx]) {
        self.arena[parent].first_child = children.first().copied();
        for pair in children.windows(2) {
            self.arena[pair[0]].next_sibling = Some(pair[1]);
        }
        if let Some(&last) = children.last() {
            self.arena[last].next_sibling = None;
        }
    }

    pub fn alloc_token(&mut self, id: NodeId, data: TokenData) -> NodeIdx {
        let idx = self.arena.alloc(CsNode {
            tag: NodeTag::Token,
            id,
            data: Some(data),
            first_child: None,
            next_sibling: None,
        });
        self.index.insert(id, idx);
        idx
    }

    pub fn alloc_node(&mut self, tag: NodeTag, id: NodeId, children: &[NodeIdx]) -> NodeIdx {
        let idx = self.arena.alloc(CsNode {
            tag,
            id,
            data: None,
            first_child: None,
            next_sibling: None,
        });
        self.index.insert(id, idx);
        self.set_children(idx, children);
        idx
    }

    /// Every node reachable from the root, in document order
    pub fn preorder(&self) -> Vec<NodeIdx> {
        self.preorder_from(self.root)
    }

    pub fn preorder_from(&self, start: NodeIdx) -> Vec<NodeIdx> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            let children = self.child_vec(idx);
            stack.extend(children.into_iter().rev());
        }
        order
    }

    pub fn reachable_ids(&self) -> HashSet<NodeId> {
        self.preorder().into_iter().map(|idx| self.id(idx)).collect()
    }

    pub fn leftmost_token(&self, idx: NodeIdx) -> Option<&TokenData> {
        let node = &self.arena[idx];
        if let Some(data) = &node.data {
            return Some(data);
        }
        self.children(idx).find_map(|child| self.leftmost_token(child))
    }

    pub fn rightmost_token(&self, idx: NodeIdx) -> Option<&TokenData> {
        let node = &self.arena[idx];
        if let Some(data) = &node.data {
            return Some(data);
        }
        let children = self.child_vec(idx);
        children
            .into_iter()
            .rev()
            .find_map(|child| self.rightmost_token(child))
    }

    /// Source span from the leftmost token's start to the rightmost token's end
    pub fn span(&self, idx: NodeIdx) -> Option<Range> {
        let first = self.leftmost_token(idx)?;
        let last = self.rightmost_token(idx)?;
        Some(Range::new(first.start(), last.end()))
    }

    pub fn span_of(&self, id: NodeId) -> Option<Range> {
        self.lookup(id).and_then(|idx| self.span(idx))
    }
}

pub struct Children<'a> {
    tree: &'a CsTree,
    next: Option<NodeIdx>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let current = self.next?;
        self.next = self.tree.arena[current].next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abc_parser::parse;

    fn tree(source: &str) -> CsTree {
        CsTree::from_file(&parse(source).file)
    }

    #[test]
    fn test_token_nodes_are_leaves() {
        let tree = tree("X:1\nK:C\n[CEG]2 C2|\n");
        for idx in tree.preorder() {
            let node = tree.node(idx);
            if node.tag == NodeTag::Token {
                assert!(node.data.is_some());
                assert!(node.first_child.is_none());
            } else {
                assert!(node.data.is_none());
            }
        }
    }

    #[test]
    fn test_set_children_relinks_chain() {
        let mut tree = tree("X:1\nK:C\nCDE\n");
        let body = tree
            .preorder()
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::TuneBody)
            .unwrap();
        let mut children = tree.child_vec(body);
        children.reverse();
        tree.set_children(body, &children);
        assert_eq!(tree.child_vec(body), children);
    }

    #[test]
    fn test_span_covers_chord() {
        let tree = tree("X:1\nK:C\n[CEG]2 C2|\n");
        let chord = tree
            .preorder()
            .into_iter()
            .find(|&idx| tree.tag(idx) == NodeTag::Chord)
            .unwrap();
        let span = tree.span(chord).unwrap();
        assert_eq!(span.start, Position::new(2, 0));
        assert_eq!(span.end, Position::new(2, 6));
    }

    #[test]
    fn test_eol_token_ends_on_next_line() {
        let data = TokenData {
            lexeme: "\n".into(),
            kind: TokenKind::Eol,
            line: 3,
            column: 7,
        };
        assert_eq!(data.end(), Position::new(4, 0));
    }
}
