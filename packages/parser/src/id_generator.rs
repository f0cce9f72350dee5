/// Identity of a node or token, unique within one identity space
pub type NodeId = u64;

/// Sequential ID generator for AST nodes within a document
///
/// The generator is owned by the parse context and handed back with the
/// parse result, so later edits keep minting identities from the same space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    count: NodeId,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Continue an identity space after `last`
    pub fn starting_after(last: NodeId) -> Self {
        Self { count: last }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> NodeId {
        self.count += 1;
        self.count
    }

    /// Most recently issued ID (0 when none was issued)
    pub fn last_id(&self) -> NodeId {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new();

        assert_eq!(gen.new_id(), 1);
        assert_eq!(gen.new_id(), 2);
        assert_eq!(gen.new_id(), 3);
        assert_eq!(gen.last_id(), 3);
    }

    #[test]
    fn test_continued_space_is_disjoint() {
        let mut first = IdGenerator::new();
        let a = first.new_id();
        let b = first.new_id();

        let mut second = IdGenerator::starting_after(first.last_id());
        let c = second.new_id();

        assert!(c > a && c > b);
    }
}
