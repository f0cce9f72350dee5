//! Voice declarations in tune headers

use super::{anchor, new_token};
use crate::cstree::{CsTree, NodeIdx, NodeTag};
use crate::errors::TransformError;
use crate::selection::Selection;
use crate::selectors::enclosing_nodes;
use abc_parser::{IdGenerator, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Optional properties written after the voice id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceParams {
    pub name: Option<String>,
    pub clef: Option<String>,
    pub transpose: Option<i32>,
}

impl VoiceParams {
    /// Value text of the `V:` line, e.g. `T1 name="Tenor" clef=bass`
    pub fn render(&self, voice_id: &str) -> String {
        let mut value = voice_id.to_string();
        if let Some(name) = &self.name {
            value.push_str(&format!(" name=\"{}\"", name));
        }
        if let Some(clef) = &self.clef {
            value.push_str(&format!(" clef={}", clef));
        }
        if let Some(transpose) = self.transpose {
            value.push_str(&format!(" transpose={}", transpose));
        }
        value
    }
}

/// Declare a voice in every tune touched by the selection
///
/// The `V:` line goes right before the `K:` line, so the key stays the
/// header's last field and repeated calls keep their order. Headers without
/// a key get the line appended.
pub fn add_voice(
    tree: &mut CsTree,
    selection: &Selection,
    ids: &mut IdGenerator,
    voice_id: &str,
    params: &VoiceParams,
) -> Result<Selection, TransformError> {
    if voice_id.is_empty() || voice_id.chars().any(char::is_whitespace) {
        return Err(TransformError::InvalidArgument(format!(
            "voice id must be a single word, got {:?}",
            voice_id
        )));
    }
    if params.name.as_deref().is_some_and(|name| name.contains('"')) {
        return Err(TransformError::InvalidArgument(
            "voice name cannot contain a double quote".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let tunes: Vec<NodeIdx> = selection
        .cursors
        .iter()
        .flat_map(|cursor| enclosing_nodes(tree, cursor, NodeTag::Tune))
        .filter(|tune| seen.insert(*tune))
        .collect();

    let value = params.render(voice_id);
    for tune in tunes {
        let Some(header) = tree.child_with_tag(tune, NodeTag::TuneHeader) else {
            continue;
        };
        insert_voice_line(tree, ids, header, &value);
    }
    tracing::debug!("[Transform] declared voice {} in {} tune(s)", voice_id, seen.len());

    Ok(selection.clone())
}

fn insert_voice_line(tree: &mut CsTree, ids: &mut IdGenerator, header: NodeIdx, value: &str) {
    let mut children = tree.child_vec(header);
    let key_line = children
        .iter()
        .position(|&child| is_field(tree, child, 'K'));

    let near = key_line
        .map(|position| children[position])
        .or_else(|| children.last().copied())
        .and_then(|idx| anchor(tree, idx));
    let key = new_token(tree, ids, TokenKind::InfoHeader, "V:", near.as_ref());
    let text = new_token(tree, ids, TokenKind::InfoString, value, near.as_ref());
    let line = tree.alloc_node(NodeTag::InfoLine, ids.new_id(), &[key, text]);
    let ending = line_ending(tree, &children);
    let eol = new_token(tree, ids, TokenKind::Eol, &ending, near.as_ref());

    match key_line {
        Some(position) => {
            children.splice(position..position, [line, eol]);
        }
        None => {
            let ends_with_eol = children
                .last()
                .is_some_and(|&last| tree.node(last).is_token(TokenKind::Eol));
            if ends_with_eol || children.is_empty() {
                children.extend([line, eol]);
            } else {
                children.extend([eol, line]);
            }
        }
    }
    tree.set_children(header, &children);
}

/// The header's own line ending, `\n` when it has none yet
fn line_ending(tree: &CsTree, children: &[NodeIdx]) -> String {
    children
        .iter()
        .find(|&&child| tree.node(child).is_token(TokenKind::Eol))
        .and_then(|&eol| tree.node(eol).lexeme())
        .unwrap_or("\n")
        .to_string()
}

fn is_field(tree: &CsTree, idx: NodeIdx, field: char) -> bool {
    tree.tag(idx) == NodeTag::InfoLine
        && tree
            .token_child(idx, TokenKind::InfoHeader)
            .and_then(|key| tree.node(key).lexeme())
            .is_some_and(|lexeme| lexeme.starts_with(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::select_notes;
    use crate::transforms::test_support::fixture;

    #[test]
    fn test_voice_goes_before_key() {
        let mut f = fixture("X:1\nK:C\nCDE|\n");
        let whole = f.whole.clone();
        add_voice(&mut f.tree, &whole, &mut f.ids, "T1", &VoiceParams::default()).unwrap();
        assert_eq!(f.text(), "X:1\nV:T1\nK:C\nCDE|\n");
    }

    #[test]
    fn test_voice_line_keeps_crlf() {
        let mut f = fixture("X:1\r\nK:C\r\nCDE|\r\n");
        let whole = f.whole.clone();
        add_voice(&mut f.tree, &whole, &mut f.ids, "T1", &VoiceParams::default()).unwrap();
        assert_eq!(f.text(), "X:1\r\nV:T1\r\nK:C\r\nCDE|\r\n");
    }

    #[test]
    fn test_repeated_voices_keep_order() {
        let mut f = fixture("X:1\nT:Song\nK:G\nG\n");
        let whole = f.whole.clone();
        add_voice(&mut f.tree, &whole, &mut f.ids, "S", &VoiceParams::default()).unwrap();
        let params = VoiceParams {
            name: Some("Alto".to_string()),
            clef: Some("treble".to_string()),
            transpose: Some(-2),
        };
        add_voice(&mut f.tree, &whole, &mut f.ids, "A", &params).unwrap();
        assert_eq!(
            f.text(),
            "X:1\nT:Song\nV:S\nV:A name=\"Alto\" clef=treble transpose=-2\nK:G\nG\n"
        );
    }

    #[test]
    fn test_only_selected_tune_changes() {
        let mut f = fixture("X:1\nK:C\nC\n\nX:2\nK:D\nD\n");
        let notes = select_notes(&f.tree, &f.whole);
        let second = f.whole.with_cursors(vec![notes.cursors[1].clone()]);
        add_voice(&mut f.tree, &second, &mut f.ids, "B", &VoiceParams::default()).unwrap();
        assert_eq!(f.text(), "X:1\nK:C\nC\n\nX:2\nV:B\nK:D\nD\n");
    }

    #[test]
    fn test_header_without_key_appends() {
        let mut f = fixture("X:1\nT:Untitled");
        let whole = f.whole.clone();
        add_voice(&mut f.tree, &whole, &mut f.ids, "1", &VoiceParams::default()).unwrap();
        assert_eq!(f.text(), "X:1\nT:Untitled\nV:1");
    }

    #[test]
    fn test_rejects_bad_id() {
        let mut f = fixture("X:1\nK:C\nC\n");
        let whole = f.whole.clone();
        let result = add_voice(&mut f.tree, &whole, &mut f.ids, "two words", &VoiceParams::default());
        assert!(matches!(result, Err(TransformError::InvalidArgument(_))));
        assert_eq!(f.text(), "X:1\nK:C\nC\n");
    }
}
