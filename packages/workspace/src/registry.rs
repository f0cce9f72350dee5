//! Fixed tables of the selectors and transforms exposed to clients
//!
//! Arguments arrive as JSON values. They are checked against each entry's
//! argument kinds before any tree is touched.

use crate::protocol::{ProtocolError, ProtocolResult};
use abc_editor::selectors::*;
use abc_editor::{CsTree, Duration, Selection, Transform, VoiceParams};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Integer,
    /// `{"numerator": n, "denominator": d}` or a plain integer
    Rational,
    String,
    Object,
}

/// A checked argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Rational(Duration),
    String(String),
    Object(Map<String, Value>),
}

pub type SelectorFn = fn(&CsTree, &Selection, &[ArgValue]) -> Selection;
pub type TransformBuilder = fn(&[ArgValue]) -> ProtocolResult<Transform>;

pub struct SelectorEntry {
    pub name: &'static str,
    pub args: &'static [ArgKind],
    pub run: SelectorFn,
}

pub struct TransformEntry {
    pub name: &'static str,
    pub args: &'static [ArgKind],
    pub build: TransformBuilder,
}

impl SelectorEntry {
    /// Check `args` and run the selector
    pub fn apply(
        &self,
        tree: &CsTree,
        selection: &Selection,
        args: &[Value],
    ) -> ProtocolResult<Selection> {
        let args = check_args(self.name, self.args, args)?;
        Ok((self.run)(tree, selection, &args))
    }
}

impl TransformEntry {
    /// Check `args` and build the transform
    pub fn transform(&self, args: &[Value]) -> ProtocolResult<Transform> {
        let args = check_args(self.name, self.args, args)?;
        (self.build)(&args)
    }
}

macro_rules! plain_selectors {
    ($($name:literal => $func:path),* $(,)?) => {
        &[$(SelectorEntry {
            name: $name,
            args: &[],
            run: |tree, selection, _| $func(tree, selection),
        }),*]
    };
}

const PLAIN_SELECTORS: &[SelectorEntry] = plain_selectors![
    "selectChords" => select_chords,
    "selectNotes" => select_notes,
    "selectNonChordNotes" => select_non_chord_notes,
    "selectChordNotes" => select_chord_notes,
    "selectRests" => select_rests,
    "selectBarLines" => select_bar_lines,
    "selectMusic" => select_music,
    "selectGraceGroups" => select_grace_groups,
    "selectInfoLines" => select_info_lines,
    "selectTune" => select_tune,
    "selectTop" => select_top,
    "selectBottom" => select_bottom,
    "selectAllButTop" => select_all_but_top,
    "selectAllButBottom" => select_all_but_bottom,
    "selectInsideChord" => select_inside_chord,
    "selectAroundChord" => select_around_chord,
    "selectInsideGraceGroup" => select_inside_grace_group,
    "selectAroundGraceGroup" => select_around_grace_group,
    "selectInsideInlineField" => select_inside_inline_field,
    "selectAroundInlineField" => select_around_inline_field,
    "selectInsideGrouping" => select_inside_grouping,
    "selectAroundGrouping" => select_around_grouping,
];

const ARG_SELECTORS: &[SelectorEntry] = &[SelectorEntry {
    name: "selectNthFromTop",
    args: &[ArgKind::Integer],
    run: |tree, selection, args| match args {
        // Negative positions are out of range like any other
        [ArgValue::Integer(n)] => match usize::try_from(*n) {
            Ok(n) => select_nth_from_top(tree, selection, n),
            Err(_) => selection.with_cursors(Vec::new()),
        },
        _ => selection.with_cursors(Vec::new()),
    },
}];

const TRANSFORMS: &[TransformEntry] = &[
    TransformEntry {
        name: "transpose",
        args: &[ArgKind::Integer],
        build: |args| Ok(Transform::Transpose(int_arg(args, 0)?)),
    },
    TransformEntry {
        name: "enharmonize",
        args: &[],
        build: |_| Ok(Transform::Enharmonize),
    },
    TransformEntry {
        name: "setRhythm",
        args: &[ArgKind::Rational],
        build: |args| Ok(Transform::SetRhythm(rational_arg(args, 0)?)),
    },
    TransformEntry {
        name: "addToRhythm",
        args: &[ArgKind::Rational],
        build: |args| Ok(Transform::AddToRhythm(rational_arg(args, 0)?)),
    },
    TransformEntry {
        name: "multiplyRhythm",
        args: &[ArgKind::Integer],
        build: |args| Ok(Transform::MultiplyRhythm(int_arg(args, 0)?)),
    },
    TransformEntry {
        name: "divideRhythm",
        args: &[ArgKind::Integer],
        build: |args| Ok(Transform::DivideRhythm(int_arg(args, 0)?)),
    },
    TransformEntry {
        name: "toRest",
        args: &[],
        build: |_| Ok(Transform::ToRest),
    },
    TransformEntry {
        name: "unwrapSingle",
        args: &[],
        build: |_| Ok(Transform::UnwrapSingle),
    },
    TransformEntry {
        name: "remove",
        args: &[],
        build: |_| Ok(Transform::Remove),
    },
    TransformEntry {
        name: "addVoice",
        args: &[ArgKind::String, ArgKind::Object],
        build: build_add_voice,
    },
];

pub fn lookup_selector(name: &str) -> Option<&'static SelectorEntry> {
    PLAIN_SELECTORS
        .iter()
        .chain(ARG_SELECTORS)
        .find(|entry| entry.name == name)
}

pub fn lookup_transform(name: &str) -> Option<&'static TransformEntry> {
    TRANSFORMS.iter().find(|entry| entry.name == name)
}

/// Match `args` against `kinds`, converting each value
pub fn check_args(name: &str, kinds: &[ArgKind], args: &[Value]) -> ProtocolResult<Vec<ArgValue>> {
    if args.len() != kinds.len() {
        return Err(ProtocolError::invalid_params(format!(
            "{} takes {} argument(s), got {}",
            name,
            kinds.len(),
            args.len()
        )));
    }
    kinds
        .iter()
        .zip(args)
        .enumerate()
        .map(|(position, (kind, value))| {
            check_arg(*kind, value).ok_or_else(|| {
                ProtocolError::invalid_params(format!(
                    "{}: argument {} must be {:?}, got {}",
                    name, position, kind, value
                ))
            })
        })
        .collect()
}

fn check_arg(kind: ArgKind, value: &Value) -> Option<ArgValue> {
    match kind {
        ArgKind::Integer => value.as_i64().map(ArgValue::Integer),
        ArgKind::String => value.as_str().map(|s| ArgValue::String(s.to_string())),
        ArgKind::Object => value.as_object().cloned().map(ArgValue::Object),
        ArgKind::Rational => {
            if let Some(n) = value.as_i64() {
                let n = i32::try_from(n).ok()?;
                return Some(ArgValue::Rational(Duration::from_integer(n)));
            }
            let object = value.as_object()?;
            let numerator = i32::try_from(object.get("numerator")?.as_i64()?).ok()?;
            let denominator = i32::try_from(object.get("denominator")?.as_i64()?).ok()?;
            // i32::MIN has no positive counterpart to normalize the sign with
            if denominator == 0 || numerator == i32::MIN || denominator == i32::MIN {
                return None;
            }
            Some(ArgValue::Rational(Duration::new(numerator, denominator)))
        }
    }
}

fn int_arg(args: &[ArgValue], position: usize) -> ProtocolResult<i32> {
    match args.get(position) {
        Some(ArgValue::Integer(n)) => i32::try_from(*n)
            .map_err(|_| ProtocolError::invalid_params(format!("{} is out of range", n))),
        _ => Err(ProtocolError::invalid_params("expected an integer")),
    }
}

fn rational_arg(args: &[ArgValue], position: usize) -> ProtocolResult<Duration> {
    match args.get(position) {
        Some(ArgValue::Rational(value)) => Ok(*value),
        _ => Err(ProtocolError::invalid_params("expected a rational")),
    }
}

fn build_add_voice(args: &[ArgValue]) -> ProtocolResult<Transform> {
    match args {
        [ArgValue::String(id), ArgValue::Object(params)] => {
            let params: VoiceParams = serde_json::from_value(Value::Object(params.clone()))
                .map_err(|e| ProtocolError::invalid_params(format!("addVoice params: {}", e)))?;
            Ok(Transform::AddVoice {
                id: id.clone(),
                params,
            })
        }
        _ => Err(ProtocolError::invalid_params("addVoice takes an id and params")),
    }
}
