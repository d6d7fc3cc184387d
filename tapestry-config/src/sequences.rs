use std::collections::{BTreeMap, HashSet};

use knuffel::errors::DecodeError;

use crate::mappings::GestureKey;
use crate::utils::expect_only_children;

/// Delimiter between gesture keys in a serialized sequence.
pub const SEQUENCE_DELIMITER: &str = ",";

/// Registered multi-gesture sequences.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sequences(pub Vec<Sequence>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub gestures: Vec<GestureKey>,
    pub action: String,
}

impl Sequence {
    /// Returns the gesture keys joined with [`SEQUENCE_DELIMITER`].
    pub fn key(&self) -> String {
        join_keys(self.gestures.iter().map(GestureKey::as_str))
    }
}

impl Sequences {
    /// Returns the sequence table keyed by the serialized sequence.
    pub fn table(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|seq| (seq.key(), seq.action.clone()))
            .collect()
    }
}

pub fn join_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    keys.into_iter()
        .collect::<Vec<_>>()
        .join(SEQUENCE_DELIMITER)
}

impl<S> knuffel::Decode<S> for Sequences
where
    S: knuffel::traits::ErrorSpan,
{
    fn decode_node(
        node: &knuffel::ast::SpannedNode<S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        expect_only_children(node, ctx);

        let mut seen = HashSet::new();
        let mut sequences = Vec::new();

        for child in node.children() {
            if &**child.node_name != "sequence" {
                ctx.emit_error(DecodeError::unexpected(
                    child,
                    "node",
                    format!("unexpected node `{}`", child.node_name.escape_default()),
                ));
                continue;
            }

            match Sequence::decode_node(child, ctx) {
                Err(e) => ctx.emit_error(e),
                Ok(seq) => {
                    if seen.insert(seq.key()) {
                        sequences.push(seq);
                    } else {
                        ctx.emit_error(DecodeError::unexpected(
                            &child.node_name,
                            "sequence",
                            "duplicate sequence",
                        ));
                    }
                }
            }
        }

        Ok(Self(sequences))
    }
}

impl<S> knuffel::Decode<S> for Sequence
where
    S: knuffel::traits::ErrorSpan,
{
    fn decode_node(
        node: &knuffel::ast::SpannedNode<S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        if let Some(type_name) = &node.type_name {
            ctx.emit_error(DecodeError::unexpected(
                type_name,
                "type name",
                "no type name expected for this node",
            ));
        }

        let mut gestures = Vec::new();
        for val in node.arguments.iter() {
            let name: String = knuffel::traits::DecodeScalar::decode(val, ctx)?;
            match name.parse::<GestureKey>() {
                Ok(key) => gestures.push(key),
                Err(e) => ctx.emit_error(DecodeError::conversion(
                    &val.literal,
                    e.wrap_err("invalid gesture"),
                )),
            }
        }

        if node.arguments.len() < 2 {
            return Err(DecodeError::missing(
                node,
                "a sequence needs at least two gestures",
            ));
        }

        let mut action = None;
        for (name, val) in &node.properties {
            match &***name {
                "action" => {
                    action = Some(knuffel::traits::DecodeScalar::decode(val, ctx)?);
                }
                name_str => {
                    ctx.emit_error(DecodeError::unexpected(
                        name,
                        "property",
                        format!("unexpected property `{}`", name_str.escape_default()),
                    ));
                }
            }
        }

        for child in node.children() {
            ctx.emit_error(DecodeError::unexpected(
                child,
                "node",
                format!("unexpected node `{}`", child.node_name.escape_default()),
            ));
        }

        let action =
            action.ok_or_else(|| DecodeError::missing(node, "property `action` is required"))?;

        Ok(Self { gestures, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_key_is_comma_joined() {
        let seq = Sequence {
            gestures: vec!["swipe-left".parse().unwrap(), "swipe-right".parse().unwrap()],
            action: String::from("edit.undo"),
        };
        assert_eq!(seq.key(), "swipe_left,swipe_right");

        let table = Sequences(vec![seq]).table();
        assert_eq!(
            table.get("swipe_left,swipe_right").map(String::as_str),
            Some("edit.undo")
        );
    }
}
