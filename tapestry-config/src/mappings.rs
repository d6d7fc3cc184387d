use std::collections::BTreeMap;
use std::str::FromStr;

use knuffel::errors::DecodeError;
use miette::miette;

use crate::utils::{expect_only_children, parse_arg_node, MergeWith};

/// Every gesture key a mapping or sequence may refer to.
pub const GESTURE_KEYS: &[&str] = &[
    "tap",
    "double_tap",
    "hold",
    "swipe_left",
    "swipe_right",
    "swipe_up",
    "swipe_down",
    "pinch_in",
    "pinch_out",
    "rotate",
];

/// Normalized gesture key, such as `double_tap` or `swipe_left`.
///
/// Parsing accepts dashes in place of underscores, so config files can write `swipe-left`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureKey(String);

/// Gesture key to action name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionTable(pub BTreeMap<String, String>);

/// Action table that applies to one context or one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedActionTable {
    pub name: String,
    pub table: ActionTable,
}

/// Three-tier action resolution: element, then context, then defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mappings {
    pub defaults: ActionTable,
    pub contexts: BTreeMap<String, ActionTable>,
    pub elements: BTreeMap<String, ActionTable>,
}

/// Mapping entries to merge into [`Mappings`].
///
/// Entries in the part replace existing entries with the same key; all other entries are kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingsPart {
    pub defaults: Option<ActionTable>,
    pub contexts: Vec<NamedActionTable>,
    pub elements: Vec<NamedActionTable>,
}

impl GestureKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GestureKey {
    type Err = miette::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if GESTURE_KEYS.contains(&normalized.as_str()) {
            Ok(Self(normalized))
        } else {
            Err(miette!(
                "unknown gesture `{s}`, expected one of: {}",
                GESTURE_KEYS.join(", ")
            ))
        }
    }
}

impl ActionTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: GestureKey, action: impl Into<String>) -> Option<String> {
        self.0.insert(key.0, action.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(GestureKey, String)> for ActionTable {
    fn from_iter<T: IntoIterator<Item = (GestureKey, String)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(key, action)| (key.0, action)).collect())
    }
}

impl MergeWith<ActionTable> for ActionTable {
    fn merge_with(&mut self, part: &ActionTable) {
        self.0
            .extend(part.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl MergeWith<MappingsPart> for Mappings {
    fn merge_with(&mut self, part: &MappingsPart) {
        if let Some(defaults) = &part.defaults {
            self.defaults.merge_with(defaults);
        }

        for named in &part.contexts {
            self.contexts
                .entry(named.name.clone())
                .or_default()
                .merge_with(&named.table);
        }

        for named in &part.elements {
            self.elements
                .entry(named.name.clone())
                .or_default()
                .merge_with(&named.table);
        }
    }
}

impl Mappings {
    /// Resolves the action for `key`, preferring the element table, then the context table, then
    /// the defaults.
    pub fn resolve(&self, target: Option<&str>, context: &str, key: &str) -> Option<&str> {
        let element = target
            .and_then(|target| self.elements.get(target))
            .and_then(|table| table.get(key));
        if element.is_some() {
            return element;
        }

        let context = self.contexts.get(context).and_then(|table| table.get(key));
        if context.is_some() {
            return context;
        }

        self.defaults.get(key)
    }
}

fn decode_table_children<S>(
    node: &knuffel::ast::SpannedNode<S>,
    ctx: &mut knuffel::decode::Context<S>,
) -> ActionTable
where
    S: knuffel::traits::ErrorSpan,
{
    let mut table = ActionTable::default();

    for child in node.children() {
        let key = match child.node_name.parse::<GestureKey>() {
            Ok(key) => key,
            Err(e) => {
                ctx.emit_error(DecodeError::conversion(
                    &child.node_name,
                    e.wrap_err("invalid gesture"),
                ));
                continue;
            }
        };

        let action: String = match parse_arg_node("action", child, ctx) {
            Ok(action) => action,
            Err(e) => {
                ctx.emit_error(e);
                continue;
            }
        };

        if table.0.contains_key(key.as_str()) {
            ctx.emit_error(DecodeError::unexpected(
                &child.node_name,
                "gesture",
                "duplicate gesture mapping",
            ));
            continue;
        }

        table.insert(key, action);
    }

    table
}

impl<S> knuffel::Decode<S> for ActionTable
where
    S: knuffel::traits::ErrorSpan,
{
    fn decode_node(
        node: &knuffel::ast::SpannedNode<S>,
        ctx: &mut knuffel::decode::Context<S>,
    ) -> Result<Self, DecodeError<S>> {
        expect_only_children(node, ctx);
        Ok(decode_table_children(node, ctx))
    }
}

impl<S> knuffel::Decode<S> for NamedActionTable
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

        let mut args = node.arguments.iter();
        let val = args
            .next()
            .ok_or_else(|| DecodeError::missing(node, "additional argument `name` is required"))?;
        let name: String = knuffel::traits::DecodeScalar::decode(val, ctx)?;

        for val in args {
            ctx.emit_error(DecodeError::unexpected(
                &val.literal,
                "argument",
                "unexpected argument",
            ));
        }
        for name in node.properties.keys() {
            ctx.emit_error(DecodeError::unexpected(
                name,
                "property",
                format!("unexpected property `{}`", name.escape_default()),
            ));
        }

        let table = decode_table_children(node, ctx);
        Ok(Self { name, table })
    }
}
