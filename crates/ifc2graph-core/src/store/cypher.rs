//! Cypher statements for the write commands.
//!
//! Parameterized statements are executed by the Neo4j store; the `render_*`
//! variants inline every value and make up the write-log script.

use std::fmt::Write as _;

use super::{
    EdgeMerge, NodeMerge, PropertyMap, PropertyValue, EDGE_TYPE, GLOBAL_ID_PROPERTY, LIST_ITEM_PROPERTY,
    P21_ID_PROPERTY, REL_TYPE_PROPERTY,
};
use crate::label::ModelLabel;

/// Quote a label or property key with backticks.
pub fn identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Double-quoted string literal.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn property_literal(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(x) if x.is_finite() => format!("{x:?}"),
        PropertyValue::Float(x) => format!("toFloat({})", string_literal(&x.to_string())),
        PropertyValue::String(s) => string_literal(s),
        PropertyValue::List(items) => {
            let inner: Vec<String> = items.iter().map(property_literal).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

pub fn map_literal(properties: &PropertyMap) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in properties.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}: {}", identifier(key), property_literal(value));
    }
    out.push('}');
    out
}

pub fn count_nodes(label: &ModelLabel) -> String {
    format!("MATCH (n:{}) RETURN count(n) AS count", identifier(label.as_str()))
}

pub fn delete_label(label: &ModelLabel) -> String {
    format!("MATCH (n:{}) DETACH DELETE n", identifier(label.as_str()))
}

fn node_pattern(node: &NodeMerge, key: &str) -> String {
    format!(
        "MERGE (n:{} {{{}: {}}}) SET n:{}:{}",
        identifier(node.label.as_str()),
        P21_ID_PROPERTY,
        key,
        identifier(node.role.label()),
        identifier(&node.class_name),
    )
}

/// Parameters: `$p21_id`, `$props`.
pub fn merge_node(node: &NodeMerge) -> String {
    format!("{}, n += $props", node_pattern(node, "$p21_id"))
}

pub fn render_merge_node(node: &NodeMerge) -> String {
    format!(
        "{}, n += {}",
        node_pattern(node, &node.p21_id.to_string()),
        map_literal(&node.properties)
    )
}

fn edge_statement(edge: &EdgeMerge, source: &str, target: &str, rel_type: &str, list_item: &str) -> String {
    let label = identifier(edge.label.as_str());
    let properties = match edge.sequence {
        Some(_) => format!("{REL_TYPE_PROPERTY}: {rel_type}, {LIST_ITEM_PROPERTY}: {list_item}"),
        None => format!("{REL_TYPE_PROPERTY}: {rel_type}"),
    };
    format!(
        "MATCH (source:{label} {{{P21_ID_PROPERTY}: {source}}}), (target:{label} {{{P21_ID_PROPERTY}: {target}}}) \
         MERGE (source)-[r:{EDGE_TYPE} {{{properties}}}]->(target)"
    )
}

/// Parameters: `$source`, `$target`, `$rel_type` and, for sequenced edges,
/// `$list_item`. Returns `count` 0 when an endpoint is missing.
pub fn merge_edge(edge: &EdgeMerge) -> String {
    format!(
        "{} RETURN count(r) AS count",
        edge_statement(edge, "$source", "$target", "$rel_type", "$list_item")
    )
}

pub fn render_merge_edge(edge: &EdgeMerge) -> String {
    let list_item = edge.sequence.map(|i| i.to_string()).unwrap_or_default();
    edge_statement(
        edge,
        &edge.source.to_string(),
        &edge.target.to_string(),
        &string_literal(&edge.relation),
        &list_item,
    )
}

/// Parameter: `$global_id`.
pub fn find_by_global_id(label: &ModelLabel) -> String {
    format!(
        "MATCH (n:{} {{{GLOBAL_ID_PROPERTY}: $global_id}}) RETURN n.{P21_ID_PROPERTY} AS p21_id LIMIT 1",
        identifier(label.as_str())
    )
}
