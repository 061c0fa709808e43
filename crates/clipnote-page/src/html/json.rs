//! JSON projection of the HTML tree and its inverse.
//!
//! Shape: `{"type": "text", "content": …}` for text nodes and
//! `{"type": "element", "tag": …, "attributes": {…}, "children": […]}`
//! for elements. A single root serializes to the node object itself,
//! multiple roots to an array.

use serde_json::{Map, Value, json};

use super::{HtmlElement, HtmlNode};
use hashlink::LinkedHashMap;

/// Project a node list to JSON.
pub fn to_json(nodes: &[HtmlNode]) -> Value {
    let mut values: Vec<Value> = nodes.iter().map(node_to_json).collect();
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn node_to_json(node: &HtmlNode) -> Value {
    match node {
        HtmlNode::Text(text) => json!({"type": "text", "content": text}),
        HtmlNode::Element(el) => {
            let mut attributes = Map::new();
            for (name, value) in &el.attributes {
                attributes.insert(name.clone(), Value::String(value.clone()));
            }
            json!({
                "type": "element",
                "tag": el.tag,
                "attributes": Value::Object(attributes),
                "children": Value::Array(el.children.iter().map(node_to_json).collect()),
            })
        }
    }
}

/// Rebuild a node list from the JSON projection. Unrecognized values
/// are dropped.
pub fn from_json(value: &Value) -> Vec<HtmlNode> {
    match value {
        Value::Array(items) => items.iter().filter_map(node_from_json).collect(),
        single => node_from_json(single).into_iter().collect(),
    }
}

fn node_from_json(value: &Value) -> Option<HtmlNode> {
    let object = value.as_object()?;
    match object.get("type")?.as_str()? {
        "text" => Some(HtmlNode::Text(
            object.get("content")?.as_str()?.to_string(),
        )),
        "element" => {
            let tag = object.get("tag")?.as_str()?.to_string();
            let mut attributes = LinkedHashMap::new();
            if let Some(Value::Object(map)) = object.get("attributes") {
                for (name, attr_value) in map {
                    if let Some(text) = attr_value.as_str() {
                        attributes.insert(name.clone(), text.to_string());
                    }
                }
            }
            let children = match object.get("children") {
                Some(Value::Array(items)) => {
                    items.iter().filter_map(node_from_json).collect()
                }
                _ => Vec::new(),
            };
            Some(HtmlNode::Element(HtmlElement {
                tag,
                attributes,
                children,
            }))
        }
        _ => None,
    }
}
