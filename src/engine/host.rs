//! Host adapter - the only code that writes element props into the document.
//!
//! Prop routing:
//!
//! - `children` is never applied (the reconciler owns it)
//! - `onXxx` handler props are recorded with the event layer as `xxx`
//! - `class` / `className` and `style` are applied as one unit each
//! - `false` removes the attribute, `true` sets it empty
//! - strings and numbers become attributes, anything else a property

use crate::dom::{Document, NodeId};
use crate::engine::{Engine, Instance};
use crate::types::{PropValue, Props, StyleMap};

const CHILDREN: &str = "children";

/// `"onClick"` → `Some("click")`; anything not shaped like a handler → `None`.
pub fn event_name_from_prop(name: &str) -> Option<String> {
    let rest = name.strip_prefix("on")?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

/// Parse `"color: red; width: 10"` into declarations.
pub fn parse_style(source: &str) -> StyleMap {
    source
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Apply every prop of a freshly created node.
pub(crate) fn set_props(engine: &Engine, node: NodeId, props: &Props) {
    for (name, value) in props.iter() {
        if name != CHILDREN {
            apply_prop(engine, node, name, value);
        }
    }
}

/// Apply the difference between `prev` and `next` over the union of their keys.
pub(crate) fn update_props(engine: &Engine, node: NodeId, prev: &Props, next: &Props) {
    for (name, value) in next.iter() {
        if name == CHILDREN {
            continue;
        }
        match prev.get(name) {
            Some(old) if old == value => continue,
            Some(old) if channel(name, old) != channel(name, value) => {
                remove_prop(engine, node, name, old);
            }
            _ => {}
        }
        apply_prop(engine, node, name, value);
    }
    for (name, old) in prev.iter() {
        if name != CHILDREN && !next.contains(name) {
            remove_prop(engine, node, name, old);
        }
    }
}

#[derive(PartialEq, Eq)]
enum Channel {
    Handler,
    Class,
    Style,
    Attribute,
    Property,
}

fn channel(name: &str, value: &PropValue) -> Channel {
    if event_name_from_prop(name).is_some() {
        return Channel::Handler;
    }
    match (name, value) {
        ("class" | "className", _) => Channel::Class,
        ("style", PropValue::Style(_) | PropValue::Str(_)) => Channel::Style,
        (_, PropValue::Str(_) | PropValue::Int(_) | PropValue::Float(_) | PropValue::Bool(_)) => {
            Channel::Attribute
        }
        _ => Channel::Property,
    }
}

fn apply_prop(engine: &Engine, node: NodeId, name: &str, value: &PropValue) {
    let document = engine.document();
    if let Some(event) = event_name_from_prop(name) {
        match value {
            PropValue::Handler(handler) => engine.add_event_handler(node, &event, handler.clone()),
            _ => {
                engine.remove_event_handler(node, &event);
            }
        }
        return;
    }
    match channel(name, value) {
        Channel::Class => {
            let class = value.to_attribute().unwrap_or_default();
            document.set_class_name(node, &class);
        }
        Channel::Style => match value {
            PropValue::Style(style) => document.set_style(node, style.clone()),
            PropValue::Str(source) => document.set_style(node, parse_style(source)),
            _ => {}
        },
        Channel::Attribute => match value.to_attribute() {
            Some(attribute) => document.set_attribute(node, name, &attribute),
            None => {
                document.remove_attribute(node, name);
            }
        },
        Channel::Property => document.set_property(node, name, value.clone()),
        Channel::Handler => {}
    }
}

fn remove_prop(engine: &Engine, node: NodeId, name: &str, old: &PropValue) {
    let document = engine.document();
    match channel(name, old) {
        Channel::Handler => {
            if let Some(event) = event_name_from_prop(name) {
                engine.remove_event_handler(node, &event);
            }
        }
        Channel::Class => document.set_class_name(node, ""),
        Channel::Style => document.set_style(node, StyleMap::new()),
        Channel::Attribute => {
            document.remove_attribute(node, name);
        }
        Channel::Property => {
            document.remove_property(node, name);
        }
    }
}

/// Move an instance's host nodes under `parent`, before `anchor`.
pub(crate) fn insert_instance(
    document: &Document,
    parent: NodeId,
    instance: &Instance,
    anchor: Option<NodeId>,
) {
    for node in instance.host_nodes() {
        document.insert_before(parent, node, anchor);
    }
}

/// Destroy an instance's host nodes and forget their handlers.
pub(crate) fn remove_instance(engine: &Engine, instance: &Instance) {
    let document = engine.document();
    for node in instance.host_nodes() {
        let freed = document.destroy(node);
        engine.forget_nodes(&freed);
    }
}
