//! Outline extraction from tree-sitter parse trees
//!
//! Walks the tree-sitter AST to extract a flat, source-ordered list of symbols.
//! Runs on the outline worker thread.

use tree_sitter::{Node, Tree};

use super::{OutlineKind, RawOutlineItem};
use crate::content_type::ContentType;

/// Extract a flat outline from a tree-sitter parse tree
pub fn extract_outline(
    tree: &Tree,
    source: &str,
    content_type: ContentType,
) -> Vec<RawOutlineItem> {
    let root = tree.root_node();
    let mut items = Vec::new();

    match content_type {
        ContentType::JavaScript => collect_js_symbols(root, source, &mut items),
        ContentType::Css => collect_css_symbols(root, source, &mut items),
        _ => {}
    }

    items
}

fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

fn child_by_field<'a>(node: &Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

fn child_by_kind<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| kinds.contains(&child.kind()));
    found
}

/// Collapse runs of whitespace (including newlines) into single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Item positioned at `anchor` (usually the name node)
fn item_at(kind: OutlineKind, title: &str, anchor: &Node) -> RawOutlineItem {
    let start = anchor.start_position();
    RawOutlineItem::new(kind, title, start.row, start.column)
}

// =============================================================================
// JavaScript symbol extraction
// =============================================================================

/// Parameter list of a function-like node, e.g. `(a, b)`
fn js_parameters(node: &Node, source: &str) -> Option<String> {
    if let Some(params) = child_by_field(node, "parameters") {
        return node_text(&params, source).map(collapse_whitespace);
    }
    // Arrow functions with a single bare parameter: `x => x`
    child_by_field(node, "parameter")
        .and_then(|param| node_text(&param, source))
        .map(|name| format!("({})", name))
}

fn is_js_function_value(node: &Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn push_js_function(
    kind: OutlineKind,
    title: &str,
    anchor: &Node,
    function: &Node,
    source: &str,
    items: &mut Vec<RawOutlineItem>,
) {
    let mut item = item_at(kind, title, anchor);
    item.subtitle = js_parameters(function, source);
    items.push(item);
}

fn method_kind(node: &Node) -> OutlineKind {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "get" => return OutlineKind::Getter,
            "set" => return OutlineKind::Setter,
            _ => {}
        }
    }
    OutlineKind::Method
}

fn collect_js_symbols(node: Node, source: &str, items: &mut Vec<RawOutlineItem>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = child_by_field(&node, "name") {
                if let Some(name) = node_text(&name_node, source) {
                    push_js_function(OutlineKind::Function, name, &name_node, &node, source, items);
                }
            }
        }
        "class_declaration" | "class" => {
            if let Some(name_node) = child_by_field(&node, "name") {
                if let Some(name) = node_text(&name_node, source) {
                    items.push(item_at(OutlineKind::Class, name, &name_node));
                }
            }
        }
        "method_definition" => {
            if let Some(name_node) = child_by_field(&node, "name") {
                if let Some(name) = node_text(&name_node, source) {
                    push_js_function(method_kind(&node), name, &name_node, &node, source, items);
                }
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) =
                (child_by_field(&node, "name"), child_by_field(&node, "value"))
            {
                if is_js_function_value(&value) {
                    if let Some(name) = node_text(&name_node, source) {
                        push_js_function(
                            OutlineKind::Function,
                            name,
                            &name_node,
                            &value,
                            source,
                            items,
                        );
                    }
                    // The function body may declare nested symbols
                    collect_js_children(value, source, items);
                    return;
                }
            }
        }
        "assignment_expression" => {
            // `Foo.prototype.bar = function() {}`
            if let (Some(left), Some(right)) =
                (child_by_field(&node, "left"), child_by_field(&node, "right"))
            {
                if is_js_function_value(&right) {
                    if let Some(name) = node_text(&left, source) {
                        let title = collapse_whitespace(name);
                        push_js_function(
                            OutlineKind::Function,
                            &title,
                            &left,
                            &right,
                            source,
                            items,
                        );
                    }
                    collect_js_children(right, source, items);
                    return;
                }
            }
        }
        "pair" => {
            // `{ bar: function() {} }`
            if let (Some(key), Some(value)) =
                (child_by_field(&node, "key"), child_by_field(&node, "value"))
            {
                if is_js_function_value(&value) {
                    if let Some(name) = node_text(&key, source) {
                        push_js_function(OutlineKind::Method, name, &key, &value, source, items);
                    }
                    collect_js_children(value, source, items);
                    return;
                }
            }
        }
        _ => {}
    }

    collect_js_children(node, source, items);
}

fn collect_js_children(node: Node, source: &str, items: &mut Vec<RawOutlineItem>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_js_symbols(child, source, items);
    }
}

// =============================================================================
// CSS symbol extraction
// =============================================================================

/// Prelude of an at-rule, e.g. `@media (max-width: 600px)`
fn css_at_rule_prelude(node: &Node, source: &str) -> Option<String> {
    let body = child_by_kind(node, &["block", "keyframe_block_list"])?;
    let prelude = source.get(node.start_byte()..body.start_byte())?;
    let prelude = collapse_whitespace(prelude);
    if prelude.is_empty() {
        None
    } else {
        Some(prelude)
    }
}

fn collect_css_symbols(node: Node, source: &str, items: &mut Vec<RawOutlineItem>) {
    match node.kind() {
        "rule_set" => {
            if let Some(selectors) = child_by_kind(&node, &["selectors"]) {
                if let Some(text) = node_text(&selectors, source) {
                    items.push(item_at(OutlineKind::Rule, &collapse_whitespace(text), &node));
                }
            }
        }
        "media_statement" | "supports_statement" | "keyframes_statement" | "at_rule" => {
            if let Some(prelude) = css_at_rule_prelude(&node, source) {
                items.push(item_at(OutlineKind::AtRule, &prelude, &node));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_css_symbols(child, source, items);
    }
}
