//! Tree lookups over parsed transcript markup.
//!
//! Thin helpers on top of `roxmltree` nodes: first/all descendant lookup by
//! tag name, immediate-children lookup, attribute and class-token matching,
//! and the two text extraction flavours the transcript format needs.
//! Tag names are matched on their local name.

use roxmltree::Node;

fn is_tag(node: &Node, tag: &str) -> bool {
    node.is_element() && node.tag_name().name() == tag
}

/// First descendant element (excluding `node` itself) with the given tag
pub fn find<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| is_tag(n, tag))
}

/// All descendant elements with the given tag, in document order
pub fn find_all<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    node.descendants().skip(1).filter(|n| is_tag(n, tag)).collect()
}

/// First immediate child element with the given tag
pub fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_tag(n, tag))
}

/// Immediate child elements with the given tag, in document order
pub fn children<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    node.children().filter(|n| is_tag(n, tag)).collect()
}

/// First descendant `tag` whose `attr` equals `value`
pub fn find_with_attr<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    attr: &str,
    value: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| is_tag(n, tag) && n.attribute(attr) == Some(value))
}

/// All descendant `tag` elements whose `attr` equals `value`
pub fn find_all_with_attr<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    attr: &str,
    value: &str,
) -> Vec<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(|n| is_tag(n, tag) && n.attribute(attr) == Some(value))
        .collect()
}

/// Whether the element's whitespace-separated `class` list contains `class`
pub fn has_class(node: &Node, class: &str) -> bool {
    node.attribute("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// First descendant `tag` carrying the given class token
pub fn find_with_class<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    class: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| is_tag(n, tag) && has_class(n, class))
}

/// All descendant `tag` elements carrying the given class token
pub fn find_all_with_class<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    class: &str,
) -> Vec<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(|n| is_tag(n, tag) && has_class(n, class))
        .collect()
}

/// Concatenation of every descendant text node, untouched
pub fn text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Concatenation of every descendant text node after trimming each one and
/// dropping the empty ones. Inline markup boundaries therefore leave no
/// whitespace behind: `<b>Mr X</b> (10:00):  Text` becomes `Mr X(10:00):  Text`.
pub fn stripped_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Trimmed text of the first descendant `tag`, if present and non-blank
pub fn find_text(node: Node, tag: &str) -> Option<String> {
    find(node, tag)
        .map(|n| text(n).trim().to_string())
        .filter(|t| !t.is_empty())
}
