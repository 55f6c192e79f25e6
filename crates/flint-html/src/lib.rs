//! HTML parsing: builds the node tree, extracts the title, and collects
//! `<style>` rules into the document's stylesheet list.

pub mod css;

use flint_dom::Document;
use flint_dom::DomTree;
use flint_dom::NodeId;

/// Tags that never take children or end tags.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parses raw HTML into a document.
///
/// The parser is forgiving: unknown constructs are skipped, mismatched end
/// tags are ignored, and text always attaches to the nearest open element.
/// It never fails; worst case it produces a document with an empty tree.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        let mut document = Document::new();
        document.raw_source = input.to_owned();

        let root = document.tree_mut().create("html");
        document.set_root(Some(root));

        let mut stack: Vec<NodeId> = vec![root];
        let mut title: Option<String> = None;
        let bytes = input.as_bytes();
        let mut idx = 0_usize;

        while idx < bytes.len() {
            if bytes[idx] != b'<' {
                let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
                let text = collapse_whitespace(&input[idx..next]);
                if !text.is_empty() {
                    if let Some(current) = stack.last() {
                        append_text(document.tree_mut(), *current, &text);
                    }
                }
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!--") {
                idx = skip_comment(bytes, idx);
                continue;
            }
            if starts_with(bytes, idx, b"<!") {
                idx = skip_to_gt(bytes, idx + 2);
                continue;
            }
            if starts_with(bytes, idx, b"<?") {
                idx = skip_to_gt(bytes, idx + 2);
                continue;
            }

            let Some((tag, after_tag)) = parse_tag(input, idx) else {
                idx += 1;
                continue;
            };

            if tag.is_end {
                close_tag(&mut stack, document.tree_mut(), &tag.name);
                idx = after_tag;
                continue;
            }

            match tag.name.as_str() {
                "html" => {
                    // Merge a real <html> tag into the synthesized root
                    // instead of nesting a second one.
                    for (name, value) in tag.attributes {
                        document.tree_mut().push_attribute(root, name, value);
                    }
                    idx = after_tag;
                }
                "title" => {
                    let (raw, after_raw) = read_raw_text(input, after_tag, "title");
                    let collapsed = collapse_whitespace(raw);
                    let node = attach_element(document.tree_mut(), &stack, tag.attributes, "title");
                    if let Some(node) = node {
                        document.tree_mut().set_content(node, collapsed.clone());
                    }
                    if title.is_none() && !collapsed.is_empty() {
                        title = Some(collapsed);
                    }
                    idx = after_raw;
                }
                "style" => {
                    let (raw, after_raw) = read_raw_text(input, after_tag, "style");
                    document.styles.extend(css::parse_rules(raw));
                    idx = after_raw;
                }
                "script" => {
                    let (_, after_raw) = read_raw_text(input, after_tag, "script");
                    idx = after_raw;
                }
                name => {
                    let node =
                        attach_element(document.tree_mut(), &stack, tag.attributes, name);
                    if let Some(node) = node {
                        if !tag.self_closing && !VOID_TAGS.contains(&name) {
                            stack.push(node);
                        }
                    }
                    idx = after_tag;
                }
            }
        }

        document.title = title.unwrap_or_default();
        document
    }
}

fn attach_element(
    tree: &mut DomTree,
    stack: &[NodeId],
    attributes: Vec<(String, String)>,
    tag: &str,
) -> Option<NodeId> {
    let parent = *stack.last()?;
    let node = tree.create(tag);
    for (name, value) in attributes {
        tree.push_attribute(node, name, value);
    }
    // A freshly created node is detached, so attachment cannot fail.
    let _ = tree.append_child(parent, node);
    Some(node)
}

fn append_text(tree: &mut DomTree, node: NodeId, text: &str) {
    let merged = match tree.content(node) {
        Some(existing) if !existing.is_empty() => format!("{existing} {text}"),
        _ => text.to_owned(),
    };
    tree.set_content(node, merged);
}

/// Pops the stack through the nearest open element named `tag`; an end tag
/// with no matching open element is ignored. The synthesized root is never
/// popped.
fn close_tag(stack: &mut Vec<NodeId>, tree: &DomTree, tag: &str) {
    let matched = stack
        .iter()
        .skip(1)
        .rposition(|id| tree.tag(*id) == Some(tag))
        .map(|position| position + 1);
    if let Some(position) = matched {
        stack.truncate(position);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    is_end: bool,
    self_closing: bool,
    attributes: Vec<(String, String)>,
}

/// Parses one tag starting at a `<`, returning it and the index just past
/// the closing `>`.
fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start + 1;
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx += 1;
    }

    idx = skip_spaces(bytes, idx);
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx += 1;
    }
    if idx == name_start {
        return None;
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        is_end,
                        self_closing,
                        attributes,
                    },
                    idx + 1,
                ));
            }
            Some(b'/') => {
                self_closing = true;
                idx += 1;
            }
            Some(_) => {
                let (attribute, after) = parse_attribute(input, idx)?;
                if let Some(attribute) = attribute {
                    attributes.push(attribute);
                }
                idx = after;
            }
        }
    }
}

/// Parses one `name` or `name=value` attribute, value quoted or bare.
fn parse_attribute(input: &str, start: usize) -> Option<(Option<(String, String)>, usize)> {
    let bytes = input.as_bytes();
    let name_start = start;
    let mut idx = start;
    while idx < bytes.len() && !matches!(bytes[idx], b'=' | b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r') {
        idx += 1;
    }
    if idx == name_start {
        // Stray byte; skip it so the tag scan can make progress.
        return Some((None, idx + 1));
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    idx = skip_spaces(bytes, idx);
    if bytes.get(idx).copied() != Some(b'=') {
        return Some((Some((name, String::new())), idx));
    }
    idx = skip_spaces(bytes, idx + 1);

    match bytes.get(idx).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            let value_start = idx + 1;
            let close = find_byte(bytes, value_start, quote)?;
            let value = input[value_start..close].to_owned();
            Some((Some((name, value)), close + 1))
        }
        _ => {
            let value_start = idx;
            while idx < bytes.len() && !matches!(bytes[idx], b'>' | b' ' | b'\t' | b'\n' | b'\r') {
                idx += 1;
            }
            Some((Some((name, input[value_start..idx].to_owned())), idx))
        }
    }
}

/// Returns the raw text up to the matching end tag and the index past it.
fn read_raw_text<'a>(input: &'a str, start: usize, tag_name: &str) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx + 1).copied() == Some(b'/')
            && starts_with_ignore_case(bytes, idx + 2, tag_bytes)
        {
            let after = skip_to_gt(bytes, idx + 2 + tag_bytes.len());
            return (&input[start..idx], after);
        }
        idx += 1;
    }

    (&input[start..], bytes.len())
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    find_subslice(bytes, start + 4, b"-->").map_or(bytes.len(), |end| end + 3)
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx + 1;
        }
        idx += 1;
    }
    bytes.len()
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx + pattern.len();
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx + pattern.len();
    if end > bytes.len() {
        return false;
    }
    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}
