// Host page model
//
// A stand-in for the live document the adapters run against: an arena of nodes
// addressed by `NodeId`, with the handful of queries and mutations the adapters
// need. Adapters hold `NodeId`s, never node data; the page owns everything.

mod parse;
mod selector;

pub use selector::Selector;

use crate::error::Result;

/// Elements with no content and no end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is kept verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element(ElementData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag: String,
    /// Attributes in source order, names lowercased
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// One loaded document plus its navigation URL
#[derive(Debug, Clone)]
pub struct Page {
    nodes: Vec<Node>,
    url: String,
    revision: u64,
}

impl Page {
    /// An empty document at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Page {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            url: url.into(),
            revision: 0,
        }
    }

    /// Read `html` leniently into a new document at `url`
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        let mut page = Page::new(url);
        let document = page.document();
        parse::parse_into(&mut page, document, html);
        // Loading is not a mutation
        page.revision = 0;
        page
    }

    // ========================================================================
    // NAVIGATION STATE
    // ========================================================================

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Text of the first `<title>`, or empty
    pub fn title(&self) -> String {
        self.descendants(self.document())
            .into_iter()
            .find(|&id| self.tag(id) == Some("title"))
            .map(|id| self.text(id))
            .unwrap_or_default()
    }

    /// Replace the `<title>` text, creating the element if needed
    pub fn set_title(&mut self, title: &str) {
        let existing = self
            .descendants(self.document())
            .into_iter()
            .find(|&id| self.tag(id) == Some("title"));
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.create_element("title");
                let head = self
                    .descendants(self.document())
                    .into_iter()
                    .find(|&id| self.tag(id) == Some("head"))
                    .unwrap_or_else(|| self.document());
                self.append_child(head, id);
                id
            }
        };
        self.set_text(id, title);
    }

    /// Bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Nodes ever allocated, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // TREE QUERIES
    // ========================================================================

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<body>` element, or the document when there is none
    pub fn body(&self) -> NodeId {
        self.descendants(self.document())
            .into_iter()
            .find(|&id| self.tag(id) == Some("body"))
            .unwrap_or_else(|| self.document())
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent if it is an element (the document node does not count)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|&s| s == id)?;
        siblings[idx + 1..]
            .iter()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// 1-based position among element siblings, with the sibling count
    pub fn element_position(&self, id: NodeId) -> Option<(usize, usize)> {
        let parent = self.parent(id)?;
        let siblings = self.element_children(parent);
        let idx = siblings.iter().position(|&s| s == id)?;
        Some((idx + 1, siblings.len()))
    }

    /// All nodes under `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Value of a text node
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Descendant text with whitespace collapsed and trimmed
    pub fn text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        if let Some(text) = self.node_value(id) {
            raw.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.node_value(node) {
                let in_script = self
                    .parent(node)
                    .and_then(|p| self.tag(p))
                    .map(|t| t == "script" || t == "style")
                    .unwrap_or(false);
                if !in_script {
                    raw.push_str(text);
                }
            }
        }
        normalize_ws(&raw)
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.inner_html(self.document())
    }

    // ========================================================================
    // SELECTORS
    // ========================================================================

    /// Elements under `scope` matching `css`, in document order
    pub fn select(&self, scope: NodeId, css: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(css)?;
        Ok(self.select_with(scope, &selector))
    }

    pub fn select_with(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    pub fn select_first(&self, scope: NodeId, css: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(css)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|&id| selector.matches(self, id)))
    }

    pub fn matches(&self, id: NodeId, css: &str) -> Result<bool> {
        Ok(Selector::parse(css)?.matches(self, id))
    }

    /// `id` or its nearest ancestor matching `css`
    pub fn closest(&self, id: NodeId, css: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(css)?;
        let mut current = Some(id);
        while let Some(node) = current {
            if selector.matches(self, node) {
                return Ok(Some(node));
            }
            current = self.parent(node);
        }
        Ok(None)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// A detached element; attach it with `append_child` or `insert_*`
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.touch();
        self.alloc(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.touch();
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Replace all children of `id` with a single text node
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        let text_node = self.create_text(text);
        self.append_child(id, text_node);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.touch();
    }

    /// Insert `new` right before `reference` (which must be attached)
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        self.insert_relative(reference, new, 0);
    }

    /// Insert `new` right after `reference` (which must be attached)
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        self.insert_relative(reference, new, 1);
    }

    fn insert_relative(&mut self, reference: NodeId, new: NodeId, offset: usize) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let idx = siblings
            .iter()
            .position(|&s| s == reference)
            .map(|i| i + offset)
            .unwrap_or(siblings.len());
        siblings.insert(idx, new);
        self.nodes[new.0].parent = Some(parent);
        self.touch();
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let NodeData::Element(el) = &mut self.nodes[id.0].data else {
            return;
        };
        match el.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attrs.push((name.to_string(), value.to_string())),
        }
        self.touch();
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            el.attrs.retain(|(n, _)| n != name);
            self.touch();
        }
    }

    /// Inline style property value (without any `!important`)
    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        parse_style(self.attr(id, "style").unwrap_or(""))
            .into_iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.trim_end_matches("!important").trim().to_string())
    }

    /// Set one inline style property, keeping the others
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str, important: bool) {
        let mut declarations = parse_style(self.attr(id, "style").unwrap_or(""));
        let value = if important {
            format!("{value} !important")
        } else {
            value.to_string()
        };
        match declarations.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value,
            None => declarations.push((property.to_string(), value)),
        }
        let style = declarations
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "style", &style);
    }

    /// `display: none`
    pub fn hide(&mut self, id: NodeId) {
        self.set_style(id, "display", "none", false);
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.style(id, "display").as_deref() == Some("none")
    }

    /// Read `html` and append the resulting nodes under `parent`
    /// (how a host page streams in more results). Returns the new top-level nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let before = self.children(parent).len();
        parse::parse_into(self, parent, html);
        self.touch();
        self.children(parent)[before..].to_vec()
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            NodeData::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag(p))
                    .map(|t| t == "script" || t == "style")
                    .unwrap_or(false);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            (!property.is_empty()).then(|| (property, value.trim().to_string()))
        })
        .collect()
}

/// Collapse runs of whitespace into one space and trim
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html>
<html><head><title>Jobs &amp; more</title></head>
<body>
  <ul id="list">
    <li class="card first">One <b>bold</b></li>
    <li class="card">Two</li>
  </ul>
  <img src="x.png">
</body></html>"#;

    #[test]
    fn test_parse_and_query() {
        let page = Page::parse("https://example.com/", SAMPLE);
        assert_eq!(page.title(), "Jobs & more");

        let cards = page.select(page.document(), "#list > li.card").unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(page.text(cards[0]), "One bold");
        assert_eq!(page.next_element_sibling(cards[0]), Some(cards[1]));
        assert_eq!(page.next_element_sibling(cards[1]), None);
        assert_eq!(page.element_position(cards[1]), Some((2, 2)));
        assert!(page.has_class(cards[0], "first"));
    }

    #[test]
    fn test_load_is_not_a_mutation() {
        let page = Page::parse("https://example.com/", SAMPLE);
        assert_eq!(page.revision(), 0);
    }

    #[test]
    fn test_style_updates_keep_other_properties() {
        let mut page = Page::parse("https://example.com/", r#"<div style="color: red">x</div>"#);
        let div = page.select_first(page.document(), "div").unwrap().unwrap();

        page.hide(div);
        assert!(page.is_hidden(div));
        assert_eq!(page.style(div, "color").as_deref(), Some("red"));

        page.set_style(div, "padding", "0.5rem", true);
        assert_eq!(page.style(div, "padding").as_deref(), Some("0.5rem"));
        assert!(page.attr(div, "style").unwrap().contains("0.5rem !important"));
        assert!(page.revision() > 0);
    }

    #[test]
    fn test_insert_positions() {
        let mut page = Page::parse("https://example.com/", "<div><a></a><b></b></div>");
        let a = page.select_first(page.document(), "a").unwrap().unwrap();
        let b = page.select_first(page.document(), "b").unwrap().unwrap();

        let before = page.create_element("i");
        page.insert_before(b, before);
        let after = page.create_element("u");
        page.insert_after(b, after);
        let first = page.create_element("em");
        page.insert_before(a, first);

        assert_eq!(page.to_html(), "<div><em></em><a></a><i></i><b></b><u></u></div>");
    }

    #[test]
    fn test_closest_and_matches() {
        let page = Page::parse(
            "https://example.com/",
            r#"<a href="/job"><div class="card"><button>Go</button></div></a>"#,
        );
        let button = page.select_first(page.document(), "button").unwrap().unwrap();
        let link = page.closest(button, "a[href]").unwrap().unwrap();
        assert_eq!(page.tag(link), Some("a"));
        assert!(page.matches(button, ".card > button").unwrap());
        assert_eq!(page.closest(button, "table").unwrap(), None);
    }

    #[test]
    fn test_serialization_escapes() {
        let mut page = Page::new("https://example.com/");
        let div = page.create_element("div");
        page.set_attr(div, "title", "Say \"hi\" & bye");
        page.set_text(div, "1 < 2");
        let body = page.body();
        page.append_child(body, div);

        assert_eq!(
            page.to_html(),
            r#"<div title="Say &quot;hi&quot; &amp; bye">1 &lt; 2</div>"#
        );
    }

    #[test]
    fn test_append_html_streams_new_nodes() {
        let mut page = Page::parse("https://example.com/", r#"<ul id="list"><li>One</li></ul>"#);
        let list = page.select_first(page.document(), "#list").unwrap().unwrap();

        let added = page.append_html(list, "<li>Two</li><li>Three</li>");
        assert_eq!(added.len(), 2);
        assert_eq!(page.select(list, "li").unwrap().len(), 3);
        assert_eq!(page.text(added[1]), "Three");
    }

    #[test]
    fn test_set_title_creates_element() {
        let mut page = Page::parse("https://example.com/", "<html><head></head><body></body></html>");
        assert_eq!(page.title(), "");
        page.set_title("Ask HN: Who is hiring? (June 2023)");
        assert_eq!(page.title(), "Ask HN: Who is hiring? (June 2023)");
    }

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
        assert_eq!(normalize_ws("a\u{a0}b"), "a b");
    }
}
