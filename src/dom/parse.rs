// Lenient HTML reader
//
// Not a conforming HTML5 parser. It handles what captured job-board pages need:
// void and raw-text elements, the common implied end tags (p, li, tr, td, th,
// option), the implied <tbody> around bare table rows, quoted/unquoted
// attributes and basic entities. Stray end tags are
// ignored; unclosed elements close at end of input.

use super::{NodeData, NodeId, Page, ElementData, RAW_TEXT_ELEMENTS, VOID_ELEMENTS};

/// Opening one of these closes an open `<p>` on top of the stack
const CLOSES_P: &[&str] = &[
    "p", "div", "ul", "ol", "table", "pre", "blockquote", "section", "article", "header",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "form", "hr",
];

pub(super) fn parse_into(page: &mut Page, root: NodeId, html: &str) {
    let mut stack: Vec<NodeId> = vec![root];
    let mut pos = 0usize;

    while pos < html.len() {
        let rest = &html[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            let id = page.alloc(NodeData::Comment(comment.to_string()));
            attach(page, &stack, id);
            pos += consumed;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').unwrap_or(rest.len());
            let id = page.alloc(NodeData::Doctype(rest[2..end].to_string()));
            attach(page, &stack, id);
            pos += (end + 1).min(rest.len());
            continue;
        }

        if let Some(body) = rest.strip_prefix("</") {
            let end = body.find('>').unwrap_or(body.len());
            let name = body[..end].trim().to_ascii_lowercase();
            close_element(page, &mut stack, &name);
            pos += (2 + end + 1).min(rest.len());
            continue;
        }

        if rest.len() > 1 && rest.as_bytes()[0] == b'<' && rest.as_bytes()[1].is_ascii_alphabetic() {
            if let Some(tag) = read_start_tag(rest) {
                pos += tag.consumed;
                pos += open_element(page, &mut stack, tag, &html[pos..]);
                continue;
            }
        }

        // Text up to the next '<' (always at least one byte, so we make progress).
        // Scan bytes: the first char may be multi-byte, and '<' is always a boundary.
        let next = rest.as_bytes()[1..]
            .iter()
            .position(|&b| b == b'<')
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let id = page.alloc(NodeData::Text(decode_entities(&rest[..next])));
        attach(page, &stack, id);
        pos += next;
    }
}

fn attach(page: &mut Page, stack: &[NodeId], id: NodeId) {
    let parent = stack[stack.len() - 1];
    page.nodes[id.0].parent = Some(parent);
    page.nodes[parent.0].children.push(id);
}

fn top_tag<'a>(page: &'a Page, stack: &[NodeId]) -> Option<&'a str> {
    // The root of the stack is the insertion point, never closed
    if stack.len() <= 1 {
        return None;
    }
    page.tag(stack[stack.len() - 1])
}

/// Pop open elements up to and including the nearest `name`, unless one of
/// `boundaries` is reached first
fn close_up_to(page: &Page, stack: &mut Vec<NodeId>, names: &[&str], boundaries: &[&str]) {
    for idx in (1..stack.len()).rev() {
        let tag = page.tag(stack[idx]).unwrap_or("");
        if names.contains(&tag) {
            stack.truncate(idx);
            return;
        }
        if boundaries.contains(&tag) {
            return;
        }
    }
}

fn close_element(page: &Page, stack: &mut Vec<NodeId>, name: &str) {
    if let Some(idx) = (1..stack.len()).rev().find(|&i| page.tag(stack[i]) == Some(name)) {
        stack.truncate(idx);
    }
}

fn apply_implied_end_tags(page: &Page, stack: &mut Vec<NodeId>, tag: &str) {
    match tag {
        "li" => close_up_to(page, stack, &["li"], &["ul", "ol"]),
        "tr" => close_up_to(page, stack, &["tr"], &["table", "tbody", "thead", "tfoot"]),
        "td" | "th" => close_up_to(page, stack, &["td", "th"], &["tr", "table"]),
        "tbody" | "thead" | "tfoot" => {
            close_up_to(page, stack, &["tbody", "thead", "tfoot"], &["table"])
        }
        "option" => {
            if top_tag(page, stack) == Some("option") {
                stack.pop();
            }
        }
        _ => {}
    }
    if CLOSES_P.contains(&tag) && top_tag(page, stack) == Some("p") {
        stack.pop();
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    consumed: usize,
}

/// Opens the element and, for raw-text elements, swallows their content.
/// Returns how many bytes of `after` were consumed.
fn open_element(page: &mut Page, stack: &mut Vec<NodeId>, tag: StartTag, after: &str) -> usize {
    apply_implied_end_tags(page, stack, &tag.name);
    if tag.name == "tr" && top_tag(page, stack) == Some("table") {
        // Rows never sit directly in a table; browsers open the body section
        let body = page.alloc(NodeData::Element(ElementData {
            tag: "tbody".to_string(),
            attrs: Vec::new(),
        }));
        attach(page, stack, body);
        stack.push(body);
    }

    let id = page.alloc(NodeData::Element(ElementData {
        tag: tag.name.clone(),
        attrs: tag.attrs,
    }));
    attach(page, stack, id);

    if VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing {
        return 0;
    }

    if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
        let close = format!("</{}", tag.name);
        let lower = after.to_ascii_lowercase();
        let end = lower.find(&close).unwrap_or(after.len());
        let content = &after[..end];
        if !content.is_empty() {
            let text = match tag.name.as_str() {
                "title" | "textarea" => decode_entities(content),
                _ => content.to_string(),
            };
            let text_id = page.alloc(NodeData::Text(text));
            page.nodes[text_id.0].parent = Some(id);
            page.nodes[id.0].children.push(text_id);
        }
        let close_end = after[end..].find('>').map(|i| end + i + 1).unwrap_or(after.len());
        return close_end;
    }

    stack.push(id);
    0
}

fn read_start_tag(s: &str) -> Option<StartTag> {
    let b = s.as_bytes();
    let mut i = 1;
    while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'>' && b[i] != b'/' {
        i += 1;
    }
    let name = s[1..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= b.len() {
            return None;
        }
        match b[i] {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    self_closing,
                    consumed: i + 1,
                })
            }
            b'/' => {
                self_closing = true;
                i += 1;
                continue;
            }
            _ => {}
        }
        self_closing = false;

        let start = i;
        while i < b.len() && !b[i].is_ascii_whitespace() && !matches!(b[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        if i == start {
            // Junk such as a stray quote; skip it
            i += 1;
            continue;
        }
        let attr_name = s[start..i].to_ascii_lowercase();

        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < b.len() && b[i] == b'=' {
            i += 1;
            while i < b.len() && b[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= b.len() {
                return None;
            }
            if b[i] == b'"' || b[i] == b'\'' {
                let quote = b[i] as char;
                let value_start = i + 1;
                let value_end = s[value_start..].find(quote)? + value_start;
                value = decode_entities(&s[value_start..value_end]);
                i = value_end + 1;
            } else {
                let value_start = i;
                while i < b.len() && !b[i].is_ascii_whitespace() && b[i] != b'>' {
                    i += 1;
                }
                value = decode_entities(&s[value_start..i]);
            }
        }

        // First occurrence wins, as in browsers
        if !attrs.iter().any(|(n, _)| *n == attr_name) {
            attrs.push((attr_name, value));
        }
    }
}

pub(super) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        if let Some(semi) = after.find(';').filter(|&semi| semi <= 10) {
            if let Some(ch) = lookup_entity(&after[1..semi]) {
                out.push(ch);
                rest = &after[semi + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &after[1..];
    }
    out.push_str(rest);
    out
}

fn lookup_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Page {
        Page::parse("https://example.com/", html)
    }

    #[test]
    fn test_implied_paragraph_ends() {
        // Hacker News comment bodies never close their <p>s
        let page = parse(r#"<div class="commtext">Acme | Remote<p>We are hiring<p>Apply now</div><span>after</span>"#);
        let text = page.select_first(page.document(), ".commtext").unwrap().unwrap();
        let paragraphs = page.select(text, "p").unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(page.parent(paragraphs[1]), Some(text));
        assert_eq!(page.node_value(page.children(text)[0]), Some("Acme | Remote"));

        let span = page.select_first(page.document(), "span").unwrap().unwrap();
        assert_eq!(page.parent(span), Some(page.document()));
    }

    #[test]
    fn test_implied_table_ends() {
        let page = parse("<table><tbody><tr><td>a<td>b<tr><td>c</table>");
        let rows = page.select(page.document(), "table > tbody > tr").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(page.element_children(rows[0]).len(), 2);
        assert_eq!(page.text(rows[1]), "c");
    }

    #[test]
    fn test_bare_rows_get_a_tbody() {
        let page = parse("<table id=outer><tr><td><table><tr><td>a</td></tr></table></td></tr><tr><td>b</table>");
        let rows = page.select(page.document(), "table#outer > tbody > tr").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(page.select(page.document(), "tbody").unwrap().len(), 2);
        let inner = page.select_first(rows[0], "table > tbody > tr > td").unwrap().unwrap();
        assert_eq!(page.text(inner), "a");
        assert_eq!(page.text(rows[1]), "b");

        // An explicit tbody is left alone
        let page = parse("<table><tbody><tr><td>x</td></tr></tbody></table>");
        assert_eq!(page.select(page.document(), "tbody").unwrap().len(), 1);
    }

    #[test]
    fn test_non_ascii_text() {
        let page = parse("<div>Über Energy</div><span>€50k · Remote — EU</span><b>ß</b>");
        let div = page.select_first(page.document(), "div").unwrap().unwrap();
        assert_eq!(page.text(div), "Über Energy");
        let span = page.select_first(page.document(), "span").unwrap().unwrap();
        assert_eq!(page.text(span), "€50k · Remote — EU");
        assert_eq!(page.to_html(), "<div>Über Energy</div><span>€50k · Remote — EU</span><b>ß</b>");
    }

    #[test]
    fn test_attributes() {
        let page = parse(r#"<a href=/jobs?id=1 data-test='StartupResult' hidden class="x" class="y">j</a>"#);
        let a = page.select_first(page.document(), "a").unwrap().unwrap();
        assert_eq!(page.attr(a, "href"), Some("/jobs?id=1"));
        assert_eq!(page.attr(a, "data-test"), Some("StartupResult"));
        assert_eq!(page.attr(a, "hidden"), Some(""));
        assert_eq!(page.attr(a, "class"), Some("x"));
    }

    #[test]
    fn test_raw_text_and_void_elements() {
        let page = parse("<script>if (a < b) { x(); }</script><br><input value=1/><p>after</p>");
        let script = page.select_first(page.document(), "script").unwrap().unwrap();
        assert_eq!(page.node_value(page.children(script)[0]), Some("if (a < b) { x(); }"));

        let p = page.select_first(page.document(), "p").unwrap().unwrap();
        assert_eq!(page.parent(p), Some(page.document()));
        assert_eq!(page.text(page.document()), "after");
    }

    #[test]
    fn test_stray_end_tags_and_unclosed_elements() {
        let page = parse("</span><div><em>open");
        let em = page.select_first(page.document(), "div > em").unwrap().unwrap();
        assert_eq!(page.text(em), "open");
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("Ben &amp; Jerry&#39;s &#x41;&lt;"), "Ben & Jerry's A<");
        assert_eq!(decode_entities("AT&T & co"), "AT&T & co");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_comments_and_doctype_round_trip() {
        let html = "<!DOCTYPE html><!-- note --><div>x</div>";
        assert_eq!(parse(html).to_html(), html);
    }
}
