// Hacker News "Ask HN: Who is hiring?" threads
//
// Each top-level comment is one company. Replies are sibling rows that follow
// it, so hiding a company hides its whole reply subtree too.

use crate::adapter::{required_anchor, required_text, wrap_control, SiteAdapter, SiteKind};
use crate::dom::{NodeId, Page};
use crate::error::{Error, Result};

const COMMENT_ROWS: &str =
    "table#hnmain > tbody > tr > td > table.comment-tree > tbody > tr";
const TOP_LEVEL: &str = r#".ind[indent="0"]"#;
const FALLBACK_PREFIX: &str = "hn-who-is-hiring--";

pub struct HackerNewsAdapter;

impl HackerNewsAdapter {
    pub fn new() -> Self {
        HackerNewsAdapter
    }

    /// Leading `Company | Role | ...` segment of the first text node, if any
    fn leading_segment(page: &Page, commtext: NodeId) -> Option<String> {
        page.children(commtext)
            .first()
            .and_then(|&first| page.node_value(first))
            .and_then(|text| text.split_once('|'))
            .map(|(before, _)| before.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

impl Default for HackerNewsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for HackerNewsAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::HackerNewsWhoIsHiring
    }

    fn list_company_elements(&self, page: &Page) -> Result<Vec<NodeId>> {
        let mut top_level = Vec::new();
        for row in page.select(page.document(), COMMENT_ROWS)? {
            if page.select_first(row, TOP_LEVEL)?.is_some() {
                top_level.push(row);
            }
        }
        Ok(top_level)
    }

    /// Falls back to a per-poster name when the comment is flagged or
    /// doesn't follow the `Company | ...` convention
    fn extract_name(&self, page: &Page, element: NodeId) -> Result<String> {
        let user = required_text(page, element, ".hnuser", self.kind())?;
        let fallback = format!("{FALLBACK_PREFIX}{user}");
        if page.select_first(element, ".comment.noshow")?.is_some() {
            return Ok(fallback);
        }
        let commtext = page
            .select_first(element, ".comment > .commtext")?
            .ok_or_else(|| Error::extraction(self.kind().name(), "no `.commtext` in comment"))?;
        Ok(Self::leading_segment(page, commtext).unwrap_or(fallback))
    }

    fn insertion_anchor(&self, page: &Page, element: NodeId) -> Result<NodeId> {
        required_anchor(page, element, ".reply", self.kind())
    }

    fn attach_control(&self, page: &mut Page, reply: NodeId, control: NodeId) {
        let paragraph = wrap_control(page, "p", control, false);
        page.insert_before(reply, paragraph);
        page.set_style(control, "padding", "0.25rem 0.5rem", false);
        page.set_style(control, "border-radius", "0.25rem", false);
    }

    fn hide(&self, page: &mut Page, element: NodeId) -> Result<()> {
        page.hide(element);
        let mut current = element;
        while let Some(next) = page.next_element_sibling(current) {
            if page.select_first(next, TOP_LEVEL)?.is_some() || page.attr(next, "id").is_none() {
                break;
            }
            page.hide(next);
            current = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, indent: u32, user: &str, body: &str) -> String {
        format!(
            r#"<tr class="athing comtr" id="{id}"><td><table><tbody><tr>
<td class="ind" indent="{indent}"></td>
<td class="default"><span class="hnuser">{user}</span>
<div class="comment">{body}<div class="reply"><a href="reply?id={id}">reply</a></div></div></td>
</tr></tbody></table></td></tr>"#
        )
    }

    fn thread(rows: &[String]) -> String {
        format!(
            r#"<html><head><title>Ask HN: Who is hiring? (March 2024) | Hacker News</title></head><body>
<table id="hnmain"><tbody><tr><td><table class="comment-tree"><tbody>{}</tbody></table></td></tr></tbody></table>
</body></html>"#,
            rows.join("\n")
        )
    }

    fn sample() -> Page {
        let html = thread(&[
            comment("1", 0, "pg", r#"<div class="commtext">Acme Corp | Senior Engineer | Remote</div>"#),
            comment("2", 40, "dang", r#"<div class="commtext">Is this still open?</div>"#),
            comment("3", 80, "pg", r#"<div class="commtext">Yes</div>"#),
            comment("4", 0, "tptacek", r#"<div class="commtext">We are hiring engineers.</div>"#),
            comment("5", 0, "sama", r#"<div class="commtext"><p>Initech | Ops</p></div>"#),
            comment("6", 0, "throwaway", r#"<div class="commtext">Globex | Sales</div>"#)
                .replace(r#"class="comment""#, r#"class="comment noshow""#),
        ]);
        Page::parse("https://news.ycombinator.com/item?id=39562986", &html)
    }

    #[test]
    fn test_only_top_level_comments_are_listed() {
        let page = sample();
        let rows = HackerNewsAdapter::new().list_company_elements(&page).unwrap();
        let ids: Vec<_> = rows.iter().map(|&r| page.attr(r, "id").unwrap()).collect();
        assert_eq!(ids, vec!["1", "4", "5", "6"]);
    }

    #[test]
    fn test_name_from_leading_segment() {
        let page = sample();
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        assert_eq!(adapter.extract_name(&page, rows[0]).unwrap(), "Acme Corp");
    }

    #[test]
    fn test_name_falls_back_to_poster() {
        let page = sample();
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        // no pipe
        assert_eq!(
            adapter.extract_name(&page, rows[1]).unwrap(),
            "hn-who-is-hiring--tptacek"
        );
        // first child is an element, not text
        assert_eq!(
            adapter.extract_name(&page, rows[2]).unwrap(),
            "hn-who-is-hiring--sama"
        );
        // collapsed
        assert_eq!(
            adapter.extract_name(&page, rows[3]).unwrap(),
            "hn-who-is-hiring--throwaway"
        );
    }

    #[test]
    fn test_missing_commtext_is_extraction_error() {
        let html = thread(&[comment("1", 0, "pg", "<span>deleted</span>")]);
        let page = Page::parse("https://news.ycombinator.com/item?id=1", &html);
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        assert!(matches!(
            adapter.extract_name(&page, rows[0]),
            Err(Error::Extraction { .. })
        ));
    }

    #[test]
    fn test_hide_takes_replies_and_stops_at_next_company() {
        let mut page = sample();
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        adapter.hide(&mut page, rows[0]).unwrap();

        let all = page.select(page.document(), "tr.athing").unwrap();
        let hidden: Vec<_> = all
            .iter()
            .filter(|&&r| page.is_hidden(r))
            .map(|&r| page.attr(r, "id").unwrap())
            .collect();
        assert_eq!(hidden, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_hide_stops_at_row_without_id() {
        let mut html = thread(&[
            comment("1", 0, "pg", r#"<div class="commtext">Acme | x</div>"#),
            comment("2", 40, "dang", r#"<div class="commtext">reply</div>"#),
        ]);
        html = html.replace(
            "</tbody></table></td></tr></tbody></table>\n</body>",
            r#"<tr class="morespace"><td>more</td></tr></tbody></table></td></tr></tbody></table>
</body>"#,
        );
        let mut page = Page::parse("https://news.ycombinator.com/item?id=1", &html);
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        adapter.hide(&mut page, rows[0]).unwrap();

        let more = page.select_first(page.document(), "tr.morespace").unwrap().unwrap();
        assert!(!page.is_hidden(more));
        let reply = page.select_first(page.document(), r#"tr[id="2"]"#).unwrap().unwrap();
        assert!(page.is_hidden(reply));
    }

    #[test]
    fn test_control_goes_before_reply_link() {
        let mut page = sample();
        let adapter = HackerNewsAdapter::new();
        let rows = adapter.list_company_elements(&page).unwrap();
        adapter.company_result(&mut page, rows[0]).unwrap();

        let comment = page.select_first(rows[0], ".comment").unwrap().unwrap();
        let children = page.element_children(comment);
        assert_eq!(page.tag(children[1]), Some("p"));
        assert!(page.has_class(children[2], "reply"));
    }
}
