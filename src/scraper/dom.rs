//! Small navigation helpers over `scraper::Html`.
//!
//! The wiki pages are walked partly by CSS selectors and partly in document
//! order ("the next `td` after this one"), so these helpers expose both.

use scraper::{ElementRef, Html, Selector};

use super::error::{ScrapeError, ScrapeResult};

pub fn selector(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("selector {css:?}: {e:?}")))
}

/// Decode a fetched body and build the tree.
pub fn parse_document(body: &[u8]) -> ScrapeResult<Html> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ScrapeError::Parse(format!("body is not UTF-8: {e}")))?;
    Ok(Html::parse_document(text))
}

/// All text beneath `el`, whitespace-collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `el` and all its descendant elements in document order.
pub fn elements_in_order(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.descendants().filter_map(ElementRef::wrap).collect()
}

/// Index of the first element named `tag` strictly after position `from`.
pub fn find_next(order: &[ElementRef<'_>], from: usize, tag: &str) -> Option<usize> {
    order
        .iter()
        .enumerate()
        .skip(from + 1)
        .find(|(_, el)| el.value().name() == tag)
        .map(|(i, _)| i)
}

/// Applies `find_next` `times` times in a row.
pub fn find_nth_next(order: &[ElementRef<'_>], from: usize, tag: &str, times: usize) -> Option<usize> {
    (0..times).try_fold(from, |pos, _| find_next(order, pos, tag))
}

/// Nearest ancestor of `el` named `tag`, not counting `el` itself.
pub fn closest<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}

/// The element whose start tag immediately precedes `el` in the document.
pub fn previous_element<'a>(doc: &'a Html, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let order = elements_in_order(doc.root_element());
    let pos = order.iter().position(|candidate| candidate.id() == el.id())?;
    pos.checked_sub(1).map(|prev| order[prev])
}

pub fn first_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(text_of).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <h4><span>Heading</span></h4>
        <table id="t"><tr><td id="a">one <b>bold</b></td><td id="b">two</td><td id="c">three</td></tr></table>
    </body></html>"#;

    #[test]
    fn test_find_next_walks_document_order() {
        let doc = Html::parse_document(PAGE);
        let table = doc.select(&selector("table").unwrap()).next().unwrap();
        let order = elements_in_order(table);

        let first = find_next(&order, 0, "td").unwrap();
        assert_eq!(order[first].value().id(), Some("a"));
        let third = find_nth_next(&order, first, "td", 2).unwrap();
        assert_eq!(order[third].value().id(), Some("c"));
        assert!(find_nth_next(&order, third, "td", 1).is_none());
    }

    #[test]
    fn test_previous_element_and_closest() {
        let doc = Html::parse_document(PAGE);
        let table = doc.select(&selector("table").unwrap()).next().unwrap();
        let prev = previous_element(&doc, table).unwrap();
        assert_eq!(text_of(prev), "Heading");

        let cell = doc.select(&selector("#b").unwrap()).next().unwrap();
        assert_eq!(closest(cell, "table").unwrap().value().id(), Some("t"));
    }

    #[test]
    fn test_text_of_joins_inline_children() {
        let doc = Html::parse_document(PAGE);
        let cell = doc.select(&selector("#a").unwrap()).next().unwrap();
        assert_eq!(text_of(cell), "one bold");
    }

    #[test]
    fn test_parse_document_rejects_invalid_utf8() {
        assert!(matches!(parse_document(&[0xff, 0xfe, 0x00]), Err(ScrapeError::Parse(_))));
    }
}
