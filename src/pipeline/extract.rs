//! Field extraction over parsed catalog pages
//!
//! A thin layer over `scraper` that answers the only questions the stage
//! handlers ask: "which entries match this selector", "what is the text of the
//! first match" and "what is this attribute of the first match". Absence is
//! always `None` or an empty list, never an error.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched page, parsed once and queried by the stage handlers
pub struct Page {
    document: Html,
    url: Url,
}

impl Page {
    /// Parses `html` served from `url` (the final URL, used to resolve links)
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching `selector`, in document order
    pub fn select_all(&self, selector: &Selector) -> Vec<Element<'_>> {
        self.document
            .select(selector)
            .map(|inner| Element { inner })
            .collect()
    }

    /// Own text of the first element matching `selector`
    pub fn select_text(&self, selector: &Selector) -> Option<String> {
        self.document.select(selector).next().and_then(own_text)
    }

    /// Attribute `attr` of the first element matching `selector`
    pub fn select_attribute(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr(attr))
            .map(str::to_string)
    }
}

/// A single matched element, queried relative to itself
#[derive(Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Own text of the first descendant matching `selector`
    pub fn select_text(&self, selector: &Selector) -> Option<String> {
        self.inner.select(selector).next().and_then(own_text)
    }

    /// Attribute `attr` of the first descendant matching `selector`
    pub fn select_attribute(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.inner
            .select(selector)
            .next()
            .and_then(|element| element.value().attr(attr))
            .map(str::to_string)
    }
}

/// First non-blank text node directly inside `element`
///
/// Text of nested children is excluded: for `<a>12345 - Pad <span>OEM</span></a>`
/// this yields `"12345 - Pad "`, not the label.
fn own_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| String::from(&**text))
        .find(|text| !text.trim().is_empty())
}
