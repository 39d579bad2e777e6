//! Locator resolution over parsed HTML, used by the static engine.

use super::Locator;
use anyhow::{anyhow, Result};
use regex::RegexBuilder;
use scraper::{ElementRef, Html, Selector};
use sizeguide_core::keywords::fold;
use sizeguide_core::table::element_text;

/// Elements never considered for text matching.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "head", "title", "template"];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Matches of `locator` in document order.
pub fn resolve<'a>(document: &'a Html, locator: &Locator) -> Result<Vec<ElementRef<'a>>> {
    match locator {
        Locator::Css { css } => Ok(document.select(&selector(css)?).collect()),
        Locator::CssText { css, text } => {
            let needle = fold(text.trim());
            Ok(document
                .select(&selector(css)?)
                .filter(|el| fold(&element_text(el)).contains(&needle))
                .collect())
        }
        Locator::Text { pattern } => {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| anyhow!("invalid text pattern {pattern:?}: {e}"))?;
            let matches = |el: &ElementRef<'_>| {
                !NON_CONTENT_TAGS.contains(&el.value().name()) && re.is_match(&element_text(el))
            };

            Ok(document
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| matches(el))
                .filter(|el| {
                    !el.descendants()
                        .skip(1)
                        .filter_map(ElementRef::wrap)
                        .any(|child| matches(&child))
                })
                .collect())
        }
    }
}

/// The `index`-th match of `locator`.
pub fn nth<'a>(document: &'a Html, locator: &Locator, index: usize) -> Result<ElementRef<'a>> {
    resolve(document, locator)?
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow!("element {index} of {locator:?} not found"))
}

/// Static visibility: no `hidden` attribute, inline `display:none` or
/// `visibility:hidden`, and no `<template>` on the way to the root.
pub fn is_visible(el: &ElementRef<'_>) -> bool {
    let mut node = Some(*el);
    while let Some(current) = node {
        let value = current.value();
        if value.name() == "template" || value.attr("hidden").is_some() {
            return false;
        }
        if let Some(style) = value.attr("style") {
            let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            let style = style.to_ascii_lowercase();
            if style.contains("display:none") || style.contains("visibility:hidden") {
                return false;
            }
        }
        node = current.parent().and_then(ElementRef::wrap);
    }
    true
}

/// The `href` an element navigates to when clicked: its own, or that of the
/// closest enclosing link.
pub fn link_target(el: &ElementRef<'_>) -> Option<String> {
    let mut node = Some(*el);
    while let Some(current) = node {
        if current.value().name() == "a" {
            if let Some(href) = current.value().attr("href") {
                return Some(href.to_string());
            }
        }
        node = current.parent().and_then(ElementRef::wrap);
    }
    None
}
