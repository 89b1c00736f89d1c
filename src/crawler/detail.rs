use crate::config::SelectorConfig;
use crate::crawler::extractor::{compile, element_text};
use crate::model::DetailInfo;
use crate::ParseError;
use scraper::{Html, Selector};

const EARLIEST_YEAR: i32 = 1000;
const LATEST_YEAR: i32 = 2100;

/// Compiled selectors for detail pages
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    author: Selector,
    year: Selector,
}

impl DetailSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ParseError> {
        Ok(Self {
            author: compile(&config.detail_author)?,
            year: compile(&config.detail_year)?,
        })
    }
}

/// Reads author and publication year from a detail page
///
/// Authors are deduplicated in document order. The year is the first
/// plausible four-digit number found in a matching element's `content` or
/// `datetime` attribute, or its text.
pub fn extract_detail(html: &str, selectors: &DetailSelectors) -> DetailInfo {
    let document = Html::parse_document(html);

    let mut authors: Vec<String> = Vec::new();
    for element in document.select(&selectors.author) {
        let name = strip_by_prefix(&element_text(element));
        if !name.is_empty() && !authors.contains(&name) {
            authors.push(name);
        }
    }

    let year_published = document.select(&selectors.year).find_map(|element| {
        let value = element.value();
        value
            .attr("content")
            .or_else(|| value.attr("datetime"))
            .and_then(find_year)
            .or_else(|| find_year(&element_text(element)))
    });

    DetailInfo {
        authors,
        year_published,
    }
}

fn strip_by_prefix(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => trimmed[3..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// First run of exactly four ASCII digits that falls in a plausible range
fn find_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut start = None;

    for i in 0..=bytes.len() {
        let is_digit = i < bytes.len() && bytes[i].is_ascii_digit();
        match (start, is_digit) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                if i - s == 4 {
                    if let Ok(year) = text[s..i].parse::<i32>() {
                        if (EARLIEST_YEAR..=LATEST_YEAR).contains(&year) {
                            return Some(year);
                        }
                    }
                }
                start = None;
            }
            _ => {}
        }
    }

    None
}
