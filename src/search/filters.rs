

use serde::{Deserialize, Serialize};

use crate::db::catalog::Book;

/// Optional catalog constraints on a request's results.
///
/// `language` and `fiction` need a matching catalog value; a book with no value is dropped.
/// `min_year` and `max_pages` give unknown values the benefit of the doubt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiction: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl SearchFilters {
    /// A blank language counts as no language filter.
    pub fn is_empty(&self) -> bool {
        self.language().is_none()
            && self.fiction.is_none()
            && self.min_year.is_none()
            && self.max_pages.is_none()
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    pub fn matches(&self, book: &Book) -> bool {
        if let Some(language) = self.language() {
            let same = book
                .language_code
                .as_deref()
                .is_some_and(|code| code.trim().eq_ignore_ascii_case(language));
            if !same {
                return false;
            }
        }
        if let Some(fiction) = self.fiction {
            if book.is_fiction != Some(fiction) {
                return false;
            }
        }
        if let (Some(min_year), Some(year)) = (self.min_year, book.published_year) {
            if year < min_year {
                return false;
            }
        }
        if let (Some(max_pages), Some(pages)) = (self.max_pages, book.page_count) {
            if pages > max_pages {
                return false;
            }
        }
        true
    }
}
