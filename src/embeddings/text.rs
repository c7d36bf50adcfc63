

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::catalog::Book;
use crate::safe_truncate;


pub const MAX_DESC_CHARS: usize = 4000;

const BGE_DOC_INSTRUCTION: &str = "Represent this passage for retrieval: ";
const BGE_QUERY_INSTRUCTION: &str = "Represent this query for retrieving relevant passages: ";

lazy_static! {
    static ref TERM_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "book", "books", "by", "for", "from",
    "in", "into", "is", "it", "its", "like", "of", "on", "or", "set", "that", "the", "their",
    "this", "to", "was", "with",
];

fn is_bge(model: &str) -> bool {
    model.to_lowercase().contains("bge")
}


pub fn query_text(model: &str, query: &str) -> String {
    if is_bge(model) {
        format!("{BGE_QUERY_INSTRUCTION}{query}")
    } else {
        query.to_string()
    }
}


pub fn document_text(model: &str, doc: &str) -> String {
    if is_bge(model) {
        format!("{BGE_DOC_INSTRUCTION}{doc}")
    } else {
        doc.to_string()
    }
}

/// `title. author. description` with empty parts skipped and the description capped.
/// Falls back to the bare title.
pub fn book_document_text(book: &Book) -> String {
    let description = book
        .description
        .as_deref()
        .map(|d| safe_truncate(d, MAX_DESC_CHARS));

    let parts: Vec<&str> = [Some(book.title.as_str()), book.author.as_deref(), description.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        book.title.trim().to_string()
    } else {
        parts.join(". ")
    }
}

/// Lowercased content terms: letters/digits runs of at least three chars, minus stopwords.
pub fn content_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TERM_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() >= 3 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: Option<&str>, description: Option<&str>) -> Book {
        Book {
            id: 1,
            title: title.to_string(),
            author: author.map(String::from),
            description: description.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_bge_prefixes() {
        assert!(query_text("BAAI/bge-small-en-v1.5", "war").starts_with("Represent this query"));
        assert!(document_text("BAAI/bge-small-en-v1.5", "war").starts_with("Represent this passage"));
        assert_eq!(query_text("nomic-embed-text", "war"), "war");
    }

    #[test]
    fn test_book_document_text_joins_parts() {
        let b = book("Homage to Catalonia", Some("George Orwell"), Some("  Memoir of Spain.  "));
        assert_eq!(
            book_document_text(&b),
            "Homage to Catalonia. George Orwell. Memoir of Spain."
        );
    }

    #[test]
    fn test_book_document_text_skips_empty_parts() {
        let b = book("Dune", Some("   "), None);
        assert_eq!(book_document_text(&b), "Dune");
    }

    #[test]
    fn test_description_is_capped() {
        let long = "x".repeat(MAX_DESC_CHARS + 50);
        let b = book("T", None, Some(&long));
        assert_eq!(book_document_text(&b).chars().count(), 3 + MAX_DESC_CHARS);
    }

    #[test]
    fn test_content_terms() {
        let terms = content_terms("The Spanish Civil War, in 1936!");
        assert_eq!(terms, vec!["spanish", "civil", "war", "1936"]);
    }
}
