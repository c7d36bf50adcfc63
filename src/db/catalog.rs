

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::Result;


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// ISO 639 code as stored by the catalog (`en`, `es`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fiction: Option<bool>,
}

/// Read access to catalog metadata (title, author, year...). Owned by an external store.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_book(&self, id: i64) -> Result<Option<Book>>;

    /// Ids without a row are simply absent from the returned map.
    async fn get_books(&self, ids: &[i64]) -> Result<HashMap<i64, Book>>;

    async fn all_books(&self) -> Result<Vec<Book>>;
}


#[derive(Default)]
pub struct InMemoryCatalog {
    books: RwLock<HashMap<i64, Book>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        let catalog = Self::new();
        {
            let mut map = catalog.books.write();
            for book in books {
                map.insert(book.id, book);
            }
            info!("InMemoryCatalog loaded {} books", map.len());
        }
        catalog
    }

    pub fn insert(&self, book: Book) {
        self.books.write().insert(book.id, book);
    }

    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        Ok(self.books.read().get(&id).cloned())
    }

    async fn get_books(&self, ids: &[i64]) -> Result<HashMap<i64, Book>> {
        let books = self.books.read();
        Ok(ids
            .iter()
            .filter_map(|id| books.get(id).map(|b| (*id, b.clone())))
            .collect())
    }

    async fn all_books(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read().values().cloned().collect();
        books.sort_by_key(|b| b.id);
        Ok(books)
    }
}
