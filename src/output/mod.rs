//! Output module for reporting on the book store
//!
//! This module handles:
//! - Statistics over stored books and past runs
//! - Rendering stored books for the command line

pub mod stats;

pub use stats::{load_statistics, print_statistics, IngestStatistics};

use crate::model::StoredBook;

/// One-line summary of a stored book
pub fn format_book_line(book: &StoredBook) -> String {
    let year = book
        .year_published
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string());

    format!(
        "{}  {} ({}) by {}",
        book.id,
        book.title,
        year,
        book.authors.join(", ")
    )
}

/// Prints one line per book, or a note when there are none
pub fn print_books(books: &[StoredBook]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in books {
        println!("{}", format_book_line(book));
    }
}
