//! InMemory Repository 実装

mod chat;
mod message;

pub use chat::InMemoryChatRepository;
pub use message::InMemoryMessageRepository;

use crate::domain::ListFilters;

/// `filters` に従って 1 ページ分を切り出す
fn paginate<T: Clone>(items: &[T], filters: ListFilters) -> Vec<T> {
    items
        .iter()
        .skip(filters.offset)
        .take(filters.limit)
        .cloned()
        .collect()
}
