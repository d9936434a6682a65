//! URL canonicalization and article identity
//!
//! Canonical URLs are the identity keys used by the queues and the visited
//! set; article identities are the natural keys used by the store.

mod article;
mod canonical;

pub use article::{
    article_identity, listing_path, namespace_index_path, ArticleRef, ARTICLE_PATH_PREFIX,
};
pub use canonical::Canonicalizer;
