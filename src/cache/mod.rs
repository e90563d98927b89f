//! Batch-scoped caches: directory existence and CSS injection.

mod css;
mod directory;

pub use css::{splice, CssInjectionCache};
pub use directory::DirectoryCache;
