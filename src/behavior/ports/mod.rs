//! Port contracts for browser drivers and sleeping.

mod pacer;
mod page;

pub use pacer::Pacer;
pub use page::{BrowserPage, PageError, PageResult};

#[cfg(test)]
pub use page::MockBrowserPage;
