//! Browser launcher port.

use crate::behavior::ports::{BrowserPage, PageResult};
use crate::platform::Platform;
use async_trait::async_trait;

/// Opens a fresh page for each run.
///
/// Pages are never shared between runs, so no cookies, storage, or
/// fingerprint state leaks from one job to the next.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Page type produced.
    type Page: BrowserPage;

    /// Opens a page for `platform`.
    async fn launch(&self, platform: Platform) -> PageResult<Self::Page>;
}
