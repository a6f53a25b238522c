//! Launcher backed by a simulated page.

use crate::agent::ports::BrowserLauncher;
use crate::behavior::adapters::SimulatedPage;
use crate::behavior::ports::PageResult;
use crate::platform::Platform;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out handles to one [`SimulatedPage`] and counts launches.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLauncher {
    page: SimulatedPage,
    launches: Arc<AtomicUsize>,
}

impl SimulatedLauncher {
    /// Creates a launcher serving `page`.
    #[must_use]
    pub fn new(page: SimulatedPage) -> Self {
        Self {
            page,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a handle to the served page.
    #[must_use]
    pub fn page(&self) -> SimulatedPage {
        self.page.clone()
    }

    /// Returns how many pages were launched.
    #[must_use]
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for SimulatedLauncher {
    type Page = SimulatedPage;

    async fn launch(&self, platform: Platform) -> PageResult<SimulatedPage> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(platform = %platform, "launched simulated page");
        Ok(self.page.clone())
    }
}
