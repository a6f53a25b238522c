//! Browser page driver port.

use crate::behavior::domain::Point;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for page driver operations.
pub type PageResult<T> = Result<T, PageError>;

/// A single browser tab driven by an automation backend.
///
/// Implementations perform raw actions only. Pacing, pointer paths, and
/// fingerprint masking are layered on top by
/// [`crate::behavior::services::HumanPage`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Registers a script evaluated before any page script on every
    /// navigation.
    async fn add_init_script(&self, script: &str) -> PageResult<()>;

    /// Sets headers sent with every subsequent request.
    async fn set_extra_headers(&self, headers: &[(String, String)]) -> PageResult<()>;

    /// Navigates to `url` and waits for the load event.
    async fn goto(&self, url: &str) -> PageResult<()>;

    /// Returns the URL currently displayed.
    async fn current_url(&self) -> PageResult<String>;

    /// Waits until an element matching `selector` is visible.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Timeout`] when nothing matches within `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<()>;

    /// Returns the viewport centre of the first element matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::TargetMissing`] when nothing matches.
    async fn element_center(&self, selector: &str) -> PageResult<Point>;

    /// Moves the pointer to `to`.
    async fn mouse_move(&self, to: Point) -> PageResult<()>;

    /// Presses and releases the primary button at `at`.
    async fn mouse_click(&self, at: Point) -> PageResult<()>;

    /// Types one character into the focused element.
    async fn type_char(&self, ch: char) -> PageResult<()>;

    /// Presses the backspace key once.
    async fn press_backspace(&self) -> PageResult<()>;

    /// Scrolls the viewport vertically by `delta` pixels.
    async fn scroll_by(&self, delta: i64) -> PageResult<()>;
}

/// Failures reported by a page driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// An element did not appear in time.
    #[error("timed out waiting for {selector}")]
    Timeout {
        /// Selector that was awaited.
        selector: String,
    },

    /// No element matched a selector.
    #[error("no element matches {selector}")]
    TargetMissing {
        /// Selector that matched nothing.
        selector: String,
    },

    /// The page ended up somewhere other than expected.
    #[error("expected to be on {expected}, found {actual}")]
    UnexpectedNavigation {
        /// URL fragment the step expected.
        expected: String,
        /// URL actually displayed.
        actual: String,
    },

    /// The automation backend failed.
    #[error("browser driver error: {0}")]
    Driver(String),
}
