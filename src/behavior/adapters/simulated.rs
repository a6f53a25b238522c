//! In-process page used to exercise agents without a browser.

use crate::behavior::domain::Point;
use crate::behavior::ports::{BrowserPage, PageError, PageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One raw action observed by a [`SimulatedPage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    /// An init script was registered.
    AddInitScript,
    /// Extra headers were set.
    SetHeaders,
    /// The page navigated to a URL.
    Goto(String),
    /// A selector was awaited.
    WaitFor(String),
    /// The pointer moved.
    MouseMove(Point),
    /// The primary button was clicked.
    Click(Point),
    /// A character was typed.
    TypeChar(char),
    /// Backspace was pressed.
    Backspace,
    /// The viewport scrolled.
    Scroll(i64),
}

#[derive(Debug, Default)]
struct SimulatedState {
    url: String,
    elements: HashMap<String, Point>,
    redirects: HashMap<String, String>,
    text: String,
    init_scripts: Vec<String>,
    headers: Vec<(String, String)>,
    actions: Vec<PageAction>,
}

/// A scripted page with fixed elements and click-triggered navigation.
///
/// Clones share state, so a test can keep a handle while an agent drives
/// the page.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPage {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedPage {
    /// Creates an empty page at `about:blank`.
    #[must_use]
    pub fn new() -> Self {
        let page = Self::default();
        "about:blank".clone_into(&mut page.state().url);
        page
    }

    /// Adds an element centred at `at`.
    #[must_use]
    pub fn with_element(self, selector: impl Into<String>, at: Point) -> Self {
        self.state().elements.insert(selector.into(), at);
        self
    }

    /// Makes a click on `selector` navigate to `url`.
    #[must_use]
    pub fn with_redirect(self, selector: impl Into<String>, url: impl Into<String>) -> Self {
        self.state().redirects.insert(selector.into(), url.into());
        self
    }

    /// Returns the text typed so far, after backspaces.
    #[must_use]
    pub fn typed_text(&self) -> String {
        self.state().text.clone()
    }

    /// Returns the URL currently displayed.
    #[must_use]
    pub fn url(&self) -> String {
        self.state().url.clone()
    }

    /// Returns the registered init scripts.
    #[must_use]
    pub fn init_scripts(&self) -> Vec<String> {
        self.state().init_scripts.clone()
    }

    /// Returns the extra headers last set.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.state().headers.clone()
    }

    /// Returns every observed action in order.
    #[must_use]
    pub fn actions(&self) -> Vec<PageAction> {
        self.state().actions.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: PageAction) {
        self.state().actions.push(action);
    }
}

#[async_trait]
impl BrowserPage for SimulatedPage {
    async fn add_init_script(&self, script: &str) -> PageResult<()> {
        let mut state = self.state();
        state.init_scripts.push(script.to_owned());
        state.actions.push(PageAction::AddInitScript);
        Ok(())
    }

    async fn set_extra_headers(&self, headers: &[(String, String)]) -> PageResult<()> {
        let mut state = self.state();
        state.headers = headers.to_vec();
        state.actions.push(PageAction::SetHeaders);
        Ok(())
    }

    async fn goto(&self, url: &str) -> PageResult<()> {
        let mut state = self.state();
        url.clone_into(&mut state.url);
        state.actions.push(PageAction::Goto(url.to_owned()));
        Ok(())
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.url())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> PageResult<()> {
        self.record(PageAction::WaitFor(selector.to_owned()));
        if self.state().elements.contains_key(selector) {
            Ok(())
        } else {
            Err(PageError::Timeout {
                selector: selector.to_owned(),
            })
        }
    }

    async fn element_center(&self, selector: &str) -> PageResult<Point> {
        self.state()
            .elements
            .get(selector)
            .copied()
            .ok_or_else(|| PageError::TargetMissing {
                selector: selector.to_owned(),
            })
    }

    async fn mouse_move(&self, to: Point) -> PageResult<()> {
        self.record(PageAction::MouseMove(to));
        Ok(())
    }

    async fn mouse_click(&self, at: Point) -> PageResult<()> {
        let mut state = self.state();
        state.actions.push(PageAction::Click(at));
        let target = state
            .elements
            .iter()
            .find(|(_, center)| **center == at)
            .map(|(selector, _)| selector.clone());
        if let Some(url) = target.and_then(|selector| state.redirects.get(&selector).cloned()) {
            state.url = url;
        }
        Ok(())
    }

    async fn type_char(&self, ch: char) -> PageResult<()> {
        let mut state = self.state();
        state.text.push(ch);
        state.actions.push(PageAction::TypeChar(ch));
        Ok(())
    }

    async fn press_backspace(&self) -> PageResult<()> {
        let mut state = self.state();
        state.text.pop();
        state.actions.push(PageAction::Backspace);
        Ok(())
    }

    async fn scroll_by(&self, delta: i64) -> PageResult<()> {
        self.record(PageAction::Scroll(delta));
        Ok(())
    }
}
