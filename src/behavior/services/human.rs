//! Page wrapper that masks fingerprints and paces every interaction.

use crate::behavior::domain::{
    Keystroke, Point, StealthProfile, bezier_path, plan_scroll, plan_typing, random_delay,
};
use crate::behavior::ports::{BrowserPage, Pacer, PageError, PageResult};
use crate::config::BehaviorConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Routes every page interaction through human-like pacing.
///
/// Each public interaction increments a shared invocation counter, so callers
/// can assert that a run never touched the page.
pub struct HumanPage<P> {
    page: P,
    pacer: Arc<dyn Pacer>,
    rng: Mutex<StdRng>,
    cursor: Mutex<Point>,
    config: BehaviorConfig,
    invocations: Arc<AtomicUsize>,
}

impl<P: BrowserPage> HumanPage<P> {
    /// Wraps `page` with an entropy-seeded random source.
    pub fn new(page: P, pacer: Arc<dyn Pacer>, config: BehaviorConfig) -> Self {
        Self {
            page,
            pacer,
            rng: Mutex::new(StdRng::from_entropy()),
            cursor: Mutex::new(Point::default()),
            config,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replaces the random source, typically with a seeded one.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Shares an external invocation counter.
    #[must_use]
    pub fn with_invocation_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.invocations = counter;
        self
    }

    /// Returns the number of interactions performed so far.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns the wrapped page.
    pub const fn inner(&self) -> &P {
        &self.page
    }

    /// Installs the fingerprint mask. Call before the first navigation.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when the driver rejects the script or headers.
    pub async fn apply_stealth(&self, profile: &StealthProfile) -> PageResult<()> {
        self.touch();
        self.page.add_init_script(&profile.init_script()).await?;
        self.page.set_extra_headers(&profile.extra_headers()).await
    }

    /// Navigates to `url`, then pauses as if reading the page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when navigation fails.
    pub async fn navigate(&self, url: &str) -> PageResult<()> {
        self.touch();
        self.page.goto(url).await?;
        self.think().await;
        Ok(())
    }

    /// Pauses for a normally distributed step delay.
    pub async fn think(&self) {
        let (min, max) = (self.config.step_pause_min_ms, self.config.step_pause_max_ms);
        self.pause_between(min, max).await;
    }

    /// Pauses for a normally distributed delay within `[min_ms, max_ms]`.
    pub async fn pause_between(&self, min_ms: u64, max_ms: u64) {
        let delay = random_delay(&mut *self.rng(), min_ms, max_ms);
        self.pacer.pause(delay).await;
    }

    /// Waits for `selector` to become visible within the element timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Timeout`] when it does not appear in time.
    pub async fn wait_for(&self, selector: &str) -> PageResult<()> {
        self.touch();
        self.page
            .wait_for_selector(selector, self.element_timeout())
            .await
    }

    /// Moves the pointer along a curved path to `selector` and clicks it.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when the element is absent or the driver fails.
    pub async fn click(&self, selector: &str) -> PageResult<()> {
        self.touch();
        self.page
            .wait_for_selector(selector, self.element_timeout())
            .await?;
        let target = self.page.element_center(selector).await?;
        let from = *self.cursor();
        let path = bezier_path(&mut *self.rng(), from, target);
        for step in path {
            self.page.mouse_move(step.to).await?;
            *self.cursor() = step.to;
            self.pacer.pause(step.pause).await;
        }
        self.page.mouse_click(target).await
    }

    /// Types `text` into the focused element with human cadence.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when the driver fails mid-way.
    pub async fn type_text(&self, text: &str) -> PageResult<()> {
        self.touch();
        let plan = plan_typing(&mut *self.rng(), text);
        for keystroke in plan {
            match keystroke {
                Keystroke::Type { ch, delay } => {
                    self.page.type_char(ch).await?;
                    self.pacer.pause(delay).await;
                }
                Keystroke::Backspace { delay } => {
                    self.page.press_backspace().await?;
                    self.pacer.pause(delay).await;
                }
                Keystroke::Pause(delay) => self.pacer.pause(delay).await,
            }
        }
        Ok(())
    }

    /// Scrolls by `distance` pixels in several paced increments.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] when the driver fails.
    pub async fn scroll(&self, distance: i64) -> PageResult<()> {
        self.touch();
        let plan = plan_scroll(
            &mut *self.rng(),
            distance,
            self.config.scroll_pause_min_ms,
            self.config.scroll_pause_max_ms,
        );
        for step in plan {
            self.page.scroll_by(step.delta).await?;
            self.pacer.pause(step.pause).await;
        }
        Ok(())
    }

    /// Checks that the current URL contains `fragment`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::UnexpectedNavigation`] when it does not.
    pub async fn assert_url(&self, fragment: &str) -> PageResult<()> {
        self.touch();
        let actual = self.page.current_url().await?;
        if actual.contains(fragment) {
            Ok(())
        } else {
            Err(PageError::UnexpectedNavigation {
                expected: fragment.to_owned(),
                actual,
            })
        }
    }

    fn touch(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }

    const fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.config.element_timeout_ms)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cursor(&self) -> MutexGuard<'_, Point> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
