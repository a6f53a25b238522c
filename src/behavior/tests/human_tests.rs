//! Tests for the humanized page wrapper.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::{fixture, rstest};

use crate::behavior::adapters::{PageAction, RecordingPacer, SimulatedPage};
use crate::behavior::domain::{Point, StealthProfile};
use crate::behavior::ports::{MockBrowserPage, PageError};
use crate::behavior::services::HumanPage;
use crate::config::BehaviorConfig;

const BUTTON: Point = Point::new(320.0, 480.0);

struct Harness {
    human: HumanPage<SimulatedPage>,
    page: SimulatedPage,
    pacer: RecordingPacer,
}

#[fixture]
fn harness() -> Harness {
    let page = SimulatedPage::new()
        .with_element("#submit", BUTTON)
        .with_redirect("#submit", "https://example.test/home");
    let pacer = RecordingPacer::new();
    let human = HumanPage::new(page.clone(), Arc::new(pacer.clone()), BehaviorConfig::default())
        .with_rng(StdRng::seed_from_u64(7));
    Harness { human, page, pacer }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stealth_is_installed_before_navigation(harness: Harness) {
    let profile = StealthProfile::randomized(&mut StdRng::seed_from_u64(1));
    harness
        .human
        .apply_stealth(&profile)
        .await
        .expect("stealth applies");
    harness
        .human
        .navigate("https://example.test/login")
        .await
        .expect("navigation succeeds");

    let actions = harness.page.actions();
    assert_eq!(actions.first(), Some(&PageAction::AddInitScript));
    assert_eq!(actions.get(1), Some(&PageAction::SetHeaders));
    assert_eq!(
        actions.get(2),
        Some(&PageAction::Goto("https://example.test/login".to_owned()))
    );
    assert_eq!(harness.page.init_scripts(), vec![profile.init_script()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn navigation_is_followed_by_a_step_pause(harness: Harness) {
    harness
        .human
        .navigate("https://example.test")
        .await
        .expect("navigation succeeds");

    let config = BehaviorConfig::default();
    let pauses = harness.pacer.pauses();
    assert_eq!(pauses.len(), 1);
    assert!(
        (Duration::from_millis(config.step_pause_min_ms)
            ..=Duration::from_millis(config.step_pause_max_ms))
            .contains(&pauses[0])
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn typing_produces_exact_text(harness: Harness) {
    let text = "Shipping the release notes today!";
    harness.human.type_text(text).await.expect("typing succeeds");

    assert_eq!(harness.page.typed_text(), text);
    assert!(harness.pacer.pauses().len() >= text.chars().count());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn click_travels_a_curve_then_clicks_target(harness: Harness) {
    harness.human.click("#submit").await.expect("click succeeds");

    let actions = harness.page.actions();
    let moves = actions
        .iter()
        .filter(|action| matches!(action, PageAction::MouseMove(_)))
        .count();
    assert!((20..=30).contains(&moves));
    assert_eq!(actions.last(), Some(&PageAction::Click(BUTTON)));
    assert_eq!(harness.page.url(), "https://example.test/home");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scroll_is_split_into_increments(harness: Harness) {
    harness.human.scroll(900).await.expect("scroll succeeds");

    let deltas: Vec<i64> = harness
        .page
        .actions()
        .into_iter()
        .filter_map(|action| match action {
            PageAction::Scroll(delta) => Some(delta),
            _ => None,
        })
        .collect();
    assert!((5..=9).contains(&deltas.len()));
    assert_eq!(deltas.iter().sum::<i64>(), 900);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assert_url_reports_unexpected_navigation(harness: Harness) {
    harness
        .human
        .navigate("https://example.test/checkpoint")
        .await
        .expect("navigation succeeds");

    let err = harness
        .human
        .assert_url("/home")
        .await
        .expect_err("url should not match");

    assert_eq!(
        err,
        PageError::UnexpectedNavigation {
            expected: "/home".to_owned(),
            actual: "https://example.test/checkpoint".to_owned(),
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invocations_are_counted_on_a_shared_counter() {
    let counter = Arc::new(AtomicUsize::new(0));
    let human = HumanPage::new(
        SimulatedPage::new().with_element("#like", BUTTON),
        Arc::new(RecordingPacer::new()),
        BehaviorConfig::default(),
    )
    .with_invocation_counter(Arc::clone(&counter));

    human.wait_for("#like").await.expect("element present");
    human.click("#like").await.expect("click succeeds");

    assert_eq!(human.invocations(), 2);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn click_stops_when_target_never_appears() {
    let mut page = MockBrowserPage::new();
    page.expect_wait_for_selector()
        .withf(|selector, timeout| selector == "#gone" && *timeout == Duration::from_millis(15_000))
        .times(1)
        .returning(|selector, _| {
            Err(PageError::Timeout {
                selector: selector.to_owned(),
            })
        });
    page.expect_element_center().never();
    page.expect_mouse_click().never();

    let human = HumanPage::new(page, Arc::new(RecordingPacer::new()), BehaviorConfig::default());
    let err = human.click("#gone").await.expect_err("click should fail");

    assert!(matches!(err, PageError::Timeout { .. }));
}
