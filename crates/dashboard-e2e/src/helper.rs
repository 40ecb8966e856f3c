//! Element-action helpers over a [`Session`].
//!
//! Each helper is one call to the async poller with a predicate that does a
//! single find-and-check. Transient failures such as a missing element, a
//! stale reference or an element that refuses a click are recoverable
//! [`SessionError`]s and are retried until the deadline. There is no
//! separate catch-and-retry around actions.

use crate::config::TestConfig;
use crate::locator::Locator;
use crate::poll::{Classify, Poller, WaitDescriptor};
use crate::result::E2eResult;
use crate::session::{ElementHandle, Session, SessionError};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits and actions on top of a browser session
#[derive(Debug, Clone)]
pub struct DriverHelper<S> {
    session: S,
    timeout: Duration,
    click_timeout: Duration,
    interval: Duration,
    disappearance_attempts: u32,
    cancel: Option<CancellationToken>,
}

impl<S: Session> DriverHelper<S> {
    /// Helper with the built-in default budgets
    pub fn new(session: S) -> Self {
        Self::from_config(session, &TestConfig::default())
    }

    /// Helper using the element, click and polling settings from `config`
    pub fn from_config(session: S, config: &TestConfig) -> Self {
        Self {
            session,
            timeout: Duration::from_millis(config.timeouts.element_ms),
            click_timeout: Duration::from_millis(config.timeouts.click_ms),
            interval: config.polling.interval(),
            disappearance_attempts: config.polling.disappearance_attempts,
            cancel: None,
        }
    }

    /// Default budget for waits without an explicit timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.click_timeout = timeout;
        self
    }

    /// Delay between attempts
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Abort every wait when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The underlying session
    pub const fn session(&self) -> &S {
        &self.session
    }

    fn poller(&self, timeout: Option<Duration>, description: String) -> Poller {
        self.poller_for(
            WaitDescriptor::new(timeout.unwrap_or(self.timeout), self.interval)
                .with_description(description),
        )
    }

    fn poller_for(&self, descriptor: WaitDescriptor) -> Poller {
        let poller = Poller::new(descriptor);
        match self.cancel {
            Some(ref token) => poller.with_cancellation(token.clone()),
            None => poller,
        }
    }

    /// Wait until `locator` is in the DOM
    pub async fn wait_presence(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> E2eResult<ElementHandle> {
        let session = &self.session;
        let element = self
            .poller(timeout, format!("presence of {locator}"))
            .run_async(move || async move { session.find_element(locator).await.map(Some) })
            .await?;
        Ok(element)
    }

    /// Wait until `locator` is in the DOM and displayed
    pub async fn wait_visibility(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> E2eResult<ElementHandle> {
        let session = &self.session;
        let element = self
            .poller(timeout, format!("visibility of {locator}"))
            .run_async(move || async move {
                let element = session.find_element(locator).await?;
                let displayed = session.is_displayed(&element).await?;
                Ok::<_, SessionError>(displayed.then_some(element))
            })
            .await?;
        Ok(element)
    }

    /// One visibility check, no waiting
    ///
    /// Recoverable failures read as "not visible"; fatal ones are errors.
    pub async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let check = async {
            let element = self.session.find_element(locator).await?;
            self.session.is_displayed(&element).await
        };
        match check.await {
            Ok(displayed) => Ok(displayed),
            Err(e) if e.is_recoverable() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Wait until at least one element matches and every match is displayed
    pub async fn wait_all_visibility(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> E2eResult<Vec<ElementHandle>> {
        let session = &self.session;
        let elements = self
            .poller(timeout, format!("visibility of all {locator}"))
            .run_async(move || async move {
                let elements = session.find_elements(locator).await?;
                if elements.is_empty() {
                    return Ok(None);
                }
                for element in &elements {
                    if !session.is_displayed(element).await? {
                        return Ok(None);
                    }
                }
                Ok::<_, SessionError>(Some(elements))
            })
            .await?;
        Ok(elements)
    }

    async fn is_shown(&self, locator: &Locator) -> Result<bool, SessionError> {
        let element = match self.session.find_element(locator).await {
            Ok(element) => element,
            Err(SessionError::NoSuchElement { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        match self.session.is_displayed(&element).await {
            Err(SessionError::StaleElement { .. }) => Ok(false),
            other => other,
        }
    }

    /// Wait until `locator` is gone or hidden, budgeted as `attempts × polling`
    ///
    /// `None` falls back to the configured attempts and interval.
    pub async fn wait_disappearance(
        &self,
        locator: &Locator,
        attempts: Option<u32>,
        polling: Option<Duration>,
    ) -> E2eResult<()> {
        let descriptor = WaitDescriptor::from_attempts(
            attempts.unwrap_or(self.disappearance_attempts),
            polling.unwrap_or(self.interval),
        )
        .with_description(format!("disappearance of {locator}"));
        self.disappearance(locator, descriptor).await
    }

    /// Wait until `locator` is gone or hidden, within `timeout`
    pub async fn wait_disappearance_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> E2eResult<()> {
        let descriptor = WaitDescriptor::new(timeout, self.interval)
            .with_description(format!("disappearance of {locator}"));
        self.disappearance(locator, descriptor).await
    }

    async fn disappearance(&self, locator: &Locator, descriptor: WaitDescriptor) -> E2eResult<()> {
        tracing::debug!(%locator, "waiting for disappearance");
        let this = self;
        self.poller_for(descriptor)
            .run_async(move || async move { this.is_shown(locator).await.map(|shown| !shown) })
            .await?;
        Ok(())
    }

    /// Wait until `locator` is displayed and enabled, then click it
    ///
    /// A click rejected as not interactable or stale is retried with a fresh
    /// lookup on the next attempt.
    pub async fn wait_and_click(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        tracing::debug!(%locator, "click");
        let session = &self.session;
        self.poller(
            Some(timeout.unwrap_or(self.click_timeout)),
            format!("{locator} to be clickable"),
        )
        .run_async(move || async move {
            let element = session.find_element(locator).await?;
            if !session.is_displayed(&element).await? || !session.is_enabled(&element).await? {
                return Ok(false);
            }
            session.click(&element).await?;
            Ok::<_, SessionError>(true)
        })
        .await?;
        Ok(())
    }

    /// Wait until `locator` is visible and return its text
    pub async fn wait_and_get_text(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> E2eResult<String> {
        let session = &self.session;
        let text = self
            .poller(timeout, format!("text of {locator}"))
            .run_async(move || async move {
                let element = session.find_element(locator).await?;
                if !session.is_displayed(&element).await? {
                    return Ok(None);
                }
                session.text(&element).await.map(Some)
            })
            .await?;
        Ok(text)
    }

    /// Wait until `locator` carries attribute `name` and return its value
    pub async fn wait_and_get_attribute(
        &self,
        locator: &Locator,
        name: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<String> {
        let session = &self.session;
        let value = self
            .poller(timeout, format!("attribute {name} of {locator}"))
            .run_async(move || async move {
                let element = session.find_element(locator).await?;
                session.attribute(&element, name).await
            })
            .await?;
        Ok(value)
    }

    /// Wait until attribute `name` of `locator` equals `expected`
    pub async fn wait_attribute_value(
        &self,
        locator: &Locator,
        name: &str,
        expected: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        let session = &self.session;
        self.poller(timeout, format!("attribute {name}={expected:?} on {locator}"))
            .run_async(move || async move {
                let element = session.find_element(locator).await?;
                let value = session.attribute(&element, name).await?;
                Ok::<_, SessionError>(value.as_deref() == Some(expected))
            })
            .await?;
        Ok(())
    }

    /// Replace the value of an input and wait until it reads back
    ///
    /// Each attempt clears and retypes, so keystrokes swallowed by a
    /// re-render are not left half-applied.
    pub async fn enter_value(
        &self,
        locator: &Locator,
        value: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        tracing::debug!(%locator, "entering value");
        let session = &self.session;
        self.poller(timeout, format!("value of {locator} to be set"))
            .run_async(move || async move {
                let element = session.find_element(locator).await?;
                if !session.is_displayed(&element).await? {
                    return Ok(false);
                }
                session.clear(&element).await?;
                session.send_keys(&element, value).await?;
                let current = session.attribute(&element, "value").await?;
                Ok::<_, SessionError>(current.as_deref() == Some(value))
            })
            .await?;
        Ok(())
    }

    /// Poll an arbitrary async predicate with this helper's cancellation
    ///
    /// The predicate's errors are classified like any other [`E2eError`],
    /// so a nested timeout is retried and a fatal session error is not.
    ///
    /// [`E2eError`]: crate::E2eError
    pub async fn wait_until_true<F, Fut>(
        &self,
        predicate: F,
        descriptor: &WaitDescriptor,
    ) -> E2eResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<bool>>,
    {
        self.poller_for(descriptor.clone())
            .run_async(predicate)
            .await?;
        Ok(())
    }

    /// Wait until the current URL contains `fragment` and return it
    pub async fn wait_url_contains(
        &self,
        fragment: &str,
        timeout: Option<Duration>,
    ) -> E2eResult<String> {
        let session = &self.session;
        let url = self
            .poller(timeout, format!("URL containing {fragment:?}"))
            .run_async(move || async move {
                let url = session.current_url().await?;
                Ok::<_, SessionError>(url.contains(fragment).then_some(url))
            })
            .await?;
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::E2eError;
    use crate::session::{MockElement, MockSession};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, Instant};

    const INTERVAL: Duration = Duration::from_millis(100);

    fn helper(session: &MockSession) -> DriverHelper<MockSession> {
        DriverHelper::new(session.clone())
            .with_timeout(Duration::from_secs(2))
            .with_interval(INTERVAL)
    }

    fn loader() -> Locator {
        Locator::id("workspace-loader")
    }

    /// Run `f` against the page after `delay` of virtual time
    fn later(
        session: &MockSession,
        delay: Duration,
        f: impl FnOnce(&MockSession) + Send + 'static,
    ) {
        let session = session.clone();
        let _ = tokio::spawn(async move {
            sleep(delay).await;
            f(&session);
        });
    }

    mod presence {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_already_present() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new());
            let start = Instant::now();
            let el = helper(&session).wait_presence(&loader(), None).await.unwrap();
            assert_eq!(el.locator, loader());
            assert_eq!(start.elapsed(), Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_appears_later() {
            let session = MockSession::new();
            later(&session, Duration::from_millis(300), |s| {
                s.insert(loader(), MockElement::new().hidden());
            });
            let start = Instant::now();
            let _ = helper(&session).wait_presence(&loader(), None).await.unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(300));
            assert!(elapsed <= Duration::from_millis(400));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_names_locator() {
            let session = MockSession::new();
            let err = helper(&session)
                .wait_presence(&loader(), Some(Duration::from_millis(500)))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            let message = err.to_string();
            assert!(message.contains("presence of id=workspace-loader"));
            assert!(message.contains("no such element"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_invalid_selector_is_fatal() {
            let session = MockSession::new();
            let bad = Locator::xpath("//[");
            session.mark_invalid(bad.clone());
            let err = helper(&session).wait_presence(&bad, None).await.unwrap_err();
            assert!(matches!(
                err,
                E2eError::Session(SessionError::InvalidSelector { .. })
            ));
            assert_eq!(session.find_calls(), 0);
        }
    }

    mod visibility {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_hidden_then_shown() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new().hidden());
            later(&session, Duration::from_millis(250), |s| {
                s.set_displayed(&loader(), true);
            });
            let start = Instant::now();
            let _ = helper(&session).wait_visibility(&loader(), None).await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(250));
        }

        #[tokio::test(start_paused = true)]
        async fn test_is_visible_single_check() {
            let session = MockSession::new();
            let h = helper(&session);
            assert!(!h.is_visible(&loader()).await.unwrap());
            session.insert(loader(), MockElement::new().hidden());
            assert!(!h.is_visible(&loader()).await.unwrap());
            session.set_displayed(&loader(), true);
            assert!(h.is_visible(&loader()).await.unwrap());

            session.disconnect("browser closed");
            assert!(h.is_visible(&loader()).await.is_err());
        }

        #[tokio::test(start_paused = true)]
        async fn test_all_visibility() {
            let session = MockSession::new();
            let rows = Locator::css(".workspace-row");
            session.push(rows.clone(), MockElement::new());
            session.push(rows.clone(), MockElement::new().hidden());
            let r = rows.clone();
            later(&session, Duration::from_millis(200), move |s| {
                s.set_displayed(&r, true);
            });
            let found = helper(&session)
                .wait_all_visibility(&rows, None)
                .await
                .unwrap();
            assert_eq!(found.len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_all_visibility_needs_a_match() {
            let session = MockSession::new();
            let err = helper(&session)
                .wait_all_visibility(&Locator::css(".row"), Some(Duration::from_millis(300)))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }

    mod disappearance {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_removed_within_attempts() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new());
            later(&session, Duration::from_millis(250), |s| s.remove(&loader()));
            let start = Instant::now();
            helper(&session)
                .wait_disappearance(&loader(), Some(5), Some(INTERVAL))
                .await
                .unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(250));
            assert!(elapsed <= Duration::from_millis(300));
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_counts_as_gone() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new().hidden());
            helper(&session)
                .wait_disappearance(&loader(), None, None)
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_attempt_budget() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new());
            let start = Instant::now();
            let err = helper(&session)
                .wait_disappearance(&loader(), Some(3), Some(INTERVAL))
                .await
                .unwrap_err();
            let E2eError::Timeout(timeout) = err else {
                panic!("expected timeout");
            };
            assert_eq!(timeout.timeout, Duration::from_millis(300));
            assert!(start.elapsed() <= Duration::from_millis(400));
        }

        #[tokio::test(start_paused = true)]
        async fn test_within_timeout() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new());
            later(&session, Duration::from_millis(500), |s| {
                s.set_displayed(&loader(), false);
            });
            helper(&session)
                .wait_disappearance_within(&loader(), Duration::from_secs(1))
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_disconnect_is_fatal() {
            let session = MockSession::new();
            session.insert(loader(), MockElement::new());
            session.disconnect("gone");
            let err = helper(&session)
                .wait_disappearance(&loader(), None, None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                E2eError::Session(SessionError::Disconnected { .. })
            ));
        }
    }

    mod click {
        use super::*;

        fn create() -> Locator {
            Locator::test_id("create-workspace")
        }

        #[tokio::test(start_paused = true)]
        async fn test_retries_not_interactable() {
            let session = MockSession::new();
            session.insert(create(), MockElement::new());
            session.block_clicks(&create(), 2);
            let start = Instant::now();
            helper(&session).wait_and_click(&create(), None).await.unwrap();
            assert_eq!(session.clicks(&create()), 1);
            assert_eq!(start.elapsed(), INTERVAL * 2);
        }

        /// Re-renders the page between the first lookup and its click
        #[derive(Debug)]
        struct RerenderOnFirstClick {
            page: MockSession,
            rerendered: AtomicBool,
        }

        #[async_trait]
        impl Session for RerenderOnFirstClick {
            async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, SessionError> {
                self.page.find_element(locator).await
            }

            async fn find_elements(
                &self,
                locator: &Locator,
            ) -> Result<Vec<ElementHandle>, SessionError> {
                self.page.find_elements(locator).await
            }

            async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError> {
                self.page.is_displayed(element).await
            }

            async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, SessionError> {
                self.page.is_enabled(element).await
            }

            async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
                if !self.rerendered.swap(true, Ordering::SeqCst) {
                    self.page.rerender(&element.locator);
                }
                self.page.click(element).await
            }

            async fn text(&self, element: &ElementHandle) -> Result<String, SessionError> {
                self.page.text(element).await
            }

            async fn attribute(
                &self,
                element: &ElementHandle,
                name: &str,
            ) -> Result<Option<String>, SessionError> {
                self.page.attribute(element, name).await
            }

            async fn send_keys(
                &self,
                element: &ElementHandle,
                keys: &str,
            ) -> Result<(), SessionError> {
                self.page.send_keys(element, keys).await
            }

            async fn clear(&self, element: &ElementHandle) -> Result<(), SessionError> {
                self.page.clear(element).await
            }

            async fn current_url(&self) -> Result<String, SessionError> {
                self.page.current_url().await
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_stale_handle_is_looked_up_again() {
            let page = MockSession::new();
            page.insert(create(), MockElement::new());
            let session = RerenderOnFirstClick {
                page: page.clone(),
                rerendered: AtomicBool::new(false),
            };
            let helper = DriverHelper::new(session)
                .with_timeout(Duration::from_secs(2))
                .with_interval(INTERVAL);
            let start = Instant::now();
            helper.wait_and_click(&create(), None).await.unwrap();
            assert_eq!(page.clicks(&create()), 1);
            assert_eq!(start.elapsed(), INTERVAL);
            assert_eq!(page.find_calls(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_waits_until_enabled() {
            let session = MockSession::new();
            session.insert(create(), MockElement::new().disabled());
            later(&session, Duration::from_millis(300), |s| {
                s.set_enabled(&create(), true);
            });
            helper(&session).wait_and_click(&create(), None).await.unwrap();
            assert_eq!(session.clicks(&create()), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_never_enabled() {
            let session = MockSession::new();
            session.insert(create(), MockElement::new().disabled());
            let err = helper(&session)
                .wait_and_click(&create(), Some(Duration::from_millis(300)))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("to be clickable"));
            assert_eq!(session.clicks(&create()), 0);
        }
    }

    mod read {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_text_once_visible() {
            let session = MockSession::new();
            let status = Locator::css(".status");
            session.insert(status.clone(), MockElement::new().with_text("Running").hidden());
            let s = status.clone();
            later(&session, Duration::from_millis(200), move |page| {
                page.set_displayed(&s, true);
            });
            let text = helper(&session)
                .wait_and_get_text(&status, None)
                .await
                .unwrap();
            assert_eq!(text, "Running");
        }

        #[tokio::test(start_paused = true)]
        async fn test_attribute_appears() {
            let session = MockSession::new();
            let link = Locator::link_text("Open");
            session.insert(link.clone(), MockElement::new());
            let l = link.clone();
            later(&session, Duration::from_millis(100), move |page| {
                page.set_attribute(&l, "href", "https://ide.example/ws-1");
            });
            let href = helper(&session)
                .wait_and_get_attribute(&link, "href", None)
                .await
                .unwrap();
            assert_eq!(href, "https://ide.example/ws-1");
        }

        #[tokio::test(start_paused = true)]
        async fn test_attribute_value() {
            let session = MockSession::new();
            let tab = Locator::css("#overview-tab");
            session.insert(tab.clone(), MockElement::new().with_attribute("aria-selected", "false"));
            let t = tab.clone();
            later(&session, Duration::from_millis(300), move |page| {
                page.set_attribute(&t, "aria-selected", "true");
            });
            helper(&session)
                .wait_attribute_value(&tab, "aria-selected", "true", None)
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_url_contains() {
            let session = MockSession::new();
            session.set_url("https://che.example/dashboard/#/");
            later(&session, Duration::from_millis(400), |page| {
                page.set_url("https://che.example/dashboard/#/workspaces");
            });
            let url = helper(&session)
                .wait_url_contains("#/workspaces", None)
                .await
                .unwrap();
            assert!(url.ends_with("#/workspaces"));
        }
    }

    mod input {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_enter_value_replaces_content() {
            let session = MockSession::new();
            let name = Locator::name("workspace-name");
            session.insert(name.clone(), MockElement::new().with_attribute("value", "default"));
            helper(&session)
                .enter_value(&name, "my-workspace", None)
                .await
                .unwrap();
            assert_eq!(session.value(&name).as_deref(), Some("my-workspace"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_enter_value_waits_for_enabled_input() {
            let session = MockSession::new();
            let name = Locator::name("workspace-name");
            session.insert(name.clone(), MockElement::new().disabled());
            let n = name.clone();
            later(&session, Duration::from_millis(200), move |page| {
                page.set_enabled(&n, true);
            });
            helper(&session).enter_value(&name, "ws", None).await.unwrap();
            assert_eq!(session.value(&name).as_deref(), Some("ws"));
        }
    }

    mod generic {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_true() {
            let session = MockSession::new();
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            helper(&session)
                .wait_until_true(
                    move || {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        async move { Ok(n >= 4) }
                    },
                    &WaitDescriptor::from_millis(1_000, 10),
                )
                .await
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 4);
        }

        #[tokio::test(start_paused = true)]
        async fn test_nested_timeout_is_retried() {
            let session = MockSession::new();
            let h = helper(&session);
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let inner = &h;
            h.wait_until_true(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    let page = session.clone();
                    async move {
                        if n == 3 {
                            page.insert(loader(), MockElement::new());
                        }
                        inner
                            .wait_presence(&loader(), Some(Duration::from_millis(50)))
                            .await
                            .map(|_| true)
                    }
                },
                &WaitDescriptor::from_millis(5_000, 100),
            )
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_fatal_predicate_error() {
            let session = MockSession::new();
            let err = helper(&session)
                .wait_until_true(
                    || async { Err(E2eError::config("bad")) },
                    &WaitDescriptor::from_millis(1_000, 10),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, E2eError::Config { .. }));
        }
    }

    mod cancellation {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_cancel_stops_wait() {
            let session = MockSession::new();
            let token = CancellationToken::new();
            let canceller = token.clone();
            let _ = tokio::spawn(async move {
                sleep(Duration::from_millis(150)).await;
                canceller.cancel();
            });
            let start = Instant::now();
            let err = helper(&session)
                .with_cancellation(token)
                .wait_presence(&loader(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, E2eError::Cancelled { .. }));
            assert!(start.elapsed() < Duration::from_secs(1));
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = TestConfig::default();
        config.timeouts.element_ms = 7_000;
        config.timeouts.click_ms = 3_000;
        config.polling.interval_ms = 250;
        let h = DriverHelper::from_config(MockSession::new(), &config);
        assert_eq!(h.timeout, Duration::from_secs(7));
        assert_eq!(h.click_timeout, Duration::from_secs(3));
        assert_eq!(h.interval, Duration::from_millis(250));
        assert_eq!(h.disappearance_attempts, 5);
    }
}
