//! Automation surface: one disposable browser per operation.
//!
//! [`Surface`] is the capability seam the controller drives; page-local
//! storage is read and written through it rather than reached ambiently from
//! the controller. [`ChromiumSurface`] backs it with one Chromium process
//! per operation, launched against a throwaway profile directory so each
//! operation gets an isolated browsing context.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::SessionCookie;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Upper bound on the in-page network-idle wait.
const NETWORK_IDLE_BUDGET_MS: u64 = 10_000;
/// Observable pacing applied to each action in debug mode.
const DEBUG_ACTION_DELAY: Duration = Duration::from_millis(1_000);

/// Capabilities the controller may exercise against a driven page.
#[async_trait]
pub trait Surface: Send {
	async fn navigate(&self, url: &str) -> Result<()>;
	/// Waits for `selector` to match an element, polling up to `timeout`.
	async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()>;
	async fn fill(&self, selector: &str, value: &str) -> Result<()>;
	async fn click(&self, selector: &str) -> Result<()>;
	/// Runs a script in the page and returns its JSON result.
	async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;
	/// Best-effort wait for network quiescence; never fails the operation.
	async fn wait_for_network_idle(&self);
	async fn current_url(&self) -> Result<String>;
	async fn read_cookies(&self) -> Result<Vec<SessionCookie>>;
	async fn write_cookies(&self, cookies: &[SessionCookie]) -> Result<()>;
	async fn read_local_state(&self) -> Result<HashMap<String, String>>;
	async fn write_local_state(&self, state: &HashMap<String, String>) -> Result<()>;
	/// Releases page, then browser, then the driver task. Each stage is
	/// guarded independently; failures are logged and swallowed so cleanup
	/// never masks the operation's own result.
	async fn close(&mut self);
}

/// Opens one fresh surface per operation.
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
	type Surface: Surface;

	async fn open(&self, debug: bool) -> Result<Self::Surface>;
}

/// Chromium-backed provider carrying the fixed desktop user agent.
#[derive(Debug, Clone)]
pub struct ChromiumProvider {
	user_agent: String,
}

impl ChromiumProvider {
	pub fn new(user_agent: impl Into<String>) -> Self {
		Self {
			user_agent: user_agent.into(),
		}
	}
}

#[async_trait]
impl SurfaceProvider for ChromiumProvider {
	type Surface = ChromiumSurface;

	async fn open(&self, debug: bool) -> Result<ChromiumSurface> {
		ChromiumSurface::open(debug, &self.user_agent).await
	}
}

/// One Chromium process, isolated profile, and page.
pub struct ChromiumSurface {
	browser: Option<Browser>,
	page: Option<Page>,
	driver_task: Option<JoinHandle<()>>,
	// Dropped with the surface, deleting the on-disk profile.
	_profile_dir: TempDir,
	action_delay: Duration,
}

impl ChromiumSurface {
	/// Launches a browser process, headless unless `debug`, with slowed
	/// pacing in debug mode so a human can follow along.
	pub async fn open(debug: bool, user_agent: &str) -> Result<Self> {
		let profile_dir = TempDir::new().map_err(|e| Error::SurfaceInit(e.to_string()))?;

		let mut builder = BrowserConfig::builder()
			.user_data_dir(profile_dir.path())
			.viewport(None)
			.arg(format!("--user-agent={user_agent}"))
			.arg("--no-first-run")
			.arg("--no-default-browser-check");
		if debug {
			builder = builder.with_head();
		}
		let config = builder.build().map_err(Error::SurfaceInit)?;

		let (browser, mut handler) = Browser::launch(config)
			.await
			.map_err(|e| Error::SurfaceInit(e.to_string()))?;
		let driver_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

		let page = match browser.new_page("about:blank").await {
			Ok(page) => page,
			Err(err) => {
				driver_task.abort();
				return Err(Error::SurfaceInit(err.to_string()));
			}
		};

		let debug_mode = debug;
		debug!(target = "gamecode.surface", debug = debug_mode, "automation surface ready");
		Ok(Self {
			browser: Some(browser),
			page: Some(page),
			driver_task: Some(driver_task),
			_profile_dir: profile_dir,
			action_delay: if debug { DEBUG_ACTION_DELAY } else { Duration::ZERO },
		})
	}

	fn page(&self) -> Result<&Page> {
		self.page.as_ref().ok_or(Error::SurfaceClosed)
	}

	async fn pace(&self) {
		if !self.action_delay.is_zero() {
			tokio::time::sleep(self.action_delay).await;
		}
	}
}

#[async_trait]
impl Surface for ChromiumSurface {
	async fn navigate(&self, url: &str) -> Result<()> {
		self.pace().await;
		debug!(target = "gamecode.surface", url, "navigating");
		self.page()?.goto(url).await?;
		Ok(())
	}

	async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<()> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.page()?.find_element(selector).await.is_ok() {
				return Ok(());
			}
			if Instant::now() >= deadline {
				return Err(Error::ElementTimeout {
					selector: selector.to_string(),
					timeout_ms: timeout.as_millis() as u64,
				});
			}
			tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
		}
	}

	async fn fill(&self, selector: &str, value: &str) -> Result<()> {
		self.pace().await;
		let element = self.page()?.find_element(selector).await?;
		element.click().await?;
		element.type_str(value).await?;
		Ok(())
	}

	async fn click(&self, selector: &str) -> Result<()> {
		self.pace().await;
		let element = self.page()?.find_element(selector).await?;
		element.click().await?;
		Ok(())
	}

	async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
		let value = self.page()?.evaluate(script.to_string()).await?.into_value()?;
		Ok(value)
	}

	async fn wait_for_network_idle(&self) {
		// A click that submits a form tears down the execution context while
		// the cross-document navigation commits; wait for the navigation to
		// settle before probing the new document.
		match self.page() {
			Ok(page) => {
				if let Err(err) = page.wait_for_navigation().await {
					debug!(target = "gamecode.surface", error = %err, "navigation wait failed; continuing");
				}
			}
			Err(_) => return,
		}
		// Resource-count quiet-window heuristic; CDP exposes no direct
		// networkidle signal.
		let script = format!(
			r#"
			(async () => {{
				const budget = {NETWORK_IDLE_BUDGET_MS};
				const quietWindow = 500;
				const start = Date.now();
				let lastCount = performance.getEntriesByType('resource').length;
				let quietSince = Date.now();
				while (Date.now() - start < budget) {{
					await new Promise(r => setTimeout(r, 100));
					const count = performance.getEntriesByType('resource').length;
					if (count !== lastCount) {{
						lastCount = count;
						quietSince = Date.now();
					}}
					if (document.readyState === 'complete' && Date.now() - quietSince >= quietWindow) {{
						return {{ idle: true, waitedMs: Date.now() - start }};
					}}
				}}
				return {{ idle: false, waitedMs: Date.now() - start }};
			}})()
			"#
		);
		// The probe itself can still lose its document to a late redirect;
		// retry exactly once in whatever document replaced it.
		for attempt in 0..2 {
			match self.evaluate(&script).await {
				Ok(result) => {
					let idle = result.get("idle").and_then(|v| v.as_bool()).unwrap_or(false);
					let waited = result.get("waitedMs").and_then(|v| v.as_u64()).unwrap_or(0);
					debug!(target = "gamecode.surface", idle, waited_ms = waited, "network-idle wait finished");
					return;
				}
				Err(err) if attempt == 0 => {
					debug!(target = "gamecode.surface", error = %err, "network-idle probe lost its document; retrying");
				}
				Err(err) => {
					debug!(target = "gamecode.surface", error = %err, "network-idle wait failed; continuing");
				}
			}
		}
	}

	async fn current_url(&self) -> Result<String> {
		Ok(self.page()?.url().await?.unwrap_or_default())
	}

	async fn read_cookies(&self) -> Result<Vec<SessionCookie>> {
		let cookies = self.page()?.get_cookies().await?;
		Ok(cookies
			.into_iter()
			.map(|c| SessionCookie {
				name: c.name,
				value: c.value,
				domain: c.domain,
				path: c.path,
				// CDP reports -1 for session cookies.
				expires: (c.expires >= 0.0).then_some(c.expires),
				secure: c.secure,
				http_only: c.http_only,
				same_site: c.same_site.map(|s| format!("{s:?}")),
			})
			.collect())
	}

	async fn write_cookies(&self, cookies: &[SessionCookie]) -> Result<()> {
		if cookies.is_empty() {
			return Ok(());
		}
		let params: Vec<CookieParam> = cookies.iter().map(cookie_param).collect();
		self.page()?.set_cookies(params).await?;
		Ok(())
	}

	async fn read_local_state(&self) -> Result<HashMap<String, String>> {
		let script = r#"
			(() => {
				const data = {};
				for (let i = 0; i < localStorage.length; i++) {
					const key = localStorage.key(i);
					if (key !== null) {
						data[key] = localStorage.getItem(key);
					}
				}
				return data;
			})()
		"#;
		let value = self.evaluate(script).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn write_local_state(&self, state: &HashMap<String, String>) -> Result<()> {
		if state.is_empty() {
			return Ok(());
		}
		let payload = serde_json::to_string(state)?;
		let script = format!(
			r#"
			(() => {{
				const data = {payload};
				for (const [key, value] of Object.entries(data)) {{
					localStorage.setItem(key, value);
				}}
			}})()
			"#
		);
		self.evaluate(&script).await?;
		Ok(())
	}

	async fn close(&mut self) {
		if let Some(page) = self.page.take() {
			if let Err(err) = page.close().await {
				warn!(target = "gamecode.surface", error = %Error::Cleanup(err.to_string()), "failed to close page");
			}
		}
		if let Some(mut browser) = self.browser.take() {
			match browser.close().await {
				Ok(_) => {
					let _ = browser.wait().await;
				}
				Err(err) => {
					warn!(target = "gamecode.surface", error = %Error::Cleanup(err.to_string()), "failed to close browser");
				}
			}
		}
		if let Some(task) = self.driver_task.take() {
			task.abort();
		}
		debug!(target = "gamecode.surface", "automation surface released");
	}
}

/// Rebuilds a CDP cookie parameter from a captured cookie, carrying the
/// expiry and SameSite attribute through the round trip.
fn cookie_param(cookie: &SessionCookie) -> CookieParam {
	let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
	param.domain = Some(cookie.domain.clone());
	param.path = Some(cookie.path.clone());
	param.expires = cookie.expires.map(TimeSinceEpoch::new);
	param.secure = Some(cookie.secure);
	param.http_only = Some(cookie.http_only);
	param.same_site = cookie.same_site.as_deref().and_then(parse_same_site);
	param
}

fn parse_same_site(value: &str) -> Option<CookieSameSite> {
	match value {
		"Strict" => Some(CookieSameSite::Strict),
		"Lax" => Some(CookieSameSite::Lax),
		"None" => Some(CookieSameSite::None),
		_ => None,
	}
}
