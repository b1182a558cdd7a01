//! Walker registry with an explicit init/teardown lifecycle.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::walkers::{Walker, sites};

/// Lifecycle of the registry's built-in registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
	Uninit,
	Initializing,
	Ready,
}

#[derive(Debug)]
struct Inner {
	state: RegistryState,
	/// Site walkers in registration order; re-registration replaces in place.
	walkers: Vec<Walker>,
	fallback: Option<Walker>,
}

/// Site key to walker table plus the designated fallback.
///
/// Read-mostly: lookups take a shared lock, registration and teardown an
/// exclusive one.
#[derive(Debug)]
pub struct Registry {
	inner: RwLock<Inner>,
	register_builtins: bool,
}

impl Default for Registry {
	fn default() -> Self {
		Self::new(true)
	}
}

impl Registry {
	/// Creates an empty registry. With `register_builtins` the built-in
	/// walkers are added on first [`init`](Self::init).
	pub fn new(register_builtins: bool) -> Self {
		Self {
			inner: RwLock::new(Inner {
				state: RegistryState::Uninit,
				walkers: Vec::new(),
				fallback: None,
			}),
			register_builtins,
		}
	}

	pub fn state(&self) -> RegistryState {
		self.inner.read().state
	}

	/// Registers the built-in walkers once. Later calls are no-ops.
	pub fn init(&self) {
		{
			let mut inner = self.inner.write();
			if inner.state != RegistryState::Uninit {
				return;
			}
			inner.state = RegistryState::Initializing;
		}

		let builtins: Vec<Walker> = if self.register_builtins {
			sites::builtin_profiles().map(Walker::site).collect()
		} else {
			Vec::new()
		};

		let mut inner = self.inner.write();
		for walker in builtins {
			upsert(&mut inner.walkers, walker);
		}
		if self.register_builtins && inner.fallback.is_none() {
			inner.fallback = Some(Walker::generic());
		}
		inner.state = RegistryState::Ready;
		info!(
			target = "chx.registry",
			walkers = inner.walkers.len(),
			fallback = inner.fallback.is_some(),
			"registry ready"
		);
	}

	/// Initializes if needed, then polls until the registry is ready.
	///
	/// Returns `false` when `ceiling` elapses first.
	pub async fn wait_ready(&self, poll: Duration, ceiling: Duration) -> bool {
		let started = Instant::now();
		loop {
			match self.state() {
				RegistryState::Ready => return true,
				RegistryState::Uninit => self.init(),
				RegistryState::Initializing => {
					if started.elapsed() >= ceiling {
						warn!(target = "chx.registry", ceiling_ms = ceiling.as_millis() as u64, "registry not ready before ceiling");
						return false;
					}
					tokio::time::sleep(poll).await;
				}
			}
		}
	}

	/// Registers or replaces a walker. A generic walker becomes the fallback.
	pub fn register(&self, walker: Walker) {
		let mut inner = self.inner.write();
		if walker.is_generic() {
			inner.fallback = Some(walker);
		} else {
			upsert(&mut inner.walkers, walker);
		}
		debug!(target = "chx.registry", walker = walker.key(), "registered walker");
	}

	/// Clears every registration and returns to [`RegistryState::Uninit`].
	pub fn teardown(&self) {
		let mut inner = self.inner.write();
		inner.walkers.clear();
		inner.fallback = None;
		inner.state = RegistryState::Uninit;
		debug!(target = "chx.registry", "registry torn down");
	}

	/// The walker registered for `site`, matched case-insensitively.
	pub fn walker_for(&self, site: &str) -> Option<Walker> {
		let site = site.trim();
		self.inner.read().walkers.iter().find(|w| w.key().eq_ignore_ascii_case(site)).copied()
	}

	/// Registered site walkers, highest priority first.
	pub fn walkers(&self) -> Vec<Walker> {
		let mut walkers = self.inner.read().walkers.clone();
		walkers.sort_by_key(|w| std::cmp::Reverse(w.priority()));
		walkers
	}

	pub fn fallback(&self) -> Option<Walker> {
		self.inner.read().fallback
	}

	#[cfg(test)]
	pub(crate) fn force_state(&self, state: RegistryState) {
		self.inner.write().state = state;
	}
}

fn upsert(walkers: &mut Vec<Walker>, walker: Walker) {
	match walkers.iter_mut().find(|w| w.key() == walker.key()) {
		Some(existing) => *existing = walker,
		None => walkers.push(walker),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::walkers::site_profile;

	#[test]
	fn init_is_idempotent() {
		let registry = Registry::new(true);
		assert_eq!(registry.state(), RegistryState::Uninit);
		registry.init();
		registry.init();
		assert_eq!(registry.state(), RegistryState::Ready);
		assert_eq!(registry.walkers().len(), 5);
		assert!(registry.fallback().is_some_and(|w| w.is_generic()));
	}

	#[test]
	fn lookup_ignores_case() {
		let registry = Registry::default();
		registry.init();
		assert_eq!(registry.walker_for("DeepSeek").map(|w| w.key()), Some("deepseek"));
		assert!(registry.walker_for("gemini").is_none());
	}

	#[test]
	fn teardown_clears_registrations() {
		let registry = Registry::default();
		registry.init();
		registry.teardown();
		assert_eq!(registry.state(), RegistryState::Uninit);
		assert!(registry.walkers().is_empty());
		assert!(registry.fallback().is_none());
	}

	#[test]
	fn reregistration_replaces_in_place() {
		let registry = Registry::new(false);
		registry.init();
		let kimi = Walker::site(site_profile("kimi").expect("kimi profile"));
		registry.register(kimi);
		registry.register(kimi);
		assert_eq!(registry.walkers().len(), 1);
		assert!(registry.fallback().is_none());
		registry.register(Walker::generic());
		assert!(registry.fallback().is_some());
	}

	#[tokio::test]
	async fn wait_initializes_lazily() {
		let registry = Registry::default();
		assert!(registry.wait_ready(Duration::from_millis(10), Duration::from_millis(100)).await);
		assert_eq!(registry.state(), RegistryState::Ready);
	}

	#[tokio::test]
	async fn wait_polls_until_another_task_finishes() {
		let registry = Arc::new(Registry::default());
		registry.force_state(RegistryState::Initializing);
		let finisher = {
			let registry = Arc::clone(&registry);
			tokio::spawn(async move {
				tokio::time::sleep(Duration::from_millis(30)).await;
				registry.force_state(RegistryState::Ready);
			})
		};
		assert!(registry.wait_ready(Duration::from_millis(5), Duration::from_secs(2)).await);
		finisher.await.expect("finisher task");
	}

	#[tokio::test]
	async fn wait_gives_up_at_ceiling() {
		let registry = Registry::default();
		registry.force_state(RegistryState::Initializing);
		assert!(!registry.wait_ready(Duration::from_millis(5), Duration::from_millis(20)).await);
	}
}
