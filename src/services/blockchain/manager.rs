//! Primary/fallback client pairs.
//!
//! A client manager fronts two instances of the same client type: a primary endpoint and an
//! optional fallback. Each endpoint carries a readiness flag that the runner clears when the
//! endpoint disconnects and that only a status check sets again.

use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};

use crate::models::ClientKind;

/// Capability set shared by every primary/fallback client pair
///
/// The runner functions in [`crate::services::blockchain::runner`] only need this interface, so
/// the same failover logic serves both the execution and the beacon clients.
pub trait ClientManager<C: ?Sized>: Send + Sync {
	/// The preferred endpoint
	fn primary_client(&self) -> Arc<C>;

	/// The backup endpoint, if one is configured
	fn fallback_client(&self) -> Option<Arc<C>>;

	fn is_primary_ready(&self) -> bool;

	fn is_fallback_ready(&self) -> bool;

	fn is_fallback_enabled(&self) -> bool;

	/// Name used in failover logs and errors ("Execution Client", "Beacon Client")
	fn client_type_name(&self) -> &'static str;

	fn set_primary_ready(&self, ready: bool);

	fn set_fallback_ready(&self, ready: bool);
}

/// Reference implementation of [`ClientManager`] holding the two clients and their flags
///
/// Readiness flags are plain atomics with relaxed ordering. Concurrent callers may observe a
/// stale flag for one call, which costs at most one extra failover hop.
pub struct ClientPair<C: ?Sized> {
	primary: Arc<C>,
	fallback: Option<Arc<C>>,
	primary_ready: AtomicBool,
	fallback_ready: AtomicBool,
	kind: ClientKind,
}

impl<C: ?Sized> ClientPair<C> {
	/// Creates a pair with the primary marked ready, and the fallback marked ready if present
	pub fn new(kind: ClientKind, primary: Arc<C>, fallback: Option<Arc<C>>) -> Self {
		let fallback_ready = fallback.is_some();
		Self {
			primary,
			fallback,
			primary_ready: AtomicBool::new(true),
			fallback_ready: AtomicBool::new(fallback_ready),
			kind,
		}
	}

	pub fn kind(&self) -> ClientKind {
		self.kind
	}
}

impl<C: ?Sized + Send + Sync> ClientManager<C> for ClientPair<C> {
	fn primary_client(&self) -> Arc<C> {
		self.primary.clone()
	}

	fn fallback_client(&self) -> Option<Arc<C>> {
		self.fallback.clone()
	}

	fn is_primary_ready(&self) -> bool {
		self.primary_ready.load(Ordering::Relaxed)
	}

	fn is_fallback_ready(&self) -> bool {
		self.fallback_ready.load(Ordering::Relaxed)
	}

	fn is_fallback_enabled(&self) -> bool {
		self.fallback.is_some()
	}

	fn client_type_name(&self) -> &'static str {
		self.kind.name()
	}

	fn set_primary_ready(&self, ready: bool) {
		self.primary_ready.store(ready, Ordering::Relaxed);
	}

	fn set_fallback_ready(&self, ready: bool) {
		// A missing fallback can never become ready
		self.fallback_ready
			.store(ready && self.fallback.is_some(), Ordering::Relaxed);
	}
}
