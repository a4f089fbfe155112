//! Failover runner shared by all client managers.
//!
//! Every call made through a client manager goes through [`run_function1`] (or one of its arity
//! wrappers). The call is made against the primary while it is ready. Only a disconnection marks
//! an endpoint as not ready and moves on to the fallback; every other error is returned as is.

use std::{future::Future, sync::Arc};

use crate::services::blockchain::{BlockChainError, ClientManager};

/// Runs `function` against the first ready client of `manager`
///
/// # Behaviour
/// - Primary ready: the primary is called. On a disconnection it is marked not ready and the
///   call is retried on the fallback if one is configured, otherwise the call fails with
///   [`BlockChainError::AllEndpointsFailed`].
/// - Fallback ready: the fallback is called. On a disconnection it is marked not ready and the
///   call fails with [`BlockChainError::AllEndpointsFailed`].
/// - Neither ready: fails with [`BlockChainError::NoEndpointsReady`] without making a call.
pub async fn run_function1<C, M, R, F, Fut>(manager: &M, function: F) -> Result<R, BlockChainError>
where
	C: ?Sized + Send + Sync,
	M: ClientManager<C> + ?Sized,
	F: Fn(Arc<C>) -> Fut,
	Fut: Future<Output = Result<R, BlockChainError>>,
{
	let type_name = manager.client_type_name();

	if manager.is_primary_ready() {
		match function(manager.primary_client()).await {
			Ok(result) => return Ok(result),
			Err(err) if err.is_disconnection() => {
				manager.set_primary_ready(false);
				if !manager.is_fallback_enabled() {
					tracing::warn!(
						error = %err,
						"Primary {} disconnected and no fallback is configured.",
						type_name
					);
					return Err(BlockChainError::all_endpoints_failed(
						type_name,
						Some(Box::new(err)),
					));
				}
				tracing::warn!(
					error = %err,
					"Primary {} disconnected, using fallback...",
					type_name
				);
			}
			Err(err) => return Err(err),
		}
	}

	if manager.is_fallback_ready() {
		if let Some(fallback) = manager.fallback_client() {
			return match function(fallback).await {
				Ok(result) => Ok(result),
				Err(err) if err.is_disconnection() => {
					tracing::warn!(error = %err, "Fallback {} disconnected", type_name);
					manager.set_fallback_ready(false);
					Err(BlockChainError::all_endpoints_failed(
						type_name,
						Some(Box::new(err)),
					))
				}
				Err(err) => Err(err),
			};
		}
	}

	Err(BlockChainError::no_endpoints_ready(type_name))
}

/// Runs a function that only reports success or failure
pub async fn run_function0<C, M, F, Fut>(manager: &M, function: F) -> Result<(), BlockChainError>
where
	C: ?Sized + Send + Sync,
	M: ClientManager<C> + ?Sized,
	F: Fn(Arc<C>) -> Fut,
	Fut: Future<Output = Result<(), BlockChainError>>,
{
	run_function1(manager, function).await
}

/// Runs a function that produces two values
pub async fn run_function2<C, M, R1, R2, F, Fut>(
	manager: &M,
	function: F,
) -> Result<(R1, R2), BlockChainError>
where
	C: ?Sized + Send + Sync,
	M: ClientManager<C> + ?Sized,
	F: Fn(Arc<C>) -> Fut,
	Fut: Future<Output = Result<(R1, R2), BlockChainError>>,
{
	run_function1(manager, function).await
}
