//! Reusable scratch buffers for decoding committees responses.
//!
//! A committees response lists every validator of every committee of an epoch and easily runs
//! into tens of megabytes. Reading it into a fresh `Vec` on every request means growing a large
//! allocation from scratch each time, so decoders (a body buffer that keeps its capacity) are
//! pooled instead.
//!
//! Contract: a decoder handed out by [`CommitteesDecoderPool::checkout`] always has an empty
//! buffer. The guard resets the buffer when it is dropped, before the decoder goes back into the
//! pool, whether decoding succeeded or not.

use serde::de::DeserializeOwned;
use std::{
	ops::{Deref, DerefMut},
	sync::Mutex,
};

/// Number of idle decoders kept by default
pub const DEFAULT_MAX_IDLE_DECODERS: usize = 4;

/// Scratch buffer for one committees response
#[derive(Debug, Default)]
pub struct CommitteesDecoder {
	buffer: Vec<u8>,
}

impl CommitteesDecoder {
	/// The buffer the response body is read into
	pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
		&mut self.buffer
	}

	pub fn buffer(&self) -> &[u8] {
		&self.buffer
	}

	/// Decodes the buffered body
	pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_slice(&self.buffer)
	}

	/// Empties the buffer while keeping its allocation
	fn reset(&mut self) {
		self.buffer.clear();
	}

	pub fn capacity(&self) -> usize {
		self.buffer.capacity()
	}
}

/// Pool of [`CommitteesDecoder`]s shared by all requests of a provider
#[derive(Debug)]
pub struct CommitteesDecoderPool {
	idle: Mutex<Vec<CommitteesDecoder>>,
	max_idle: usize,
}

impl Default for CommitteesDecoderPool {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_IDLE_DECODERS)
	}
}

impl CommitteesDecoderPool {
	/// Creates an empty pool that keeps at most `max_idle` decoders around
	pub fn new(max_idle: usize) -> Self {
		Self {
			idle: Mutex::new(Vec::new()),
			max_idle,
		}
	}

	/// Takes an idle decoder, or creates one if the pool is empty
	pub fn checkout(&self) -> PooledDecoder<'_> {
		let decoder = self
			.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.pop()
			.unwrap_or_default();
		PooledDecoder {
			pool: self,
			decoder,
		}
	}

	/// Number of decoders waiting in the pool
	pub fn idle_count(&self) -> usize {
		self.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.len()
	}

	fn checkin(&self, mut decoder: CommitteesDecoder) {
		decoder.reset();
		let mut idle = self
			.idle
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		if idle.len() < self.max_idle {
			idle.push(decoder);
		}
	}
}

/// A decoder checked out of a [`CommitteesDecoderPool`]; returned to the pool on drop
pub struct PooledDecoder<'a> {
	pool: &'a CommitteesDecoderPool,
	decoder: CommitteesDecoder,
}

impl Deref for PooledDecoder<'_> {
	type Target = CommitteesDecoder;

	fn deref(&self) -> &Self::Target {
		&self.decoder
	}
}

impl DerefMut for PooledDecoder<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.decoder
	}
}

impl Drop for PooledDecoder<'_> {
	fn drop(&mut self) {
		self.pool.checkin(std::mem::take(&mut self.decoder));
	}
}
