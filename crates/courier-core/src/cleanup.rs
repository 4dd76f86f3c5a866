//! Periodic TTL cleanup.
//!
//! A background tokio task sweeps every topic on a configurable interval,
//! range-deleting log entries older than the topic's retention window,
//! messages left behind by retired generations, and staged payloads of
//! transactions that never resolved. Sweeps need no coordination with
//! publishers: the range deletes are atomic and idempotent at the engine
//! boundary, and an append racing past the cutoff is simply caught by the
//! next sweep.
//!
//! Sweep failures are logged and retried on the next interval; they are
//! never fatal.

use crate::error::Result;
use crate::message_store::MessageStore;
use crate::metadata_store::MetadataStore;
use crate::payload_store::PayloadStore;
use chrono::Utc;
use courier_commons::MessagingConfig;
use courier_store::StorageBackend;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Deletion counts of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    /// Live topics visited.
    pub topics: usize,
    /// Log entries removed (expired plus retired generations).
    pub messages_deleted: usize,
    /// Staged payloads removed.
    pub payloads_deleted: usize,
}

pub struct TtlCleanupScheduler {
    metadata: MetadataStore,
    messages: MessageStore,
    payloads: PayloadStore,
    config: MessagingConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown: Notify,
}

impl TtlCleanupScheduler {
    pub fn new(backend: Arc<dyn StorageBackend>, config: MessagingConfig) -> Result<Self> {
        Ok(Self {
            metadata: MetadataStore::new(backend.clone())?,
            messages: MessageStore::new(backend.clone())?,
            payloads: PayloadStore::new(backend)?,
            config,
            handle: Mutex::new(None),
            shutdown: Notify::new(),
        })
    }

    /// Spawns the sweep loop. The first sweep runs immediately. Calling
    /// start on a running scheduler is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            log::warn!("TTL cleanup scheduler is already running");
            return;
        }
        let scheduler = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.config.cleanup_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!(
                "TTL cleanup scheduler started (interval {}s)",
                scheduler.config.cleanup_interval_seconds
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let stats = scheduler.run_sweep();
                        if stats.messages_deleted + stats.payloads_deleted > 0 {
                            log::info!(
                                "TTL sweep over {} topic(s) deleted {} message(s), {} staged payload(s)",
                                stats.topics,
                                stats.messages_deleted,
                                stats.payloads_deleted
                            );
                        }
                    }
                    _ = scheduler.shutdown.notified() => {
                        log::info!("TTL cleanup scheduler stopped");
                        break;
                    }
                }
            }
        }));
    }

    /// Stops the sweep loop, waiting for an in-flight sweep to finish.
    /// Idempotent.
    pub async fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            self.shutdown.notify_one();
            if let Err(e) = handle.await {
                log::warn!("TTL cleanup task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Runs one sweep over every topic. Per-topic failures are logged and
    /// skipped so one broken topic cannot starve the rest.
    pub fn run_sweep(&self) -> SweepStats {
        let mut stats = SweepStats::default();
        let now = Utc::now().timestamp_millis();

        let topics = match self.metadata.list_all() {
            Ok(topics) => topics,
            Err(e) => {
                log::warn!("TTL sweep could not list topics: {}", e);
                return stats;
            }
        };

        for metadata in topics {
            stats.topics += 1;
            let topic_id = metadata.topic_id();
            let generation = metadata.generation();
            let ttl_seconds = metadata
                .ttl_seconds()
                .unwrap_or(self.config.default_ttl_seconds);
            let cutoff = now - ttl_seconds.saturating_mul(1000);

            match self.messages.delete_before(topic_id, generation, cutoff) {
                Ok(n) => stats.messages_deleted += n,
                Err(e) => log::warn!("TTL sweep failed for {} log: {}", topic_id, e),
            }
            match self.messages.delete_retired_generations(topic_id, generation) {
                Ok(n) => stats.messages_deleted += n,
                Err(e) => log::warn!("Retired-generation purge failed for {}: {}", topic_id, e),
            }
            match self.payloads.delete_before(topic_id, cutoff) {
                Ok(n) => stats.payloads_deleted += n,
                Err(e) => log::warn!("Staged-payload sweep failed for {}: {}", topic_id, e),
            }
        }

        // Topics deleted and never recreated still hold data under their
        // last generation.
        match self.metadata.list_retired() {
            Ok(retired) => {
                for (topic_id, last_generation) in retired {
                    match self
                        .messages
                        .delete_retired_generations(&topic_id, last_generation + 1)
                    {
                        Ok(n) => stats.messages_deleted += n,
                        Err(e) => {
                            log::warn!("Purge of deleted topic {} failed: {}", topic_id, e)
                        }
                    }
                    match self.payloads.delete_before(&topic_id, i64::MAX) {
                        Ok(n) => stats.payloads_deleted += n,
                        Err(e) => {
                            log::warn!("Staged purge of deleted topic {} failed: {}", topic_id, e)
                        }
                    }
                }
            }
            Err(e) => log::warn!("TTL sweep could not list deleted topics: {}", e),
        }

        stats
    }
}
