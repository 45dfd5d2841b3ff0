//! Chunked validation scheduler
//!
//! A pass is a queue of entity ids drained a fixed number at a time. The
//! host calls [`ValidationScheduler::tick`] (or awaits
//! [`ValidationScheduler::drain`], which yields to the runtime between
//! chunks). Reports of a pass are staged and only published once its queue
//! is empty, so a superseded pass never leaks partial results.

use crate::core::types::EntityId;
use crate::rules::{RuleContext, RuleRegistry};
use crate::validation::report::EntityReport;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Draining(VecDeque<EntityId>),
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Entities remain; call again after yielding
    Yield { processed: usize, remaining: usize },
    /// The queue drained and its reports were published
    Idle { processed: usize },
}

#[derive(Debug)]
pub struct ValidationScheduler {
    state: SchedulerState,
    /// Ids currently in the queue
    queued: AHashSet<EntityId>,
    chunk_size: usize,
    /// Whether the current pass covers every entity
    full_pass: bool,
    generation: u64,
    staged: AHashMap<EntityId, EntityReport>,
    published: AHashMap<EntityId, EntityReport>,
}

impl Default for ValidationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ValidationScheduler {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            state: SchedulerState::Idle,
            queued: AHashSet::new(),
            chunk_size: chunk_size.max(1),
            full_pass: false,
            generation: 0,
            staged: AHashMap::new(),
            published: AHashMap::new(),
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SchedulerState::Idle)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bumped whenever a full pass replaces the queue
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> usize {
        match &self.state {
            SchedulerState::Idle => 0,
            SchedulerState::Draining(queue) => queue.len(),
        }
    }

    /// Start a full pass over `ids`.
    ///
    /// Replaces any queue in progress outright; reports staged by the
    /// superseded pass are discarded.
    pub fn request_full(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        let mut seen = AHashSet::new();
        let queue: VecDeque<EntityId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if !self.is_idle() {
            tracing::debug!(
                "Full revalidation supersedes a pass with {} entities pending",
                self.pending()
            );
        }
        self.generation += 1;
        self.full_pass = true;
        self.staged.clear();
        self.queued = seen;
        self.state = SchedulerState::Draining(queue);
    }

    /// Queue `ids` for re-check, appended to any pass in progress
    pub fn request_incremental(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        if self.is_idle() {
            self.full_pass = false;
            self.state = SchedulerState::Draining(VecDeque::new());
        }
        if let SchedulerState::Draining(queue) = &mut self.state {
            for id in ids {
                if self.queued.insert(id) {
                    queue.push_back(id);
                }
            }
        }
    }

    /// Drop everything known about a removed entity
    pub fn forget(&mut self, id: EntityId) {
        self.staged.remove(&id);
        self.published.remove(&id);
        if self.queued.remove(&id) {
            if let SchedulerState::Draining(queue) = &mut self.state {
                queue.retain(|queued| *queued != id);
            }
        }
    }

    /// Evaluate up to one chunk of the queue
    pub fn tick(&mut self, registry: &RuleRegistry, ctx: &mut RuleContext<'_>) -> Tick {
        let SchedulerState::Draining(queue) = &mut self.state else {
            return Tick::Idle { processed: 0 };
        };

        let take = self.chunk_size.min(queue.len());
        let chunk: Vec<EntityId> = queue.drain(..take).collect();
        let remaining = queue.len();
        for id in &chunk {
            self.queued.remove(id);
        }

        let entities = ctx.entities;
        let mut processed = 0;
        for id in chunk {
            let Some(entity) = entities.get(id) else {
                tracing::debug!("Entity {} was removed before validation, skipping", id);
                continue;
            };
            // A changed outline drops its memos before any rule reads them
            ctx.cache.refresh(entity);
            let report = registry.evaluate(entity, ctx);
            self.staged.insert(id, report);
            processed += 1;
        }

        if remaining > 0 {
            return Tick::Yield {
                processed,
                remaining,
            };
        }

        self.publish();
        Tick::Idle { processed }
    }

    /// Tick until the queue is empty, yielding to the runtime between chunks.
    /// Returns the number of entities evaluated.
    pub async fn drain(&mut self, registry: &RuleRegistry, ctx: &mut RuleContext<'_>) -> usize {
        let mut total = 0;
        loop {
            match self.tick(registry, ctx) {
                Tick::Yield { processed, .. } => {
                    total += processed;
                    tokio::task::yield_now().await;
                }
                Tick::Idle { processed } => return total + processed,
            }
        }
    }

    fn publish(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        tracing::debug!(
            "Publishing {} reports ({} pass)",
            staged.len(),
            if self.full_pass { "full" } else { "incremental" }
        );
        if self.full_pass {
            self.published = staged;
        } else {
            self.published.extend(staged);
        }
        self.full_pass = false;
        self.queued.clear();
        self.state = SchedulerState::Idle;
    }

    pub fn report(&self, id: EntityId) -> Option<&EntityReport> {
        self.published.get(&id)
    }

    pub fn reports(&self) -> impl Iterator<Item = &EntityReport> {
        self.published.values()
    }
}
