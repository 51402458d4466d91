// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window admission control for contact submissions.
//!
//! Each client key owns a log of the instants at which its submissions were
//! admitted. A submission is admitted while fewer than `max_requests` of those
//! instants fall inside the trailing window `(now - window, now]`.
//!
//! The table is a sharded concurrent map. The entry guard holds the shard's
//! write lock for the whole evict/count/append sequence, so two concurrent
//! submissions for the same key can never both observe spare budget.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Fraction of the cap freed in one pass when the client table overflows.
const EVICTION_HEADROOM: usize = 20;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Submission admitted and recorded
    Admit {
        /// Submissions still available in the current window
        remaining: u32,
    },
    /// Submission rejected, nothing recorded
    Reject {
        /// Time until the oldest recorded submission leaves the window
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

/// Admitted instants for one client.
#[derive(Debug)]
struct RequestLog {
    hits: VecDeque<Instant>,
    /// Last time this client was evaluated, admitted or not
    last_seen: Instant,
}

impl RequestLog {
    fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop every instant at least `window` old. The boundary itself is expired.
    ///
    /// Callers may read the clock before taking the entry lock, so instants
    /// are not guaranteed to arrive in order.
    fn evict_expired(&mut self, now: Instant, window: Duration) {
        self.hits
            .retain(|&ts| now.saturating_duration_since(ts) < window);
    }

    fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        self.hits.iter().min().map_or(window, |&oldest| {
            window.saturating_sub(now.saturating_duration_since(oldest))
        })
    }

    fn is_idle(&self, now: Instant, window: Duration) -> bool {
        !self
            .hits
            .iter()
            .any(|&ts| now.saturating_duration_since(ts) < window)
    }
}

/// Thread-safe per-client sliding-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    logs: DashMap<String, RequestLog>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            logs: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and record a submission for `key` at the current instant.
    pub fn check(&self, key: &str) -> Decision {
        self.check_and_record(key, Instant::now())
    }

    /// Decide whether `key` may submit at `now`, recording the submission if so.
    ///
    /// Eviction, the budget check and the append all use the same `now` and
    /// happen under the entry lock for `key`.
    pub fn check_and_record(&self, key: &str, now: Instant) -> Decision {
        let window = self.config.window_duration();
        let max = self.config.max_requests as usize;

        let mut created = false;
        let decision = {
            let mut log = self.logs.entry(key.to_owned()).or_insert_with(|| {
                created = true;
                RequestLog::new(now)
            });

            log.evict_expired(now, window);
            log.last_seen = log.last_seen.max(now);

            if log.hits.len() >= max {
                Decision::Reject {
                    retry_after: log.retry_after(now, window),
                }
            } else {
                log.hits.push_back(now);
                Decision::Admit {
                    remaining: (max - log.hits.len()) as u32,
                }
            }
        };

        // The entry guard is released above; touching other shards while
        // holding it could deadlock.
        if created {
            self.enforce_capacity(key, now);
        }

        match decision {
            Decision::Admit { remaining } => debug!(client = %key, remaining, "Submission admitted"),
            Decision::Reject { retry_after } => {
                debug!(client = %key, ?retry_after, "Submission rejected")
            }
        }

        decision
    }

    /// Number of recorded submissions currently held for `key`.
    pub fn recorded(&self, key: &str) -> usize {
        self.logs.get(key).map_or(0, |log| log.hits.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    /// Remove clients with no submission inside the window. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.config.window_duration();
        let before = self.logs.len();
        self.logs.retain(|_, log| !log.is_idle(now, window));
        let removed = before.saturating_sub(self.logs.len());
        if removed > 0 {
            debug!(removed, remaining = self.logs.len(), "Swept idle clients");
        }
        removed
    }

    /// Sweep idle clients as of the current instant.
    pub fn sweep_expired(&self) -> usize {
        self.sweep(Instant::now())
    }

    /// Keep the table within `max_tracked_keys`, never evicting `keep`.
    ///
    /// Once the cap is exceeded the table is trimmed to `cap - cap / EVICTION_HEADROOM`,
    /// so the following insertions do not rescan it.
    fn enforce_capacity(&self, keep: &str, now: Instant) {
        let cap = self.config.max_tracked_keys;
        if cap == 0 || self.logs.len() <= cap {
            return;
        }
        let target = cap - cap / EVICTION_HEADROOM;

        self.sweep(now);
        let excess = self.logs.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut candidates: Vec<(Instant, String)> = self
            .logs
            .iter()
            .filter(|entry| entry.key() != keep)
            .map(|entry| (entry.value().last_seen, entry.key().clone()))
            .collect();
        let excess = excess.min(candidates.len());
        if excess == 0 {
            return;
        }
        if excess < candidates.len() {
            candidates.select_nth_unstable(excess - 1);
            candidates.truncate(excess);
        }

        warn!(evicted = excess, cap, "Client table full, evicting least recently seen");
        for (_, victim) in candidates {
            self.logs.remove(&victim);
        }
    }
}
