// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse patterns for security testing.

use std::time::Duration;

/// Simulated traffic pattern.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Virtual time between consecutive requests
    pub spacing: Duration,
    /// Number of unique IPs to rotate through
    pub unique_ips: usize,
    /// Whether payloads are well-formed
    pub valid_payloads: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            spacing: Duration::from_millis(100),
            unique_ips: 1,
            valid_payloads: true,
        }
    }
}

/// Predefined patterns.
impl AttackConfig {
    /// One client submitting as fast as it can.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 500,
            spacing: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Many clients, a handful of submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 2_000,
            spacing: Duration::from_millis(5),
            unique_ips: 200,
            ..Default::default()
        }
    }

    /// One client staying just under the budget.
    pub fn slow_drip(window: Duration, max_requests: u32) -> Self {
        Self {
            total_requests: 50,
            spacing: window / max_requests + Duration::from_secs(1),
            ..Default::default()
        }
    }

    /// Garbage payloads at high rate.
    pub fn invalid_payload_flood() -> Self {
        Self {
            total_requests: 300,
            spacing: Duration::from_millis(1),
            valid_payloads: false,
            ..Default::default()
        }
    }

    /// A fresh address for every request.
    pub fn key_churn() -> Self {
        Self {
            total_requests: 5_000,
            spacing: Duration::from_millis(1),
            unique_ips: 5_000,
            ..Default::default()
        }
    }
}
