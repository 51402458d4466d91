// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use contact_relay::validator::ContactRequest;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A well-formed submission, varied by index.
pub fn valid_request(i: usize) -> ContactRequest {
    ContactRequest {
        name: format!("Visitor {i}"),
        email: format!("visitor{i}@example.com"),
        message: format!("Hello, this is message number {i} about your work."),
    }
}

/// Submissions that must all fail validation.
pub fn generate_invalid_requests() -> Vec<ContactRequest> {
    let ok = valid_request(0);
    vec![
        ContactRequest { name: String::new(), ..ok.clone() },
        ContactRequest { name: " x ".to_string(), ..ok.clone() },
        ContactRequest { name: "n".repeat(101), ..ok.clone() },
        ContactRequest { email: "not-an-email".to_string(), ..ok.clone() },
        ContactRequest { email: "a@b".to_string(), ..ok.clone() },
        ContactRequest { email: "<script>@x.com".to_string(), ..ok.clone() },
        ContactRequest { message: "hello".to_string(), ..ok.clone() },
        ContactRequest { message: "          ".to_string(), ..ok.clone() },
        ContactRequest { message: "m".repeat(5001), ..ok },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }
}
