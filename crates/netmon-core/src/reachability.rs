//! Reachability evaluation rules
//!
//! Combines per-address probe outcomes into the two booleans a connectivity
//! cycle publishes: local-network up and internet up.
//!
//! - Local: at least one of the probed gateway addresses responded.
//! - Remote, default resolvers: at least one resolver responded.
//! - Remote, single address: exactly that address's outcome.
//! - Remote, hop list: every configured hop responded. A hop that failed to
//!   resolve never appears in the outcome map and therefore counts as not
//!   responded; an empty outcome map evaluates false rather than vacuously
//!   true.

use crate::config::RemoteCheck;
use crate::traits::ProbeReport;
use serde::{Deserialize, Serialize};

/// Result of one connectivity cycle
///
/// Immutable after creation; consumed by the publisher and by the decision
/// of whether to run a speed sample in the same wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    /// Local area network reachable
    pub local: bool,

    /// Internet reachable
    pub remote: bool,
}

/// Per-hop diagnostic entry for traceroute mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopStatus {
    /// Zero-based position in the configured hop list
    pub hop: usize,

    /// The hop's address as configured
    pub address: String,

    /// Whether the hop responded within the run
    pub responded: bool,
}

impl HopStatus {
    /// Human-readable status, matching the log rendering
    pub fn status_str(&self) -> &'static str {
        status_str(self.responded)
    }
}

/// "ok" / "no response" rendering used in logs and hop reports
pub fn status_str(ok: bool) -> &'static str {
    if ok { "ok" } else { "no response" }
}

/// Evaluate local-network reachability from a probe run
pub fn evaluate_local(report: &ProbeReport) -> bool {
    report.any_responded()
}

/// Evaluate internet reachability from a probe run, per check mode
pub fn evaluate_remote(check: &RemoteCheck, report: &ProbeReport) -> bool {
    match check {
        RemoteCheck::DefaultResolvers => report.any_responded(),
        RemoteCheck::Address(addr) => report.responded(addr),
        RemoteCheck::Traceroute(hops) => {
            // Every configured hop must be present and answering; a skipped
            // (unresolved) hop breaks the path signal.
            !hops.is_empty() && hops.iter().all(|hop| report.responded(hop))
        }
    }
}

/// Render per-hop statuses in configured order
pub fn hop_report(hops: &[String], report: &ProbeReport) -> Vec<HopStatus> {
    hops.iter()
        .enumerate()
        .map(|(hop, address)| HopStatus {
            hop,
            address: address.clone(),
            responded: report.responded(address),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn report(entries: &[(&str, bool)]) -> ProbeReport {
        ProbeReport {
            outcomes: entries
                .iter()
                .map(|(a, ok)| (a.to_string(), *ok))
                .collect(),
            skipped: Vec::new(),
        }
    }

    fn hops(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn local_up_if_any_gateway_responds() {
        let r = report(&[
            ("10.0.1.1", false),
            ("192.168.0.1", false),
            ("192.168.1.1", true),
        ]);
        assert!(evaluate_local(&r));

        let r = report(&[("10.0.1.1", false), ("192.168.0.1", false)]);
        assert!(!evaluate_local(&r));
    }

    #[test]
    fn single_address_mode_equals_that_outcome() {
        let check = RemoteCheck::Address("4.2.2.1".to_string());
        assert!(evaluate_remote(&check, &report(&[("4.2.2.1", true)])));
        assert!(!evaluate_remote(&check, &report(&[("4.2.2.1", false)])));
    }

    #[test]
    fn traceroute_requires_every_hop() {
        let check = RemoteCheck::Traceroute(hops(&["10.0.0.1", "4.2.2.1", "4.2.2.2"]));

        let all_up = report(&[("10.0.0.1", true), ("4.2.2.1", true), ("4.2.2.2", true)]);
        assert!(evaluate_remote(&check, &all_up));

        // Example from the field: hop 2 down anywhere in the list → internet down
        let one_down = report(&[("10.0.0.1", true), ("4.2.2.1", true), ("4.2.2.2", false)]);
        assert!(!evaluate_remote(&check, &one_down));

        let statuses = hop_report(
            &hops(&["10.0.0.1", "4.2.2.1", "4.2.2.2"]),
            &one_down,
        );
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[2].hop, 2);
        assert_eq!(statuses[2].address, "4.2.2.2");
        assert_eq!(statuses[2].status_str(), "no response");
        assert_eq!(statuses[0].status_str(), "ok");
    }

    #[test]
    fn unresolved_hop_counts_as_down() {
        // 4.2.2.1 failed to resolve: not in the outcome map at all
        let check = RemoteCheck::Traceroute(hops(&["10.0.0.1", "4.2.2.1"]));
        let r = ProbeReport {
            outcomes: HashMap::from([("10.0.0.1".to_string(), true)]),
            skipped: vec!["4.2.2.1".to_string()],
        };
        assert!(!evaluate_remote(&check, &r));

        let statuses = hop_report(&hops(&["10.0.0.1", "4.2.2.1"]), &r);
        assert!(!statuses[1].responded);
    }

    #[test]
    fn traceroute_over_empty_outcomes_is_down() {
        // Zero resolvable hops is zero evidence, not vacuous confirmation
        let check = RemoteCheck::Traceroute(hops(&["10.0.0.1"]));
        assert!(!evaluate_remote(&check, &ProbeReport::new()));
    }

    #[test]
    fn default_resolvers_need_only_one() {
        let check = RemoteCheck::DefaultResolvers;
        let r = report(&[("208.67.222.222", false), ("8.8.8.8", true), ("1.1.1.1", false)]);
        assert!(evaluate_remote(&check, &r));
        assert!(!evaluate_remote(&check, &ProbeReport::new()));
    }
}
