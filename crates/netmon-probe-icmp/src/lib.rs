// # ICMP Echo Prober
//
// This crate provides an ICMP-based Prober for the netmon system.
//
// ## Architecture
//
// One probe run opens one ICMP client, resolves every address, and sends one
// echo request per address as a concurrent task. The run completes when every
// task has either received a reply or hit the run timeout, so it terminates
// even when every address is silent.
//
// Addresses that fail to resolve (or resolve to no IPv4 address) are logged
// and excluded from the outcome map entirely; they are a pass-through
// failure, not part of the up/down signal. Only a transport-setup failure
// (e.g. no permission to open an ICMP socket) fails the run itself.
//
// ## Privileges
//
// surge-ping uses unprivileged ICMP datagram sockets where available; on
// Linux this typically requires `net.ipv4.ping_group_range` to cover the
// process or CAP_NET_RAW.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use netmon_core::traits::{ProbeReport, Prober};
use netmon_core::{Error, Result};
use surge_ping::{Client, Config, PingIdentifier, PingSequence};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Echo payload; 56 data bytes like classic ping
const PAYLOAD: [u8; 56] = [0; 56];

/// ICMP echo prober
///
/// Stateless between runs: each probe run opens its own client, so a
/// transient transport failure surfaces per run instead of wedging the
/// prober for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct IcmpProber;

impl IcmpProber {
    /// Create a new ICMP prober
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, addresses: &[String], timeout: Duration) -> Result<ProbeReport> {
        let mut report = ProbeReport::new();

        // Resolve first so setup cost is only paid when something will be sent
        let mut targets = Vec::with_capacity(addresses.len());
        for address in addresses {
            match resolve_v4(address).await {
                Ok(ip) => targets.push((address.clone(), ip)),
                Err(e) => {
                    warn!("skipping {address}: {e}");
                    report.skipped.push(address.clone());
                }
            }
        }

        if targets.is_empty() {
            return Ok(report);
        }

        let client = Client::new(&Config::default())
            .map_err(|e| Error::probe(format!("failed to open ICMP socket: {e}")))?;

        let ident = PingIdentifier(std::process::id() as u16);
        let mut tasks = JoinSet::new();
        for (address, ip) in targets {
            let client = client.clone();
            tasks.spawn(async move {
                let mut pinger = client.pinger(ip, ident).await;
                pinger.timeout(timeout);
                let responded = match pinger.ping(PingSequence(0), &PAYLOAD).await {
                    Ok((_packet, rtt)) => {
                        debug!("{address} answered in {rtt:?}");
                        true
                    }
                    Err(e) => {
                        debug!("{address} no response: {e}");
                        false
                    }
                };
                (address, responded)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((address, responded)) => {
                    report.outcomes.insert(address, responded);
                }
                Err(e) => {
                    // A panicked probe task loses that address's outcome but
                    // must not sink the run
                    warn!("probe task failed: {e}");
                }
            }
        }

        Ok(report)
    }
}

/// Resolve an address to an IPv4 target
///
/// IP literals short-circuit name resolution. Hostnames resolve through the
/// system resolver; only IPv4 results are considered since echoes go out the
/// v4 client.
async fn resolve_v4(address: &str) -> Result<IpAddr> {
    if let Ok(ip) = address.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(_) => Ok(ip),
            IpAddr::V6(_) => Err(Error::resolve(format!("{address} is not an IPv4 address"))),
        };
    }

    let mut candidates = tokio::net::lookup_host((address, 0))
        .await
        .map_err(|e| Error::resolve(format!("cannot resolve {address}: {e}")))?;

    candidates
        .find(|sockaddr| sockaddr.is_ipv4())
        .map(|sockaddr| sockaddr.ip())
        .ok_or_else(|| Error::resolve(format!("{address} has no IPv4 address")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ip_literal_resolves_without_dns() {
        let ip = resolve_v4("192.168.1.1").await.unwrap();
        assert_eq!(ip, "192.168.1.1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn ipv6_literal_is_rejected() {
        assert!(resolve_v4("::1").await.is_err());
    }

    #[tokio::test]
    async fn empty_address_list_completes_without_a_socket() {
        // No targets → no transport setup, empty report
        let prober = IcmpProber::new();
        let report = prober.probe(&[], Duration::from_secs(1)).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.skipped.is_empty());
    }
}
