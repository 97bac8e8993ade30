//! Client identifier discovery
//!
//! Every measurement carries a stable client identifier so one database can
//! hold data from several monitoring hosts. Without an explicit `--mac`
//! override the identifier is the MAC address of the most plausible primary
//! interface: wireless first, then wired, then anything with a non-empty
//! hardware address.

use anyhow::{Context, Result, anyhow};
use if_addrs::get_if_addrs;
use std::collections::HashSet;

/// An interface considered for the client identifier
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub mac: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterfaceClass {
    Wireless,
    Wired,
    Other,
}

/// Classify an interface by its name
///
/// Name-based, like every OS tool that guesses link types: wlan0/wlp2s0 and
/// friends are wireless, eth0/enp3s0/igb0 wired, the rest unknown.
fn classify(name: &str) -> InterfaceClass {
    let clean = name.to_lowercase().replace('-', "");

    if clean.contains("wifi") || clean.contains("wlan") || clean.contains("wlp") {
        InterfaceClass::Wireless
    } else if clean.contains("ethernet")
        || clean.contains("eth")
        || clean.contains("enp")
        || clean.contains("igb")
    {
        InterfaceClass::Wired
    } else {
        InterfaceClass::Other
    }
}

fn usable_mac(candidate: &Candidate) -> Option<String> {
    candidate
        .mac
        .clone()
        .filter(|mac| !mac.is_empty() && mac != "00:00:00:00:00:00")
}

/// Pick the client identifier from a candidate list
///
/// Preference order: wireless, wired, then any interface with a usable MAC.
pub fn select_client_id(candidates: &[Candidate]) -> Option<String> {
    for class in [InterfaceClass::Wireless, InterfaceClass::Wired] {
        if let Some(mac) = candidates
            .iter()
            .filter(|c| classify(&c.name) == class)
            .find_map(usable_mac)
        {
            return Some(mac);
        }
    }
    candidates.iter().find_map(usable_mac)
}

/// Discover the client identifier from the host's interfaces
pub fn discover() -> Result<String> {
    let if_addrs = get_if_addrs().context("failed to enumerate network interfaces")?;

    // One candidate per interface name; an interface appears once per
    // address family in the enumeration
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for if_addr in if_addrs {
        if !seen.insert(if_addr.name.clone()) {
            continue;
        }
        let mac = mac_address::mac_address_by_name(&if_addr.name)
            .ok()
            .flatten()
            .map(|mac| mac.to_string().to_lowercase());
        candidates.push(Candidate {
            name: if_addr.name,
            mac,
        });
    }

    select_client_id(&candidates).ok_or_else(|| {
        anyhow!(
            "no network interface with a MAC address found; \
            set one explicitly with --mac \"XX:XX:XX:XX:XX:XX\""
        )
    })
}
