//! Expansion of `[[group]]` target entries into [`Target`]s.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use super::ConfigError;
use super::defaults::MAX_RANGE_ADDRESSES;
use super::toml::TargetEntry;
use crate::target::Target;

/// Expands `entries` into the targets of `group`, in order.
///
/// An address of the form `a.b.c.d-e.f.g.h` (both ends IPv4) expands to
/// every address in the inclusive range. Anything else is kept as written.
///
/// # Errors
///
/// Returns an error for empty addresses, reversed or oversized ranges,
/// names on range entries, and duplicate addresses.
pub fn expand_targets(group: &str, entries: &[TargetEntry]) -> Result<Vec<Target>, ConfigError> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();

    for entry in entries {
        let address = entry.address.trim();
        let invalid = |reason: &str| ConfigError::InvalidTarget {
            group: group.to_string(),
            address: entry.address.clone(),
            reason: reason.to_string(),
        };

        if address.is_empty() {
            return Err(invalid("address is empty"));
        }

        let expanded = match parse_range(address) {
            Some((start, end)) => {
                if entry.name.is_some() {
                    return Err(invalid("a range cannot have a name"));
                }
                expand_range(group, start, end).map_err(|reason| invalid(&reason))?
            }
            None => vec![Target::new(address, group).with_display_name(entry.name.as_deref())],
        };

        for target in expanded {
            if !seen.insert(target.address().to_string()) {
                return Err(ConfigError::InvalidTarget {
                    group: group.to_string(),
                    address: target.address().to_string(),
                    reason: "listed more than once".to_string(),
                });
            }
            targets.push(target);
        }
    }

    Ok(targets)
}

/// Splits `start-end` where both sides are IPv4 addresses.
fn parse_range(address: &str) -> Option<(Ipv4Addr, Ipv4Addr)> {
    let (start, end) = address.split_once('-')?;
    let start = start.trim().parse().ok()?;
    let end = end.trim().parse().ok()?;
    Some((start, end))
}

fn expand_range(group: &str, start: Ipv4Addr, end: Ipv4Addr) -> Result<Vec<Target>, String> {
    let (first, last) = (u32::from(start), u32::from(end));
    if first > last {
        return Err(format!("range start {start} is after its end {end}"));
    }
    if last - first >= MAX_RANGE_ADDRESSES {
        return Err(format!(
            "range covers more than {MAX_RANGE_ADDRESSES} addresses"
        ));
    }

    Ok((first..=last)
        .map(|n| Target::new(Ipv4Addr::from(n).to_string(), group))
        .collect())
}
