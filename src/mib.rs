//! Synthetic IF-MIB tree for a simulated device.
//!
//! The tree is regenerated for every request from the interface count alone,
//! so there is no state to share between requests.

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::{
    oid::Oid,
    pdu::{Value, VarBind},
};

/// IF-MIB `interfaces` group: .1.3.6.1.2.1.2
const INTERFACES: &[u32] = &[1, 3, 6, 1, 2, 1, 2];

/// IF-MIB `ifXEntry`: .1.3.6.1.2.1.31.1.1.1
const IF_X_ENTRY: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1];

/// ifTable columns: ifInOctets, ifInDiscards, ifInErrors, ifOutOctets, ifOutDiscards, ifOutErrors.
pub const IF_TABLE_COLUMNS: [u32; 6] = [10, 13, 14, 16, 19, 20];

/// ifXTable columns: ifHCInOctets, ifHCOutOctets.
pub const IF_X_TABLE_COLUMNS: [u32; 2] = [6, 10];

/// Which objects the simulated device exposes.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum MibProfile {
    /// ifNumber scalar, ifTable counters and 64-bit ifXTable counters.
    #[default]
    Full,
    /// ifTable and 64-bit ifXTable counters, no ifNumber.
    Simple,
    /// Like `simple`, but the HC counters are served as Counter32.
    Degraded,
}

impl MibProfile {
    /// Whether the ifNumber scalar is part of the tree.
    pub fn has_if_number(self) -> bool {
        matches!(self, MibProfile::Full)
    }

    /// Whether the ifXTable HC counters are 64 bits wide.
    pub fn has_counter64(self) -> bool {
        !matches!(self, MibProfile::Degraded)
    }

    /// Number of bindings `generate` yields for `if_count` interfaces.
    pub fn row_count(self, if_count: u32) -> usize {
        let per_if = IF_TABLE_COLUMNS.len() + IF_X_TABLE_COLUMNS.len();
        per_if * if_count as usize + usize::from(self.has_if_number())
    }
}

impl fmt::Display for MibProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MibProfile::Full => write!(f, "full"),
            MibProfile::Simple => write!(f, "simple"),
            MibProfile::Degraded => write!(f, "degraded"),
        }
    }
}

/// ifNumber.0: .1.3.6.1.2.1.2.1.0
pub fn if_number() -> Oid {
    let mut v = INTERFACES.to_vec();
    v.extend_from_slice(&[1, 0]);
    oid(v)
}

/// ifEntry column prefix: `.1.3.6.1.2.1.2.2.1.{column}`
pub fn if_entry_column(column: u32) -> Oid {
    let mut v = INTERFACES.to_vec();
    v.extend_from_slice(&[2, 1, column]);
    oid(v)
}

/// ifXEntry column prefix: `.1.3.6.1.2.1.31.1.1.1.{column}`
pub fn if_x_entry_column(column: u32) -> Oid {
    let mut v = IF_X_ENTRY.to_vec();
    v.push(column);
    oid(v)
}

fn oid(arcs: Vec<u32>) -> Oid {
    // Every constant above is non-empty.
    Oid::from_slice(&arcs).unwrap_or_else(|| unreachable!("MIB prefixes are never empty"))
}

/// Generates the tree for `if_count` interfaces, sorted ascending by OID.
pub fn generate(if_count: u32, profile: MibProfile) -> Vec<VarBind> {
    generate_at(if_count, profile, Utc::now())
}

/// Same as [`generate`] with an explicit clock, so counter values are reproducible.
pub fn generate_at(if_count: u32, profile: MibProfile, now: DateTime<Utc>) -> Vec<VarBind> {
    let mut bindings = Vec::with_capacity(profile.row_count(if_count));
    let tick = now.timestamp().max(0) as u64;

    if profile.has_if_number() {
        bindings.push(VarBind::new(
            if_number(),
            Value::Integer(i32::try_from(if_count).unwrap_or(i32::MAX)),
        ));
    }

    for column in IF_TABLE_COLUMNS {
        let prefix = if_entry_column(column);
        for index in 1..=if_count {
            let value = counter_value(tick, column, index) as u32;
            bindings.push(VarBind::new(prefix.child(index), Value::Counter32(value)));
        }
    }

    for column in IF_X_TABLE_COLUMNS {
        let prefix = if_x_entry_column(column);
        for index in 1..=if_count {
            let raw = counter_value(tick, column, index);
            let value = if profile.has_counter64() {
                Value::Counter64(raw)
            } else {
                Value::Counter32(raw as u32)
            };
            bindings.push(VarBind::new(prefix.child(index), value));
        }
    }

    // Column-major generation is already ordered; sort anyway so the invariant
    // does not depend on the constant tables above.
    bindings.sort_by(|a, b| a.oid.cmp(&b.oid));
    bindings
}

/// Pseudo traffic counter: grows with wall-clock seconds, differs per cell.
fn counter_value(tick: u64, column: u32, index: u32) -> u64 {
    tick.wrapping_mul(1_000 + u64::from(column))
        .wrapping_add(u64::from(index) << 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oids(bindings: &[VarBind]) -> Vec<Oid> {
        bindings.iter().map(|vb| vb.oid.clone()).collect()
    }

    #[test]
    fn test_row_count_per_profile() {
        for n in [0u32, 1, 8, 24] {
            assert_eq!(generate(n, MibProfile::Full).len(), 6 * n as usize + 1 + 2 * n as usize);
            assert_eq!(generate(n, MibProfile::Simple).len(), 8 * n as usize);
            assert_eq!(generate(n, MibProfile::Degraded).len(), 8 * n as usize);
            assert_eq!(MibProfile::Full.row_count(n), generate(n, MibProfile::Full).len());
        }
    }

    #[test]
    fn test_generate_is_sorted_and_unique() {
        let bindings = generate(12, MibProfile::Full);
        for pair in bindings.windows(2) {
            assert!(
                pair[0].oid < pair[1].oid,
                "OIDs not strictly ascending: {} >= {}",
                pair[0].oid,
                pair[1].oid
            );
        }
    }

    #[test]
    fn test_generate_same_oids_twice() {
        let first = generate(10, MibProfile::Full);
        let second = generate(10, MibProfile::Full);
        assert_eq!(oids(&first), oids(&second));
    }

    #[test]
    fn test_generate_at_is_fully_deterministic() {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            generate_at(4, MibProfile::Full, now),
            generate_at(4, MibProfile::Full, now)
        );
    }

    #[test]
    fn test_if_number_scalar() {
        let full = generate(5, MibProfile::Full);
        assert_eq!(full[0].oid.to_string(), "1.3.6.1.2.1.2.1.0");
        assert_eq!(full[0].value, Value::Integer(5));

        let simple = generate(5, MibProfile::Simple);
        assert!(simple.iter().all(|vb| vb.oid != if_number()));
    }

    #[test]
    fn test_value_types_per_table() {
        let if_table = Oid::parse("1.3.6.1.2.1.2.2.1").unwrap();
        let if_x_table = Oid::parse("1.3.6.1.2.1.31.1.1.1").unwrap();

        for vb in generate(3, MibProfile::Full) {
            if vb.oid.starts_with(&if_table) {
                assert!(matches!(vb.value, Value::Counter32(_)), "{}", vb.oid);
            } else if vb.oid.starts_with(&if_x_table) {
                assert!(matches!(vb.value, Value::Counter64(_)), "{}", vb.oid);
            }
        }

        for vb in generate(3, MibProfile::Degraded) {
            assert!(matches!(vb.value, Value::Counter32(_)), "{}", vb.oid);
        }
    }

    #[test]
    fn test_expected_cells_present() {
        let bindings = oids(&generate(2, MibProfile::Full));
        for text in [
            "1.3.6.1.2.1.2.2.1.10.1",
            "1.3.6.1.2.1.2.2.1.20.2",
            "1.3.6.1.2.1.31.1.1.1.6.1",
            "1.3.6.1.2.1.31.1.1.1.10.2",
        ] {
            assert!(bindings.contains(&Oid::parse(text).unwrap()), "missing {}", text);
        }
        assert!(!bindings.contains(&Oid::parse("1.3.6.1.2.1.2.2.1.10.3").unwrap()));
    }

    #[test]
    fn test_counters_move_with_time() {
        let t0 = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let t1 = DateTime::<Utc>::from_timestamp(1_700_000_060, 0).unwrap();
        let a = generate_at(1, MibProfile::Simple, t0);
        let b = generate_at(1, MibProfile::Simple, t1);
        assert_eq!(oids(&a), oids(&b));
        assert!(a.iter().zip(&b).all(|(x, y)| x.value != y.value));
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!(MibProfile::from_str("full", false).unwrap(), MibProfile::Full);
        assert_eq!(MibProfile::from_str("degraded", false).unwrap(), MibProfile::Degraded);
        assert!(MibProfile::from_str("bogus", false).is_err());
        assert_eq!(MibProfile::Simple.to_string(), "simple");
    }
}
