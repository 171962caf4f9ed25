//! Get, GetNext and GetBulk over a sorted MIB snapshot.
//!
//! All functions are pure: they read the snapshot and build fresh bindings.
//! The snapshot must be sorted ascending by OID (as `mib::generate` returns it).

use crate::{
    oid::Oid,
    pdu::{Value, VarBind},
};

/// Exact-match lookup for each requested OID, in request order.
///
/// Missing OIDs produce a `NoSuchInstance` binding for the requested OID.
pub fn get(oids: &[Oid], snapshot: &[VarBind]) -> Vec<VarBind> {
    oids.iter()
        .map(|oid| match snapshot.binary_search_by(|vb| vb.oid.cmp(oid)) {
            Ok(pos) => snapshot[pos].clone(),
            Err(_) => VarBind::new(oid.clone(), Value::NoSuchInstance),
        })
        .collect()
}

/// The single successor of each requested OID.
pub fn get_next(oids: &[Oid], snapshot: &[VarBind]) -> Vec<VarBind> {
    oids.iter().flat_map(|oid| walk(oid, 1, snapshot)).collect()
}

/// GetBulk: the first `non_repeaters` OIDs get one successor, the rest up to
/// `max_repetitions` successors each.
pub fn get_bulk(
    oids: &[Oid],
    non_repeaters: u32,
    max_repetitions: u32,
    snapshot: &[VarBind],
) -> Vec<VarBind> {
    let non_repeaters = non_repeaters as usize;
    let mut out = Vec::new();

    for (i, oid) in oids.iter().enumerate() {
        let count = if i < non_repeaters {
            1
        } else {
            max_repetitions as usize
        };
        out.extend(walk(oid, count, snapshot));
    }

    out
}

/// Up to `count` snapshot entries strictly after `oid`, in ascending order.
///
/// If nothing follows `oid` (and `count > 0`), returns a single `EndOfMibView`
/// bound to `oid`. A `count` of zero yields nothing.
pub fn walk(oid: &Oid, count: usize, snapshot: &[VarBind]) -> Vec<VarBind> {
    if count == 0 {
        return Vec::new();
    }

    let start = snapshot.partition_point(|vb| vb.oid <= *oid);
    let found: Vec<VarBind> = snapshot[start..].iter().take(count).cloned().collect();

    if found.is_empty() {
        vec![VarBind::new(oid.clone(), Value::EndOfMibView)]
    } else {
        found
    }
}
