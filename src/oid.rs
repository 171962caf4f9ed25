//! SNMP Object Identifier model.
//!
//! OIDs compare numerically arc by arc, with a strict prefix ordering before
//! any of its extensions. This is the ordering SNMP walks rely on, so
//! `1.3.6.1.2.1.2.2.1.10.9` sorts before `1.3.6.1.2.1.2.2.1.10.10`.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors produced while parsing an OID from its dotted text form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OidError {
    #[error("Malformed OID: empty")]
    Empty,
    #[error("Malformed OID: invalid arc {arc:?} in {input:?}")]
    Malformed { input: String, arc: String },
}

/// An SNMP Object Identifier.
///
/// The derived ordering on the inner `Vec<u32>` is exactly the SNMP
/// lexicographic order: element-wise numeric, shorter prefix first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Creates a new OID from a slice of sub-identifiers.
    ///
    /// Returns `None` for an empty slice, since an OID must have at least one arc.
    pub fn from_slice(arcs: &[u32]) -> Option<Self> {
        if arcs.is_empty() {
            None
        } else {
            Some(Oid(arcs.to_vec()))
        }
    }

    /// Parses the dotted text form, e.g. `1.3.6.1.2.1.2.1.0`.
    ///
    /// A single leading dot (net-snmp style) is accepted.
    pub fn parse(text: &str) -> Result<Self, OidError> {
        let trimmed = text.strip_prefix('.').unwrap_or(text);
        if trimmed.is_empty() {
            return Err(OidError::Empty);
        }

        let arcs = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u32>().map_err(|_| OidError::Malformed {
                    input: text.to_string(),
                    arc: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Oid(arcs))
    }

    /// Returns the sub-identifiers.
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Returns the number of sub-identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: an OID holds at least one arc.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if this OID starts with `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Returns a new OID with `arc` appended.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = Vec::with_capacity(self.0.len() + 1);
        arcs.extend_from_slice(&self.0);
        arcs.push(arc);
        Oid(arcs)
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Oid::parse(s)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}
