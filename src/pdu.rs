//! Request/response model shared by the dispatcher, handlers and codec.

use std::fmt;

use crate::oid::Oid;

/// SNMP message version as carried in the community-based header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Version {
    V1,
    V2c,
}

impl Version {
    /// Wire value of the version field.
    pub fn to_wire(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
        }
    }

    /// Maps the wire value back to a version, `None` for v3 and unknown values.
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            _ => None,
        }
    }
}

/// Request PDU kind. Anything other than the three read operations is `Other`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PduType {
    Get,
    GetNext,
    GetBulk,
    /// Any other PDU; carries the raw context tag.
    Other(u8),
}

impl fmt::Display for PduType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PduType::Get => write!(f, "GetRequest"),
            PduType::GetNext => write!(f, "GetNextRequest"),
            PduType::GetBulk => write!(f, "GetBulkRequest"),
            PduType::Other(0xA3) => write!(f, "SetRequest"),
            PduType::Other(tag) => write!(f, "Unknown(0x{:02X})", tag),
        }
    }
}

/// An SNMP variable binding value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Integer(i32),
    Counter32(u32),
    Counter64(u64),
    /// Placeholder value carried by requests.
    Null,
    NoSuchInstance,
    EndOfMibView,
}

impl Value {
    /// True for the v2 exception markers that carry no value.
    pub fn is_exception(&self) -> bool {
        matches!(self, Value::NoSuchInstance | Value::EndOfMibView)
    }
}

/// A variable binding (OID + value).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        VarBind { oid, value }
    }
}

/// A decoded Get/GetNext/GetBulk (or other) request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub version: Version,
    /// Passed through to the response unmodified.
    pub community: Vec<u8>,
    pub pdu_type: PduType,
    pub request_id: i32,
    /// GetBulk only; zero for other PDUs.
    pub non_repeaters: u32,
    /// GetBulk only; zero for other PDUs.
    pub max_repetitions: u32,
    pub oids: Vec<Oid>,
}

/// A GetResponse PDU ready for encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub version: Version,
    pub community: Vec<u8>,
    pub request_id: i32,
    /// SNMPv1 only: 1-based request position of the first exception, 0 when none.
    pub error_index: u32,
    pub varbinds: Vec<VarBind>,
}

impl Response {
    /// Builds a response mirroring the request header, with varbinds sorted by OID.
    pub fn for_request(request: &Request, mut varbinds: Vec<VarBind>) -> Self {
        // v1 Get/GetNext yield exactly one binding per requested OID, in request order.
        let error_index = match request.version {
            Version::V1 => varbinds
                .iter()
                .position(|vb| vb.value.is_exception())
                .map_or(0, |i| i as u32 + 1),
            Version::V2c => 0,
        };

        // Stable sort keeps the handler order for equal OIDs (e.g. repeated requests).
        varbinds.sort_by(|a, b| a.oid.cmp(&b.oid));
        Response {
            version: request.version,
            community: request.community.clone(),
            request_id: request.request_id,
            error_index,
            varbinds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_wire_values() {
        assert_eq!(Version::from_wire(0), Some(Version::V1));
        assert_eq!(Version::from_wire(1), Some(Version::V2c));
        assert_eq!(Version::from_wire(3), None);
        assert_eq!(Version::V2c.to_wire(), 1);
    }

    #[test]
    fn test_pdu_type_names() {
        assert_eq!(PduType::GetBulk.to_string(), "GetBulkRequest");
        assert_eq!(PduType::Other(0xA3).to_string(), "SetRequest");
        assert_eq!(PduType::Other(0xA7).to_string(), "Unknown(0xA7)");
    }

    #[test]
    fn test_response_sorts_and_mirrors_header() {
        let request = Request {
            version: Version::V2c,
            community: b"public".to_vec(),
            pdu_type: PduType::Get,
            request_id: 77,
            non_repeaters: 0,
            max_repetitions: 0,
            oids: vec![],
        };
        let varbinds = vec![
            VarBind::new(Oid::parse("1.2.10").unwrap(), Value::Integer(2)),
            VarBind::new(Oid::parse("1.2.9").unwrap(), Value::Integer(1)),
        ];
        let response = Response::for_request(&request, varbinds);
        assert_eq!(response.request_id, 77);
        assert_eq!(response.community, b"public");
        assert_eq!(response.varbinds[0].oid.to_string(), "1.2.9");
        assert_eq!(response.varbinds[1].oid.to_string(), "1.2.10");
    }

    #[test]
    fn test_v1_error_index_follows_request_order() {
        let request = Request {
            version: Version::V1,
            community: b"public".to_vec(),
            pdu_type: PduType::Get,
            request_id: 3,
            non_repeaters: 0,
            max_repetitions: 0,
            oids: vec![
                Oid::parse("1.3.6.1.2.1.99.0").unwrap(),
                Oid::parse("1.3.6.1.2.1.2.1.0").unwrap(),
            ],
        };
        let varbinds = vec![
            VarBind::new(Oid::parse("1.3.6.1.2.1.99.0").unwrap(), Value::NoSuchInstance),
            VarBind::new(Oid::parse("1.3.6.1.2.1.2.1.0").unwrap(), Value::Integer(4)),
        ];
        let response = Response::for_request(&request, varbinds);
        // Sorted last, but it was the first OID the manager asked for.
        assert_eq!(response.varbinds[1].value, Value::NoSuchInstance);
        assert_eq!(response.error_index, 1);
    }

    #[test]
    fn test_v2c_has_no_error_index() {
        let request = Request {
            version: Version::V2c,
            community: b"public".to_vec(),
            pdu_type: PduType::Get,
            request_id: 3,
            non_repeaters: 0,
            max_repetitions: 0,
            oids: vec![Oid::parse("1.3.6.1.2.1.99.0").unwrap()],
        };
        let varbinds = vec![VarBind::new(
            Oid::parse("1.3.6.1.2.1.99.0").unwrap(),
            Value::NoSuchInstance,
        )];
        assert_eq!(Response::for_request(&request, varbinds).error_index, 0);
    }
}
