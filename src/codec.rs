//! Minimal BER codec for SNMPv1/v2c community messages (RFC 1157, RFC 3416).
//!
//! Only what the simulator needs: decoding Get/GetNext/GetBulk requests and
//! encoding GetResponse PDUs. The manager-side pair (`encode_request`,
//! `decode_response`) exists for tooling and loopback tests.

use thiserror::Error;

use crate::{
    oid::Oid,
    pdu::{PduType, Request, Response, Value, VarBind, Version},
};

// --- Universal tags ---

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

// --- Application tags (RFC 2578) ---

const TAG_COUNTER32: u8 = 0x41;
const TAG_COUNTER64: u8 = 0x46;

// --- Exception values (RFC 3416 §3) ---

const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

// --- PDU tags ---

pub const PDU_GET: u8 = 0xA0;
pub const PDU_GET_NEXT: u8 = 0xA1;
pub const PDU_RESPONSE: u8 = 0xA2;
pub const PDU_SET: u8 = 0xA3;
pub const PDU_GET_BULK: u8 = 0xA5;

/// Largest payload a single UDP/IPv4 datagram can carry.
pub const MAX_MESSAGE_SIZE: usize = 65_507;

/// SNMPv1 error-status noSuchName.
const ERROR_NO_SUCH_NAME: i32 = 2;

/// Errors raised while decoding a datagram. The datagram is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated data at offset {0}")]
    Truncated(usize),
    #[error("Unexpected tag 0x{actual:02X} at offset {offset}, expected 0x{expected:02X}")]
    UnexpectedTag {
        offset: usize,
        expected: u8,
        actual: u8,
    },
    #[error("Indefinite length at offset {0}")]
    IndefiniteLength(usize),
    #[error("Length field of {0} octets is too long")]
    LengthTooLong(usize),
    #[error("Integer of {0} octets is too long")]
    IntegerTooLong(usize),
    #[error("Unsupported SNMP version {0}")]
    UnsupportedVersion(i32),
    #[error("Malformed OID encoding at offset {0}")]
    MalformedOid(usize),
    #[error("Unsupported value tag 0x{0:02X}")]
    UnsupportedValue(u8),
    #[error("Expected PDU tag, found 0x{0:02X}")]
    NotAPdu(u8),
}

/// Errors raised while encoding a response. The response is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("OID {0} cannot be BER encoded")]
    InvalidOid(Oid),
    #[error("Counter64 value for {0} cannot be sent in an SNMPv1 message")]
    Counter64InV1(Oid),
    #[error("Encoded message of {0} bytes exceeds the UDP payload limit")]
    TooLarge(usize),
}

/// Decodes a community-based request message.
pub fn decode(bytes: &[u8]) -> Result<Request, DecodeError> {
    let (version, community, tag, mut pdu) = decode_header(bytes)?;

    let request_id = pdu.read_integer()?;
    let field1 = pdu.read_integer()?;
    let field2 = pdu.read_integer()?;
    let oids = decode_request_oids(&mut pdu)?;

    let pdu_type = match (tag, version) {
        (PDU_GET, _) => PduType::Get,
        (PDU_GET_NEXT, _) => PduType::GetNext,
        (PDU_GET_BULK, Version::V2c) => PduType::GetBulk,
        (other, _) => PduType::Other(other),
    };

    let (non_repeaters, max_repetitions) = if pdu_type == PduType::GetBulk {
        (field1.max(0) as u32, field2.max(0) as u32)
    } else {
        (0, 0)
    };

    Ok(Request {
        version,
        community,
        pdu_type,
        request_id,
        non_repeaters,
        max_repetitions,
        oids,
    })
}

/// Encodes a GetResponse message.
///
/// SNMPv1 cannot carry exception values or Counter64: an exception is
/// reported as noSuchName with `Response::error_index` (or, when that is 0,
/// the 1-based position of the first exception), and Counter64 is an error.
pub fn encode(response: &Response) -> Result<Vec<u8>, EncodeError> {
    let mut error_status = 0;
    let mut error_index = 0;

    if response.version == Version::V1 {
        if let Some(vb) = response
            .varbinds
            .iter()
            .find(|vb| matches!(vb.value, Value::Counter64(_)))
        {
            return Err(EncodeError::Counter64InV1(vb.oid.clone()));
        }
        if let Some(pos) = response.varbinds.iter().position(|vb| vb.value.is_exception()) {
            error_status = ERROR_NO_SUCH_NAME;
            error_index = if response.error_index > 0 {
                i32::try_from(response.error_index).unwrap_or(i32::MAX)
            } else {
                pos as i32 + 1
            };
        }
    }

    encode_message(
        response.version,
        &response.community,
        PDU_RESPONSE,
        response.request_id,
        error_status,
        error_index,
        &response.varbinds,
    )
}

/// Encodes a GetBulk response, dropping trailing bindings until the message
/// fits in one UDP datagram (RFC 3416 §4.2.3).
pub fn encode_fitting(response: &Response) -> Result<Vec<u8>, EncodeError> {
    match encode(response) {
        Err(EncodeError::TooLarge(_)) => {}
        other => return other,
    }

    // Invariant: a prefix of `fits` bindings encodes, one of `too_large` does not.
    let mut fits = 0;
    let mut too_large = response.varbinds.len();
    let mut trimmed = response.clone();

    while too_large - fits > 1 {
        let mid = fits + (too_large - fits) / 2;
        trimmed.varbinds = response.varbinds[..mid].to_vec();
        match encode(&trimmed) {
            Ok(_) => fits = mid,
            Err(EncodeError::TooLarge(_)) => too_large = mid,
            Err(e) => return Err(e),
        }
    }

    log::debug!(
        "Trimmed response {} from {} to {} varbinds",
        response.request_id,
        response.varbinds.len(),
        fits
    );
    trimmed.varbinds = response.varbinds[..fits].to_vec();
    encode(&trimmed)
}

/// Encodes a request message (manager side). Varbind values are NULL.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, EncodeError> {
    let (tag, field1, field2) = match request.pdu_type {
        PduType::Get => (PDU_GET, 0, 0),
        PduType::GetNext => (PDU_GET_NEXT, 0, 0),
        PduType::GetBulk => (
            PDU_GET_BULK,
            i32::try_from(request.non_repeaters).unwrap_or(i32::MAX),
            i32::try_from(request.max_repetitions).unwrap_or(i32::MAX),
        ),
        PduType::Other(tag) => (tag, 0, 0),
    };

    let varbinds: Vec<VarBind> = request
        .oids
        .iter()
        .map(|oid| VarBind::new(oid.clone(), Value::Null))
        .collect();

    encode_message(
        request.version,
        &request.community,
        tag,
        request.request_id,
        field1,
        field2,
        &varbinds,
    )
}

/// Decodes a GetResponse message (manager side).
pub fn decode_response(bytes: &[u8]) -> Result<Response, DecodeError> {
    let (version, community, tag, mut pdu) = decode_header(bytes)?;
    if tag != PDU_RESPONSE {
        return Err(DecodeError::UnexpectedTag {
            offset: 0,
            expected: PDU_RESPONSE,
            actual: tag,
        });
    }

    let request_id = pdu.read_integer()?;
    let _error_status = pdu.read_integer()?;
    let error_index = pdu.read_integer()?;
    let varbinds = decode_varbind_list(&mut pdu)?;

    Ok(Response {
        version,
        community,
        request_id,
        error_index: error_index.max(0) as u32,
        varbinds,
    })
}

/// Reads the message header up to the PDU, returning a decoder over the PDU body.
fn decode_header(bytes: &[u8]) -> Result<(Version, Vec<u8>, u8, Decoder<'_>), DecodeError> {
    let mut top = Decoder::new(bytes);
    let mut msg = top.read_constructed(TAG_SEQUENCE)?;

    let raw_version = msg.read_integer()?;
    let version =
        Version::from_wire(raw_version).ok_or(DecodeError::UnsupportedVersion(raw_version))?;
    let community = msg.read_octet_string()?.to_vec();

    let tag = msg.peek_tag()?;
    if tag & 0xE0 != 0xA0 {
        return Err(DecodeError::NotAPdu(tag));
    }
    let pdu = msg.read_constructed(tag)?;

    Ok((version, community, tag, pdu))
}

/// Request varbinds: only the OIDs matter, values are skipped whatever their type.
fn decode_request_oids(pdu: &mut Decoder<'_>) -> Result<Vec<Oid>, DecodeError> {
    let mut list = pdu.read_constructed(TAG_SEQUENCE)?;
    let mut oids = Vec::new();

    while !list.is_empty() {
        let mut vb = list.read_constructed(TAG_SEQUENCE)?;
        oids.push(vb.read_oid()?);
        vb.read_tlv()?;
    }

    Ok(oids)
}

fn decode_varbind_list(pdu: &mut Decoder<'_>) -> Result<Vec<VarBind>, DecodeError> {
    let mut list = pdu.read_constructed(TAG_SEQUENCE)?;
    let mut varbinds = Vec::new();

    while !list.is_empty() {
        let mut vb = list.read_constructed(TAG_SEQUENCE)?;
        let oid = vb.read_oid()?;
        let value = vb.read_value()?;
        varbinds.push(VarBind::new(oid, value));
    }

    Ok(varbinds)
}

// --- Decoding ---

/// Cursor over a BER buffer. Offsets in errors are relative to `base`.
struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
    base: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Decoder {
            data,
            offset: 0,
            base: 0,
        }
    }

    fn position(&self) -> usize {
        self.base + self.offset
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn peek_tag(&self) -> Result<u8, DecodeError> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or(DecodeError::Truncated(self.position()))
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_tag()?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let start = self.position();
        let first = self.read_byte()?;

        if first == 0x80 {
            return Err(DecodeError::IndefiniteLength(start));
        }
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let octets = (first & 0x7F) as usize;
        if octets > 4 {
            return Err(DecodeError::LengthTooLong(octets));
        }
        let mut len = 0usize;
        for _ in 0..octets {
            len = (len << 8) | self.read_byte()? as usize;
        }
        Ok(len)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::Truncated(self.position()))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Reads a tag + length and returns the content bytes.
    fn read_tlv(&mut self) -> Result<(u8, usize, &'a [u8]), DecodeError> {
        let tag = self.read_byte()?;
        let len = self.read_length()?;
        let content_start = self.position();
        let content = self.read_bytes(len)?;
        Ok((tag, content_start, content))
    }

    fn expect(&mut self, expected: u8) -> Result<(usize, &'a [u8]), DecodeError> {
        let offset = self.position();
        let (tag, start, content) = self.read_tlv()?;
        if tag != expected {
            return Err(DecodeError::UnexpectedTag {
                offset,
                expected,
                actual: tag,
            });
        }
        Ok((start, content))
    }

    fn read_constructed(&mut self, expected: u8) -> Result<Decoder<'a>, DecodeError> {
        let (start, content) = self.expect(expected)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            base: start,
        })
    }

    fn read_integer(&mut self) -> Result<i32, DecodeError> {
        let (start, content) = self.expect(TAG_INTEGER)?;
        decode_signed(content, start)
    }

    fn read_octet_string(&mut self) -> Result<&'a [u8], DecodeError> {
        Ok(self.expect(TAG_OCTET_STRING)?.1)
    }

    fn read_oid(&mut self) -> Result<Oid, DecodeError> {
        let (start, content) = self.expect(TAG_OID)?;
        decode_oid(content, start)
    }

    fn read_value(&mut self) -> Result<Value, DecodeError> {
        let (tag, start, content) = self.read_tlv()?;
        match tag {
            TAG_NULL => Ok(Value::Null),
            TAG_INTEGER => Ok(Value::Integer(decode_signed(content, start)?)),
            TAG_COUNTER32 => Ok(Value::Counter32(decode_unsigned(content, 4)? as u32)),
            TAG_COUNTER64 => Ok(Value::Counter64(decode_unsigned(content, 8)?)),
            TAG_NO_SUCH_OBJECT | TAG_NO_SUCH_INSTANCE => Ok(Value::NoSuchInstance),
            TAG_END_OF_MIB_VIEW => Ok(Value::EndOfMibView),
            other => Err(DecodeError::UnsupportedValue(other)),
        }
    }
}

fn decode_signed(content: &[u8], offset: usize) -> Result<i32, DecodeError> {
    if content.is_empty() {
        return Err(DecodeError::Truncated(offset));
    }
    if content.len() > 4 {
        return Err(DecodeError::IntegerTooLong(content.len()));
    }
    let mut value: i32 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &byte in content {
        value = (value << 8) | byte as i32;
    }
    Ok(value)
}

/// Unsigned value of at most `width` bytes, allowing one leading zero octet.
fn decode_unsigned(content: &[u8], width: usize) -> Result<u64, DecodeError> {
    let digits = match content {
        [0, rest @ ..] if !rest.is_empty() => rest,
        _ => content,
    };
    if digits.is_empty() || digits.len() > width {
        return Err(DecodeError::IntegerTooLong(content.len()));
    }
    Ok(digits.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

fn decode_oid(content: &[u8], offset: usize) -> Result<Oid, DecodeError> {
    let malformed = || DecodeError::MalformedOid(offset);
    let mut subids = Vec::new();
    let mut value: u64 = 0;
    let mut in_progress = false;

    for &byte in content {
        value = (value << 7) | (byte & 0x7F) as u64;
        if value > u64::from(u32::MAX) + 80 {
            return Err(malformed());
        }
        in_progress = byte & 0x80 != 0;
        if !in_progress {
            subids.push(value);
            value = 0;
        }
    }

    if in_progress || subids.is_empty() {
        return Err(malformed());
    }

    let first = subids[0];
    let (arc1, arc2) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut arcs = Vec::with_capacity(subids.len() + 1);
    arcs.push(arc1 as u32);
    arcs.push(u32::try_from(arc2).map_err(|_| malformed())?);
    for &subid in &subids[1..] {
        arcs.push(u32::try_from(subid).map_err(|_| malformed())?);
    }

    Oid::from_slice(&arcs).ok_or_else(malformed)
}

// --- Encoding ---

fn encode_message(
    version: Version,
    community: &[u8],
    pdu_tag: u8,
    request_id: i32,
    field1: i32,
    field2: i32,
    varbinds: &[VarBind],
) -> Result<Vec<u8>, EncodeError> {
    let mut list = Vec::new();
    for vb in varbinds {
        let mut entry = tlv(TAG_OID, &encode_oid(&vb.oid)?);
        entry.extend_from_slice(&encode_value(&vb.value, version));
        list.extend_from_slice(&tlv(TAG_SEQUENCE, &entry));
    }

    let mut pdu = encode_integer(request_id as i64);
    pdu.extend_from_slice(&encode_integer(field1 as i64));
    pdu.extend_from_slice(&encode_integer(field2 as i64));
    pdu.extend_from_slice(&tlv(TAG_SEQUENCE, &list));

    let mut msg = encode_integer(version.to_wire() as i64);
    msg.extend_from_slice(&tlv(TAG_OCTET_STRING, community));
    msg.extend_from_slice(&tlv(pdu_tag, &pdu));

    let out = tlv(TAG_SEQUENCE, &msg);
    if out.len() > MAX_MESSAGE_SIZE {
        return Err(EncodeError::TooLarge(out.len()));
    }
    Ok(out)
}

fn encode_value(value: &Value, version: Version) -> Vec<u8> {
    match value {
        Value::Integer(v) => encode_integer(*v as i64),
        Value::Counter32(v) => tlv(TAG_COUNTER32, &unsigned_content(*v as u64)),
        Value::Counter64(v) => tlv(TAG_COUNTER64, &unsigned_content(*v)),
        Value::Null => tlv(TAG_NULL, &[]),
        // v1 reports exceptions through error-status; the binding carries NULL.
        Value::NoSuchInstance | Value::EndOfMibView if version == Version::V1 => {
            tlv(TAG_NULL, &[])
        }
        Value::NoSuchInstance => tlv(TAG_NO_SUCH_INSTANCE, &[]),
        Value::EndOfMibView => tlv(TAG_END_OF_MIB_VIEW, &[]),
    }
}

/// Wraps `content` in a tag and definite length.
fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(content.len() + 6);
    buf.push(tag);
    encode_length(&mut buf, content.len());
    buf.extend_from_slice(content);
    buf
}

fn encode_length(buf: &mut Vec<u8>, len: usize) {
    if len <= 127 {
        buf.push(len as u8);
        return;
    }
    let bytes = (len as u32).to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    buf.push(0x80 | (4 - skip) as u8);
    buf.extend_from_slice(&bytes[skip..]);
}

/// Minimal two's-complement INTEGER.
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(TAG_INTEGER, &bytes[start..])
}

/// Minimal unsigned content, with a leading zero when the top bit is set.
fn unsigned_content(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    let mut out = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn encode_oid(oid: &Oid) -> Result<Vec<u8>, EncodeError> {
    let arcs = oid.arcs();
    let invalid = || EncodeError::InvalidOid(oid.clone());

    let arc1 = u64::from(arcs[0]);
    let arc2 = arcs.get(1).copied().map(u64::from).unwrap_or(0);
    if arc1 > 2 || (arc1 < 2 && arc2 >= 40) {
        return Err(invalid());
    }

    let mut out = Vec::with_capacity(arcs.len() + 4);
    encode_subid(&mut out, arc1 * 40 + arc2);
    for &arc in arcs.iter().skip(2) {
        encode_subid(&mut out, u64::from(arc));
    }
    Ok(out)
}

fn encode_subid(out: &mut Vec<u8>, value: u64) {
    let mut groups = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        Oid::parse(s).unwrap()
    }

    /// `snmpbulkget -v2c -c public -Cn0 -Cr18 host .1.3.6.1.2.1.2.2.1`
    const BULK_REQUEST: &[u8] = &[
        0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA5, 0x1C,
        0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x12, 0x30, 0x0E, 0x30,
        0x0C, 0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x05, 0x00,
    ];

    #[test]
    fn test_decode_bulk_request_bytes() {
        let request = decode(BULK_REQUEST).unwrap();
        assert_eq!(request.version, Version::V2c);
        assert_eq!(request.community, b"public");
        assert_eq!(request.pdu_type, PduType::GetBulk);
        assert_eq!(request.request_id, 0x12345678);
        assert_eq!(request.non_repeaters, 0);
        assert_eq!(request.max_repetitions, 18);
        assert_eq!(request.oids, vec![oid("1.3.6.1.2.1.2.2.1")]);
    }

    #[test]
    fn test_request_encode_matches_capture() {
        let request = decode(BULK_REQUEST).unwrap();
        assert_eq!(encode_request(&request).unwrap(), BULK_REQUEST);
    }

    #[test]
    fn test_negative_bulk_parameters_become_zero() {
        let request = Request {
            version: Version::V2c,
            community: b"public".to_vec(),
            pdu_type: PduType::GetBulk,
            request_id: 1,
            non_repeaters: 0,
            max_repetitions: 0,
            oids: vec![oid("1.3.6.1")],
        };
        let mut bytes = encode_request(&request).unwrap();
        // non-repeaters and max-repetitions are single-octet zeros; make them -1.
        let pos = bytes
            .windows(6)
            .position(|w| w == [0x02, 0x01, 0x00, 0x02, 0x01, 0x00])
            .unwrap();
        bytes[pos + 2] = 0xFF;
        bytes[pos + 5] = 0xFF;
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.non_repeaters, 0);
        assert_eq!(decoded.max_repetitions, 0);
    }

    #[test]
    fn test_getbulk_in_v1_is_other() {
        let mut bytes = BULK_REQUEST.to_vec();
        bytes[4] = 0x00;
        assert_eq!(decode(&bytes).unwrap().pdu_type, PduType::Other(PDU_GET_BULK));
    }

    #[test]
    fn test_set_request_is_other() {
        let request = Request {
            version: Version::V2c,
            community: b"private".to_vec(),
            pdu_type: PduType::Other(PDU_SET),
            request_id: 9,
            non_repeaters: 0,
            max_repetitions: 0,
            oids: vec![oid("1.3.6.1.2.1.1.5.0")],
        };
        let decoded = decode(&encode_request(&request).unwrap()).unwrap();
        assert_eq!(decoded.pdu_type, PduType::Other(PDU_SET));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x30, 0x05, 0x02]).is_err());
        assert!(matches!(
            decode(&[0x30, 0x80, 0x00, 0x00]),
            Err(DecodeError::IndefiniteLength(_))
        ));
        assert!(matches!(
            decode(&[0x04, 0x00]),
            Err(DecodeError::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_v3() {
        let mut bytes = BULK_REQUEST.to_vec();
        bytes[4] = 0x03;
        assert_eq!(decode(&bytes), Err(DecodeError::UnsupportedVersion(3)));
    }

    #[test]
    fn test_response_values_survive_encoding() {
        let response = Response {
            version: Version::V2c,
            community: b"public".to_vec(),
            request_id: -7,
            error_index: 0,
            varbinds: vec![
                VarBind::new(oid("1.3.6.1.2.1.2.1.0"), Value::Integer(24)),
                VarBind::new(oid("1.3.6.1.2.1.2.2.1.10.1"), Value::Counter32(u32::MAX)),
                VarBind::new(oid("1.3.6.1.2.1.31.1.1.1.6.1"), Value::Counter64(u64::MAX)),
                VarBind::new(oid("1.3.6.1.2.1.99.0"), Value::NoSuchInstance),
                VarBind::new(oid("1.3.6.1.2.1.31.1.1.1.10.200"), Value::EndOfMibView),
            ],
        };
        let bytes = encode(&response).unwrap();
        assert_eq!(decode_response(&bytes).unwrap(), response);
    }

    #[test]
    fn test_v1_exception_sets_error_status() {
        let response = Response {
            version: Version::V1,
            community: b"public".to_vec(),
            request_id: 1,
            error_index: 0,
            varbinds: vec![
                VarBind::new(oid("1.3.6.1.2.1.2.1.0"), Value::Integer(1)),
                VarBind::new(oid("1.3.6.1.2.1.99.0"), Value::NoSuchInstance),
            ],
        };
        let bytes = encode(&response).unwrap();
        // request-id, error-status, error-index follow the 0xA2 header.
        let pdu = bytes.iter().position(|&b| b == PDU_RESPONSE).unwrap();
        assert_eq!(&bytes[pdu + 2..pdu + 11], &[0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02, 0x01, 0x02]);
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.varbinds[1].value, Value::Null);
    }

    #[test]
    fn test_v1_counter64_is_encode_error() {
        let response = Response {
            version: Version::V1,
            community: b"public".to_vec(),
            request_id: 1,
            error_index: 0,
            varbinds: vec![VarBind::new(oid("1.3.6.1.2.1.31.1.1.1.6.1"), Value::Counter64(5))],
        };
        assert!(matches!(encode(&response), Err(EncodeError::Counter64InV1(_))));
    }

    #[test]
    fn test_invalid_oid_is_encode_error() {
        let response = Response {
            version: Version::V2c,
            community: vec![],
            request_id: 1,
            error_index: 0,
            varbinds: vec![VarBind::new(oid("3.1"), Value::Integer(1))],
        };
        assert!(matches!(encode(&response), Err(EncodeError::InvalidOid(_))));
    }

    #[test]
    fn test_integer_encoding_is_minimal() {
        assert_eq!(encode_integer(0), vec![0x02, 0x01, 0x00]);
        assert_eq!(encode_integer(127), vec![0x02, 0x01, 0x7F]);
        assert_eq!(encode_integer(128), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(encode_integer(-1), vec![0x02, 0x01, 0xFF]);
        assert_eq!(encode_integer(-129), vec![0x02, 0x02, 0xFF, 0x7F]);
    }

    #[test]
    fn test_long_form_length() {
        let mut buf = Vec::new();
        encode_length(&mut buf, 300);
        assert_eq!(buf, vec![0x82, 0x01, 0x2C]);
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.read_length().unwrap(), 300);
    }

    #[test]
    fn test_large_arc_oid() {
        let original = oid("1.3.6.1.4.1.99999.4294967295");
        let encoded = encode_oid(&original).unwrap();
        assert_eq!(decode_oid(&encoded, 0).unwrap(), original);
    }

    #[test]
    fn test_v1_error_index_taken_from_response() {
        let response = Response {
            version: Version::V1,
            community: b"public".to_vec(),
            request_id: 1,
            error_index: 1,
            varbinds: vec![
                VarBind::new(oid("1.3.6.1.2.1.2.1.0"), Value::Integer(1)),
                VarBind::new(oid("1.3.6.1.2.1.99.0"), Value::NoSuchInstance),
            ],
        };
        let decoded = decode_response(&encode(&response).unwrap()).unwrap();
        assert_eq!(decoded.error_index, 1);
    }

    fn oversized_response(count: u32) -> Response {
        Response {
            version: Version::V2c,
            community: b"public".to_vec(),
            request_id: 5,
            error_index: 0,
            varbinds: (0..count)
                .map(|i| {
                    let text = format!("1.3.6.1.4.1.99999.4294967295.4294967295.{}", i);
                    VarBind::new(oid(&text), Value::Counter64(u64::MAX))
                })
                .collect(),
        }
    }

    #[test]
    fn test_fitting_trims_trailing_varbinds() {
        let response = oversized_response(3000);
        assert!(matches!(encode(&response), Err(EncodeError::TooLarge(_))));

        let bytes = encode_fitting(&response).unwrap();
        assert!(bytes.len() <= MAX_MESSAGE_SIZE);

        let decoded = decode_response(&bytes).unwrap();
        let kept = decoded.varbinds.len();
        assert!(kept > 1000 && kept < 3000);
        assert_eq!(decoded.varbinds[..], response.varbinds[..kept]);

        // One more binding would not have fitted.
        let mut longer = response.clone();
        longer.varbinds.truncate(kept + 1);
        assert!(matches!(encode(&longer), Err(EncodeError::TooLarge(_))));
    }

    #[test]
    fn test_fitting_keeps_small_response_intact() {
        let response = oversized_response(10);
        assert_eq!(encode_fitting(&response).unwrap(), encode(&response).unwrap());
    }
}
