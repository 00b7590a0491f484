//! Key encoding and decoding utilities
//!
//! Maps logical Redis keys onto the flat, byte-ordered keyspace of the
//! embedded store. Every physical key starts with the same header:
//!
//! ```text
//! type_id (1 byte) | key_len (4 bytes, big-endian) | key | suffix
//! ```
//!
//! - String: header only, the value is the payload
//! - Set / Hash / ZSet marker: header only, empty value
//! - Set member: header + member, empty value
//! - Hash field: header + field, value is the field payload
//! - ZSet value index: header + member, value is the score (big-endian f64)
//! - ZSet score index: header + sortable score (8 bytes) + member, empty value
//!
//! Embedding `key_len` before the key bytes means the header of one logical
//! key is never a prefix of the header of another, so a prefix scan over
//! `header(key, type)` only ever yields records of that key.

/// Type ids, the first byte of every physical key
pub mod type_id {
    pub const STRING: u8 = 1;
    pub const SET: u8 = 2;
    pub const SET_MEMBER: u8 = 3;
    pub const HASH: u8 = 4;
    pub const HASH_FIELD: u8 = 5;
    pub const ZSET: u8 = 6;
    pub const ZSET_VALUE: u8 = 7;
    pub const ZSET_SCORE: u8 = 8;
}

/// Length of `type_id | key_len`
pub const KEY_PREFIX_LEN: usize = 5;

/// Length of an encoded score
pub const SCORE_LEN: usize = 8;

/// Top-level data type of a logical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    String,
    Set,
    Hash,
    ZSet,
}

impl KeyType {
    pub const ALL: [KeyType; 4] = [KeyType::String, KeyType::Set, KeyType::Hash, KeyType::ZSet];

    /// Type id of the record that marks a key of this type as present
    pub fn type_id(self) -> u8 {
        match self {
            KeyType::String => type_id::STRING,
            KeyType::Set => type_id::SET,
            KeyType::Hash => type_id::HASH,
            KeyType::ZSet => type_id::ZSET,
        }
    }

    pub fn from_type_id(id: u8) -> Option<Self> {
        match id {
            type_id::STRING => Some(KeyType::String),
            type_id::SET => Some(KeyType::Set),
            type_id::HASH => Some(KeyType::Hash),
            type_id::ZSET => Some(KeyType::ZSet),
            _ => None,
        }
    }

    /// Name reported by TYPE
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Set => "set",
            KeyType::Hash => "hash",
            KeyType::ZSet => "zset",
        }
    }

    /// Type ids of the element records owned by a key of this type
    pub fn element_type_ids(self) -> &'static [u8] {
        match self {
            KeyType::String => &[],
            KeyType::Set => &[type_id::SET_MEMBER],
            KeyType::Hash => &[type_id::HASH_FIELD],
            KeyType::ZSet => &[type_id::ZSET_VALUE, type_id::ZSET_SCORE],
        }
    }
}

fn key_with_capacity(key: &[u8], type_id: u8, suffix_len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(KEY_PREFIX_LEN + key.len() + suffix_len);
    result.push(type_id);
    result.extend_from_slice(&(key.len() as u32).to_be_bytes());
    result.extend_from_slice(key);
    result
}

/// Build the header `type_id | key_len | key`
pub fn get_key(key: &[u8], type_id: u8) -> Vec<u8> {
    key_with_capacity(key, type_id, 0)
}

fn get_key_with_suffix(key: &[u8], type_id: u8, suffix: &[u8]) -> Vec<u8> {
    let mut result = key_with_capacity(key, type_id, suffix.len());
    result.extend_from_slice(suffix);
    result
}

/// Marker record of a key of the given type (the string record for strings)
pub fn encode_marker(key: &[u8], key_type: KeyType) -> Vec<u8> {
    get_key(key, key_type.type_id())
}

pub fn encode_string(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::STRING)
}

pub fn encode_set(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::SET)
}

pub fn encode_set_member(key: &[u8], member: &[u8]) -> Vec<u8> {
    get_key_with_suffix(key, type_id::SET_MEMBER, member)
}

/// Lower bound (and prefix) of all members of a set
pub fn min_set_member(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::SET_MEMBER)
}

pub fn encode_hash(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::HASH)
}

pub fn encode_hash_field(key: &[u8], field: &[u8]) -> Vec<u8> {
    get_key_with_suffix(key, type_id::HASH_FIELD, field)
}

/// Lower bound (and prefix) of all fields of a hash
pub fn min_hash_field(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::HASH_FIELD)
}

pub fn encode_zset(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::ZSET)
}

/// Value index record: `member -> score`
pub fn encode_zset_value(key: &[u8], member: &[u8]) -> Vec<u8> {
    get_key_with_suffix(key, type_id::ZSET_VALUE, member)
}

/// Score index record: `(score, member) -> ()`
pub fn encode_zset_score(key: &[u8], member: &[u8], score: f64) -> Vec<u8> {
    let mut result = key_with_capacity(key, type_id::ZSET_SCORE, SCORE_LEN + member.len());
    result.extend_from_slice(&sortable_score(score));
    result.extend_from_slice(member);
    result
}

pub fn min_zset_score(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::ZSET_SCORE)
}

pub fn min_zset_value(key: &[u8]) -> Vec<u8> {
    get_key(key, type_id::ZSET_VALUE)
}

/// Split a physical key into `(type_id, key_len, remainder)`
///
/// `remainder` starts with the logical key and continues with the
/// type-specific suffix.
pub fn decode_key(encoded: &[u8]) -> Option<(u8, u32, &[u8])> {
    if encoded.len() < KEY_PREFIX_LEN {
        return None;
    }
    let type_id = encoded[0];
    let key_len = u32::from_be_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]);
    Some((type_id, key_len, &encoded[KEY_PREFIX_LEN..]))
}

/// Extract the logical key from any physical key
pub fn decode_logical_key(encoded: &[u8]) -> Option<&[u8]> {
    let (_, key_len, rest) = decode_key(encoded)?;
    rest.get(..key_len as usize)
}

/// Extract the suffix after the logical key
///
/// For set members, hash fields and zset value index records this is the
/// member (or field) itself.
pub fn decode_suffix(encoded: &[u8]) -> Option<&[u8]> {
    let (_, key_len, rest) = decode_key(encoded)?;
    rest.get(key_len as usize..)
}

/// Extract the score from a score index key
pub fn decode_zset_score(encoded: &[u8]) -> Option<f64> {
    let suffix = decode_suffix(encoded)?;
    let bytes: [u8; SCORE_LEN] = suffix.get(..SCORE_LEN)?.try_into().ok()?;
    Some(score_from_sortable(bytes))
}

/// Extract the member from a score index key
pub fn decode_zset_value(encoded: &[u8]) -> Option<&[u8]> {
    decode_suffix(encoded)?.get(SCORE_LEN..)
}

/// Encode a score as stored in the value index (plain IEEE-754, big-endian)
pub fn encode_score(score: f64) -> [u8; SCORE_LEN] {
    score.to_be_bytes()
}

/// Decode a score stored in the value index
pub fn decode_score(bytes: &[u8]) -> Option<f64> {
    let bytes: [u8; SCORE_LEN] = bytes.try_into().ok()?;
    Some(f64::from_be_bytes(bytes))
}

const SIGN_BIT: u64 = 1 << 63;

/// Order-preserving encoding of a score
///
/// Byte order of the result equals numeric order of the input, negative
/// values included: positive numbers get their sign bit set, negative
/// numbers have every bit inverted.
fn sortable_score(score: f64) -> [u8; SCORE_LEN] {
    let bits = score.to_bits();
    let bits = if bits & SIGN_BIT == 0 {
        bits | SIGN_BIT
    } else {
        !bits
    };
    bits.to_be_bytes()
}

fn score_from_sortable(bytes: [u8; SCORE_LEN]) -> f64 {
    let bits = u64::from_be_bytes(bytes);
    let bits = if bits & SIGN_BIT != 0 {
        bits & !SIGN_BIT
    } else {
        !bits
    };
    f64::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let encoded = encode_string(b"abc");
        assert_eq!(encoded, vec![1, 0, 0, 0, 3, b'a', b'b', b'c']);

        let encoded = encode_set_member(b"k", b"m");
        assert_eq!(encoded, vec![3, 0, 0, 0, 1, b'k', b'm']);
    }

    #[test]
    fn test_decode_key_round_trip() {
        for key_type in KeyType::ALL {
            let encoded = encode_marker(b"mykey", key_type);
            let (id, len, rest) = decode_key(&encoded).unwrap();
            assert_eq!(KeyType::from_type_id(id), Some(key_type));
            assert_eq!(len, 5);
            assert_eq!(rest, b"mykey");
            assert_eq!(decode_logical_key(&encoded), Some(&b"mykey"[..]));
        }
    }

    #[test]
    fn test_zset_score_key_round_trip() {
        for score in [0.0, 1.5, -2.25, 1e300, -1e-300, f64::INFINITY, f64::NEG_INFINITY] {
            let encoded = encode_zset_score(b"z", b"member", score);
            assert_eq!(decode_zset_score(&encoded), Some(score));
            assert_eq!(decode_zset_value(&encoded), Some(&b"member"[..]));
            assert_eq!(decode_logical_key(&encoded), Some(&b"z"[..]));
        }
    }

    #[test]
    fn test_member_suffix() {
        assert_eq!(decode_suffix(&encode_hash_field(b"h", b"f1")), Some(&b"f1"[..]));
        assert_eq!(decode_suffix(&encode_zset_value(b"z", b"a")), Some(&b"a"[..]));
        assert_eq!(decode_suffix(&min_set_member(b"s")), Some(&b""[..]));
    }

    #[test]
    fn test_prefix_isolation() {
        // "a" + member "b" must not fall under the prefix of key "ab"
        let prefix_ab = min_set_member(b"ab");
        let member_of_a = encode_set_member(b"a", b"b");
        assert!(!member_of_a.starts_with(&prefix_ab));

        let prefix_a = min_set_member(b"a");
        let member_of_ab = encode_set_member(b"ab", b"");
        assert!(!member_of_ab.starts_with(&prefix_a));
        assert!(member_of_a.starts_with(&prefix_a));
    }

    #[test]
    fn test_score_index_orders_numerically() {
        let scores = [f64::NEG_INFINITY, -10.5, -1.0, -0.25, 0.0, 0.5, 1.0, 42.0, f64::INFINITY];
        let encoded: Vec<Vec<u8>> = scores
            .iter()
            .map(|s| encode_zset_score(b"z", b"m", *s))
            .collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
    }

    #[test]
    fn test_ties_order_by_member() {
        let a = encode_zset_score(b"z", b"a", 3.0);
        let b = encode_zset_score(b"z", b"b", 3.0);
        assert!(a < b);
    }

    #[test]
    fn test_value_index_score() {
        let bytes = encode_score(-3.5);
        assert_eq!(bytes, (-3.5f64).to_be_bytes());
        assert_eq!(decode_score(&bytes), Some(-3.5));
        assert_eq!(decode_score(b"short"), None);
    }

    #[test]
    fn test_decode_rejects_truncated() {
        assert!(decode_key(&[1, 0, 0]).is_none());
        assert!(decode_logical_key(&[1, 0, 0, 0, 9, b'a']).is_none());
    }
}
