//! 식별자(ObjectId)
//!
//! 레코드의 `_id`는 스토리지 계층이 할당합니다. 클라이언트 입력으로는 절대 생성되지 않습니다.
//!
//! # 형식
//!
//! 12바이트 = 4바이트 타임스탬프(초, big-endian) + 5바이트 프로세스 랜덤 + 3바이트 카운터.
//! 문자열 표현은 24자 소문자 hex이며, 비교는 항상 이 정규 문자열 형태로 합니다.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// 레코드 식별자 필드 이름
pub const ID_FIELD: &str = "_id";

/// ObjectId
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl ObjectId {
    /// 새 ObjectId 생성
    pub fn new() -> Self {
        use rand::Rng;

        let secs = chrono::Utc::now().timestamp() as u32;
        let unique = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00ff_ffff)))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// 24자 hex 문자열에서 파싱 (대소문자 무관)
    pub fn parse_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::Validation {
            field: ID_FIELD.to_string(),
            message: format!("expected 24 hex characters: {}", e),
        })?;
        Ok(Self(bytes))
    }

    /// 정규 문자열 형태 (소문자 hex)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// 문자열이 ObjectId 형식인지 확인
    pub fn is_valid(s: &str) -> bool {
        s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ObjectId::parse_str(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_unique_and_hex() {
        let a = ObjectId::new();
        let b = ObjectId::new();

        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), 24);
        assert!(ObjectId::is_valid(&a.to_hex()));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let upper = ObjectId::parse_str("64B0000000000000000000AB").unwrap();
        let lower = ObjectId::parse_str("64b0000000000000000000ab").unwrap();

        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), "64b0000000000000000000ab");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ObjectId::parse_str("123").is_err());
        assert!(ObjectId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(!ObjectId::is_valid("64b00000000000000000000"));
    }

    #[test]
    fn test_round_trip_through_hex() {
        let id = ObjectId::new();
        assert_eq!(ObjectId::parse_str(&id.to_hex()).unwrap(), id);
        assert!(ObjectId::parse_str("64b0000000000000000000ab00").is_err());
    }
}
