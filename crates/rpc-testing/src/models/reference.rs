//! Block references used by the "by hash or by number" RPC method pairs.
//!
//! A reference is classified once, where it enters the harness, and then
//! travels as a [`BlockReference`]. Method selection only ever looks at
//! [`BlockReference::is_by_hash`].
use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::error::RunnerError;

/// Length of a 32 bytes hash, "0x" prefix included.
const HASH_LENGTH: usize = 66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Latest,
    Earliest,
    Pending,
}

impl BlockTag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Earliest => "earliest",
            Self::Pending => "pending",
        }
    }
}

impl FromStr for BlockTag {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            _ => Err(RunnerError::UnrecognizedReference(Value::String(
                s.to_string(),
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockReference {
    /// "0x" followed by 64 hex digits.
    Hash(String),
    Number(u64),
    Tag(BlockTag),
}

impl BlockReference {
    pub const LATEST: Self = Self::Tag(BlockTag::Latest);
    pub const EARLIEST: Self = Self::Tag(BlockTag::Earliest);
    pub const PENDING: Self = Self::Tag(BlockTag::Pending);

    /// Classifies a raw reference: a 66 characters hex string is a hash, a
    /// non-negative integer a number, `latest`/`earliest`/`pending` a tag.
    /// Anything else is rejected.
    pub fn classify(value: &Value) -> Result<Self, RunnerError> {
        match value {
            Value::String(s) if is_hash(s) => Ok(Self::Hash(s.clone())),
            Value::String(s) => s
                .parse::<BlockTag>()
                .map(Self::Tag)
                .map_err(|_| RunnerError::UnrecognizedReference(value.clone())),
            Value::Number(n) => n
                .as_u64()
                .map(Self::Number)
                .ok_or_else(|| RunnerError::UnrecognizedReference(value.clone())),
            _ => Err(RunnerError::UnrecognizedReference(value.clone())),
        }
    }

    /// Builds a hash reference, validating its shape.
    pub fn hash(hash: &str) -> Result<Self, RunnerError> {
        if is_hash(hash) {
            Ok(Self::Hash(hash.to_string()))
        } else {
            Err(RunnerError::UnrecognizedReference(Value::String(
                hash.to_string(),
            )))
        }
    }

    pub const fn is_by_hash(&self) -> bool {
        matches!(self, Self::Hash(_))
    }

    /// The reference as an RPC parameter.
    pub fn to_param(&self) -> Value {
        match self {
            Self::Hash(hash) => Value::String(hash.clone()),
            Self::Number(number) => Value::from(*number),
            Self::Tag(tag) => Value::String(tag.as_str().to_string()),
        }
    }
}

fn is_hash(s: &str) -> bool {
    s.len() == HASH_LENGTH
        && (s.starts_with("0x") || s.starts_with("0X"))
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl From<BlockTag> for BlockReference {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl From<u64> for BlockReference {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<&BlockReference> for Value {
    fn from(reference: &BlockReference) -> Self {
        reference.to_param()
    }
}

impl Serialize for BlockReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Hash(hash) => serializer.serialize_str(hash),
            Self::Number(number) => serializer.serialize_u64(*number),
            Self::Tag(tag) => serializer.serialize_str(tag.as_str()),
        }
    }
}

impl fmt::Display for BlockReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => write!(f, "{hash}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Tag(tag) => write!(f, "{}", tag.as_str()),
        }
    }
}
