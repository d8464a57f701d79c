//! Public identifier scheme: `<prefix><sequence>`, e.g. `REG1001`.

use crate::domain::error::DomainError;

/// Default prefix of public member ids.
pub const DEFAULT_PREFIX: &str = "REG";

/// Sequence number handed out when nothing can be continued.
pub const DEFAULT_FIRST_SEQUENCE: u64 = 1001;

/// Parses and formats sequential public identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIdScheme {
    prefix: String,
    first_sequence: u64,
}

impl Default for PublicIdScheme {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            first_sequence: DEFAULT_FIRST_SEQUENCE,
        }
    }
}

impl PublicIdScheme {
    pub fn new(prefix: &str, first_sequence: u64) -> Result<Self, DomainError> {
        if prefix.is_empty() {
            return Err(DomainError::InvalidPublicId(
                "empty identifier prefix".to_string(),
            ));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            first_sequence,
        })
    }

    /// Numeric suffix of `public_id`, if it follows the scheme.
    pub fn sequence_of(&self, public_id: &str) -> Option<u64> {
        public_id
            .strip_prefix(self.prefix.as_str())
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
    }

    pub fn format(&self, sequence: u64) -> String {
        format!("{}{}", self.prefix, sequence)
    }

    /// Identifier following `last`, or the first one if `last` is absent or
    /// does not follow the scheme.
    pub fn next_after(&self, last: Option<&str>) -> String {
        let next = last
            .and_then(|id| self.sequence_of(id))
            .and_then(|n| n.checked_add(1))
            .unwrap_or(self.first_sequence);
        self.format(next)
    }
}
