//! Error types for block template assembly.

use core::fmt;

/// Errors that can occur while turning a raw node template into a
/// [`BlockTemplate`](crate::BlockTemplate).
///
/// [`TemplateError::UnparsableTransaction`] and
/// [`TemplateError::LegacyTransactionVersion`] never escape a template build:
/// the transaction filter logs them and drops the offending transaction. All
/// other variants abort the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A payout address decoded neither as a 25-byte base58 payload nor as a
    /// 20-byte bech32 witness program.
    InvalidAddress {
        /// The offending address, verbatim.
        address: String,
    },
    /// A node-supplied transaction could not be decoded.
    UnparsableTransaction {
        /// Description of the decoding failure.
        reason: String,
    },
    /// A node-supplied transaction declares the unsupported legacy version.
    LegacyTransactionVersion {
        /// The declared version.
        version: i32,
    },
    /// The payouts requested by the template exceed the block reward.
    RewardImbalance {
        /// The (negative) pool remainder after all payouts.
        remaining: i128,
    },
    /// The raw template is missing a required field or carries an invalid one.
    MalformedTemplate {
        /// Name of the offending RPC field.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

impl TemplateError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        TemplateError::MalformedTemplate {
            field,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors the transaction filter recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TemplateError::UnparsableTransaction { .. }
                | TemplateError::LegacyTransactionVersion { .. }
        )
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::InvalidAddress { address } => {
                write!(f, "invalid address {}", address)
            }
            TemplateError::UnparsableTransaction { reason } => {
                write!(f, "unparsable transaction: {}", reason)
            }
            TemplateError::LegacyTransactionVersion { version } => {
                write!(f, "unsupported legacy transaction version {}", version)
            }
            TemplateError::RewardImbalance { remaining } => {
                write!(
                    f,
                    "payouts exceed block reward: pool remainder would be {}",
                    remaining
                )
            }
            TemplateError::MalformedTemplate { field, reason } => {
                write!(f, "malformed template field `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_address() {
        let err = TemplateError::InvalidAddress {
            address: "Rbogus".to_string(),
        };
        assert_eq!(err.to_string(), "invalid address Rbogus");
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(TemplateError::LegacyTransactionVersion { version: 1 }.is_recoverable());
        assert!(TemplateError::UnparsableTransaction {
            reason: "eof".into()
        }
        .is_recoverable());
        assert!(!TemplateError::RewardImbalance { remaining: -1 }.is_recoverable());
        assert!(!TemplateError::malformed("bits", "missing").is_recoverable());
    }
}
