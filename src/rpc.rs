//! Raw `getblocktemplate` model.
//!
//! [`RawTemplate`] mirrors the JSON object a Raptoreum-family node returns
//! from `getblocktemplate`. Optional reward categories are resolved into
//! typed values while deserializing, so the rest of the crate never inspects
//! JSON shapes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TemplateError;

/// The node's block template, as returned over RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTemplate {
    /// Height of the block being built.
    pub height: u64,
    /// Display-order hex hash of the chain tip.
    #[serde(default)]
    pub previousblockhash: Option<String>,
    /// Display-order hex of the full 256-bit target.
    #[serde(default)]
    pub target: Option<String>,
    /// Node clock, Unix seconds.
    pub curtime: u32,
    /// Compact target, 8 hex digits, big-endian.
    #[serde(default)]
    pub bits: Option<String>,
    /// Block header version.
    pub version: i32,
    /// Subsidy plus fees available to the coinbase.
    pub coinbasevalue: u64,
    #[serde(default)]
    pub coinbasedevreward: Option<DevReward>,
    #[serde(
        default,
        alias = "masternode",
        deserialize_with = "deserialize_node_payees",
        skip_serializing_if = "NodePayeeSet::is_none"
    )]
    pub smartnode: NodePayeeSet,
    #[serde(default)]
    pub superblock: Vec<PayeeEntry>,
    #[serde(default)]
    pub founder: Option<PayeeEntry>,
    #[serde(default)]
    pub founder_payments_started: bool,
    #[serde(default)]
    pub coinbaseaux: Option<CoinbaseAux>,
    /// Hex payload for special coinbase transactions.
    #[serde(default)]
    pub coinbase_payload: Option<String>,
    /// Hex locking script of the segwit commitment output.
    #[serde(default)]
    pub default_witness_commitment: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
}

/// Developer reward paid to a fixed locking script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevReward {
    /// Hex locking script.
    pub scriptpubkey: String,
    pub value: u64,
}

/// A payee described by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeEntry {
    pub payee: String,
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseAux {
    /// Hex bytes appended to the coinbase scriptSig after the height.
    #[serde(default)]
    pub flags: Option<String>,
}

/// A node-selected transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTransaction {
    /// Hex serialized transaction.
    pub data: String,
    /// Declared transaction version, when the node reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Smartnode (masternode) payees for this block.
///
/// Nodes report either a single payee object or an ordered list of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodePayeeSet {
    #[default]
    None,
    Single(PayeeEntry),
    Many(Vec<PayeeEntry>),
}

impl NodePayeeSet {
    pub fn is_none(&self) -> bool {
        matches!(self, NodePayeeSet::None)
    }

    /// The payees in payout order.
    pub fn payees(&self) -> &[PayeeEntry] {
        match self {
            NodePayeeSet::None => &[],
            NodePayeeSet::Single(payee) => core::slice::from_ref(payee),
            NodePayeeSet::Many(payees) => payees,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodePayeeShape {
    Many(Vec<PayeeEntry>),
    Single(PayeeEntry),
    Other(serde::de::IgnoredAny),
}

// Any shape other than a payee object or a list of them carries no payout.
fn deserialize_node_payees<'de, D>(deserializer: D) -> Result<NodePayeeSet, D::Error>
where
    D: Deserializer<'de>,
{
    let shape = Option::<NodePayeeShape>::deserialize(deserializer)?;
    Ok(match shape {
        Some(NodePayeeShape::Many(payees)) => NodePayeeSet::Many(payees),
        Some(NodePayeeShape::Single(payee)) => NodePayeeSet::Single(payee),
        Some(NodePayeeShape::Other(_)) | None => NodePayeeSet::None,
    })
}

impl RawTemplate {
    /// Parse the `result` object of a `getblocktemplate` response.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MalformedTemplate`] if the JSON does not match
    /// the template model.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(json).map_err(|e| TemplateError::malformed("result", e.to_string()))
    }

    /// Developer reward value, zero when absent.
    pub fn dev_reward_value(&self) -> u64 {
        self.coinbasedevreward.as_ref().map(|d| d.value).unwrap_or(0)
    }

    /// Decoded coinbase auxiliary flags, empty when absent.
    pub fn aux_flags(&self) -> Result<Vec<u8>, TemplateError> {
        match self.coinbaseaux.as_ref().and_then(|aux| aux.flags.as_deref()) {
            Some(flags) => decode_hex("coinbaseaux.flags", flags),
            None => Ok(Vec::new()),
        }
    }

    /// Decoded special-transaction payload.
    pub fn payload(&self) -> Result<Option<Vec<u8>>, TemplateError> {
        self.coinbase_payload
            .as_deref()
            .map(|p| decode_hex("coinbase_payload", p))
            .transpose()
    }

    /// Decoded witness commitment locking script.
    pub fn witness_commitment(&self) -> Result<Option<Vec<u8>>, TemplateError> {
        self.default_witness_commitment
            .as_deref()
            .map(|c| decode_hex("default_witness_commitment", c))
            .transpose()
    }

    /// The previous block hash in display order.
    pub fn previous_block_hash(&self) -> Result<[u8; 32], TemplateError> {
        let hex = required("previousblockhash", &self.previousblockhash)?;
        let bytes = decode_hex("previousblockhash", hex)?;
        bytes.as_slice().try_into().map_err(|_| {
            TemplateError::malformed(
                "previousblockhash",
                format!("expected 32 bytes, got {}", bytes.len()),
            )
        })
    }

    /// The compact target as the node prints it (big-endian).
    pub fn bits_bytes(&self) -> Result<[u8; 4], TemplateError> {
        let hex = required("bits", &self.bits)?;
        let bytes = decode_hex("bits", hex)?;
        bytes.as_slice().try_into().map_err(|_| {
            TemplateError::malformed(
                "bits",
                format!("expected 4 bytes, got {}", bytes.len()),
            )
        })
    }

    /// The full target, big-endian, at most 32 bytes.
    pub fn target_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let hex = required("target", &self.target)?;
        let bytes = decode_hex("target", hex)?;
        if bytes.len() > 32 {
            return Err(TemplateError::malformed(
                "target",
                format!("expected at most 32 bytes, got {}", bytes.len()),
            ));
        }
        Ok(bytes)
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, TemplateError> {
    value
        .as_deref()
        .ok_or_else(|| TemplateError::malformed(field, "missing"))
}

pub(crate) fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, TemplateError> {
    hex::decode(value).map_err(|e| TemplateError::malformed(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_smartnode() {
        let raw: RawTemplate = serde_json::from_str(
            r#"{"height":1,"curtime":0,"version":4,"coinbasevalue":10,
                "smartnode":{"payee":"Raddr","amount":3,"script":"76a9"}}"#,
        )
        .unwrap();
        assert_eq!(
            raw.smartnode,
            NodePayeeSet::Single(PayeeEntry {
                payee: "Raddr".into(),
                amount: 3
            })
        );
        assert_eq!(raw.smartnode.payees().len(), 1);
    }

    #[test]
    fn test_smartnode_list_and_masternode_alias() {
        let raw: RawTemplate = serde_json::from_str(
            r#"{"height":1,"curtime":0,"version":4,"coinbasevalue":10,
                "masternode":[{"payee":"A","amount":1},{"payee":"B","amount":2}]}"#,
        )
        .unwrap();
        let payees = raw.smartnode.payees();
        assert_eq!(payees.len(), 2);
        assert_eq!(payees[1].payee, "B");
    }

    #[test]
    fn test_smartnode_other_shapes_are_none() {
        for value in ["{}", "null", "\"\"", "7"] {
            let json = format!(
                r#"{{"height":1,"curtime":0,"version":4,"coinbasevalue":10,"smartnode":{}}}"#,
                value
            );
            let raw: RawTemplate = serde_json::from_str(&json).unwrap();
            assert!(raw.smartnode.is_none(), "shape {}", value);
        }
    }

    #[test]
    fn test_founder_amount_defaults_to_zero() {
        let raw: RawTemplate = serde_json::from_str(
            r#"{"height":1,"curtime":0,"version":4,"coinbasevalue":10,
                "founder":{"payee":"F"},"founder_payments_started":true}"#,
        )
        .unwrap();
        assert_eq!(raw.founder.unwrap().amount, 0);
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        let err = RawTemplate::from_json(r#"{"height":"tall"}"#).unwrap_err();
        assert!(matches!(err, TemplateError::MalformedTemplate { field: "result", .. }));
    }

    #[test]
    fn test_missing_required_hex_fields() {
        let raw = RawTemplate::default();
        assert!(matches!(
            raw.previous_block_hash(),
            Err(TemplateError::MalformedTemplate { field: "previousblockhash", .. })
        ));
        assert!(matches!(
            raw.bits_bytes(),
            Err(TemplateError::MalformedTemplate { field: "bits", .. })
        ));
        assert!(matches!(
            raw.target_bytes(),
            Err(TemplateError::MalformedTemplate { field: "target", .. })
        ));
    }

    #[test]
    fn test_bits_must_be_four_bytes() {
        let raw = RawTemplate {
            bits: Some("1d00ff".into()),
            ..Default::default()
        };
        assert!(raw.bits_bytes().is_err());

        let raw = RawTemplate {
            bits: Some("1d00ffff".into()),
            ..Default::default()
        };
        assert_eq!(raw.bits_bytes().unwrap(), [0x1d, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn test_optional_hex_fields() {
        let raw = RawTemplate {
            coinbaseaux: Some(CoinbaseAux {
                flags: Some("0102".into()),
            }),
            coinbase_payload: Some("zz".into()),
            ..Default::default()
        };
        assert_eq!(raw.aux_flags().unwrap(), vec![1, 2]);
        assert!(raw.payload().is_err());
        assert_eq!(raw.witness_commitment().unwrap(), None);
        assert_eq!(RawTemplate::default().aux_flags().unwrap(), Vec::<u8>::new());
    }
}
