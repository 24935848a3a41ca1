//! Block reward distribution.
//!
//! Walks the reward-bearing fields of a [`RawTemplate`] and emits one coinbase
//! output per payee. The order is fixed and consensus-relevant:
//!
//! ```text
//! [developer] [smartnode...] [superblock...] [founder] [pool] [witness commitment]
//! ```
//!
//! Absent categories are skipped. The pool output is not computed on its own:
//! it receives whatever the [`RewardLedger`] has left, so the outputs always
//! sum to `coinbasevalue + developer reward`.

use bitcoin::{Amount, ScriptBuf, TxOut};
use tracing::debug;

use crate::address::Payee;
use crate::codec::{pack_int64_le, var_int};
use crate::error::TemplateError;
use crate::rpc::RawTemplate;
use crate::witness;

/// Running totals for one reward distribution.
///
/// Both counters start at the full block reward and every payout reduces
/// both of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardLedger {
    /// Reward not yet assigned to any output.
    pub total_reward: i128,
    /// Reward still owed to the pool.
    pub pool_reward: i128,
}

impl RewardLedger {
    /// Start a ledger for a block paying `coinbase_value + dev_reward`.
    pub fn new(coinbase_value: u64, dev_reward: u64) -> Self {
        let total = coinbase_value as i128 + dev_reward as i128;
        Self {
            total_reward: total,
            pool_reward: total,
        }
    }
}

/// Append an output paying `amount` to `payee` and charge it to the ledger.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidAddress`] if the payee address does not
/// resolve.
pub fn add_payout(
    ledger: RewardLedger,
    outputs: &mut Vec<TxOut>,
    amount: u64,
    payee: &Payee,
) -> Result<RewardLedger, TemplateError> {
    let script_pubkey = payee.locking_script()?;
    outputs.push(TxOut {
        value: Amount::from_sat(amount),
        script_pubkey,
    });
    Ok(RewardLedger {
        total_reward: ledger.total_reward - amount as i128,
        pool_reward: ledger.pool_reward - amount as i128,
    })
}

/// The coinbase outputs produced by [`distribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseOutputs {
    outputs: Vec<TxOut>,
    pool_index: usize,
    has_witness_commitment: bool,
    ledger: RewardLedger,
}

impl CoinbaseOutputs {
    /// All outputs, in payout order.
    pub fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    /// The output paying the pool's remainder.
    pub fn pool_output(&self) -> &TxOut {
        &self.outputs[self.pool_index]
    }

    /// Whether a witness commitment output (and coinbase witness) is present.
    pub fn has_witness_commitment(&self) -> bool {
        self.has_witness_commitment
    }

    /// The ledger after every payout.
    pub fn ledger(&self) -> RewardLedger {
        self.ledger
    }

    /// Sum of all output values.
    pub fn total_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.value.to_sat()).sum()
    }

    /// Serialize as it appears in the coinbase after the input's sequence.
    ///
    /// The output count is followed by each output. With a witness commitment
    /// the coinbase witness stack follows the outputs; it is not counted.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(&encode_output(output));
        }
        if self.has_witness_commitment {
            buf.extend_from_slice(&witness::coinbase_witness_stack());
        }
        buf
    }
}

/// Encode one output: 8-byte amount, script length, script.
pub fn encode_output(output: &TxOut) -> Vec<u8> {
    let script = output.script_pubkey.as_bytes();
    let mut buf = Vec::with_capacity(8 + 9 + script.len());
    buf.extend_from_slice(&pack_int64_le(output.value.to_sat()));
    buf.extend_from_slice(&var_int(script.len() as u64));
    buf.extend_from_slice(script);
    buf
}

/// Distribute the block reward described by `raw` between its payees and
/// the pool.
///
/// # Errors
///
/// - [`TemplateError::InvalidAddress`] if any payee or the pool address does
///   not resolve.
/// - [`TemplateError::MalformedTemplate`] if a developer script or witness
///   commitment is not valid hex.
/// - [`TemplateError::RewardImbalance`] if the payees take more than the
///   block reward.
pub fn distribute(raw: &RawTemplate, pool: &Payee) -> Result<CoinbaseOutputs, TemplateError> {
    let mut ledger = RewardLedger::new(raw.coinbasevalue, raw.dev_reward_value());
    let mut outputs = Vec::new();

    if let Some(dev) = &raw.coinbasedevreward {
        let script = crate::rpc::decode_hex("coinbasedevreward.scriptpubkey", &dev.scriptpubkey)?;
        let payee = Payee::Script(ScriptBuf::from_bytes(script));
        ledger = add_payout(ledger, &mut outputs, dev.value, &payee)?;
    }

    for entry in raw.smartnode.payees() {
        let payee = Payee::Address(entry.payee.clone());
        ledger = add_payout(ledger, &mut outputs, entry.amount, &payee)?;
    }

    for entry in &raw.superblock {
        let payee = Payee::Address(entry.payee.clone());
        ledger = add_payout(ledger, &mut outputs, entry.amount, &payee)?;
    }

    if raw.founder_payments_started {
        if let Some(founder) = &raw.founder {
            ledger = add_payout(
                ledger,
                &mut outputs,
                founder.amount,
                &Payee::Address(founder.payee.clone()),
            )?;
        }
    }

    if ledger.pool_reward < 0 {
        return Err(TemplateError::RewardImbalance {
            remaining: ledger.pool_reward,
        });
    }
    let pool_index = outputs.len();
    ledger = add_payout(ledger, &mut outputs, ledger.pool_reward as u64, pool)?;

    let commitment = raw.witness_commitment()?;
    let has_witness_commitment = commitment.is_some();
    if let Some(script) = commitment {
        let payee = Payee::Script(ScriptBuf::from_bytes(script));
        ledger = add_payout(ledger, &mut outputs, 0, &payee)?;
    }

    debug!(
        height = raw.height,
        outputs = outputs.len(),
        pool_reward = outputs[pool_index].value.to_sat(),
        "distributed coinbase reward"
    );

    Ok(CoinbaseOutputs {
        outputs,
        pool_index,
        has_witness_commitment,
        ledger,
    })
}
