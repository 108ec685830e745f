use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::{Amount, Beneficiary, Identity, TrustLedger};

/// Point-in-time view of everything observable about a trust, plus a
/// digest over it. Two ledgers that agree on roles, balance, registry,
/// and payout record produce the same digest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustSnapshot {
    pub trustor: Identity,
    pub trustee: Identity,
    pub balance: Amount,
    pub beneficiaries: BTreeMap<String, Beneficiary>,
    pub paid_out: BTreeMap<Identity, Amount>,
    pub state_digest: [u8; 32],
}

impl TrustSnapshot {
    pub fn of(trust: &TrustLedger) -> Self {
        let beneficiaries = trust.beneficiaries().clone();
        let paid_out = trust.payouts().clone();
        let state_digest = compute_state_digest(
            trust.trustor(),
            trust.trustee(),
            trust.balance(),
            &beneficiaries,
            &paid_out,
        );
        Self {
            trustor: trust.trustor().clone(),
            trustee: trust.trustee().clone(),
            balance: trust.balance(),
            beneficiaries,
            paid_out,
            state_digest,
        }
    }
}

fn compute_state_digest(
    trustor: &Identity,
    trustee: &Identity,
    balance: Amount,
    beneficiaries: &BTreeMap<String, Beneficiary>,
    paid_out: &BTreeMap<Identity, Amount>,
) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();

    let mut hasher = Sha256::new();
    hasher.update(b"roles");
    hasher.update(trustor.as_bytes());
    hasher.update([0u8]);
    hasher.update(trustee.as_bytes());
    leaves.push(hasher.finalize().into());

    let mut hasher = Sha256::new();
    hasher.update(b"pool");
    hasher.update(balance.to_le_bytes());
    leaves.push(hasher.finalize().into());

    for (name, beneficiary) in beneficiaries {
        let mut hasher = Sha256::new();
        hasher.update(b"bene");
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(beneficiary.age_threshold.to_le_bytes());
        match &beneficiary.withdrawal_address {
            Some(address) => {
                hasher.update([1u8]);
                hasher.update(address.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        hasher.update([beneficiary.has_withdrawn as u8]);
        leaves.push(hasher.finalize().into());
    }

    for (address, amount) in paid_out {
        let mut hasher = Sha256::new();
        hasher.update(b"paid");
        hasher.update(address.as_bytes());
        hasher.update([0u8]);
        hasher.update(amount.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }

    let mut root = Sha256::new();
    root.update(b"private-trust-v1");
    for leaf in &leaves {
        root.update(leaf);
    }
    root.finalize().into()
}
