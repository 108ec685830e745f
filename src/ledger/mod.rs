use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Identity = String;
pub type Amount = u64;
pub type Age = u64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrustError {
    #[error("caller is not authorized to {action}")]
    Unauthorized { action: &'static str },
    #[error("beneficiary {name} has not been designated")]
    NotDesignated { name: String },
    #[error("beneficiary {name} has already withdrawn")]
    AlreadyWithdrawn { name: String },
    #[error("claimed age {claimed} is below the withdrawal age {threshold}")]
    BelowWithdrawalAge { claimed: Age, threshold: Age },
    #[error("beneficiary {name} has no withdrawal address")]
    NoWithdrawalAddress { name: String },
    #[error("trust holds no funds")]
    NoFunds,
}

/// A named claimant on the trust. Presence in the registry map is what
/// makes a beneficiary designated; a removed name leaves no trace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Beneficiary {
    pub age_threshold: Age,
    pub withdrawal_address: Option<Identity>,
    pub has_withdrawn: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrustEvent {
    Deposited {
        amount: Amount,
    },
    Designated {
        name: String,
        age_threshold: Age,
    },
    Removed {
        name: String,
    },
    AddressAssigned {
        address: Identity,
        name: String,
    },
    Withdrawn {
        address: Identity,
        name: String,
        amount: Amount,
    },
}

/// Single-custodian trust fund ledger.
///
/// The trustor funds the pool and designates beneficiaries; the trustee
/// binds each beneficiary to a withdrawal address once they reach their
/// age threshold; each beneficiary then withdraws an equal share of the
/// remaining pool exactly once.
///
/// Every operation takes the (already authenticated) caller identity as
/// its first argument, checks all preconditions before mutating anything,
/// and appends one event on success. A failing call leaves the ledger
/// untouched. Serialization of calls is the host's job; `&mut self` is
/// the only concurrency control needed.
pub struct TrustLedger {
    trustor: Identity,
    trustee: Identity,
    balance: Amount,
    beneficiaries: BTreeMap<String, Beneficiary>,
    paid_out: BTreeMap<Identity, Amount>,
    events: Vec<TrustEvent>,
}

impl TrustLedger {
    /// Opens a trust. The trustee starts as the trustor and is usually
    /// reassigned right away.
    pub fn new(trustor: Identity) -> Self {
        Self {
            trustee: trustor.clone(),
            trustor,
            balance: 0,
            beneficiaries: BTreeMap::new(),
            paid_out: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn deposit(&mut self, caller: &Identity, amount: Amount) -> Result<(), TrustError> {
        if *caller != self.trustor {
            return Err(TrustError::Unauthorized { action: "deposit" });
        }
        self.balance += amount;
        self.events.push(TrustEvent::Deposited { amount });
        Ok(())
    }

    pub fn assign_trustee(
        &mut self,
        caller: &Identity,
        new_trustee: Identity,
    ) -> Result<(), TrustError> {
        if *caller != self.trustor {
            return Err(TrustError::Unauthorized {
                action: "assign a trustee",
            });
        }
        self.trustee = new_trustee;
        Ok(())
    }

    /// Designates a new beneficiary, or updates the age threshold of an
    /// existing one in place. An already-bound withdrawal address survives
    /// re-designation.
    pub fn designate_beneficiary(
        &mut self,
        caller: &Identity,
        name: &str,
        age_threshold: Age,
    ) -> Result<(), TrustError> {
        if *caller != self.trustor {
            return Err(TrustError::Unauthorized {
                action: "designate a beneficiary",
            });
        }
        if let Some(beneficiary) = self.beneficiaries.get_mut(name) {
            if beneficiary.has_withdrawn {
                return Err(TrustError::AlreadyWithdrawn {
                    name: name.to_string(),
                });
            }
            beneficiary.age_threshold = age_threshold;
        } else {
            self.beneficiaries.insert(
                name.to_string(),
                Beneficiary {
                    age_threshold,
                    withdrawal_address: None,
                    has_withdrawn: false,
                },
            );
        }
        self.events.push(TrustEvent::Designated {
            name: name.to_string(),
            age_threshold,
        });
        Ok(())
    }

    /// Deletes a beneficiary record entirely; the name becomes reusable
    /// and prior threshold/address state is discarded.
    pub fn remove_beneficiary(&mut self, caller: &Identity, name: &str) -> Result<(), TrustError> {
        if *caller != self.trustee {
            return Err(TrustError::Unauthorized {
                action: "remove a beneficiary",
            });
        }
        let beneficiary =
            self.beneficiaries
                .get(name)
                .ok_or_else(|| TrustError::NotDesignated {
                    name: name.to_string(),
                })?;
        if beneficiary.has_withdrawn {
            return Err(TrustError::AlreadyWithdrawn {
                name: name.to_string(),
            });
        }
        self.beneficiaries.remove(name);
        self.events.push(TrustEvent::Removed {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Binds the destination a beneficiary will withdraw to. May be
    /// reassigned any number of times before withdrawal; the claimed age
    /// must meet the beneficiary's threshold each time.
    pub fn assign_withdrawal_address(
        &mut self,
        caller: &Identity,
        address: Identity,
        name: &str,
        claimed_age: Age,
    ) -> Result<(), TrustError> {
        if *caller != self.trustee {
            return Err(TrustError::Unauthorized {
                action: "assign a withdrawal address",
            });
        }
        let beneficiary =
            self.beneficiaries
                .get_mut(name)
                .ok_or_else(|| TrustError::NotDesignated {
                    name: name.to_string(),
                })?;
        if beneficiary.has_withdrawn {
            return Err(TrustError::AlreadyWithdrawn {
                name: name.to_string(),
            });
        }
        if claimed_age < beneficiary.age_threshold {
            return Err(TrustError::BelowWithdrawalAge {
                claimed: claimed_age,
                threshold: beneficiary.age_threshold,
            });
        }
        beneficiary.withdrawal_address = Some(address.clone());
        self.events.push(TrustEvent::AddressAssigned {
            address,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Pays a beneficiary its equal share of the remaining pool.
    ///
    /// The share is `balance / k` (floor), where `k` counts beneficiaries
    /// that currently have a bound address and have not yet withdrawn,
    /// this one included. Each withdrawal recomputes against the live
    /// balance, so later withdrawers absorb earlier rounding remainders
    /// and the last one drains the pool to zero.
    ///
    /// Anyone may invoke this; only the exact bound address succeeds.
    pub fn withdraw(&mut self, address: &Identity, name: &str) -> Result<Amount, TrustError> {
        if self.balance == 0 {
            return Err(TrustError::NoFunds);
        }
        let beneficiary =
            self.beneficiaries
                .get(name)
                .ok_or_else(|| TrustError::NotDesignated {
                    name: name.to_string(),
                })?;
        let bound = beneficiary
            .withdrawal_address
            .as_ref()
            .ok_or_else(|| TrustError::NoWithdrawalAddress {
                name: name.to_string(),
            })?;
        if bound != address {
            return Err(TrustError::Unauthorized { action: "withdraw" });
        }
        if beneficiary.has_withdrawn {
            return Err(TrustError::AlreadyWithdrawn {
                name: name.to_string(),
            });
        }

        let claimants = self.claimant_count();
        debug_assert!(claimants > 0);
        let share = self.balance / claimants;

        self.balance -= share;
        *self.paid_out.entry(address.clone()).or_default() += share;
        // second registry lookup releases the shared borrow taken above
        if let Some(beneficiary) = self.beneficiaries.get_mut(name) {
            beneficiary.has_withdrawn = true;
        }
        self.events.push(TrustEvent::Withdrawn {
            address: address.clone(),
            name: name.to_string(),
            amount: share,
        });
        Ok(share)
    }

    /// Beneficiaries still in line for a share: address bound, not yet
    /// withdrawn.
    fn claimant_count(&self) -> u64 {
        self.beneficiaries
            .values()
            .filter(|b| b.withdrawal_address.is_some() && !b.has_withdrawn)
            .count() as u64
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn trustor(&self) -> &Identity {
        &self.trustor
    }

    pub fn trustee(&self) -> &Identity {
        &self.trustee
    }

    pub fn beneficiary(&self, name: &str) -> Option<&Beneficiary> {
        self.beneficiaries.get(name)
    }

    pub fn beneficiaries(&self) -> &BTreeMap<String, Beneficiary> {
        &self.beneficiaries
    }

    /// Cumulative amount transferred to an address across all withdrawals.
    pub fn paid_out(&self, address: &Identity) -> Amount {
        self.paid_out.get(address).copied().unwrap_or(0)
    }

    pub fn payouts(&self) -> &BTreeMap<Identity, Amount> {
        &self.paid_out
    }

    pub fn events(&self) -> &[TrustEvent] {
        &self.events
    }

    /// Hands the accumulated event records to the host for forwarding,
    /// leaving the internal list empty.
    pub fn drain_events(&mut self) -> Vec<TrustEvent> {
        std::mem::take(&mut self.events)
    }
}
