use serde::{Deserialize, Serialize};
use syndic_types::{FaultReason, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofKind {
    KeyGeneration,
    OutputCorrectness,
    DecryptionShare,
}

impl ProofKind {
    /// Stable byte tag used in attestation payloads.
    pub fn tag(&self) -> u8 {
        match self {
            ProofKind::KeyGeneration => 1,
            ProofKind::OutputCorrectness => 2,
            ProofKind::DecryptionShare => 3,
        }
    }
}

/// Per-fault-reason slashing terms. Proof-based policies execute instantly
/// and carry no appeal window; evidence-based policies must leave one open.
/// `affects_committee` controls whether an executed slash also expels the
/// accused from the job's committee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashPolicy {
    pub reason: FaultReason,
    pub enabled: bool,
    pub ticket_amount: TokenAmount,
    pub license_amount: TokenAmount,
    pub requires_proof: bool,
    pub proof_kind: Option<ProofKind>,
    pub appeal_window_secs: i64,
    pub ban: bool,
    pub affects_committee: bool,
}

impl SlashPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.requires_proof {
            if self.proof_kind.is_none() {
                return Err("proof-based policy must name a proof kind".into());
            }
            if self.appeal_window_secs != 0 {
                return Err("proof-based policy cannot carry an appeal window".into());
            }
        } else {
            if self.proof_kind.is_some() {
                return Err("evidence-based policy cannot name a proof kind".into());
            }
            if self.appeal_window_secs <= 0 {
                return Err("evidence-based policy must leave an appeal window open".into());
            }
        }
        if self.ticket_amount.is_zero() && self.license_amount.is_zero() && !self.ban {
            return Err("policy slashes nothing and bans nobody".into());
        }
        Ok(())
    }
}

/// Default policy table. Proven protocol faults slash the license bond and
/// ban; behavioral faults go through the evidence lane with a three-day
/// appeal window.
pub fn default_policies() -> Vec<SlashPolicy> {
    const THREE_DAYS: i64 = 3 * 24 * 3_600;
    vec![
        SlashPolicy {
            reason: FaultReason::KeyGenFault,
            enabled: true,
            ticket_amount: TokenAmount::ZERO,
            license_amount: TokenAmount::from_units(500),
            requires_proof: true,
            proof_kind: Some(ProofKind::KeyGeneration),
            appeal_window_secs: 0,
            ban: true,
            affects_committee: true,
        },
        SlashPolicy {
            reason: FaultReason::DecryptionFault,
            enabled: true,
            ticket_amount: TokenAmount::ZERO,
            license_amount: TokenAmount::from_units(500),
            requires_proof: true,
            proof_kind: Some(ProofKind::DecryptionShare),
            appeal_window_secs: 0,
            ban: true,
            affects_committee: true,
        },
        SlashPolicy {
            reason: FaultReason::InvalidOutput,
            enabled: true,
            ticket_amount: TokenAmount::ZERO,
            license_amount: TokenAmount::from_units(750),
            requires_proof: true,
            proof_kind: Some(ProofKind::OutputCorrectness),
            appeal_window_secs: 0,
            ban: true,
            affects_committee: true,
        },
        SlashPolicy {
            reason: FaultReason::Unavailability,
            enabled: true,
            ticket_amount: TokenAmount::from_units(50),
            license_amount: TokenAmount::from_units(200),
            requires_proof: false,
            proof_kind: None,
            appeal_window_secs: THREE_DAYS,
            ban: false,
            affects_committee: true,
        },
        SlashPolicy {
            reason: FaultReason::Equivocation,
            enabled: true,
            ticket_amount: TokenAmount::from_units(100),
            license_amount: TokenAmount::from_units(400),
            requires_proof: false,
            proof_kind: None,
            appeal_window_secs: THREE_DAYS,
            ban: true,
            affects_committee: true,
        },
    ]
}
