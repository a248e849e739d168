use crate::job::JobStage;
use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, TokenAmount};

/// Work-completed fractions by the stage a job had reached when it failed,
/// in basis points of the escrowed payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSchedule {
    pub committee_finalized_bps: u16,
    pub key_published_bps: u16,
    pub activated_bps: u16,
    pub ciphertext_ready_bps: u16,
}

impl WorkSchedule {
    pub fn for_stage(&self, stage: JobStage) -> u16 {
        match stage {
            JobStage::Requested => 0,
            JobStage::CommitteeFinalized => self.committee_finalized_bps,
            JobStage::KeyPublished => self.key_published_bps,
            JobStage::Activated => self.activated_bps,
            JobStage::CiphertextReady => self.ciphertext_ready_bps,
            JobStage::Complete => 10_000,
            JobStage::Failed => 0,
        }
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            committee_finalized_bps: 1_000,
            key_published_bps: 2_500,
            activated_bps: 4_000,
            ciphertext_ready_bps: 7_500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub base_fee: TokenAmount,
    pub per_member_fee: TokenAmount,
    /// Sortition submission window after a request.
    pub request_window_secs: i64,
    pub key_publish_window_secs: i64,
    pub activation_window_secs: i64,
    pub compute_window_secs: i64,
    pub decryption_window_secs: i64,
    /// Protocol cut of the earned portion of the payment.
    pub protocol_fee_bps: u16,
    /// Share of routed slashed funds paid to surviving members when the
    /// job failed; the rest compensates the requester.
    pub failure_slashed_node_bps: u16,
    /// Share of routed slashed funds paid to surviving members when the
    /// job completed; the rest goes to protocol fees.
    pub success_slashed_node_bps: u16,
    pub work_schedule: WorkSchedule,
    pub governance: Vec<AccountId>,
    pub treasury: AccountId,
}

impl JobsConfig {
    /// Escrow owed for a committee of the given size.
    pub fn job_fee(&self, committee_size: u32) -> Option<TokenAmount> {
        let member_fees = self
            .per_member_fee
            .to_units()
            .checked_mul(u64::from(committee_size))?;
        self.base_fee.checked_add(TokenAmount::from_units(member_fees))
    }

    /// First stage window that is not positive, if any.
    pub fn invalid_window(&self) -> Option<(&'static str, i64)> {
        [
            ("request", self.request_window_secs),
            ("key_publish", self.key_publish_window_secs),
            ("activation", self.activation_window_secs),
            ("compute", self.compute_window_secs),
            ("decryption", self.decryption_window_secs),
        ]
        .into_iter()
        .find(|(_, secs)| *secs <= 0)
    }

    pub fn is_governance(&self, caller: &AccountId) -> bool {
        self.governance.contains(caller)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            base_fee: TokenAmount::from_units(1_000),
            per_member_fee: TokenAmount::from_units(200),
            request_window_secs: 3_600,
            key_publish_window_secs: 3_600,
            activation_window_secs: 3_600,
            compute_window_secs: 7_200,
            decryption_window_secs: 3_600,
            protocol_fee_bps: 500,
            failure_slashed_node_bps: 5_000,
            success_slashed_node_bps: 2_500,
            work_schedule: WorkSchedule::default(),
            governance: Vec::new(),
            treasury: AccountId::from_bytes([0xEE; 32]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_fee_scales_with_committee() {
        let config = JobsConfig::default();
        assert_eq!(config.job_fee(3), Some(TokenAmount::from_units(1_600)));
        assert_eq!(config.job_fee(0), Some(TokenAmount::from_units(1_000)));
    }

    #[test]
    fn test_job_fee_overflow() {
        let config = JobsConfig {
            per_member_fee: TokenAmount::MAX,
            ..Default::default()
        };
        assert_eq!(config.job_fee(2), None);
    }

    #[test]
    fn test_invalid_window_detection() {
        assert_eq!(JobsConfig::default().invalid_window(), None);
        let config = JobsConfig {
            compute_window_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.invalid_window(), Some(("compute", 0)));
    }

    #[test]
    fn test_work_schedule_by_stage() {
        let schedule = WorkSchedule::default();
        assert_eq!(schedule.for_stage(JobStage::Requested), 0);
        assert_eq!(schedule.for_stage(JobStage::CommitteeFinalized), 1_000);
        assert_eq!(schedule.for_stage(JobStage::CiphertextReady), 7_500);
        assert_eq!(schedule.for_stage(JobStage::Complete), 10_000);
    }
}
