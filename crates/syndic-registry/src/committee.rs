use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, Digest, JobId, Threshold, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitteeStage {
    /// Accepting ticket submissions.
    Requested,
    /// Members selected; the committee serves its job.
    Finalized,
    /// Sortition closed without enough submissions.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Expelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSubmission {
    pub operator: AccountId,
    pub ticket_number: u64,
    pub score: Digest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub operator: AccountId,
    pub ticket_number: u64,
    pub score: Digest,
    pub status: MemberStatus,
}

/// Active head count against the reconstruction threshold. The committee
/// stays able to serve while `active_count >= threshold_m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeViability {
    pub active_count: u32,
    pub threshold_m: u32,
}

impl CommitteeViability {
    pub fn is_viable(&self) -> bool {
        self.active_count >= self.threshold_m
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeOutcome {
    Finalized { members: Vec<AccountId> },
    QuorumNotReached { submitted: usize, required: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub job: JobId,
    pub seed: Digest,
    pub threshold: Threshold,
    pub submission_deadline: i64,
    pub stage: CommitteeStage,
    /// Ticket balances frozen when the round opened. Bonding after the
    /// request cannot buy tickets into this sortition.
    pub eligibility: Vec<(AccountId, TokenAmount)>,
    pub submissions: Vec<TicketSubmission>,
    pub members: Vec<CommitteeMember>,
    pub public_key: Option<Vec<u8>>,
}

impl Committee {
    pub fn new(
        job: JobId,
        seed: Digest,
        threshold: Threshold,
        submission_deadline: i64,
        eligibility: Vec<(AccountId, TokenAmount)>,
    ) -> Self {
        Self {
            job,
            seed,
            threshold,
            submission_deadline,
            stage: CommitteeStage::Requested,
            eligibility,
            submissions: Vec::new(),
            members: Vec::new(),
            public_key: None,
        }
    }

    pub fn eligible_balance(&self, operator: &AccountId) -> Option<TokenAmount> {
        self.eligibility
            .iter()
            .find(|(op, _)| op == operator)
            .map(|(_, balance)| *balance)
    }

    pub fn member(&self, operator: &AccountId) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| &m.operator == operator)
    }

    pub fn is_active_member(&self, operator: &AccountId) -> bool {
        matches!(
            self.member(operator),
            Some(m) if m.status == MemberStatus::Active
        )
    }

    pub fn active_members(&self) -> Vec<AccountId> {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Active)
            .map(|m| m.operator)
            .collect()
    }

    pub fn active_count(&self) -> u32 {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Active)
            .count() as u32
    }

    pub fn viability(&self) -> CommitteeViability {
        CommitteeViability {
            active_count: self.active_count(),
            threshold_m: self.threshold.m,
        }
    }

    pub fn has_submitted(&self, operator: &AccountId) -> bool {
        self.submissions.iter().any(|s| &s.operator == operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    fn committee_of_three() -> Committee {
        let mut committee = Committee::new(
            JobId::new(1),
            Digest::of(b"seed"),
            Threshold { m: 2, n: 3 },
            100,
            Vec::new(),
        );
        committee.stage = CommitteeStage::Finalized;
        committee.members = (1..=3)
            .map(|b| CommitteeMember {
                operator: op(b),
                ticket_number: u64::from(b),
                score: Digest::of(&[b]),
                status: MemberStatus::Active,
            })
            .collect();
        committee
    }

    #[test]
    fn test_viability_tracks_expulsions() {
        let mut committee = committee_of_three();
        assert!(committee.viability().is_viable());

        committee.members[0].status = MemberStatus::Expelled;
        let v = committee.viability();
        assert_eq!(v.active_count, 2);
        assert!(v.is_viable());

        committee.members[1].status = MemberStatus::Expelled;
        let v = committee.viability();
        assert_eq!(v.active_count, 1);
        assert!(!v.is_viable());
    }

    #[test]
    fn test_active_membership_queries() {
        let mut committee = committee_of_three();
        assert!(committee.is_active_member(&op(2)));

        committee.members[1].status = MemberStatus::Expelled;
        assert!(!committee.is_active_member(&op(2)));
        assert!(committee.member(&op(2)).is_some());
        assert_eq!(committee.active_members(), vec![op(1), op(3)]);
    }
}
