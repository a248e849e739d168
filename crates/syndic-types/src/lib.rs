pub mod amount;
pub mod digest;
pub mod ids;
pub mod keys;
pub mod proof;
pub mod reason;

pub use amount::TokenAmount;
pub use digest::Digest;
pub use ids::{AccountId, JobId, ProposalId, Threshold};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use proof::MembershipProof;
pub use reason::{FaultReason, JobFailureReason};
