use crate::policy::ProofKind;
use serde::{Deserialize, Serialize};
use syndic_types::{Digest, JobId, Keypair, PublicKey, Signature};

const ATTESTATION_TAG: &[u8] = b"syndic.fault.attestation";

/// A node's signature over the fault material it produced. Binds the chain,
/// the job, the proof kind, and digests of the proof bytes and public
/// inputs, so an attestation cannot be replayed against another job or
/// another deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultAttestation {
    pub chain_id: u64,
    pub job: JobId,
    pub proof_kind: ProofKind,
    pub proof_digest: Digest,
    pub public_inputs_digest: Digest,
    pub signature: Signature,
}

impl FaultAttestation {
    /// The digest the node signs.
    pub fn payload_digest(
        chain_id: u64,
        job: JobId,
        proof_kind: ProofKind,
        proof_digest: &Digest,
        public_inputs_digest: &Digest,
    ) -> Digest {
        Digest::of_parts(&[
            ATTESTATION_TAG,
            &chain_id.to_le_bytes(),
            &job.as_u64().to_le_bytes(),
            &[proof_kind.tag()],
            proof_digest.as_bytes(),
            public_inputs_digest.as_bytes(),
        ])
    }

    /// Build and sign an attestation over raw proof material.
    pub fn signed(
        keypair: &Keypair,
        chain_id: u64,
        job: JobId,
        proof_kind: ProofKind,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Self {
        let proof_digest = Digest::of(proof);
        let public_inputs_digest = Digest::of(public_inputs);
        let payload = Self::payload_digest(
            chain_id,
            job,
            proof_kind,
            &proof_digest,
            &public_inputs_digest,
        );
        Self {
            chain_id,
            job,
            proof_kind,
            proof_digest,
            public_inputs_digest,
            signature: keypair.sign(payload.as_bytes()),
        }
    }

    /// Check the signature against a claimed signer key.
    pub fn verify_signer(&self, signer: &PublicKey) -> bool {
        let payload = Self::payload_digest(
            self.chain_id,
            self.job,
            self.proof_kind,
            &self.proof_digest,
            &self.public_inputs_digest,
        );
        signer.verify(payload.as_bytes(), &self.signature).is_ok()
    }

    /// Whether `proof` and `public_inputs` are the bytes this attestation
    /// was signed over.
    pub fn matches_material(&self, proof: &[u8], public_inputs: &[u8]) -> bool {
        Digest::of(proof) == self.proof_digest
            && Digest::of(public_inputs) == self.public_inputs_digest
    }
}
