use async_trait::async_trait;
use std::sync::Arc;
use syndic_types::JobId;

/// Verifies that a published ciphertext output is the correct result of
/// the job's encrypted program. `Ok(false)` rejects the output; `Err`
/// means the verifier could not run.
#[async_trait]
pub trait ProgramVerifier: Send + Sync {
    async fn verify(&self, job: JobId, ciphertext: &[u8], proof: &[u8]) -> anyhow::Result<bool>;
}

/// Verifies that a published plaintext is the correct threshold decryption
/// of the job's ciphertext output.
#[async_trait]
pub trait DecryptionVerifier: Send + Sync {
    async fn verify(&self, job: JobId, plaintext: &[u8], proof: &[u8]) -> anyhow::Result<bool>;
}

/// Verifier pair pinned to a job at request time.
#[derive(Clone)]
pub struct JobVerifiers {
    pub program: Arc<dyn ProgramVerifier>,
    pub decryption: Arc<dyn DecryptionVerifier>,
}
