use alloy_primitives::Address;
use rollout_abi::Artifact;
use rollout_values::Value;

use crate::client::{VerificationRequest, Verifier, VerifyOutcome};

/// Submits a created resource for source verification. Best effort: every
/// failure is logged and swallowed.
pub(crate) async fn verify_creation(
    verifier: &dyn Verifier,
    artifact: &Artifact,
    args: &[Value],
    address: Address,
    network: &str,
) {
    let constructor_args = match artifact.encode_constructor_args(args) {
        Ok(encoded) => encoded,
        Err(err) => {
            log::warn!("not verifying {} at {address}: {err}", artifact.name());
            return;
        }
    };
    let request = VerificationRequest {
        kind: artifact.name().to_owned(),
        address,
        constructor_args,
        network: network.to_owned(),
    };
    match verifier.verify(&request).await {
        Ok(VerifyOutcome::Verified) => log::info!("verified {} at {address}", request.kind),
        Ok(VerifyOutcome::AlreadyVerified) => {
            log::debug!("{} at {address} already verified", request.kind)
        }
        Err(err) => log::warn!("verification of {} at {address} failed: {err}", request.kind),
    }
}
