use crate::error::CryptoError;
use crate::keys::{recover, PublicKey, Signature};
use rayon::prelude::*;

/// One signature to recover and check against an optional expected
/// signer, for use with `verify_batch`.
pub struct BatchRequest {
    pub digest: [u8; 32],
    pub signature: Signature,
    pub expected_signer: Option<PublicKey>,
}

/// Recovers and checks every request in parallel. The result vector
/// preserves input order; each slot holds the recovered key on success,
/// or the reason recovery or the signer check failed.
///
/// Reference: the access-log conflict checker (`meridian-state`) and the
/// transaction pipeline both need to authenticate a block's worth of
/// transactions without serializing the recovery cost across them.
pub fn verify_batch(requests: &[BatchRequest]) -> Vec<Result<PublicKey, CryptoError>> {
    requests
        .par_iter()
        .map(|req| {
            let recovered = recover(&req.signature, &req.digest)?;
            if let Some(expected) = req.expected_signer {
                if recovered != expected {
                    return Err(CryptoError::new("recovered signer does not match expected"));
                }
            }
            Ok(recovered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;
    use crate::keys::sign;
    use meridian_primitives::UInt256;

    #[test]
    fn batch_matches_sequential_recovery() {
        let privkey = UInt256::from_u64(99);
        let requests: Vec<BatchRequest> = (0..20)
            .map(|i| {
                let digest = keccak256(format!("msg-{i}").as_bytes());
                let signature = sign(&privkey, &digest).unwrap();
                BatchRequest {
                    digest,
                    signature,
                    expected_signer: None,
                }
            })
            .collect();

        let results = verify_batch(&requests);
        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn batch_reports_signer_mismatch() {
        let privkey = UInt256::from_u64(1);
        let other_privkey = UInt256::from_u64(2);
        let digest = keccak256(b"msg");
        let signature = sign(&privkey, &digest).unwrap();
        let other_pubkey = crate::keys::recover(&sign(&other_privkey, &digest).unwrap(), &digest).unwrap();

        let requests = vec![BatchRequest {
            digest,
            signature,
            expected_signer: Some(other_pubkey),
        }];
        let results = verify_batch(&requests);
        assert!(results[0].is_err());
    }

    #[test]
    fn empty_batch_is_vacuously_ok() {
        assert!(verify_batch(&[]).is_empty());
    }
}
