use crate::error::CryptoError;
use crate::hash::keccak256;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use meridian_primitives::UInt256;
use zeroize::Zeroize;

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the curve order, the low-S malleability boundary (EIP-2).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// A point on secp256k1 in its canonical 64-byte form, `x ∥ y` big-endian.
///
/// Equality and hashing are over this 64-byte form regardless of whether
/// the value was constructed from coordinates or recovered from a
/// signature over the same key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 64]);

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.0))
    }
}

impl PublicKey {
    /// Builds a `PublicKey` from its 64-byte `x ∥ y` form.
    pub fn from_xy_bytes(bytes: [u8; 64]) -> Self {
        PublicKey(bytes)
    }

    /// Defensive copy: the caller gets an owned array, never a reference
    /// into any internal cache.
    pub fn to_xy_bytes(&self) -> [u8; 64] {
        self.0
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let encoded = key.to_encoded_point(false);
        let uncompressed = encoded.as_bytes();
        let mut xy = [0u8; 64];
        xy.copy_from_slice(&uncompressed[1..]);
        PublicKey(xy)
    }

    fn to_verifying_key(self) -> Result<VerifyingKey, CryptoError> {
        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(&self.0);
        VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|e| CryptoError::new(format!("invalid public key point: {e}")))
    }

    /// Last 20 bytes of `keccak256(x ∥ y)`, a compact public-key identifier.
    pub fn key_id20(&self) -> [u8; 20] {
        let digest = keccak256(&self.0);
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest[12..]);
        id
    }
}

/// An ECDSA signature `(v, r, s)`. `v` is `27` or `28`, encoding the
/// recovery identifier used to recover the public key without a known
/// verifying key. Signing always emits a low-S signature (`s <=
/// n/2`); `recover` accepts both forms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Signature {
    pub v: u8,
    pub r: UInt256,
    pub s: UInt256,
}

impl Signature {
    pub fn is_low_s(&self) -> bool {
        self.s.to_bytes_be() <= SECP256K1_HALF_ORDER
    }
}

/// Signs `digest` (assumed to already be a Keccak-256 hash) with
/// `privkey`, returning a low-S signature with `v = 27 + recId`.
pub fn sign(privkey: &UInt256, digest: &[u8; 32]) -> Result<Signature, CryptoError> {
    let mut key_bytes = privkey.to_bytes_be();
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| CryptoError::new(format!("invalid private key: {e}")))?;
    key_bytes.zeroize();

    let (sig, recid) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::new(format!("signing failed: {e}")))?;

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    let (s_normalized, flipped) = if s > SECP256K1_HALF_ORDER {
        (invert_scalar(&s), true)
    } else {
        (s, false)
    };

    let v = if flipped {
        if recid.to_byte() == 0 {
            28
        } else {
            27
        }
    } else {
        recid.to_byte() + 27
    };

    Ok(Signature {
        v,
        r: UInt256::from_bytes_be(&r).expect("32 bytes always fit UInt256"),
        s: UInt256::from_bytes_be(&s_normalized).expect("32 bytes always fit UInt256"),
    })
}

/// Recovers the public key that produced `sig` over `digest`. Accepts
/// both low-S and high-S signatures.
pub fn recover(sig: &Signature, digest: &[u8; 32]) -> Result<PublicKey, CryptoError> {
    let recovery_id = parse_recovery_id(sig.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&sig.r.to_bytes_be());
    sig_bytes[32..].copy_from_slice(&sig.s.to_bytes_be());

    let k256_sig = K256Signature::from_slice(&sig_bytes)
        .map_err(|e| CryptoError::new(format!("invalid signature encoding: {e}")))?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &k256_sig, recovery_id)
        .map_err(|e| CryptoError::new(format!("public key recovery failed: {e}")))?;

    Ok(PublicKey::from_verifying_key(&recovered))
}

/// Verifies `sig` was produced by `pubkey` over `digest` without
/// recovering a key, for callers that already hold the expected signer.
pub fn verify(pubkey: &PublicKey, sig: &Signature, digest: &[u8; 32]) -> Result<(), CryptoError> {
    let verifying_key = pubkey.to_verifying_key()?;
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&sig.r.to_bytes_be());
    sig_bytes[32..].copy_from_slice(&sig.s.to_bytes_be());
    let k256_sig = K256Signature::from_slice(&sig_bytes)
        .map_err(|e| CryptoError::new(format!("invalid signature encoding: {e}")))?;
    verifying_key
        .verify_prehash(digest, &k256_sig)
        .map_err(|_| CryptoError::new("signature does not match public key"))
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        other => return Err(CryptoError::new(format!("invalid recovery id v={other}"))),
    };
    RecoveryId::try_from(id).map_err(|e| CryptoError::new(format!("invalid recovery id: {e}")))
}

/// `n - s`, used to flip a high-S signature produced by the underlying
/// library into the low-S form this system always emits.
fn invert_scalar(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;
    for i in (0..32).rev() {
        let diff = SECP256K1_ORDER[i] as i32 - s[i] as i32 - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }
    result
}
