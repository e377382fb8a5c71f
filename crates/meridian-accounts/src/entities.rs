use meridian_codec::{ByteDecode, ByteEncode, DecodeError, Instant};
use meridian_primitives::{UInt256, Utf8, Utf8Key};

/// The last 20 bytes of `keccak256` over a 64-byte `x‖y` public key —
/// the only form a signer is ever referred to by once recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId20(pub [u8; 20]);

impl KeyId20 {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        KeyId20(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl ByteEncode for KeyId20 {
    fn encode(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl ByteDecode for KeyId20 {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < 20 {
            return Err(DecodeError::unexpected_end("KeyId20"));
        }
        let (head, rest) = bytes.split_at(20);
        let mut buf = [0u8; 20];
        buf.copy_from_slice(head);
        Ok((KeyId20(buf), rest))
    }
}

/// A named on-chain identity. An unnamed account is not a stored entity
/// at all — it is simply a recovered signer whose key id never appears
/// in this table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub name: Utf8Key,
    pub owner: KeyId20,
    pub guardian: Option<KeyId20>,
    pub nonce: u64,
}

impl ByteEncode for Account {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.name.encode();
        out.extend(self.owner.encode());
        out.extend(self.guardian.encode());
        out.extend(self.nonce.encode());
        out
    }
}

impl ByteDecode for Account {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (name, rest) = Utf8Key::decode(bytes)?;
        let (owner, rest) = KeyId20::decode(rest)?;
        let (guardian, rest) = Option::<KeyId20>::decode(rest)?;
        let (nonce, rest) = u64::decode(rest)?;
        Ok((
            Account {
                name,
                owner,
                guardian,
                nonce,
            },
            rest,
        ))
    }
}

/// Value stored under `(account_name, key_id20)` in the `nameKey` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameKeyEntry {
    pub registered_at: Instant,
    pub expires_at: Option<Instant>,
}

impl ByteEncode for NameKeyEntry {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.registered_at.encode();
        out.extend(self.expires_at.encode());
        out
    }
}

impl ByteDecode for NameKeyEntry {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (registered_at, rest) = Instant::decode(bytes)?;
        let (expires_at, rest) = Option::<Instant>::decode(rest)?;
        Ok((
            NameKeyEntry {
                registered_at,
                expires_at,
            },
            rest,
        ))
    }
}

/// Composite key for the `nameKey` table: self-delimiting because
/// `Utf8Key`'s encoding terminates itself, so the following `KeyId20`
/// bytes can never be mistaken for more of the account name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKeyKey {
    pub account: Utf8Key,
    pub key_id: KeyId20,
}

impl NameKeyKey {
    pub fn new(account: Utf8Key, key_id: KeyId20) -> Self {
        NameKeyKey { account, key_id }
    }
}

impl ByteEncode for NameKeyKey {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.account.encode();
        out.extend(self.key_id.encode());
        out
    }
}

/// `{ coordinator, member_count, group_nonce }`; membership itself lives
/// in the separate `groupMember` table so that adding/removing a member
/// never rewrites this record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub coordinator: Utf8Key,
    pub member_count: u32,
    pub group_nonce: u64,
}

impl ByteEncode for Group {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.coordinator.encode();
        out.extend(self.member_count.encode());
        out.extend(self.group_nonce.encode());
        out
    }
}

impl ByteDecode for Group {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (coordinator, rest) = Utf8Key::decode(bytes)?;
        let (member_count, rest) = u32::decode(rest)?;
        let (group_nonce, rest) = u64::decode(rest)?;
        Ok((
            Group {
                coordinator,
                member_count,
                group_nonce,
            },
            rest,
        ))
    }
}

/// Composite key for the `groupMember` table: `(group_name,
/// member_key_id20)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupMemberKey {
    pub group: Utf8Key,
    pub member: KeyId20,
}

impl GroupMemberKey {
    pub fn new(group: Utf8Key, member: KeyId20) -> Self {
        GroupMemberKey { group, member }
    }
}

impl ByteEncode for GroupMemberKey {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.group.encode();
        out.extend(self.member.encode());
        out
    }
}

/// `{ network_id, created_at, memo }`, hashed together with the
/// transaction value it accompanies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub network_id: UInt256,
    pub created_at: Instant,
    pub memo: Option<Utf8>,
}

impl ByteEncode for Envelope {
    fn encode(&self) -> Vec<u8> {
        let mut out = self.network_id.encode();
        out.extend(self.created_at.encode());
        out.extend(self.memo.encode());
        out
    }
}

impl ByteDecode for Envelope {
    fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let (network_id, rest) = UInt256::decode(bytes)?;
        let (created_at, rest) = Instant::decode(rest)?;
        let (memo, rest) = Option::<Utf8>::decode(rest)?;
        Ok((
            Envelope {
                network_id,
                created_at,
                memo,
            },
            rest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_round_trips() {
        let account = Account {
            name: Utf8Key("alice".to_string()),
            owner: KeyId20([1; 20]),
            guardian: Some(KeyId20([2; 20])),
            nonce: 7,
        };
        let bytes = account.encode();
        let (decoded, rest) = Account::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, account);
    }

    #[test]
    fn name_key_key_is_self_delimiting_across_account_name_lengths() {
        let a = NameKeyKey::new(Utf8Key("a".to_string()), KeyId20([0xff; 20]));
        let b = NameKeyKey::new(Utf8Key("ab".to_string()), KeyId20([0; 20]));
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn envelope_round_trips_with_memo() {
        let envelope = Envelope {
            network_id: UInt256::from_u64(7),
            created_at: Instant::from_epoch_millis(1000),
            memo: Some(Utf8::new("hello").unwrap()),
        };
        let bytes = envelope.encode();
        let (decoded, rest) = Envelope::decode(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, envelope);
    }
}
