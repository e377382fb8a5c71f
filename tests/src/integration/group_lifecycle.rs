//! Mounts the account and group blueprints together and walks a full
//! group lifecycle through their public `Module` API, exercising the
//! same disband-gating scenario as the unit tests but from outside
//! the `meridian-accounts` crate.

use meridian_accounts::{account_blueprint, group_blueprint, AccountTx, Envelope, GroupTx, KeyId20};
use meridian_codec::{ByteEncode, Instant};
use meridian_crypto::{keccak256, recover, sign};
use meridian_modules::Signed;
use meridian_primitives::{UInt256, Utf8Key};
use meridian_modules::TablesProvider;
use meridian_state::{Path, PrefixFreePath, StoreState};
use meridian_trie::{InMemoryNodeStore, NodeStore, TrieConfig};
use std::sync::Arc;

fn envelope(created_at: u64) -> Envelope {
    Envelope {
        network_id: UInt256::from_u64(1),
        created_at: Instant::from_epoch_millis(created_at),
        memo: None,
    }
}

fn signed<T: ByteEncode>(privkey: &UInt256, value: T) -> Signed<T> {
    let digest = keccak256(&value.encode());
    let signature = sign(privkey, &digest).unwrap();
    Signed::new(value, signature)
}

fn key_id(privkey: &UInt256) -> KeyId20 {
    let pubkey = recover(&sign(privkey, &[0u8; 32]).unwrap(), &[0u8; 32]).unwrap();
    KeyId20::from_bytes(pubkey.key_id20())
}

#[test]
fn group_membership_must_be_empty_before_disband() {
    let node_store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new());
    let mut registrar = PrefixFreePath::new();

    let accounts = account_blueprint()
        .mount(
            &Path::new(["chain", "accounts"]),
            node_store.clone(),
            TrieConfig::default(),
            &mut registrar,
            &TablesProvider::empty(),
        )
        .unwrap();
    let groups = group_blueprint()
        .mount(
            &Path::new(["chain", "groups"]),
            node_store,
            TrieConfig::default(),
            &mut registrar,
            accounts.provided_tables(),
        )
        .unwrap();

    let coordinator_key = UInt256::from_u64(1001);
    let coordinator_id = key_id(&coordinator_key);
    let member_id = key_id(&UInt256::from_u64(1002));

    let state = StoreState::genesis();
    let (state, result) = accounts
        .dispatch(Arc::new(signed(
            &coordinator_key,
            AccountTx::RegisterAccount {
                name: Utf8Key::new("treasury"),
                owner_key_id: coordinator_id,
                envelope: envelope(1),
            },
        )))
        .run(state)
        .unwrap();
    result.unwrap();

    let (state, result) = groups
        .dispatch(Arc::new(signed(
            &coordinator_key,
            GroupTx::CreateGroup {
                name: Utf8Key::new("signers"),
                coordinator: Utf8Key::new("treasury"),
                envelope: envelope(2),
            },
        )))
        .run(state)
        .unwrap();
    result.unwrap();

    let (state, result) = groups
        .dispatch(Arc::new(signed(
            &coordinator_key,
            GroupTx::AddMembers {
                group: Utf8Key::new("signers"),
                members: vec![member_id],
                nonce: 0,
                envelope: envelope(3),
            },
        )))
        .run(state)
        .unwrap();
    result.unwrap();

    let (state, result) = groups
        .dispatch(Arc::new(signed(
            &coordinator_key,
            GroupTx::DisbandGroup {
                group: Utf8Key::new("signers"),
                nonce: 1,
                envelope: envelope(4),
            },
        )))
        .run(state)
        .unwrap();
    assert!(result.is_err());

    let (state, result) = groups
        .dispatch(Arc::new(signed(
            &coordinator_key,
            GroupTx::RemoveMembers {
                group: Utf8Key::new("signers"),
                members: vec![member_id],
                nonce: 1,
                envelope: envelope(5),
            },
        )))
        .run(state)
        .unwrap();
    result.unwrap();

    let (_, result) = groups
        .dispatch(Arc::new(signed(
            &coordinator_key,
            GroupTx::DisbandGroup {
                group: Utf8Key::new("signers"),
                nonce: 2,
                envelope: envelope(6),
            },
        )))
        .run(state)
        .unwrap();
    result.unwrap();
}
