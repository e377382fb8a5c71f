use crate::entities::{Envelope, Group, GroupMemberKey, KeyId20};
use crate::error::AccountError;
use meridian_codec::{ByteEncode, Instant};
use meridian_crypto::keccak256;
use meridian_modules::{
    Blueprint, EntrySpec, ModuleError, ModuleReducer, ReducerOutput, Signed, TablesProvider, Tx,
};
use meridian_primitives::Utf8Key;
use meridian_state::{BrandedKey, StateTable, StoreF};
use std::any::Any;
use std::sync::Arc;

pub struct GroupTag;
pub struct GroupMemberTag;

pub const GROUP_TABLE: &str = "group";
pub const GROUP_MEMBER_TABLE: &str = "groupMember";

/// The four group-management transactions. Every mutation is
/// coordinator-signed and carries the group's current `group_nonce`;
/// add/remove are idempotent over already-present or already-absent
/// members rather than failing on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupTx {
    CreateGroup {
        name: Utf8Key,
        coordinator: Utf8Key,
        envelope: Envelope,
    },
    AddMembers {
        group: Utf8Key,
        members: Vec<KeyId20>,
        nonce: u64,
        envelope: Envelope,
    },
    RemoveMembers {
        group: Utf8Key,
        members: Vec<KeyId20>,
        nonce: u64,
        envelope: Envelope,
    },
    DisbandGroup {
        group: Utf8Key,
        nonce: u64,
        envelope: Envelope,
    },
}

impl GroupTx {
    fn envelope(&self) -> &Envelope {
        match self {
            GroupTx::CreateGroup { envelope, .. } => envelope,
            GroupTx::AddMembers { envelope, .. } => envelope,
            GroupTx::RemoveMembers { envelope, .. } => envelope,
            GroupTx::DisbandGroup { envelope, .. } => envelope,
        }
    }
}

impl ByteEncode for GroupTx {
    fn encode(&self) -> Vec<u8> {
        match self {
            GroupTx::CreateGroup {
                name,
                coordinator,
                envelope,
            } => {
                let mut out = vec![0u8];
                out.extend(name.encode());
                out.extend(coordinator.encode());
                out.extend(envelope.encode());
                out
            }
            GroupTx::AddMembers {
                group,
                members,
                nonce,
                envelope,
            } => {
                let mut out = vec![1u8];
                out.extend(group.encode());
                out.extend(members.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
            GroupTx::RemoveMembers {
                group,
                members,
                nonce,
                envelope,
            } => {
                let mut out = vec![2u8];
                out.extend(group.encode());
                out.extend(members.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
            GroupTx::DisbandGroup {
                group,
                nonce,
                envelope,
            } => {
                let mut out = vec![3u8];
                out.extend(group.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
        }
    }
}

impl Tx for GroupTx {
    type Result = ();
    type Event = GroupEvent;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupEvent {
    GroupCreated { name: Utf8Key, coordinator: Utf8Key },
    MembersAdded { group: Utf8Key, members: Vec<KeyId20> },
    MembersRemoved { group: Utf8Key, members: Vec<KeyId20> },
    GroupDisbanded { group: Utf8Key },
}

fn account_err(e: AccountError) -> ModuleError {
    ModuleError::Sigil(e.into())
}

type GroupStateTable = Arc<StateTable<GroupTag, Utf8Key, Group>>;
type GroupMemberStateTable = Arc<StateTable<GroupMemberTag, GroupMemberKey, bool>>;
type AccountStateTable =
    Arc<StateTable<crate::account::AccountTag, Utf8Key, crate::entities::Account>>;

pub struct GroupReducer;

impl GroupReducer {
    fn tables(
        owned: &TablesProvider,
    ) -> Result<(GroupStateTable, GroupMemberStateTable), ModuleError> {
        let groups = owned.table::<GroupTag, Utf8Key, Group>(GROUP_TABLE)?;
        let members = owned.table::<GroupMemberTag, GroupMemberKey, bool>(GROUP_MEMBER_TABLE)?;
        Ok((groups, members))
    }

    /// Loads the group, requires the signer to be the owner or guardian
    /// of the group's coordinator account, and requires the supplied
    /// nonce to match the stored `group_nonce`.
    fn authorize_existing(
        groups: GroupStateTable,
        accounts: AccountStateTable,
        group_name: Utf8Key,
        signer_id: KeyId20,
        nonce: u64,
    ) -> StoreF<Result<Group, ModuleError>> {
        groups
            .get(BrandedKey::new(group_name.clone()))
            .bind(move |existing| {
                let Some(group) = existing else {
                    return StoreF::pure(Err(account_err(AccountError::GroupNotFound {
                        name: group_name.0.clone(),
                    })));
                };
                if group.group_nonce != nonce {
                    return StoreF::pure(Err(account_err(AccountError::NonceMismatch {
                        expected: group.group_nonce,
                        got: nonce,
                    })));
                }
                accounts
                    .get(BrandedKey::new(group.coordinator.clone()))
                    .map(move |coordinator_account| {
                        let Some(coordinator_account) = coordinator_account else {
                            return Err(account_err(AccountError::AccountNotFound {
                                name: group.coordinator.0.clone(),
                            }));
                        };
                        if coordinator_account.owner != signer_id
                            && coordinator_account.guardian != Some(signer_id)
                        {
                            return Err(account_err(AccountError::Unauthorized));
                        }
                        Ok(group)
                    })
            })
    }
}

impl ModuleReducer for GroupReducer {
    fn apply(
        &self,
        owned: TablesProvider,
        needs: TablesProvider,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> StoreF<Result<ReducerOutput, ModuleError>> {
        let signed = match tx.downcast::<Signed<GroupTx>>() {
            Ok(signed) => *signed,
            Err(_) => return StoreF::pure(Err(ModuleError::WrongTxType)),
        };
        let (groups, members) = match Self::tables(&owned) {
            Ok(tables) => tables,
            Err(e) => return StoreF::pure(Err(e)),
        };
        let accounts: AccountStateTable = match needs
            .table::<crate::account::AccountTag, Utf8Key, crate::entities::Account>(
                crate::account::ACCOUNT_TABLE,
            ) {
            Ok(table) => table,
            Err(e) => return StoreF::pure(Err(e)),
        };

        let digest = keccak256(&signed.value.encode());
        let signer_id = match signed.recover_signer(&digest) {
            Ok(pubkey) => KeyId20::from_bytes(pubkey.key_id20()),
            Err(e) => return StoreF::pure(Err(ModuleError::Sigil(e.into()))),
        };
        match signed.value {
            GroupTx::CreateGroup {
                name,
                coordinator,
                ..
            } => {
                let coordinator_for_lookup = coordinator.clone();
                accounts
                    .get(BrandedKey::new(coordinator_for_lookup))
                    .bind(move |coordinator_account| {
                        let Some(coordinator_account) = coordinator_account else {
                            return StoreF::pure(Err(account_err(AccountError::AccountNotFound {
                                name: coordinator.0.clone(),
                            })));
                        };
                        if coordinator_account.owner != signer_id
                            && coordinator_account.guardian != Some(signer_id)
                        {
                            return StoreF::pure(Err(account_err(AccountError::Unauthorized)));
                        }
                        groups
                            .get(BrandedKey::new(name.clone()))
                            .bind(move |existing| {
                                if existing.is_some() {
                                    return StoreF::pure(Err(account_err(
                                        AccountError::DuplicateGroup {
                                            name: name.0.clone(),
                                        },
                                    )));
                                }
                                let group = Group {
                                    coordinator: coordinator.clone(),
                                    member_count: 0,
                                    group_nonce: 0,
                                };
                                let event_name = name.clone();
                                let event_coordinator = coordinator.clone();
                                groups.put(BrandedKey::new(name), group).map(move |()| {
                                    Ok(ReducerOutput::new(
                                        (),
                                        vec![GroupEvent::GroupCreated {
                                            name: event_name,
                                            coordinator: event_coordinator,
                                        }],
                                    ))
                                })
                            })
                    })
            }
            GroupTx::AddMembers {
                group,
                members: member_ids,
                nonce,
                ..
            } => {
                let group_name = group.clone();
                GroupReducer::authorize_existing(groups.clone(), accounts.clone(), group.clone(), signer_id, nonce)
                    .bind(move |result| match result {
                        Err(e) => StoreF::pure(Err(e)),
                        Ok(group_row) => add_members(
                            groups.clone(),
                            members.clone(),
                            group_name.clone(),
                            group_row,
                            member_ids.clone(),
                        ),
                    })
            }
            GroupTx::RemoveMembers {
                group,
                members: member_ids,
                nonce,
                ..
            } => {
                let group_name = group.clone();
                GroupReducer::authorize_existing(groups.clone(), accounts.clone(), group.clone(), signer_id, nonce)
                    .bind(move |result| match result {
                        Err(e) => StoreF::pure(Err(e)),
                        Ok(group_row) => remove_members(
                            groups.clone(),
                            members.clone(),
                            group_name.clone(),
                            group_row,
                            member_ids.clone(),
                        ),
                    })
            }
            GroupTx::DisbandGroup { group, nonce, .. } => {
                let group_name = group.clone();
                GroupReducer::authorize_existing(groups.clone(), accounts.clone(), group.clone(), signer_id, nonce)
                    .bind(move |result| match result {
                        Err(e) => StoreF::pure(Err(e)),
                        Ok(group_row) => {
                            if group_row.member_count != 0 {
                                return StoreF::pure(Err(account_err(AccountError::GroupNotEmpty {
                                    name: group_name.0.clone(),
                                    remaining: group_row.member_count,
                                })));
                            }
                            let event_name = group_name.clone();
                            groups.remove(BrandedKey::new(group_name)).map(move |()| {
                                Ok(ReducerOutput::new(
                                    (),
                                    vec![GroupEvent::GroupDisbanded { group: event_name }],
                                ))
                            })
                        }
                    })
            }
        }
    }
}

fn add_members(
    groups: GroupStateTable,
    members_table: GroupMemberStateTable,
    group_name: Utf8Key,
    mut group_row: Group,
    member_ids: Vec<KeyId20>,
) -> StoreF<Result<ReducerOutput, ModuleError>> {
    let added = member_ids.clone();
    let group_name_for_event = group_name.clone();
    let initial_count = group_row.member_count;

    // Fold over each member: idempotent insert, counting only genuinely
    // new members toward `member_count`.
    let mut chain = StoreF::pure(0u32);
    for member in member_ids {
        let members_table = members_table.clone();
        let key = GroupMemberKey::new(group_name.clone(), member);
        chain = chain.bind(move |added_so_far| {
            members_table
                .get(BrandedKey::new(key.clone()))
                .bind(move |existing| {
                    if existing.is_some() {
                        StoreF::pure(added_so_far)
                    } else {
                        members_table
                            .put(BrandedKey::new(key), true)
                            .map(move |()| added_so_far + 1)
                    }
                })
        });
    }
    chain.bind(move |newly_added| {
        group_row.member_count = initial_count + newly_added;
        group_row.group_nonce += 1;
        groups
            .put(BrandedKey::new(group_name_for_event.clone()), group_row)
            .map(move |()| {
                Ok(ReducerOutput::new(
                    (),
                    vec![GroupEvent::MembersAdded {
                        group: group_name_for_event,
                        members: added,
                    }],
                ))
            })
    })
}

fn remove_members(
    groups: GroupStateTable,
    members_table: GroupMemberStateTable,
    group_name: Utf8Key,
    mut group_row: Group,
    member_ids: Vec<KeyId20>,
) -> StoreF<Result<ReducerOutput, ModuleError>> {
    let removed = member_ids.clone();
    let group_name_for_event = group_name.clone();
    let initial_count = group_row.member_count;

    let mut chain = StoreF::pure(0u32);
    for member in member_ids {
        let members_table = members_table.clone();
        let key = GroupMemberKey::new(group_name.clone(), member);
        chain = chain.bind(move |removed_so_far| {
            members_table
                .get(BrandedKey::new(key.clone()))
                .bind(move |existing| {
                    if existing.is_none() {
                        StoreF::pure(removed_so_far)
                    } else {
                        members_table
                            .remove(BrandedKey::new(key))
                            .map(move |()| removed_so_far + 1)
                    }
                })
        });
    }
    chain.bind(move |newly_removed| {
        group_row.member_count = initial_count.saturating_sub(newly_removed);
        group_row.group_nonce += 1;
        groups
            .put(BrandedKey::new(group_name_for_event.clone()), group_row)
            .map(move |()| {
                Ok(ReducerOutput::new(
                    (),
                    vec![GroupEvent::MembersRemoved {
                        group: group_name_for_event,
                        members: removed,
                    }],
                ))
            })
    })
}

/// Builds the group management blueprint: owns `group` and
/// `groupMember`, needs the account module's `account` table to
/// authorize coordinator signatures at creation time.
pub fn group_blueprint() -> Blueprint {
    Blueprint::new(
        "groups",
        vec![
            EntrySpec::new::<GroupTag, Utf8Key, Group>(GROUP_TABLE),
            EntrySpec::new::<GroupMemberTag, GroupMemberKey, bool>(GROUP_MEMBER_TABLE),
        ],
        vec![crate::account::ACCOUNT_TABLE],
        Arc::new(GroupReducer),
    )
}
