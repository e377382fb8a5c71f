use crate::entities::{Account, Envelope, KeyId20, NameKeyEntry, NameKeyKey};
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

pub struct AccountTag;
pub struct NameKeyTag;

pub const ACCOUNT_TABLE: &str = "account";
pub const NAME_KEY_TABLE: &str = "nameKey";

/// The four account-management transactions. `nonce` is absent from
/// `RegisterAccount` — a fresh account starts at nonce zero, so there
/// is no prior value to compare against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountTx {
    RegisterAccount {
        name: Utf8Key,
        owner_key_id: KeyId20,
        envelope: Envelope,
    },
    RegisterKey {
        account: Utf8Key,
        key_id: KeyId20,
        expires_at: Option<Instant>,
        nonce: u64,
        envelope: Envelope,
    },
    RevokeKey {
        account: Utf8Key,
        key_id: KeyId20,
        nonce: u64,
        envelope: Envelope,
    },
    SetGuardian {
        account: Utf8Key,
        guardian: Option<KeyId20>,
        nonce: u64,
        envelope: Envelope,
    },
}

impl AccountTx {
    fn envelope(&self) -> &Envelope {
        match self {
            AccountTx::RegisterAccount { envelope, .. } => envelope,
            AccountTx::RegisterKey { envelope, .. } => envelope,
            AccountTx::RevokeKey { envelope, .. } => envelope,
            AccountTx::SetGuardian { envelope, .. } => envelope,
        }
    }
}

impl ByteEncode for AccountTx {
    fn encode(&self) -> Vec<u8> {
        match self {
            AccountTx::RegisterAccount {
                name,
                owner_key_id,
                envelope,
            } => {
                let mut out = vec![0u8];
                out.extend(name.encode());
                out.extend(owner_key_id.encode());
                out.extend(envelope.encode());
                out
            }
            AccountTx::RegisterKey {
                account,
                key_id,
                expires_at,
                nonce,
                envelope,
            } => {
                let mut out = vec![1u8];
                out.extend(account.encode());
                out.extend(key_id.encode());
                out.extend(expires_at.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
            AccountTx::RevokeKey {
                account,
                key_id,
                nonce,
                envelope,
            } => {
                let mut out = vec![2u8];
                out.extend(account.encode());
                out.extend(key_id.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
            AccountTx::SetGuardian {
                account,
                guardian,
                nonce,
                envelope,
            } => {
                let mut out = vec![3u8];
                out.extend(account.encode());
                out.extend(guardian.encode());
                out.extend(nonce.encode());
                out.extend(envelope.encode());
                out
            }
        }
    }
}

impl Tx for AccountTx {
    type Result = ();
    type Event = AccountEvent;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    AccountRegistered { name: Utf8Key, owner: KeyId20 },
    KeyRegistered { account: Utf8Key, key_id: KeyId20 },
    KeyRevoked { account: Utf8Key, key_id: KeyId20 },
    GuardianChanged { account: Utf8Key, guardian: Option<KeyId20> },
}

fn account_err(e: AccountError) -> ModuleError {
    ModuleError::Sigil(e.into())
}

type AccountStateTable = Arc<StateTable<AccountTag, Utf8Key, Account>>;
type NameKeyStateTable = Arc<StateTable<NameKeyTag, NameKeyKey, NameKeyEntry>>;

pub struct AccountReducer;

impl AccountReducer {
    fn tables(
        owned: &TablesProvider,
    ) -> Result<(AccountStateTable, NameKeyStateTable), ModuleError> {
        let accounts = owned.table::<AccountTag, Utf8Key, Account>(ACCOUNT_TABLE)?;
        let name_keys = owned.table::<NameKeyTag, NameKeyKey, NameKeyEntry>(NAME_KEY_TABLE)?;
        Ok((accounts, name_keys))
    }

    /// Steps 2-6 of the signature pipeline shared by every mutation on an
    /// already-existing account: resolve the signer's key id, require it
    /// to be registered and unexpired, require it to be the owner or
    /// guardian, and require the supplied nonce to match.
    fn authorize_existing(
        accounts: AccountStateTable,
        name_keys: NameKeyStateTable,
        account_name: Utf8Key,
        signer_id: KeyId20,
        created_at: Instant,
        nonce: u64,
    ) -> StoreF<Result<Account, ModuleError>> {
        let name_key_lookup = NameKeyKey::new(account_name.clone(), signer_id);
        accounts
            .get(BrandedKey::new(account_name.clone()))
            .bind(move |existing| {
                let Some(account) = existing else {
                    return StoreF::pure(Err(account_err(AccountError::AccountNotFound {
                        name: account_name.0.clone(),
                    })));
                };
                name_keys
                    .get(BrandedKey::new(name_key_lookup))
                    .map(move |entry| {
                        let entry = match entry {
                            Some(entry) => entry,
                            None => return Err(account_err(AccountError::UnregisteredKey)),
                        };
                        if let Some(expires_at) = entry.expires_at {
                            if expires_at < created_at {
                                return Err(account_err(AccountError::ExpiredKey));
                            }
                        }
                        let is_owner = account.owner == signer_id;
                        let is_guardian = account.guardian == Some(signer_id);
                        if !is_owner && !is_guardian {
                            return Err(account_err(AccountError::Unauthorized));
                        }
                        if account.nonce != nonce {
                            return Err(account_err(AccountError::NonceMismatch {
                                expected: account.nonce,
                                got: nonce,
                            }));
                        }
                        Ok(account)
                    })
            })
    }
}

impl ModuleReducer for AccountReducer {
    fn apply(
        &self,
        owned: TablesProvider,
        _needs: TablesProvider,
        tx: Arc<dyn Any + Send + Sync>,
    ) -> StoreF<Result<ReducerOutput, ModuleError>> {
        let signed = match tx.downcast::<Signed<AccountTx>>() {
            Ok(signed) => *signed,
            Err(_) => return StoreF::pure(Err(ModuleError::WrongTxType)),
        };
        let (accounts, name_keys) = match Self::tables(&owned) {
            Ok(tables) => tables,
            Err(e) => return StoreF::pure(Err(e)),
        };

        let digest = keccak256(&signed.value.encode());
        let signer_id = match signed.recover_signer(&digest) {
            Ok(pubkey) => KeyId20::from_bytes(pubkey.key_id20()),
            Err(e) => return StoreF::pure(Err(ModuleError::Sigil(e.into()))),
        };
        let created_at = signed.value.envelope().created_at;

        match signed.value {
            AccountTx::RegisterAccount {
                name,
                owner_key_id,
                ..
            } => {
                if signer_id != owner_key_id {
                    return StoreF::pure(Err(account_err(AccountError::OwnerKeyMismatch)));
                }
                let registered_at = created_at;
                let event_name = name.clone();
                accounts
                    .get(BrandedKey::new(name.clone()))
                    .bind(move |existing| {
                        if existing.is_some() {
                            return StoreF::pure(Err(account_err(AccountError::DuplicateAccount {
                                name: name.0.clone(),
                            })));
                        }
                        let account = Account {
                            name: name.clone(),
                            owner: owner_key_id,
                            guardian: None,
                            nonce: 0,
                        };
                        let name_key = NameKeyKey::new(name.clone(), owner_key_id);
                        let entry = NameKeyEntry {
                            registered_at,
                            expires_at: None,
                        };
                        accounts
                            .put(BrandedKey::new(name.clone()), account)
                            .then(name_keys.put(BrandedKey::new(name_key), entry))
                            .map(move |()| {
                                Ok(ReducerOutput::new(
                                    (),
                                    vec![AccountEvent::AccountRegistered {
                                        name: event_name,
                                        owner: owner_key_id,
                                    }],
                                ))
                            })
                    })
            }
            AccountTx::RegisterKey {
                account,
                key_id,
                expires_at,
                nonce,
                ..
            } => {
                let account_name = account.clone();
                AccountReducer::authorize_existing(
                    accounts.clone(),
                    name_keys.clone(),
                    account.clone(),
                    signer_id,
                    created_at,
                    nonce,
                )
                .bind(move |result| match result {
                    Err(e) => StoreF::pure(Err(e)),
                    Ok(mut acct) => {
                        acct.nonce += 1;
                        let name_key = NameKeyKey::new(account_name.clone(), key_id);
                        let entry = NameKeyEntry {
                            registered_at: created_at,
                            expires_at,
                        };
                        accounts
                            .put(BrandedKey::new(account_name.clone()), acct)
                            .then(name_keys.put(BrandedKey::new(name_key), entry))
                            .map(move |()| {
                                Ok(ReducerOutput::new(
                                    (),
                                    vec![AccountEvent::KeyRegistered {
                                        account: account_name,
                                        key_id,
                                    }],
                                ))
                            })
                    }
                })
            }
            AccountTx::RevokeKey {
                account,
                key_id,
                nonce,
                ..
            } => {
                let account_name = account.clone();
                AccountReducer::authorize_existing(
                    accounts.clone(),
                    name_keys.clone(),
                    account.clone(),
                    signer_id,
                    created_at,
                    nonce,
                )
                .bind(move |result| match result {
                    Err(e) => StoreF::pure(Err(e)),
                    Ok(mut acct) => {
                        acct.nonce += 1;
                        let name_key = NameKeyKey::new(account_name.clone(), key_id);
                        accounts
                            .put(BrandedKey::new(account_name.clone()), acct)
                            .then(name_keys.remove(BrandedKey::new(name_key)))
                            .map(move |()| {
                                Ok(ReducerOutput::new(
                                    (),
                                    vec![AccountEvent::KeyRevoked {
                                        account: account_name,
                                        key_id,
                                    }],
                                ))
                            })
                    }
                })
            }
            AccountTx::SetGuardian {
                account,
                guardian,
                nonce,
                ..
            } => {
                let account_name = account.clone();
                AccountReducer::authorize_existing(
                    accounts.clone(),
                    name_keys.clone(),
                    account.clone(),
                    signer_id,
                    created_at,
                    nonce,
                )
                .bind(move |result| match result {
                    Err(e) => StoreF::pure(Err(e)),
                    Ok(mut acct) => {
                        acct.nonce += 1;
                        acct.guardian = guardian;
                        accounts
                            .put(BrandedKey::new(account_name.clone()), acct)
                            .map(move |()| {
                                Ok(ReducerOutput::new(
                                    (),
                                    vec![AccountEvent::GuardianChanged {
                                        account: account_name,
                                        guardian,
                                    }],
                                ))
                            })
                    }
                })
            }
        }
    }
}

/// Builds the account management blueprint: owns `account` and
/// `nameKey`, needs nothing from sibling modules.
pub fn account_blueprint() -> Blueprint {
    Blueprint::new(
        "accounts",
        vec![
            EntrySpec::new::<AccountTag, Utf8Key, Account>(ACCOUNT_TABLE),
            EntrySpec::new::<NameKeyTag, NameKeyKey, NameKeyEntry>(NAME_KEY_TABLE),
        ],
        vec![],
        Arc::new(AccountReducer),
    )
}
