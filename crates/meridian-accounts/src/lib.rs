//! Account and group management: signature verification, key
//! registration, and group membership, built on `meridian-modules`'
//! `Blueprint`/`Module` framework.

mod account;
mod entities;
mod error;
mod group;

pub use account::{
    account_blueprint, AccountEvent, AccountReducer, AccountTag, AccountTx, NameKeyTag,
    ACCOUNT_TABLE, NAME_KEY_TABLE,
};
pub use entities::{Account, Envelope, Group, GroupMemberKey, KeyId20, NameKeyEntry, NameKeyKey};
pub use error::AccountError;
pub use group::{
    group_blueprint, GroupEvent, GroupMemberTag, GroupReducer, GroupTag, GroupTx, GROUP_MEMBER_TABLE,
    GROUP_TABLE,
};
