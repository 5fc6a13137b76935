//! Interpreting the store's tagged replies.
//!
//! The store answers `uploadAvatar` and `getAvatar` with a tagged
//! success/failure value. These functions either yield the contained value
//! or raise [`StoreError::Rejected`] carrying the service's message text.
//!
//! `getAvatar` has one more case: an empty result with no error text means
//! nothing is stored under that identifier. That is [`StoredAvatar::Absent`],
//! a normal outcome, not an error.

use crate::store::{AvatarId, AvatarReply, RemoteResult, StoreError};

/// What a read-back found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredAvatar {
    Found(Vec<u8>),
    Absent,
}

impl StoredAvatar {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            StoredAvatar::Found(bytes) => Some(bytes),
            StoredAvatar::Absent => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            StoredAvatar::Found(bytes) => Some(bytes),
            StoredAvatar::Absent => None,
        }
    }
}

/// Unwrap an `uploadAvatar` reply into the assigned identifier.
pub fn unwrap_upload(reply: RemoteResult<u64>) -> Result<AvatarId, StoreError> {
    match reply {
        RemoteResult::Ok(id) => Ok(AvatarId(id)),
        RemoteResult::Err(message) => Err(StoreError::Rejected(message)),
    }
}

/// Unwrap a `getAvatar` reply of either revision.
pub fn unwrap_avatar(reply: AvatarReply) -> Result<StoredAvatar, StoreError> {
    match reply {
        AvatarReply::Result(RemoteResult::Ok(bytes)) if bytes.is_empty() => Ok(StoredAvatar::Absent),
        AvatarReply::Result(RemoteResult::Ok(bytes)) => Ok(StoredAvatar::Found(bytes)),
        AvatarReply::Result(RemoteResult::Err(message)) => Err(StoreError::Rejected(message)),
        AvatarReply::Optional(found) => Ok(unwrap_legacy_avatar(found)),
    }
}

/// The older revision has no error channel: absence is the only non-success.
pub fn unwrap_legacy_avatar(reply: Option<Vec<u8>>) -> StoredAvatar {
    match reply {
        Some(bytes) if !bytes.is_empty() => StoredAvatar::Found(bytes),
        _ => StoredAvatar::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_ok_yields_id() {
        assert_eq!(unwrap_upload(RemoteResult::Ok(0)), Ok(AvatarId(0)));
    }

    #[test]
    fn upload_err_carries_service_text() {
        let err = unwrap_upload(RemoteResult::Err("avatar too big".into())).unwrap_err();
        assert_eq!(err, StoreError::Rejected("avatar too big".into()));
        assert!(err.to_string().contains("avatar too big"));
    }

    #[test]
    fn avatar_bytes_found() {
        let reply = AvatarReply::Result(RemoteResult::Ok(vec![1, 2, 3]));
        assert_eq!(unwrap_avatar(reply), Ok(StoredAvatar::Found(vec![1, 2, 3])));
    }

    #[test]
    fn empty_result_is_absent_not_error() {
        let reply = AvatarReply::Result(RemoteResult::Ok(Vec::new()));
        assert_eq!(unwrap_avatar(reply), Ok(StoredAvatar::Absent));
    }

    #[test]
    fn explicit_error_is_distinguished_from_absent() {
        let reply = AvatarReply::Result(RemoteResult::Err("Avatar not found".into()));
        assert!(matches!(unwrap_avatar(reply), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn legacy_optional_shape() {
        assert_eq!(
            unwrap_avatar(AvatarReply::Optional(None)),
            Ok(StoredAvatar::Absent)
        );
        assert_eq!(
            unwrap_avatar(AvatarReply::Optional(Some(vec![9]))),
            Ok(StoredAvatar::Found(vec![9]))
        );
        assert_eq!(unwrap_legacy_avatar(Some(Vec::new())), StoredAvatar::Absent);
    }

    #[test]
    fn into_bytes() {
        assert_eq!(StoredAvatar::Found(vec![4]).into_bytes(), Some(vec![4]));
        assert_eq!(StoredAvatar::Absent.into_bytes(), None);
    }
}
