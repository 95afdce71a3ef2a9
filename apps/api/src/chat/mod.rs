#![allow(dead_code)]

//! Chat room identity over the external realtime store.
//!
//! Room ids are synthesized deterministically from the participants and
//! job: `{recruiter}_{candidate}_{job}`. Historic clients wrote rooms with
//! the participants swapped, so resolution must tolerate the swapped order
//! as a fallback lookup path. The realtime store itself is an external
//! collaborator reached through the narrow `RoomStore` contract.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn room_exists(&self, room_id: &str) -> Result<bool>;
}

/// Canonical room id: recruiter first.
pub fn room_id(recruiter_id: Uuid, candidate_id: Uuid, job_id: Uuid) -> String {
    format!("{recruiter_id}_{candidate_id}_{job_id}")
}

/// Legacy room id with the participants swapped.
pub fn swapped_room_id(recruiter_id: Uuid, candidate_id: Uuid, job_id: Uuid) -> String {
    format!("{candidate_id}_{recruiter_id}_{job_id}")
}

/// Resolves the room for a conversation: canonical order first, then the
/// swapped fallback. Returns `None` when neither exists.
pub async fn resolve_room(
    store: &dyn RoomStore,
    recruiter_id: Uuid,
    candidate_id: Uuid,
    job_id: Uuid,
) -> Result<Option<String>> {
    let canonical = room_id(recruiter_id, candidate_id, job_id);
    if store.room_exists(&canonical).await? {
        return Ok(Some(canonical));
    }

    let swapped = swapped_room_id(recruiter_id, candidate_id, job_id);
    if store.room_exists(&swapped).await? {
        return Ok(Some(swapped));
    }

    Ok(None)
}

/// Access check: a user may read a room only when they are one of the two
/// participants encoded in its id.
pub fn is_participant(room_id: &str, user_id: Uuid) -> bool {
    let mut segments = room_id.splitn(3, '_');
    let first = segments.next().and_then(|s| Uuid::parse_str(s).ok());
    let second = segments.next().and_then(|s| Uuid::parse_str(s).ok());
    first == Some(user_id) || second == Some(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct FakeStore {
        rooms: Mutex<HashSet<String>>,
    }

    impl FakeStore {
        fn with_rooms(rooms: &[String]) -> Self {
            Self {
                rooms: Mutex::new(rooms.iter().cloned().collect()),
            }
        }
    }

    #[async_trait]
    impl RoomStore for FakeStore {
        async fn room_exists(&self, room_id: &str) -> Result<bool> {
            Ok(self.rooms.lock().unwrap().contains(room_id))
        }
    }

    #[tokio::test]
    async fn test_resolve_prefers_canonical_order() {
        let (r, c, j) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = FakeStore::with_rooms(&[room_id(r, c, j), swapped_room_id(r, c, j)]);

        let resolved = resolve_room(&store, r, c, j).await.unwrap();
        assert_eq!(resolved, Some(room_id(r, c, j)));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_swapped_order() {
        let (r, c, j) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = FakeStore::with_rooms(&[swapped_room_id(r, c, j)]);

        let resolved = resolve_room(&store, r, c, j).await.unwrap();
        assert_eq!(resolved, Some(swapped_room_id(r, c, j)));
    }

    #[tokio::test]
    async fn test_resolve_missing_room_is_none() {
        let store = FakeStore::with_rooms(&[]);
        let resolved = resolve_room(&store, Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_participant_check_accepts_both_sides() {
        let (r, c, j) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let id = room_id(r, c, j);
        assert!(is_participant(&id, r));
        assert!(is_participant(&id, c));
        assert!(!is_participant(&id, j));
        assert!(!is_participant(&id, Uuid::new_v4()));
    }

    #[test]
    fn test_room_id_is_deterministic() {
        let (r, c, j) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(room_id(r, c, j), room_id(r, c, j));
    }
}
