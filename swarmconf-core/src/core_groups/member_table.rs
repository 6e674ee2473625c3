/*
    member_table.rs - Ordered member set of a legacy group

    Members are unique by session id and kept sorted by it. The tree form
    is a dictionary `{session_id: is_admin}`.

    Removal while iterating goes through MemberCursor::erase_current. The
    cursor holds the table mutably, so any other mutation while it is alive
    does not compile.
*/

use super::session_id::SessionId;
use crate::core_codec::{Dict, Value};
use crate::errors::{SyncError, SyncResult};
use std::collections::BTreeMap;
use std::ops::Bound;

/// A group member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub session_id: SessionId,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberTable {
    members: BTreeMap<SessionId, bool>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member or change its admin flag.
    ///
    /// Returns false for an invalid session id or when the member already
    /// exists with the same flag.
    pub fn add(&mut self, session_id: &str, is_admin: bool) -> bool {
        let Ok(id) = SessionId::parse(session_id) else {
            return false;
        };
        self.members.insert(id, is_admin) != Some(is_admin)
    }

    pub fn remove(&mut self, session_id: &str) -> bool {
        match SessionId::parse(session_id) {
            Ok(id) => self.members.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        SessionId::parse(session_id)
            .map(|id| self.members.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn is_admin(&self, session_id: &str) -> bool {
        SessionId::parse(session_id)
            .ok()
            .and_then(|id| self.members.get(&id).copied())
            .unwrap_or(false)
    }

    /// (total, admins, non-admins)
    pub fn count(&self) -> (usize, usize, usize) {
        let admins = self.members.values().filter(|admin| **admin).count();
        (self.members.len(), admins, self.members.len() - admins)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in session id order
    pub fn iter(&self) -> impl Iterator<Item = Member> + '_ {
        self.members.iter().map(|(id, admin)| Member {
            session_id: id.clone(),
            is_admin: *admin,
        })
    }

    /// Cursor positioned at the first member
    pub fn cursor(&mut self) -> MemberCursor<'_> {
        let current = self.members.keys().next().cloned();
        MemberCursor {
            table: self,
            current,
        }
    }

    pub fn to_dict(&self) -> Dict {
        self.members
            .iter()
            .map(|(id, admin)| (id.to_string(), Value::Bool(*admin)))
            .collect()
    }

    /// Read the tree form. Entries with an invalid id or a non-boolean
    /// flag are skipped.
    pub fn from_dict(dict: &Dict) -> Self {
        let members = dict
            .iter()
            .filter_map(|(id, admin)| Some((SessionId::parse(id).ok()?, admin.as_bool()?)))
            .collect();
        MemberTable { members }
    }

    fn after(&self, id: &SessionId) -> Option<SessionId> {
        self.members
            .range((Bound::Excluded(id), Bound::Unbounded))
            .next()
            .map(|(next, _)| next.clone())
    }
}

/// Iteration over a member table that may erase as it goes
pub struct MemberCursor<'a> {
    table: &'a mut MemberTable,
    current: Option<SessionId>,
}

impl MemberCursor<'_> {
    /// Member under the cursor, None once exhausted
    pub fn current(&self) -> Option<Member> {
        let id = self.current.as_ref()?;
        let is_admin = *self.table.members.get(id)?;
        Some(Member {
            session_id: id.clone(),
            is_admin,
        })
    }

    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    /// Move to the next member; returns false once exhausted
    pub fn advance(&mut self) -> bool {
        self.current = self
            .current
            .as_ref()
            .and_then(|id| self.table.after(id));
        self.current.is_some()
    }

    /// Remove the member under the cursor and move to the next one
    pub fn erase_current(&mut self) -> SyncResult<Member> {
        let id = self.current.take().ok_or_else(|| {
            SyncError::ContractViolation("erase through an exhausted member cursor".to_string())
        })?;
        self.current = self.table.after(&id);
        let is_admin = self.table.members.remove(&id).unwrap_or(false);
        Ok(Member {
            session_id: id,
            is_admin,
        })
    }
}
