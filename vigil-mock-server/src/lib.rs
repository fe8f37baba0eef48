use std::collections::{btree_map, BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;
use vigil_api::{
    CommentId, CommentRecord, CommentSource, Error, InteractionType, NewComment, PrayerId,
    RawTimestamp, Time, UserId,
};

/// In-memory stand-in for the prayer interaction backend
pub struct MockServer {
    users: BTreeMap<UserId, String>,
    prayers: BTreeMap<PrayerId, Vec<CommentRecord>>,
    session: Option<UserId>,
    clock: Time,
    reversed_feeds: bool,
}

impl MockServer {
    /// Comments get timestamps starting at `start`, one second apart
    pub fn new(start: Time) -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            prayers: BTreeMap::new(),
            session: None,
            clock: start,
            reversed_feeds: false,
        }
    }

    pub fn admin_create_user(&mut self, id: UserId, name: String) -> Result<(), Error> {
        match self.users.entry(id) {
            btree_map::Entry::Occupied(e) => Err(Error::Unknown(format!(
                "user {} already exists",
                e.key().0
            ))),
            btree_map::Entry::Vacant(e) => {
                e.insert(name);
                Ok(())
            }
        }
    }

    pub fn login(&mut self, id: &UserId) -> Result<(), Error> {
        if !self.users.contains_key(id) {
            return Err(Error::PermissionDenied);
        }
        self.session = Some(id.clone());
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    /// Serve feeds newest-first, so replies come before their parents
    pub fn reverse_feeds(&mut self, reversed: bool) {
        self.reversed_feeds = reversed;
    }

    /// Store a record as-is, bypassing every check
    pub fn insert_raw(&mut self, prayer: PrayerId, record: CommentRecord) {
        self.prayers.entry(prayer).or_default().push(record);
    }

    pub fn comments(&self, prayer: &PrayerId) -> Vec<CommentRecord> {
        let mut res = self.prayers.get(prayer).cloned().unwrap_or_default();
        if self.reversed_feeds {
            res.reverse();
        }
        res
    }

    fn find(&self, id: &CommentId) -> Option<(&PrayerId, &CommentRecord)> {
        self.prayers
            .iter()
            .find_map(|(p, recs)| recs.iter().find(|r| r.id == *id).map(|r| (p, r)))
    }

    pub fn create(&mut self, c: NewComment) -> Result<CommentRecord, Error> {
        let owner = self.session.clone().ok_or(Error::PermissionDenied)?;
        let content = c.content.trim();
        if c.kind == InteractionType::Comment && content.is_empty() {
            return Err(Error::EmptyContent);
        }
        if let Some(parent_id) = &c.parent_interaction_id {
            if c.kind != InteractionType::Comment {
                return Err(Error::ParentMismatch(parent_id.clone()));
            }
            let (parent_prayer, parent) = self
                .find(parent_id)
                .ok_or_else(|| Error::ParentNotFound(parent_id.clone()))?;
            if !parent.is_comment() || *parent_prayer != c.prayer_request_id {
                return Err(Error::ParentMismatch(parent_id.clone()));
            }
        }

        let record = CommentRecord {
            id: CommentId(Uuid::new_v4().to_string()),
            parent_interaction_id: c.parent_interaction_id,
            prayer_request_id: Some(c.prayer_request_id.clone()),
            user_name: self.users.get(&owner).cloned().unwrap_or_default(),
            user_id: owner,
            user_profile_pic_url: None,
            kind: c.kind,
            content: Some(String::from(content)),
            timestamp: RawTimestamp::from(self.clock),
            reply_count: None,
            replies: Vec::new(),
        };
        self.clock = self.clock + Duration::seconds(1);
        self.insert_raw(c.prayer_request_id, record.clone());
        Ok(record)
    }

    /// Only the author may delete; replies go away with their parent
    pub fn delete(&mut self, id: &CommentId) -> Result<(), Error> {
        let user = self.session.clone().ok_or(Error::PermissionDenied)?;
        let (prayer, record) = self.find(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        if record.user_id != user {
            return Err(Error::PermissionDenied);
        }
        let prayer = prayer.clone();
        let records = self
            .prayers
            .get_mut(&prayer)
            .expect("prayer of a found comment vanished");

        let mut doomed = HashSet::new();
        doomed.insert(id.clone());
        loop {
            let before = doomed.len();
            for r in records.iter() {
                if r.parent_interaction_id
                    .as_ref()
                    .map_or(false, |p| doomed.contains(p))
                {
                    doomed.insert(r.id.clone());
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        records.retain(|r| !doomed.contains(&r.id));
        tracing::info!(comment = %id, num_deleted = doomed.len(), "deleted comment");
        Ok(())
    }
}

#[async_trait]
impl CommentSource for MockServer {
    fn current_user(&self) -> Option<UserId> {
        self.session.clone()
    }

    async fn fetch_comments(&mut self, prayer: &PrayerId) -> anyhow::Result<Vec<CommentRecord>> {
        Ok(self.comments(prayer))
    }

    async fn create_comment(&mut self, c: NewComment) -> anyhow::Result<CommentRecord> {
        Ok(self.create(c)?)
    }

    async fn delete_comment(&mut self, id: &CommentId) -> anyhow::Result<()> {
        Ok(self.delete(id)?)
    }
}
