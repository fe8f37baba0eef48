use std::fmt;

mod error;
pub use error::Error;

mod source;
pub use source::CommentSource;

mod timestamp;
pub use timestamp::{epoch, RawTimestamp, TimestampError};

pub use chrono_tz::Tz;
pub type Time = chrono::DateTime<chrono::Utc>;

#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> CommentId {
        CommentId(id.into())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> UserId {
        UserId(id.into())
    }

    pub fn stub() -> UserId {
        UserId(String::from("stub-user"))
    }
}

#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct PrayerId(pub String);

impl PrayerId {
    pub fn new(id: impl Into<String>) -> PrayerId {
        PrayerId(id.into())
    }
}

impl fmt::Display for PrayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a prayer interaction. Reactions share the feed with comments, but
/// only `Comment` takes part in threads.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    Pray,
    #[default]
    Comment,
    Encourage,
    Amen,
    Heart,
    Praise,

    /// Any kind this crate does not know about yet
    #[serde(other)]
    Other,
}

/// The backend serializes unset fields as `null`
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let v: Option<T> = serde::Deserialize::deserialize(d)?;
    Ok(v.unwrap_or_default())
}

/// One comment (or reaction) as the backend sends it: flat, with an optional
/// pointer to its parent.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: CommentId,

    #[serde(default, alias = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_interaction_id: Option<CommentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prayer_request_id: Option<PrayerId>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: UserId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile_pic_url: Option<String>,

    /// Missing on feeds that only ever carry comments
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: InteractionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, rename = "timestamp", alias = "createdAt")]
    pub timestamp: RawTimestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u32>,

    /// Replies the backend already nested under this record
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub replies: Vec<CommentRecord>,
}

impl CommentRecord {
    pub fn stub(id: &str) -> CommentRecord {
        CommentRecord {
            id: CommentId::new(id),
            parent_interaction_id: None,
            prayer_request_id: None,
            user_id: UserId::stub(),
            user_name: String::from("Stub User"),
            user_profile_pic_url: None,
            kind: InteractionType::Comment,
            content: None,
            timestamp: RawTimestamp::default(),
            reply_count: None,
            replies: Vec::new(),
        }
    }

    pub fn reply_to(mut self, parent: &str) -> CommentRecord {
        self.parent_interaction_id = Some(CommentId::new(parent));
        self
    }

    pub fn at(mut self, timestamp: impl Into<RawTimestamp>) -> CommentRecord {
        self.timestamp = timestamp.into();
        self
    }

    pub fn is_comment(&self) -> bool {
        self.kind == InteractionType::Comment
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentPage {
    pub content: Vec<CommentRecord>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
    pub first: bool,
    pub last: bool,
}

/// Response of the comment listing endpoint, which answers with a bare array
/// when unpaginated and with a page object otherwise.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum CommentFeed {
    List(Vec<CommentRecord>),
    Page(CommentPage),
}

impl CommentFeed {
    pub fn into_records(self) -> Vec<CommentRecord> {
        match self {
            CommentFeed::List(records) => records,
            CommentFeed::Page(page) => page.content,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub prayer_request_id: PrayerId,

    #[serde(rename = "type")]
    pub kind: InteractionType,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_interaction_id: Option<CommentId>,
}

impl NewComment {
    pub fn new(prayer: PrayerId, content: String, parent: Option<CommentId>) -> NewComment {
        NewComment {
            prayer_request_id: prayer,
            kind: InteractionType::Comment,
            content,
            parent_interaction_id: parent,
        }
    }
}
