use chrono::{Duration, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng};
use vigil_api::{CommentId, CommentRecord, InteractionType, PrayerId, RawTimestamp, Time, UserId};

const NUM_USERS: usize = 5;
const NUM_COMMENTS: usize = 200;
const NUM_REACTIONS: usize = 40;
const NUM_ORPHANS: usize = 5;

// Chance that a comment replies to an earlier one rather than starting a thread
const REPLY_PROBABILITY: f64 = 0.7;
// Chance that a timestamp is unusable
const BAD_TIMESTAMP_PROBABILITY: f64 = 0.02;

const COMMENT_WORD_COUNT: usize = 12;

const REACTIONS: [InteractionType; 5] = [
    InteractionType::Pray,
    InteractionType::Encourage,
    InteractionType::Amen,
    InteractionType::Heart,
    InteractionType::Praise,
];

fn gen_timestamp(rng: &mut impl Rng, t: Time) -> RawTimestamp {
    if rng.gen_bool(BAD_TIMESTAMP_PROBABILITY) {
        return match rng.gen_bool(0.5) {
            true => RawTimestamp::from("not-a-date"),
            false => RawTimestamp::Unparsed(serde_json::Value::Null),
        };
    }
    // Mix the three shapes the backend has been seen sending
    match rng.gen_range(0..3) {
        0 => RawTimestamp::from(t),
        1 => RawTimestamp::Text(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        _ => RawTimestamp::from(
            t.format("%Y %m %d %H %M %S")
                .to_string()
                .split(' ')
                .filter_map(|f| f.parse().ok())
                .collect::<Vec<i64>>(),
        ),
    }
}

fn main() {
    let mut rng = rand::thread_rng();
    let prayer = PrayerId::new(uuid::Uuid::new_v4().to_string());
    let users = (0..NUM_USERS)
        .map(|i| (UserId::new(uuid::Uuid::new_v4().to_string()), format!("User {i}")))
        .collect::<Vec<_>>();
    let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();

    let mut records = Vec::<CommentRecord>::new();
    let mut gen_record = |rng: &mut rand::rngs::ThreadRng, parent: Option<CommentId>| {
        now = now + Duration::seconds(rng.gen_range(1..3600));
        let (user_id, user_name) = users[rng.gen_range(0..users.len())].clone();
        CommentRecord {
            id: CommentId::new(uuid::Uuid::new_v4().to_string()),
            parent_interaction_id: parent,
            prayer_request_id: Some(prayer.clone()),
            user_id,
            user_name,
            user_profile_pic_url: None,
            kind: InteractionType::Comment,
            content: Some(lipsum::lipsum_words(COMMENT_WORD_COUNT)),
            timestamp: gen_timestamp(rng, now),
            reply_count: None,
            replies: Vec::new(),
        }
    };

    for _ in 0..NUM_COMMENTS {
        let parent = match !records.is_empty() && rng.gen_bool(REPLY_PROBABILITY) {
            true => Some(records[rng.gen_range(0..records.len())].id.clone()),
            false => None,
        };
        let r = gen_record(&mut rng, parent);
        records.push(r);
    }
    for _ in 0..NUM_ORPHANS {
        let r = gen_record(&mut rng, Some(CommentId::new("deleted-comment")));
        records.push(r);
    }
    for _ in 0..NUM_REACTIONS {
        let mut r = gen_record(&mut rng, None);
        r.kind = REACTIONS[rng.gen_range(0..REACTIONS.len())];
        r.content = None;
        records.push(r);
    }

    // The backend gives no ordering guarantee
    records.shuffle(&mut rng);
    println!(
        "{}",
        serde_json::to_string_pretty(&records).expect("serializing test data")
    );
}
