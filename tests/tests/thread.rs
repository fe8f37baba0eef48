use chrono::{TimeZone, Utc};
use vigil_api::{
    CommentId, CommentRecord, CommentSource, InteractionType, NewComment, PrayerId, UserId,
};
use vigil_client::{
    count_nodes, delete_and_reload, load_thread, submit_comment, CommentNode, ThreadView,
    TreeBuilder, Viewer,
};
use vigil_mock_server::MockServer;

fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt::try_init();
    }
}

fn server() -> MockServer {
    init_tracing();
    let mut s = MockServer::new(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    s.admin_create_user(UserId::new("ruth"), String::from("Ruth"))
        .expect("creating ruth");
    s.admin_create_user(UserId::new("boaz"), String::from("Boaz"))
        .expect("creating boaz");
    s
}

fn texts(nodes: &[CommentNode]) -> String {
    nodes
        .iter()
        .map(|n| {
            let text = n.record.content.clone().unwrap_or_default();
            match n.replies.is_empty() {
                true => text,
                false => format!("{text}({})", texts(&n.replies)),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

async fn post(
    s: &mut MockServer,
    prayer: &PrayerId,
    text: &str,
    parent: Option<&CommentId>,
) -> CommentId {
    s.create_comment(NewComment::new(
        prayer.clone(),
        String::from(text),
        parent.cloned(),
    ))
    .await
    .expect("posting comment")
    .id
}

#[tokio::test]
async fn reversed_feed_builds_the_same_thread() -> anyhow::Result<()> {
    let mut s = server();
    let prayer = PrayerId::new("p1");
    s.login(&UserId::new("ruth"))?;
    let a = post(&mut s, &prayer, "a", None).await;
    let b = post(&mut s, &prayer, "b", Some(&a)).await;
    post(&mut s, &prayer, "c", Some(&b)).await;
    post(&mut s, &prayer, "d", None).await;
    post(&mut s, &prayer, "e", Some(&a)).await;

    let builder = TreeBuilder::default();
    let forward = load_thread(&mut s, &prayer, &builder).await?;
    s.reverse_feeds(true);
    let backward = load_thread(&mut s, &prayer, &builder).await?;

    assert_eq!(texts(&forward.nodes), "a(b(c),e),d");
    assert_eq!(forward, backward);
    assert_eq!(forward.total, 5);
    assert_eq!(forward.stats().max_depth, 3);
    Ok(())
}

#[tokio::test]
async fn messy_feed() -> anyhow::Result<()> {
    let mut s = server();
    let prayer = PrayerId::new("p1");
    let raw = |id: &str, parent: Option<&str>, content: &str| {
        let mut r = CommentRecord::stub(id);
        r.parent_interaction_id = parent.map(CommentId::new);
        r.content = Some(String::from(content));
        r
    };
    s.insert_raw(
        prayer.clone(),
        raw("r2", Some("r1"), "reply").at(vec![2024_i64, 1, 1, 9, 5]),
    );
    s.insert_raw(
        prayer.clone(),
        raw("o", Some("gone"), "orphan").at("2024-01-01T09:30:00Z"),
    );
    s.insert_raw(prayer.clone(), raw("bad", None, "undated").at("garbage"));
    let mut amen = raw("amen", None, "").at("2024-01-01T09:00:00");
    amen.kind = InteractionType::Amen;
    s.insert_raw(prayer.clone(), amen);
    s.insert_raw(
        prayer.clone(),
        raw("r1", None, "root").at("2024-01-01T09:00:00.000"),
    );

    let thread = load_thread(&mut s, &prayer, &TreeBuilder::default()).await?;
    assert_eq!(texts(&thread.nodes), "undated,root(reply),orphan");
    assert_eq!(thread.total, 4);
    Ok(())
}

#[tokio::test]
async fn replying_through_the_view() -> anyhow::Result<()> {
    let mut s = server();
    let prayer = PrayerId::new("p1");
    let builder = TreeBuilder::default();
    assert_eq!(Viewer::of_source(&s), Viewer::anonymous());
    s.login(&UserId::new("ruth"))?;
    assert_eq!(Viewer::of_source(&s), Viewer::user(UserId::new("ruth")));
    let mut view = ThreadView::new(Viewer::of_source(&s));

    let thread = submit_comment(&mut s, &mut view, &prayer, None, "  first  ", &builder)
        .await?
        .expect("comment was not posted");
    let first = thread.nodes[0].id().clone();

    view.toggle_collapse(&first);
    view.start_reply(first.clone());
    let thread = submit_comment(
        &mut s,
        &mut view,
        &prayer,
        Some(first.clone()),
        "second",
        &builder,
    )
    .await?
    .expect("reply was not posted");
    assert_eq!(texts(&thread.nodes), "first(second)");
    assert!(!view.is_collapsed(&first));
    assert_eq!(view.replying_to(), None);
    assert_eq!(view.rows(&thread.nodes).len(), 2);
    assert!(view.rows(&thread.nodes).iter().all(|r| r.is_owner));

    // Blank text never reaches the source
    assert!(submit_comment(&mut s, &mut view, &prayer, None, "   ", &builder)
        .await?
        .is_none());
    let mut anon = ThreadView::new(Viewer::anonymous());
    assert!(submit_comment(&mut s, &mut anon, &prayer, None, "hi", &builder)
        .await?
        .is_none());
    assert_eq!(s.comments(&prayer).len(), 2);
    Ok(())
}

#[tokio::test]
async fn deleting_drops_the_subtree() -> anyhow::Result<()> {
    let mut s = server();
    let prayer = PrayerId::new("p1");
    let builder = TreeBuilder::default();
    s.login(&UserId::new("ruth"))?;
    let a = post(&mut s, &prayer, "a", None).await;
    post(&mut s, &prayer, "keep", None).await;
    s.login(&UserId::new("boaz"))?;
    let b = post(&mut s, &prayer, "b", Some(&a)).await;
    post(&mut s, &prayer, "c", Some(&b)).await;

    let mut view = ThreadView::new(Viewer::user(UserId::new("boaz")));
    view.toggle_collapse(&b);
    view.toggle_collapse(&a);

    // Boaz may not delete Ruth's comment
    let err = delete_and_reload(&mut s, &mut view, &prayer, &a, &builder)
        .await
        .expect_err("deleting someone else's comment");
    assert_eq!(
        err.downcast_ref::<vigil_api::Error>(),
        Some(&vigil_api::Error::PermissionDenied)
    );

    let thread = delete_and_reload(&mut s, &mut view, &prayer, &b, &builder).await?;
    assert_eq!(texts(&thread.nodes), "a,keep");
    assert!(!view.is_collapsed(&b));
    assert!(view.is_collapsed(&a));

    s.login(&UserId::new("ruth"))?;
    let thread = delete_and_reload(&mut s, &mut view, &prayer, &a, &builder).await?;
    assert_eq!(texts(&thread.nodes), "keep");
    assert_eq!(count_nodes(&thread.nodes), 1);
    assert!(!view.is_collapsed(&a));
    Ok(())
}

#[tokio::test]
async fn generated_style_dump_parses() -> anyhow::Result<()> {
    let dump = r#"{
        "content": [
            {"id": "2", "parentInteractionId": "1", "userId": "u", "userName": "U",
             "type": "COMMENT", "content": "reply", "timestamp": [2024, 1, 1, 10, 5, 0]},
            {"id": "1", "userId": "u", "userName": "U", "type": "COMMENT",
             "content": "root", "timestamp": "2024-01-01T10:00:00"},
            {"id": "3", "userId": "u", "type": "PRAY", "timestamp": "2024-01-01T10:01:00"}
        ],
        "totalElements": 3, "totalPages": 1, "size": 20, "number": 0,
        "first": true, "last": true
    }"#;
    let feed: vigil_api::CommentFeed = serde_json::from_str(dump)?;
    let nodes = TreeBuilder::default().build(feed.into_records());
    assert_eq!(texts(&nodes), "root(reply)");
    Ok(())
}
