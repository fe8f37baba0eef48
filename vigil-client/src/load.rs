use anyhow::Context;

use crate::{
    api::{CommentId, CommentSource, NewComment, PrayerId},
    count_nodes, CommentNode, ThreadStats, ThreadView, TreeBuilder,
};

/// A freshly built comment thread of one prayer request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    pub prayer: PrayerId,
    pub nodes: Vec<CommentNode>,
    pub total: usize,
}

impl Thread {
    pub fn stats(&self) -> ThreadStats {
        ThreadStats::of(&self.nodes)
    }
}

pub async fn load_thread<S>(
    source: &mut S,
    prayer: &PrayerId,
    builder: &TreeBuilder,
) -> anyhow::Result<Thread>
where
    S: CommentSource + ?Sized,
{
    let records = source
        .fetch_comments(prayer)
        .await
        .with_context(|| format!("fetching comments of prayer {prayer}"))?;
    let nodes = builder.build(records);
    let total = count_nodes(&nodes);
    tracing::debug!(%prayer, total, "rebuilt comment thread");
    Ok(Thread {
        prayer: prayer.clone(),
        nodes,
        total,
    })
}

/// Post a comment (or a reply to `parent`) and reload the thread.
///
/// Returns `None` without contacting the source when there is nothing to
/// post or nobody to post as.
pub async fn submit_comment<S>(
    source: &mut S,
    view: &mut ThreadView,
    prayer: &PrayerId,
    parent: Option<CommentId>,
    text: &str,
    builder: &TreeBuilder,
) -> anyhow::Result<Option<Thread>>
where
    S: CommentSource + ?Sized,
{
    let text = text.trim();
    if text.is_empty() || !view.can_comment() {
        return Ok(None);
    }
    let created = source
        .create_comment(NewComment::new(
            prayer.clone(),
            String::from(text),
            parent.clone(),
        ))
        .await
        .context("posting comment")?;
    tracing::debug!(comment = %created.id, "posted comment");
    view.reply_posted(parent.as_ref());
    load_thread(source, prayer, builder).await.map(Some)
}

/// Delete a comment (the backend drops its replies with it) and reload
pub async fn delete_and_reload<S>(
    source: &mut S,
    view: &mut ThreadView,
    prayer: &PrayerId,
    id: &CommentId,
    builder: &TreeBuilder,
) -> anyhow::Result<Thread>
where
    S: CommentSource + ?Sized,
{
    source
        .delete_comment(id)
        .await
        .with_context(|| format!("deleting comment {id}"))?;
    let thread = load_thread(source, prayer, builder).await?;
    view.retain_existing(&thread.nodes);
    Ok(thread)
}
