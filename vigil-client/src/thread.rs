use std::collections::HashSet;

use crate::{
    api::{CommentId, CommentRecord, CommentSource, UserId},
    CommentNode,
};

/// Indentation stops growing past this depth
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Who is looking at the thread. The backend sometimes reports the author's
/// email in `userId`, so ownership matches either.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Viewer {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Viewer {
        Viewer::default()
    }

    pub fn user(id: UserId) -> Viewer {
        Viewer {
            user_id: Some(id),
            email: None,
        }
    }

    /// Whoever `source` acts on behalf of
    pub fn of_source<S: CommentSource + ?Sized>(source: &S) -> Viewer {
        Viewer {
            user_id: source.current_user(),
            email: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.user_id.is_some() || self.email.is_some()
    }

    pub fn owns(&self, record: &CommentRecord) -> bool {
        self.user_id.as_ref() == Some(&record.user_id)
            || self.email.as_deref() == Some(record.user_id.0.as_str())
    }
}

/// One visible line of a rendered thread
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row<'a> {
    pub node: &'a CommentNode,
    pub depth: usize,
    pub depth_class: usize,
    pub has_replies: bool,
    pub is_collapsed: bool,
    pub is_last_child: bool,
    pub is_replying: bool,
    pub is_owner: bool,
}

/// Ephemeral display state of one thread: which comments are folded and
/// which one is being replied to. It survives rebuilds of the tree, as it is
/// keyed by comment id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadView {
    pub viewer: Viewer,
    pub max_depth: usize,
    collapsed: HashSet<CommentId>,
    replying_to: Option<CommentId>,
}

impl ThreadView {
    pub fn new(viewer: Viewer) -> ThreadView {
        ThreadView {
            viewer,
            max_depth: DEFAULT_MAX_DEPTH,
            collapsed: HashSet::new(),
            replying_to: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> ThreadView {
        self.max_depth = max_depth;
        self
    }

    pub fn can_comment(&self) -> bool {
        self.viewer.is_known()
    }

    pub fn is_owner(&self, node: &CommentNode) -> bool {
        self.viewer.owns(&node.record)
    }

    pub fn is_collapsed(&self, id: &CommentId) -> bool {
        self.collapsed.contains(id)
    }

    pub fn replying_to(&self) -> Option<&CommentId> {
        self.replying_to.as_ref()
    }

    pub fn toggle_collapse(&mut self, id: &CommentId) {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.clone());
        }
    }

    pub fn start_reply(&mut self, id: CommentId) {
        self.replying_to = Some(id);
    }

    pub fn cancel_reply(&mut self) {
        self.replying_to = None;
    }

    /// A reply was accepted: close the composer and unfold the parent so the
    /// new reply shows up
    pub fn reply_posted(&mut self, parent: Option<&CommentId>) {
        if let Some(p) = parent {
            self.collapsed.remove(p);
        }
        self.replying_to = None;
    }

    /// Forget state about comments that are gone from `tree`
    pub fn retain_existing(&mut self, tree: &[CommentNode]) {
        self.collapsed
            .retain(|id| CommentNode::find_in(tree, id).is_some());
        if let Some(id) = &self.replying_to {
            if CommentNode::find_in(tree, id).is_none() {
                self.replying_to = None;
            }
        }
    }

    /// Depth-first list of what is on screen. Replies of folded comments are
    /// skipped.
    pub fn rows<'a>(&self, tree: &'a [CommentNode]) -> Vec<Row<'a>> {
        let mut rows = Vec::new();
        let mut stack = Vec::new();
        push_level(&mut stack, tree, 0);
        while let Some((node, depth, is_last_child)) = stack.pop() {
            let is_collapsed = self.is_collapsed(node.id());
            rows.push(Row {
                node,
                depth,
                depth_class: depth.min(self.max_depth),
                has_replies: !node.replies.is_empty(),
                is_collapsed,
                is_last_child,
                is_replying: self.replying_to.as_ref() == Some(node.id()),
                is_owner: self.is_owner(node),
            });
            if !is_collapsed {
                push_level(&mut stack, &node.replies, depth + 1);
            }
        }
        rows
    }
}

/// Queue siblings so that popping yields them first to last
fn push_level<'a>(
    stack: &mut Vec<(&'a CommentNode, usize, bool)>,
    nodes: &'a [CommentNode],
    depth: usize,
) {
    let last = nodes.len().saturating_sub(1);
    stack.extend(
        nodes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, n)| (n, depth, i == last)),
    );
}
