use vigil_client::{api::Time, count_nodes, format_relative, Thread, ThreadView};

/// Indented plain-text rendering of a thread, one comment per block
pub fn render(thread: &Thread, view: &ThreadView, now: Time) -> String {
    let mut out = String::new();
    for row in view.rows(&thread.nodes) {
        let indent = "    ".repeat(row.depth_class);
        let r = &row.node.record;
        let name = match r.user_name.is_empty() {
            true => &r.user_id.0,
            false => &r.user_name,
        };
        out.push_str(&format!(
            "{indent}{} {name} · {} · {}",
            if row.depth > 0 { "↳" } else { "●" },
            format_relative(row.node.created_at, now),
            r.id,
        ));
        if row.is_owner {
            out.push_str(" (you)");
        }
        if row.is_collapsed {
            out.push_str(&format!(" [+{} hidden]", count_nodes(&row.node.replies)));
        }
        out.push('\n');
        for line in r.content.as_deref().unwrap_or("").lines() {
            out.push_str(&format!("{indent}  {line}\n"));
        }
    }
    let stats = thread.stats();
    out.push_str(&format!(
        "{} comments in {} threads from {} participants\n",
        stats.total, stats.top_level, stats.participants,
    ));
    out
}
