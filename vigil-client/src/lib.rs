mod comment;
pub use comment::{build_tree, count_nodes, CommentNode, ThreadStats, TreeBuilder};

mod load;
pub use load::{delete_and_reload, load_thread, submit_comment, Thread};

mod relative;
pub use relative::format_relative;

mod thread;
pub use thread::{Row, ThreadView, Viewer, DEFAULT_MAX_DEPTH};

mod fuzz;

pub mod api {
    pub use vigil_api::*;
}
