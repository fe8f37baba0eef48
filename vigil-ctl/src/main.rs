use std::{
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context};
use vigil_client::{
    api::{CommentFeed, CommentId, PrayerId, Tz, UserId},
    count_nodes, delete_and_reload, load_thread, submit_comment, Thread, ThreadView, TreeBuilder,
    Viewer,
};

mod http;
mod render;

use http::HttpSource;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the backend API
    #[structopt(long)]
    host: Option<String>,

    /// Time zone of timestamps that carry no offset
    #[structopt(long, default_value = "UTC")]
    timezone: String,

    /// Indentation stops growing past this depth
    #[structopt(long, default_value = "3")]
    max_depth: usize,

    /// Id of the current user, to mark their comments and post as them
    #[structopt(short, long)]
    user: Option<String>,

    /// Print the thread as JSON instead of text
    #[structopt(long)]
    json: bool,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Show the comment thread of a prayer request
    Show {
        /// Prayer request id
        prayer: String,
    },

    /// Show a comment thread from a JSON dump (`-` for stdin)
    ShowFile { path: PathBuf },

    /// Comment on a prayer request, or reply to a comment
    Post {
        /// Prayer request id
        prayer: String,

        text: String,

        /// Comment to reply to
        #[structopt(long)]
        parent: Option<String>,
    },

    /// Delete a comment and its replies
    Delete {
        /// Prayer request id, to show the thread afterwards
        prayer: String,

        comment: String,
    },
}

fn token() -> Option<String> {
    std::env::var("VIGIL_TOKEN").ok()
}

fn read_dump(path: &Path) -> anyhow::Result<String> {
    let mut data = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut data)
            .context("reading comment dump from stdin")?;
    } else {
        data = std::fs::read_to_string(path)
            .with_context(|| format!("reading comment dump {path:?}"))?;
    }
    Ok(data)
}

fn print(opt: &Opt, thread: &Thread, view: &ThreadView) -> anyhow::Result<()> {
    if opt.json {
        let json = serde_json::to_string_pretty(&thread.nodes).context("serializing thread")?;
        println!("{json}");
    } else {
        print!("{}", render::render(thread, view, chrono::Utc::now()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let zone = Tz::from_str(&opt.timezone)
        .map_err(|e| anyhow!("parsing time zone {:?}: {e}", opt.timezone))?;
    let builder = TreeBuilder::new(zone);
    let user = opt.user.clone().map(UserId);
    let view_as = |viewer: Viewer| ThreadView::new(viewer).with_max_depth(opt.max_depth);
    let source = || -> anyhow::Result<HttpSource> {
        let host = opt.host.clone().context("--host is required for this command")?;
        Ok(HttpSource::new(host, token(), user.clone()))
    };

    let (thread, view) = match &opt.cmd {
        Command::Show { prayer } => {
            let mut source = source()?;
            let view = view_as(Viewer::of_source(&source));
            let thread = load_thread(&mut source, &PrayerId::new(prayer), &builder).await?;
            (thread, view)
        }
        Command::ShowFile { path } => {
            let feed: CommentFeed =
                serde_json::from_str(&read_dump(path)?).context("parsing comment dump")?;
            let nodes = builder.build(feed.into_records());
            let thread = Thread {
                prayer: PrayerId::default(),
                total: count_nodes(&nodes),
                nodes,
            };
            let viewer = match user.clone() {
                Some(id) => Viewer::user(id),
                None => Viewer::anonymous(),
            };
            (thread, view_as(viewer))
        }
        Command::Post {
            prayer,
            text,
            parent,
        } => {
            let mut source = source()?;
            let mut view = view_as(Viewer::of_source(&source));
            let posted = submit_comment(
                &mut source,
                &mut view,
                &PrayerId::new(prayer),
                parent.clone().map(CommentId),
                text,
                &builder,
            )
            .await?;
            match posted {
                Some(thread) => (thread, view),
                None => bail!("nothing posted: the text is empty or --user is missing"),
            }
        }
        Command::Delete { prayer, comment } => {
            let mut source = source()?;
            let mut view = view_as(Viewer::of_source(&source));
            let thread = delete_and_reload(
                &mut source,
                &mut view,
                &PrayerId::new(prayer),
                &CommentId::new(comment.as_str()),
                &builder,
            )
            .await?;
            (thread, view)
        }
    };

    tracing::info!(total = thread.total, "loaded comment thread");
    print(&opt, &thread, &view)
}
