use anyhow::{anyhow, Context};
use async_trait::async_trait;
use vigil_api::{
    CommentFeed, CommentId, CommentRecord, CommentSource, Error, NewComment, PrayerId, UserId,
};

/// The prayer interaction REST backend
pub struct HttpSource {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
    user: Option<UserId>,
}

impl HttpSource {
    pub fn new(host: String, token: Option<String>, user: Option<UserId>) -> HttpSource {
        HttpSource {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
            token,
            user,
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(tok) => req.bearer_auth(tok),
            None => req,
        }
    }
}

async fn check(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.context("reading error body")?;
    match Error::parse(&body) {
        Ok(err) => Err(anyhow::Error::from(err).context(format!("server answered {status}"))),
        Err(_) => Err(anyhow!("server answered {status}")),
    }
}

#[async_trait]
impl CommentSource for HttpSource {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }

    async fn fetch_comments(&mut self, prayer: &PrayerId) -> anyhow::Result<Vec<CommentRecord>> {
        let req = self.client.get(format!(
            "{}/prayer-interactions/prayer/{}/comments",
            self.host, prayer
        ));
        let feed: CommentFeed = check(self.auth(req).send().await?)
            .await?
            .json()
            .await
            .context("parsing comment feed")?;
        Ok(feed.into_records())
    }

    async fn create_comment(&mut self, c: NewComment) -> anyhow::Result<CommentRecord> {
        let req = self
            .client
            .post(format!("{}/prayer-interactions", self.host))
            .json(&c);
        check(self.auth(req).send().await?)
            .await?
            .json()
            .await
            .context("parsing created comment")
    }

    async fn delete_comment(&mut self, id: &CommentId) -> anyhow::Result<()> {
        let req = self
            .client
            .delete(format!("{}/prayer-interactions/{}", self.host, id));
        check(self.auth(req).send().await?).await?;
        Ok(())
    }
}
