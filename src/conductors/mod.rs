use anyhow::{anyhow, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::cmds::{
    App as CmdApp, CommentCreateCmd, CommentIdCmd, CommentMod, CommentUpdateCmd, PostCreateCmd,
    PostFeedCmd, PostIdCmd, PostMod, PostReportCmd, PostTagsCmd, PostUpdateCmd, RootMod,
    UserFollowCmd, UserGetCmd, UserMod, UserRegisterCmd,
};
use crate::constructors::App;
use crate::entities::UserId;
use crate::usecases::{comment, post, user};
use crate::utils::LetChain;

pub mod helper;

use helper::{error_json, parse_line, read_upload, to_json, LineCommand};

/// reads command lines, runs them against the controllers, answers in json.
pub struct Conductor {
    pub app: App,
    viewer: Mutex<Option<UserId>>,
}

impl Conductor {
    pub fn new(app: App) -> Self {
        Self {
            app,
            viewer: Mutex::new(None),
        }
    }

    /// `--as` acts for this line, and sticks for later lines once the line succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn conduct(&self, cmd: CmdApp) -> Result<Value> {
        let CmdApp { viewer, cmd } = cmd;

        let current = match viewer {
            Some(id) => Some(id),
            None => *self.viewer.lock().await,
        };

        let res = self.dispatch(current, cmd).await?;

        if let Some(id) = viewer {
            *self.viewer.lock().await = Some(id);
        }

        Ok(res)
    }

    async fn dispatch(&self, current: Option<UserId>, cmd: RootMod) -> Result<Value> {
        let acting = || current.ok_or_else(|| anyhow!("no acting user. pass `--as <USER_ID>`."));

        let res = match cmd {
            RootMod::User { cmd } => match cmd {
                UserMod::Register(UserRegisterCmd { name }) => self
                    .app
                    .user
                    .register(user::register::Input {
                        user_id: acting()?,
                        name,
                        created: ::chrono::Utc::now(),
                    })
                    .await?
                    .let_(to_json)?,

                UserMod::Get(UserGetCmd { user_id }) => self
                    .app
                    .user
                    .get(user::get::Input {
                        user_id: match user_id {
                            Some(id) => id,
                            None => acting()?,
                        },
                    })
                    .await?
                    .let_(to_json)?,

                UserMod::Follow(UserFollowCmd { user_id }) => self
                    .app
                    .user
                    .follow(user::follow::Input {
                        user_id,
                        follower: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                UserMod::Unfollow(UserFollowCmd { user_id }) => self
                    .app
                    .user
                    .unfollow(user::unfollow::Input {
                        user_id,
                        follower: acting()?,
                    })
                    .await?
                    .let_(to_json)?,
            },

            RootMod::Post { cmd } => match cmd {
                PostMod::Feed(PostFeedCmd { page, limit }) => self
                    .app
                    .post
                    .feed(post::feed::Input {
                        viewer: acting()?,
                        page,
                        limit,
                    })
                    .await?
                    .let_(to_json)?,

                PostMod::Get(PostIdCmd { post_id }) => self
                    .app
                    .post
                    .get(post::get::Input { post_id })
                    .await?
                    .let_(to_json)?,

                PostMod::Likes(PostIdCmd { post_id }) => self
                    .app
                    .post
                    .likes(post::likes::Input {
                        post_id,
                        viewer: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                PostMod::Tags(PostTagsCmd { query }) => self
                    .app
                    .post
                    .tags(post::tags::Input { query })
                    .await?
                    .let_(to_json)?,

                PostMod::Create(PostCreateCmd {
                    file,
                    description,
                    tags,
                }) => {
                    let author = acting()?;
                    let file = read_upload(&file).await?;

                    self.app
                        .post
                        .create(post::create::Input {
                            file,
                            description,
                            tags,
                            author,
                        })
                        .await?
                        .let_(to_json)?
                },

                PostMod::Update(PostUpdateCmd {
                    post_id,
                    description,
                    tags,
                }) => self
                    .app
                    .post
                    .update(post::update::Input {
                        post_id,
                        description,
                        tags,
                    })
                    .await?
                    .let_(to_json)?,

                PostMod::Delete(PostIdCmd { post_id }) => self
                    .app
                    .post
                    .delete(post::delete::Input { post_id })
                    .await?
                    .let_(to_json)?,

                PostMod::Report(PostReportCmd { post_id, reason }) => self
                    .app
                    .post
                    .report(post::report::Input {
                        post_id,
                        reason,
                        reporter: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                PostMod::Share(PostIdCmd { post_id }) => self
                    .app
                    .post
                    .share(post::share::Input {
                        post_id,
                        user_id: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                PostMod::Like(PostIdCmd { post_id }) => self
                    .app
                    .post
                    .like(post::like::Input {
                        post_id,
                        user_id: acting()?,
                    })
                    .await?
                    .let_(to_json)?,
            },

            RootMod::Comment { cmd } => match cmd {
                CommentMod::List(PostIdCmd { post_id }) => self
                    .app
                    .comment
                    .list(comment::list::Input {
                        post_id,
                        viewer: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                CommentMod::Create(CommentCreateCmd {
                    post_id,
                    text,
                    reply_to,
                }) => self
                    .app
                    .comment
                    .create(comment::create::Input {
                        text,
                        post_id,
                        reply_to,
                        author: acting()?,
                    })
                    .await?
                    .let_(to_json)?,

                CommentMod::Update(CommentUpdateCmd { comment_id, text }) => self
                    .app
                    .comment
                    .update(comment::update::Input { comment_id, text })
                    .await?
                    .let_(to_json)?,

                CommentMod::Delete(CommentIdCmd { comment_id }) => self
                    .app
                    .comment
                    .delete(comment::delete::Input { comment_id })
                    .await?
                    .let_(to_json)?,

                CommentMod::Like(CommentIdCmd { comment_id }) => self
                    .app
                    .comment
                    .like(comment::like::Input {
                        comment_id,
                        user_id: acting()?,
                    })
                    .await?
                    .let_(to_json)?,
            },
        };

        Ok(res)
    }

    /// one line in, one answer out. `None` for blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let cmd = match parse_line(line)? {
            LineCommand::Command(c) => *c,
            LineCommand::Showing(s) => return Some(s),
        };

        let value = match self.conduct(cmd).await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!("command failed: {:#}", e);
                error_json(&e)
            },
        };

        match serde_json::to_string_pretty(&value) {
            Ok(s) => Some(s),
            Err(e) => Some(format!("cannot render output: {}", e)),
        }
    }

    pub async fn run(
        &self,
        input: impl AsyncBufRead + Unpin,
        mut output: impl AsyncWrite + Unpin,
    ) -> Result<()> {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            if let Some(answer) = self.handle_line(&line).await {
                output.write_all(answer.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }

        Ok(())
    }
}
