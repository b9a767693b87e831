use crate::entities::{CommentId, PostId, ReportReason, UserId};
use crate::usecases::{DEFAULT_LIMIT, DEFAULT_PAGE};

pub mod parser;

use parser::*;

/// this is a snapfeed.
#[derive(Debug, Clone, ::clap::Parser)]
#[clap(name = "snapfeed", author, version)]
pub struct App {
    /// act as this user. remembered for later lines.
    #[clap(long = "as", short = 'a', name = "AS", parse(try_from_str = parse_user_id))]
    pub viewer: Option<UserId>,

    #[clap(subcommand)]
    pub cmd: RootMod,
}

#[derive(Debug, Clone, ::clap::Subcommand)]
pub enum RootMod {
    /// about user.
    #[clap(short_flag = 'U')]
    User {
        #[clap(subcommand)]
        cmd: UserMod,
    },

    /// about post.
    #[clap(short_flag = 'P')]
    Post {
        #[clap(subcommand)]
        cmd: PostMod,
    },

    /// about comment.
    #[clap(short_flag = 'C')]
    Comment {
        #[clap(subcommand)]
        cmd: CommentMod,
    },
}

#[derive(Debug, Clone, ::clap::Subcommand)]
pub enum UserMod {
    #[clap(short_flag = 'c')]
    Register(UserRegisterCmd),

    #[clap(short_flag = 'g')]
    Get(UserGetCmd),

    #[clap(short_flag = 'f')]
    Follow(UserFollowCmd),

    #[clap(short_flag = 'u')]
    Unfollow(UserFollowCmd),
}

#[derive(Debug, Clone, ::clap::Subcommand)]
pub enum PostMod {
    #[clap(short_flag = 'q')]
    Feed(PostFeedCmd),

    #[clap(short_flag = 'g')]
    Get(PostIdCmd),

    #[clap(short_flag = 'L')]
    Likes(PostIdCmd),

    #[clap(short_flag = 't')]
    Tags(PostTagsCmd),

    #[clap(short_flag = 'c')]
    Create(PostCreateCmd),

    #[clap(short_flag = 'e')]
    Update(PostUpdateCmd),

    #[clap(short_flag = 'd')]
    Delete(PostIdCmd),

    #[clap(short_flag = 'r')]
    Report(PostReportCmd),

    #[clap(short_flag = 's')]
    Share(PostIdCmd),

    #[clap(short_flag = 'l')]
    Like(PostIdCmd),
}

#[derive(Debug, Clone, ::clap::Subcommand)]
pub enum CommentMod {
    #[clap(short_flag = 'q')]
    List(PostIdCmd),

    #[clap(short_flag = 'c')]
    Create(CommentCreateCmd),

    #[clap(short_flag = 'e')]
    Update(CommentUpdateCmd),

    #[clap(short_flag = 'd')]
    Delete(CommentIdCmd),

    #[clap(short_flag = 'l')]
    Like(CommentIdCmd),
}

/// register user with the acting user's id.
#[derive(Debug, Clone, ::clap::Args)]
pub struct UserRegisterCmd {
    /// str
    #[clap(name = "NAME")]
    pub name: String,
}

/// get user with id.
/// if not given id, fallback to the acting user's id.
#[derive(Debug, Clone, ::clap::Args)]
pub struct UserGetCmd {
    /// u32
    #[clap(name = "USER_ID", parse(try_from_str = parse_user_id))]
    pub user_id: Option<UserId>,
}

/// (un)follow user as the acting user.
#[derive(Debug, Clone, ::clap::Args)]
pub struct UserFollowCmd {
    /// u32
    #[clap(name = "USER_ID", parse(try_from_str = parse_user_id))]
    pub user_id: UserId,
}

/// show the feed, newest first.
#[derive(Debug, Clone, ::clap::Args)]
pub struct PostFeedCmd {
    /// u32 (1 =< n)
    #[clap(short, long, default_value_t = DEFAULT_PAGE, parse(try_from_str = parse_nonzero_num))]
    pub page: u32,

    /// u32 (1 =< n)
    #[clap(short, long, default_value_t = DEFAULT_LIMIT, parse(try_from_str = parse_nonzero_num))]
    pub limit: u32,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct PostIdCmd {
    /// u32
    #[clap(name = "POST_ID", parse(try_from_str = parse_post_id))]
    pub post_id: PostId,
}

/// search tag names. empty query lists the first ones.
#[derive(Debug, Clone, ::clap::Args)]
pub struct PostTagsCmd {
    /// str (case-insensitive substring)
    #[clap(name = "QUERY", default_value = "")]
    pub query: String,
}

/// create post as the acting user.
#[derive(Debug, Clone, ::clap::Args)]
pub struct PostCreateCmd {
    /// path to an image file
    #[clap(name = "FILE")]
    pub file: String,

    /// str
    #[clap(name = "DESCRIPTION", default_value = "")]
    pub description: String,

    /// json
    ///
    /// schema: [str]
    #[clap(short, long, parse(try_from_str = parse_tags_payload))]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct PostUpdateCmd {
    /// u32
    #[clap(name = "POST_ID", parse(try_from_str = parse_post_id))]
    pub post_id: PostId,

    /// str
    #[clap(short, long)]
    pub description: Option<String>,

    /// json
    ///
    /// schema: [str]
    #[clap(short, long, parse(try_from_str = parse_tags_payload))]
    pub tags: Option<String>,
}

/// report post as the acting user.
#[derive(Debug, Clone, ::clap::Args)]
pub struct PostReportCmd {
    /// u32
    #[clap(name = "POST_ID", parse(try_from_str = parse_post_id))]
    pub post_id: PostId,

    /// u32
    #[clap(name = "REASON", parse(try_from_str = parse_report_reason))]
    pub reason: ReportReason,
}

/// comment on post as the acting user.
#[derive(Debug, Clone, ::clap::Args)]
pub struct CommentCreateCmd {
    /// u32
    #[clap(name = "POST_ID", parse(try_from_str = parse_post_id))]
    pub post_id: PostId,

    /// str
    #[clap(name = "TEXT")]
    pub text: String,

    /// u32
    #[clap(short, long, parse(try_from_str = parse_comment_id))]
    pub reply_to: Option<CommentId>,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct CommentUpdateCmd {
    /// u32
    #[clap(name = "COMMENT_ID", parse(try_from_str = parse_comment_id))]
    pub comment_id: CommentId,

    /// str
    #[clap(name = "TEXT")]
    pub text: String,
}

#[derive(Debug, Clone, ::clap::Args)]
pub struct CommentIdCmd {
    /// u32
    #[clap(name = "COMMENT_ID", parse(try_from_str = parse_comment_id))]
    pub comment_id: CommentId,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_feed_with_defaults() {
        let app = App::try_parse_from(["snapfeed", "--as", "1", "post", "feed"]).unwrap();

        assert_eq!(app.viewer, Some(UserId(1)));
        match app.cmd {
            RootMod::Post {
                cmd: PostMod::Feed(PostFeedCmd { page, limit }),
            } => {
                assert_eq!(page, DEFAULT_PAGE);
                assert_eq!(limit, DEFAULT_LIMIT);
            },
            c => panic!("unexpected: {:?}", c),
        }
    }

    #[test]
    fn short_flags_reach_comment_create() {
        let app = App::try_parse_from(["snapfeed", "-C", "-c", "3", "hello", "--reply-to", "7"])
            .unwrap();

        match app.cmd {
            RootMod::Comment {
                cmd:
                    CommentMod::Create(CommentCreateCmd {
                        post_id,
                        text,
                        reply_to,
                    }),
            } => {
                assert_eq!(post_id, PostId(3));
                assert_eq!(text, "hello");
                assert_eq!(reply_to, Some(CommentId(7)));
            },
            c => panic!("unexpected: {:?}", c),
        }
    }

    #[test]
    fn rejects_zero_page() {
        assert!(App::try_parse_from(["snapfeed", "post", "feed", "--page", "0"]).is_err());
    }

    #[test]
    fn clap_definition_is_valid() {
        use clap::CommandFactory;

        App::command().debug_assert();
    }
}
