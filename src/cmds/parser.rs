use core::num::{NonZeroU32, ParseIntError};

use crate::entities::{CommentId, PostId, ReportReason, UserId};
use crate::utils::LetChain;

pub fn parse_nonzero_num(
    s: &str,
) -> ::core::result::Result<u32, <NonZeroU32 as ::core::str::FromStr>::Err> {
    Ok(s.parse::<NonZeroU32>()?.get())
}

macro_rules! id_parser {
    ($( $f:ident => $t:ident ),* $(,)?) => {$(
        pub fn $f(s: &str) -> ::core::result::Result<$t, ParseIntError> {
            Ok(s.parse::<u32>()?.let_($t))
        }
    )*};
}

id_parser! {
    parse_user_id => UserId,
    parse_post_id => PostId,
    parse_comment_id => CommentId,
    parse_report_reason => ReportReason,
}

/// tag payloads are handed over untouched. only blank input is refused here.
pub fn parse_tags_payload(s: &str) -> ::core::result::Result<String, String> {
    match s.trim().is_empty() {
        true => Err("tags payload is blank. pass a json array, e.g. '[\"cat\"]'".to_string()),
        false => Ok(s.to_string()),
    }
}
