use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::usecases::{comment, post, user};

/// hands each output back to the controller waiting on the other end.
pub struct ReturnPresenter<O> {
    pub ret: mpsc::Sender<O>,
}

macro_rules! return_presenter {
    ($( $g:ident :: $m:ident ),* $(,)?) => {$(
        #[async_trait]
        impl $g::$m::Presenter for ReturnPresenter<$g::$m::Output> {
            async fn complete(&self, data: $g::$m::Output) -> Result<()> {
                self.ret
                    .send(data)
                    .await
                    .map_err(|e| anyhow!("cannot return output: {}", e))
            }
        }
    )*};
}

return_presenter! {
    post::feed, post::get, post::likes, post::tags, post::create,
    post::update, post::delete, post::report, post::share, post::like,
}

return_presenter! {
    comment::list, comment::create, comment::update, comment::delete, comment::like,
}

return_presenter! {
    user::register, user::get, user::follow, user::unfollow,
}
