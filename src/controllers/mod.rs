use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// one operation: its usecase, a lock serializing callers, and where its output arrives.
pub struct Endpoint<U: ?Sized, O> {
    usecase: Arc<U>,
    lock: Mutex<()>,
    ret: Mutex<mpsc::Receiver<O>>,
}

impl<U: ?Sized, O> Endpoint<U, O> {
    pub fn new(usecase: Arc<U>, ret: mpsc::Receiver<O>) -> Self {
        Self {
            usecase,
            lock: Mutex::new(()),
            ret: Mutex::new(ret),
        }
    }
}

macro_rules! return_inner {
    ($e:expr => data $d:ident) => {{
        let guard = $e.lock.lock().await;

        $e.usecase.handle($d).await?;
        let ret = $e
            .ret
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| ::anyhow::anyhow!("presenter closed without output."))?;

        drop(guard);

        Ok(ret)
    }};
}

macro_rules! controller {
    ($n:ident for $g:ident { $( $op:ident ),* $(,)? }) => {
        pub struct $n {
            $( $op: super::Endpoint<dyn $g::$op::Usecase + Sync + Send, $g::$op::Output>, )*
        }

        impl $n {
            #[allow(clippy::too_many_arguments)]
            pub fn new(
                $( $op: super::Endpoint<dyn $g::$op::Usecase + Sync + Send, $g::$op::Output>, )*
            ) -> Self {
                Self { $( $op, )* }
            }

            $(
                pub async fn $op(&self, data: $g::$op::Input) -> ::anyhow::Result<$g::$op::Output> {
                    return_inner!(self.$op => data data)
                }
            )*
        }
    };
}

pub mod comment;
pub mod post;
pub mod user;
