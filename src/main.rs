use std::env::{args, var};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use snapfeed::conductors::Conductor;
use snapfeed::storage::local::LocalFileStorage;
use snapfeed::{in_memory_with, mongo};
use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

async fn async_main() {
    let AppValues {
        store,
        db_name,
        upload_dir,
        public_url,
    } = get_values();

    let file_storage = match LocalFileStorage::new_with(&upload_dir, &public_url).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("cannot prepare upload dir `{}`: {}", upload_dir, e);
            return;
        },
    };

    let app = match store.as_str() {
        "memory" => {
            tracing::info!("using in-memory store.");
            in_memory_with(file_storage)
        },
        uri => match mongo(uri, &db_name, file_storage).await {
            Ok(a) => {
                tracing::info!("using mongodb store (db: {}).", db_name);
                a
            },
            Err(e) => {
                tracing::error!("cannot connect to mongodb: {}", e);
                return;
            },
        },
    };

    tracing::info!("ready. reading commands from stdin.");

    match Conductor::new(app)
        .run(BufReader::new(stdin()), stdout())
        .await
    {
        Ok(()) => tracing::info!("stdin closed. bye."),
        Err(e) => tracing::error!("conductor returned: {}", e),
    }
}

fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(::std::io::stderr)
        .init();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| {
            static NUM: AtomicUsize = AtomicUsize::new(0);
            format!("snapfeed-worker-{}", NUM.fetch_add(1, Ordering::SeqCst))
        })
        .build()
    {
        Ok(r) => r,
        Err(e) => return eprintln!("{}", e),
    };

    rt.block_on(async_main())
}

struct AppValues {
    store: String,
    db_name: String,
    upload_dir: String,
    public_url: String,
}

fn get_values() -> AppValues {
    let mut args = args();
    args.next(); // the first one is the command name.

    let store = crate::try_get_value!(args; "SNAPFEED_STORE", "BUILD_WITH_SNAPFEED_STORE", "store"; "memory");
    let db_name = crate::try_get_value!(args; "SNAPFEED_DB_NAME", "BUILD_WITH_SNAPFEED_DB_NAME", "db_name"; "snapfeed");
    let upload_dir = crate::try_get_value!(args; "SNAPFEED_UPLOAD_DIR", "BUILD_WITH_SNAPFEED_UPLOAD_DIR", "upload_dir"; "uploads");
    let public_url = crate::try_get_value!(args; "SNAPFEED_PUBLIC_URL", "BUILD_WITH_SNAPFEED_PUBLIC_URL", "public_url"; "file://uploads");

    AppValues {
        store,
        db_name,
        upload_dir,
        public_url,
    }
}

/// positional argument, then environment variable, then the value baked in at build time.
/// the last token is used when all of them are missing.
#[macro_export]
macro_rules! try_get_value {
    ($a:expr; $n:literal, $bn:literal, $pn:literal; $d:literal) => {{
        match $a.next() {
            Some(t) => t,
            None => match var($n) {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!("error on getting `{}`: {}", $n, e);

                    match option_env!($bn) {
                        Some(t) => t.to_string(),
                        None => {
                            tracing::debug!("fallback to default `{}`: {}", stringify!($pn), $d);
                            $d.to_string()
                        },
                    }
                },
            },
        }
    }};
}
