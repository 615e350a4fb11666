use s3up::cli::{dispatch, start};
use std::process;

#[tokio::main]
async fn main() {
    let (coordinator, args) = match start() {
        Ok(rs) => rs,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };

    // Ctrl-C stops every upload, started ones are aborted
    let cancel = coordinator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, cancelling uploads");
            cancel.cancel();
        }
    });

    if let Err(e) = dispatch(&coordinator, args).await {
        eprintln!("{e:#}");
        process::exit(1);
    }
}
