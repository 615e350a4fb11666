use crate::{
    cli::UploadArgs,
    upload::{Coordinator, FileHandle, Outcome},
};
use anyhow::{Result, anyhow};
use colored::Colorize;

/// Upload the files and print one line per file
///
/// # Errors
///
/// Will return `Err` if a file can not be opened or any upload failed
pub async fn dispatch(coordinator: &Coordinator, args: UploadArgs) -> Result<()> {
    let mut files = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let file = FileHandle::open(path)
            .await
            .map_err(|e| anyhow!("could not open {}: {e}", path.display()))?;

        files.push(match &args.content_type {
            Some(content_type) => file.with_content_type(content_type),
            None => file,
        });
    }

    let outcomes = coordinator.run(files).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match outcome {
            Outcome::Completed { key, etag } => {
                println!("{} {key} {}", "✔".green(), etag.dimmed());
            }
            Outcome::Failed { key, error } => {
                failed += 1;
                eprintln!("{} {key}: {}", "✘".red(), error.to_string().red());
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} of {} uploads failed", outcomes.len()));
    }

    Ok(())
}
