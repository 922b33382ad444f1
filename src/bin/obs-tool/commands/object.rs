// Single object commands: put, get, exists, rm

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

use crate::cli::{GetArgs, ObjectArgs, PutArgs};
use obs_plugin::ObjectStore;

/// Execute the put command
pub async fn execute_put(args: &PutArgs, store: &dyn ObjectStore) -> Result<()> {
    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    store
        .put_object(&args.object.bucket, &args.object.key, Box::new(file))
        .await?;

    tracing::info!(
        bucket = %args.object.bucket,
        key = %args.object.key,
        "uploaded {}",
        args.file.display()
    );
    Ok(())
}

/// Execute the get command
pub async fn execute_get(args: &GetArgs, store: &dyn ObjectStore) -> Result<()> {
    let mut reader = store
        .get_object(&args.object.bucket, &args.object.key)
        .await?;

    let written = match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let n = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            n
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let n = tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
            n
        }
    };

    tracing::debug!(bytes = written, "download complete");
    Ok(())
}

/// Execute the exists command
pub async fn execute_exists(args: &ObjectArgs, store: &dyn ObjectStore) -> Result<()> {
    let exists = store.object_exists(&args.bucket, &args.key).await?;
    println!("{}", exists);
    Ok(())
}

/// Execute the rm command
pub async fn execute_rm(args: &ObjectArgs, store: &dyn ObjectStore) -> Result<()> {
    store.delete_object(&args.bucket, &args.key).await?;
    tracing::info!(bucket = %args.bucket, key = %args.key, "removed");
    Ok(())
}
