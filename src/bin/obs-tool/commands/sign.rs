// Sign command implementation

use anyhow::{Context, Result};

use crate::cli::SignArgs;
use obs_plugin::cfg::parse_duration;
use obs_plugin::ObjectStore;

/// Execute the sign command
pub async fn execute_sign(args: &SignArgs, store: &dyn ObjectStore) -> Result<()> {
    let ttl = parse_duration(&args.ttl).with_context(|| format!("Invalid ttl: {}", args.ttl))?;

    let url = store
        .create_signed_url(&args.object.bucket, &args.object.key, ttl)
        .await?;
    println!("{}", url);

    Ok(())
}
