// List command implementation

use anyhow::Result;

use crate::cli::LsArgs;
use obs_plugin::ObjectStore;

/// Execute the ls command
pub async fn execute_ls(args: &LsArgs, store: &dyn ObjectStore) -> Result<()> {
    let entries = match &args.delimiter {
        Some(delimiter) => {
            store
                .list_common_prefixes(&args.bucket, &args.prefix, delimiter)
                .await?
        }
        None => store.list_objects(&args.bucket, &args.prefix).await?,
    };

    for entry in &entries {
        println!("{}", entry);
    }

    Ok(())
}
