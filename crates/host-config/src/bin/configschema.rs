//! Print the JSON Schema of the deployer configuration document

use anyhow::Result;
use host_config::DocumentFile;

fn main() -> Result<()> {
    let schema = schemars::schema_for!(DocumentFile);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
