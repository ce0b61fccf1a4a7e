use super::print_json;
use anyhow::{Context, Result};
use serde_json::Value;
use sift::SearchClient;
use std::fs;
use std::path::Path;

/// List indices in the cluster
pub async fn run_indices(client: &SearchClient, json: bool) -> Result<()> {
    let indices = client.list_indices().await?;

    if json {
        return print_json(&serde_json::to_value(&indices)?);
    }

    println!(
        "{:<30} {:<8} {:<8} {:>12} {:>10}",
        "INDEX", "HEALTH", "STATUS", "DOCS", "SIZE"
    );
    println!("{}", "-".repeat(72));
    for idx in indices {
        println!(
            "{:<30} {:<8} {:<8} {:>12} {:>10}",
            idx.index,
            idx.health.as_deref().unwrap_or("?"),
            idx.status.as_deref().unwrap_or("?"),
            idx.docs_count.as_deref().unwrap_or("?"),
            idx.store_size.as_deref().unwrap_or("?"),
        );
    }
    Ok(())
}

/// Bulk-index a JSON array of documents into the configured index
pub async fn run_index_data(client: &SearchClient, file: &Path) -> Result<()> {
    let docs = read_documents(file)?;
    println!("Ingesting data: {} documents into {}", docs.len(), client.index());

    let summary = client.bulk_index(&docs).await?;
    println!(
        "Indexed {} documents in {}ms ({} failed)",
        summary.items - summary.failed,
        summary.took,
        summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("{} of {} documents failed to index", summary.failed, summary.items);
    }
    Ok(())
}

/// Print the field mappings of the configured index
pub async fn run_mapping(client: &SearchClient) -> Result<()> {
    let properties = client.get_mapping().await?;
    print_json(&Value::Object(properties))
}

pub async fn run_delete_index(client: &SearchClient) -> Result<()> {
    let acknowledged = client.delete_index().await?;
    if !acknowledged {
        anyhow::bail!("Deletion of index '{}' was not acknowledged", client.index());
    }
    println!("Deleted index {}", client.index());
    Ok(())
}

fn read_documents(file: &Path) -> Result<Vec<Value>> {
    let content =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let parsed: Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {} as JSON", file.display()))?;
    match parsed {
        Value::Array(docs) if !docs.is_empty() => Ok(docs),
        Value::Array(_) => anyhow::bail!("{} holds no documents", file.display()),
        _ => anyhow::bail!("{} must hold a JSON array of documents", file.display()),
    }
}
