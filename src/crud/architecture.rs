// Architecture documents in the remote store
use crate::http::{ApiClient, error::Error};
use crate::schemas::architecture::{
    Architecture, ArchitecturePatch, ArchitectureSummary, Dataset, DatasetResponse, DatasetUpload,
    DeleteResponse, NewArchitecture,
};
use crate::schemas::graph::{self, Connection, Node};
use serde_json::Value;

pub async fn list(client: &ApiClient) -> Result<Vec<ArchitectureSummary>, Error> {
    client.get("/models").await
}

/// Create an architecture and return it with its server-issued id.
pub async fn create(new: &NewArchitecture, client: &ApiClient) -> Result<Architecture, Error> {
    let created: Architecture = client.post("/models", Some(new)).await?;
    log::debug!("Created architecture {} ({})", created.id, created.name);
    Ok(created)
}

pub async fn fetch(id: &str, client: &ApiClient) -> Result<Architecture, Error> {
    client.get(&format!("/models/{}", id)).await
}

pub async fn update(
    id: &str,
    patch: &ArchitecturePatch,
    client: &ApiClient,
) -> Result<Architecture, Error> {
    client.put(&format!("/models/{}", id), patch).await
}

/// Delete an architecture.
///
/// # Returns
///  The confirmation message sent back by the store.
pub async fn delete(id: &str, client: &ApiClient) -> Result<String, Error> {
    let response: DeleteResponse = client.delete(&format!("/models/{}", id)).await?;
    log::debug!("Deleted architecture {}", id);
    Ok(response.message)
}

pub async fn fetch_nodes(id: &str, client: &ApiClient) -> Result<Vec<Node>, Error> {
    let values: Vec<Value> = client.get(&format!("/models/{}/nodes", id)).await?;
    Ok(graph::nodes_from_wire(values))
}

/// Replace the whole node list of an architecture.
///
/// # Arguments
///  id: &str - The architecture id
///  nodes: &[Node] - The complete node list; the store keeps nothing else
///
/// # Returns
///  The node list as stored
pub async fn replace_nodes(id: &str, nodes: &[Node], client: &ApiClient) -> Result<Vec<Node>, Error> {
    let values: Vec<Value> = client.put(&format!("/models/{}/nodes", id), nodes).await?;
    Ok(graph::nodes_from_wire(values))
}

pub async fn fetch_connections(id: &str, client: &ApiClient) -> Result<Vec<Connection>, Error> {
    client.get(&format!("/models/{}/connections", id)).await
}

pub async fn replace_connections(
    id: &str,
    connections: &[Connection],
    client: &ApiClient,
) -> Result<Vec<Connection>, Error> {
    client
        .put(&format!("/models/{}/connections", id), connections)
        .await
}

/// Record dataset metadata on an architecture. The file itself is uploaded
/// elsewhere; the store only keeps its descriptor.
pub async fn attach_dataset(
    id: &str,
    upload: &DatasetUpload,
    client: &ApiClient,
) -> Result<Dataset, Error> {
    let response: DatasetResponse = client
        .post(&format!("/models/{}/dataset", id), Some(upload))
        .await?;
    Ok(response.dataset)
}
