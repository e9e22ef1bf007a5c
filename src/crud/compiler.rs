// Remote validation and code generation
use crate::http::{ApiClient, error::Error};
use crate::schemas::architecture::{GeneratedCode, ValidationRequest, Verdict};

pub async fn validate(request: &ValidationRequest, client: &ApiClient) -> Result<Verdict, Error> {
    log::debug!(
        "Validating architecture {} ({} nodes, {} edges)",
        request.model_id,
        request.nodes.len(),
        request.edges.len()
    );
    client.post("/validate", Some(request)).await
}

pub async fn generate(id: &str, client: &ApiClient) -> Result<String, Error> {
    let generated: GeneratedCode = client
        .post(&format!("/models/{}/generate", id), None::<&()>)
        .await?;
    Ok(generated.code)
}
