use crate::http::{ApiClient, error::Error};
use crate::schemas::architecture::{
    Architecture, ArchitecturePatch, ArchitectureSummary, Dataset, DatasetUpload, NewArchitecture,
    ValidationRequest, Verdict,
};
use crate::schemas::graph::{Connection, Node};
use async_trait::async_trait;

pub mod architecture;
pub mod compiler;

/// The remote contract the sync gateway is written against.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_architectures(&self) -> Result<Vec<ArchitectureSummary>, Error>;
    async fn create_architecture(&self, new: &NewArchitecture) -> Result<Architecture, Error>;
    async fn fetch_architecture(&self, id: &str) -> Result<Architecture, Error>;
    async fn update_architecture(
        &self,
        id: &str,
        patch: &ArchitecturePatch,
    ) -> Result<Architecture, Error>;
    async fn delete_architecture(&self, id: &str) -> Result<String, Error>;
    async fn fetch_nodes(&self, id: &str) -> Result<Vec<Node>, Error>;
    async fn replace_nodes(&self, id: &str, nodes: &[Node]) -> Result<Vec<Node>, Error>;
    async fn fetch_connections(&self, id: &str) -> Result<Vec<Connection>, Error>;
    async fn replace_connections(
        &self,
        id: &str,
        connections: &[Connection],
    ) -> Result<Vec<Connection>, Error>;
    async fn attach_dataset(&self, id: &str, upload: &DatasetUpload) -> Result<Dataset, Error>;
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, Error>;
    async fn generate(&self, id: &str) -> Result<String, Error>;
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn list_architectures(&self) -> Result<Vec<ArchitectureSummary>, Error> {
        architecture::list(self).await
    }

    async fn create_architecture(&self, new: &NewArchitecture) -> Result<Architecture, Error> {
        architecture::create(new, self).await
    }

    async fn fetch_architecture(&self, id: &str) -> Result<Architecture, Error> {
        architecture::fetch(id, self).await
    }

    async fn update_architecture(
        &self,
        id: &str,
        patch: &ArchitecturePatch,
    ) -> Result<Architecture, Error> {
        architecture::update(id, patch, self).await
    }

    async fn delete_architecture(&self, id: &str) -> Result<String, Error> {
        architecture::delete(id, self).await
    }

    async fn fetch_nodes(&self, id: &str) -> Result<Vec<Node>, Error> {
        architecture::fetch_nodes(id, self).await
    }

    async fn replace_nodes(&self, id: &str, nodes: &[Node]) -> Result<Vec<Node>, Error> {
        architecture::replace_nodes(id, nodes, self).await
    }

    async fn fetch_connections(&self, id: &str) -> Result<Vec<Connection>, Error> {
        architecture::fetch_connections(id, self).await
    }

    async fn replace_connections(
        &self,
        id: &str,
        connections: &[Connection],
    ) -> Result<Vec<Connection>, Error> {
        architecture::replace_connections(id, connections, self).await
    }

    async fn attach_dataset(&self, id: &str, upload: &DatasetUpload) -> Result<Dataset, Error> {
        architecture::attach_dataset(id, upload, self).await
    }

    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, Error> {
        compiler::validate(request, self).await
    }

    async fn generate(&self, id: &str) -> Result<String, Error> {
        compiler::generate(id, self).await
    }
}
