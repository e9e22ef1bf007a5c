// Moves graph state between an editor session and the remote service
use crate::crud::RemoteStore;
use crate::engine::session::EditorSession;
use crate::engine::templates;
use crate::engine::types::ArchitectureType;
use crate::http::error::Error;
use crate::schemas::architecture::{
    Architecture, ArchitecturePatch, ArchitectureSummary, Dataset, DatasetUpload, NewArchitecture,
    ValidationRequest, Verdict,
};
use crate::schemas::graph::{Connection, Edge, Node};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Independent sequences; a newer save never supersedes an older load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Save,
    Load,
    Validate,
}

/// Issued when a call starts, before anything is awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub channel: Channel,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    pub stamp: Stamp,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A newer call on the same channel was issued; the result was dropped.
    Stale,
}

/// Owned copy of what gets pushed, taken at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub nodes: Vec<Node>,
    pub revision: u64,
}

/// What the store kept, and the session revision it corresponds to.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub nodes: Vec<Node>,
    pub revision: u64,
}

impl SaveRequest {
    pub fn from_session(session: &EditorSession) -> Self {
        Self {
            nodes: session.nodes().to_vec(),
            revision: session.revision(),
        }
    }
}

#[derive(Debug, Default)]
struct Sequencer {
    save: AtomicU64,
    load: AtomicU64,
    validate: AtomicU64,
}

impl Sequencer {
    fn counter(&self, channel: Channel) -> &AtomicU64 {
        match channel {
            Channel::Save => &self.save,
            Channel::Load => &self.load,
            Channel::Validate => &self.validate,
        }
    }

    fn issue(&self, channel: Channel) -> Stamp {
        let seq = self.counter(channel).fetch_add(1, Ordering::SeqCst) + 1;
        Stamp { channel, seq }
    }

    fn latest(&self, channel: Channel) -> u64 {
        self.counter(channel).load(Ordering::SeqCst)
    }
}

/// Remote calls for one editor. Calls take owned snapshots, so the session
/// stays editable while they are in flight; results are applied back
/// explicitly and only if nothing newer was issued on the same channel.
pub struct SyncGateway<R> {
    remote: R,
    sequences: Sequencer,
}

impl<R: RemoteStore> SyncGateway<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            sequences: Sequencer::default(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn is_current(&self, stamp: &Stamp) -> bool {
        self.sequences.latest(stamp.channel) == stamp.seq
    }

    /// Replace the stored node list with `request.nodes`.
    pub fn save<'a>(
        &'a self,
        architecture_id: &'a str,
        request: SaveRequest,
    ) -> impl Future<Output = Result<Stamped<Saved>, Error>> + Send + 'a {
        let stamp = self.sequences.issue(Channel::Save);
        async move {
            let stored = self
                .remote
                .replace_nodes(architecture_id, &request.nodes)
                .await
                .inspect_err(|e| log::error!("Saving {} failed: {}", architecture_id, e))?;
            Ok(Stamped {
                stamp,
                value: Saved {
                    nodes: stored,
                    revision: request.revision,
                },
            })
        }
    }

    /// Fetch the stored node list. Apply it with [`SyncGateway::apply_load`].
    pub fn load<'a>(
        &'a self,
        architecture_id: &'a str,
    ) -> impl Future<Output = Result<Stamped<Vec<Node>>, Error>> + Send + 'a {
        let stamp = self.sequences.issue(Channel::Load);
        async move {
            let nodes = self
                .remote
                .fetch_nodes(architecture_id)
                .await
                .inspect_err(|e| log::error!("Loading {} failed: {}", architecture_id, e))?;
            Ok(Stamped { stamp, value: nodes })
        }
    }

    pub fn validate<'a>(
        &'a self,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        architecture_id: &'a str,
    ) -> impl Future<Output = Result<Stamped<Verdict>, Error>> + Send + 'a {
        let stamp = self.sequences.issue(Channel::Validate);
        async move {
            let request = ValidationRequest {
                nodes,
                edges,
                model_id: architecture_id.to_string(),
            };
            let verdict = self
                .remote
                .validate(&request)
                .await
                .inspect_err(|e| log::error!("Validating {} failed: {}", architecture_id, e))?;
            Ok(Stamped {
                stamp,
                value: verdict,
            })
        }
    }

    /// Code produced by the remote generator, returned untouched.
    pub async fn generate(&self, architecture_id: &str) -> Result<String, Error> {
        self.remote.generate(architecture_id).await
    }

    /// Mark the session saved at the request's revision. The graph itself is
    /// never rewritten from a save response.
    pub fn acknowledge_save(&self, session: &mut EditorSession, saved: &Stamped<Saved>) -> Applied {
        if !self.is_current(&saved.stamp) {
            log::warn!("Discarding stale save acknowledgement #{}", saved.stamp.seq);
            return Applied::Stale;
        }
        session.mark_saved(saved.value.revision);
        Applied::Applied
    }

    /// Replace the session's nodes with a fetched list, without history.
    pub fn apply_load(&self, session: &mut EditorSession, loaded: Stamped<Vec<Node>>) -> Applied {
        if !self.is_current(&loaded.stamp) {
            log::warn!("Discarding stale load #{}", loaded.stamp.seq);
            return Applied::Stale;
        }
        session.reload_nodes(loaded.value);
        Applied::Applied
    }

    pub fn apply_verdict(&self, session: &mut EditorSession, verdict: Stamped<Verdict>) -> Applied {
        if !self.is_current(&verdict.stamp) {
            log::warn!("Discarding stale verdict #{}", verdict.stamp.seq);
            return Applied::Stale;
        }
        session.set_verdict(verdict.value);
        Applied::Applied
    }

    /// Save, then acknowledge in one step. On failure the session is untouched.
    pub async fn save_session(
        &self,
        architecture_id: &str,
        session: &mut EditorSession,
    ) -> Result<Applied, Error> {
        let saved = self
            .save(architecture_id, SaveRequest::from_session(session))
            .await?;
        Ok(self.acknowledge_save(session, &saved))
    }

    pub async fn load_session(
        &self,
        architecture_id: &str,
        session: &mut EditorSession,
    ) -> Result<Applied, Error> {
        let loaded = self.load(architecture_id).await?;
        Ok(self.apply_load(session, loaded))
    }

    pub async fn save_connections(
        &self,
        architecture_id: &str,
        connections: Vec<Connection>,
    ) -> Result<Vec<Connection>, Error> {
        self.remote
            .replace_connections(architecture_id, &connections)
            .await
    }

    pub async fn load_connections(&self, architecture_id: &str) -> Result<Vec<Connection>, Error> {
        self.remote.fetch_connections(architecture_id).await
    }

    /// Persist committed edges through a partial update of the architecture.
    pub async fn save_edges(&self, architecture_id: &str, edges: Vec<Edge>) -> Result<Vec<Edge>, Error> {
        let patch = ArchitecturePatch {
            edges: Some(edges),
            ..Default::default()
        };
        let updated = self.remote.update_architecture(architecture_id, &patch).await?;
        Ok(updated.edges)
    }

    pub async fn list(&self) -> Result<Vec<ArchitectureSummary>, Error> {
        self.remote.list_architectures().await
    }

    pub async fn create(&self, name: &str, kind: ArchitectureType) -> Result<Architecture, Error> {
        self.remote
            .create_architecture(&NewArchitecture::blank(name, kind))
            .await
    }

    pub async fn fetch(&self, architecture_id: &str) -> Result<Architecture, Error> {
        self.remote.fetch_architecture(architecture_id).await
    }

    pub async fn update(
        &self,
        architecture_id: &str,
        patch: &ArchitecturePatch,
    ) -> Result<Architecture, Error> {
        self.remote.update_architecture(architecture_id, patch).await
    }

    pub async fn delete(&self, architecture_id: &str) -> Result<String, Error> {
        self.remote.delete_architecture(architecture_id).await
    }

    /// Create an architecture seeded with `kind`'s template and open it.
    /// Nothing is written remotely when the family has no template.
    pub async fn create_from_template(
        &self,
        name: &str,
        kind: ArchitectureType,
        history_limit: Option<usize>,
    ) -> Result<EditorSession, Error> {
        let (nodes, edges) = templates::instantiate(kind)?;
        let created = self
            .remote
            .create_architecture(&NewArchitecture {
                name: name.to_string(),
                kind,
                nodes,
                edges,
            })
            .await?;
        Ok(EditorSession::open(&created, history_limit))
    }

    /// Open a stored architecture in a fresh session.
    pub async fn open(
        &self,
        architecture_id: &str,
        history_limit: Option<usize>,
    ) -> Result<EditorSession, Error> {
        let architecture = self.fetch(architecture_id).await?;
        Ok(EditorSession::open(&architecture, history_limit))
    }

    /// Record dataset metadata; the session picks it up if it is editing
    /// that architecture.
    pub async fn attach_dataset(
        &self,
        architecture_id: &str,
        upload: &DatasetUpload,
        session: &mut EditorSession,
    ) -> Result<Dataset, Error> {
        let dataset = self.remote.attach_dataset(architecture_id, upload).await?;
        if session.architecture().map(|info| info.id.as_str()) == Some(architecture_id) {
            session.set_dataset(dataset.clone());
        }
        Ok(dataset)
    }
}
