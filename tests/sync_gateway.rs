use async_trait::async_trait;
use graph_builder::crud::RemoteStore;
use graph_builder::engine::session::{ArchitectureInfo, EditorSession};
use graph_builder::engine::types::{ArchitectureType, NodeKind};
use graph_builder::schemas::architecture::{
    Architecture, ArchitecturePatch, ArchitectureSummary, Dataset, DatasetUpload, NewArchitecture,
    ValidationRequest, Verdict,
};
use graph_builder::schemas::graph::{Connection, Node, Position};
use graph_builder::sync::{Applied, Channel, SaveRequest, SyncGateway};
use graph_builder::{GraphError, SyncError as Error};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Document store held in memory, with a switch to simulate an outage.
#[derive(Default)]
struct MockRemote {
    models: Mutex<HashMap<String, Architecture>>,
    offline: AtomicBool,
    next_id: AtomicUsize,
}

impl MockRemote {
    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::unavailable("connection refused"));
        }
        Ok(())
    }

    fn with_model<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Architecture) -> T,
    ) -> Result<T, Error> {
        self.check()?;
        let mut models = self.models.lock().unwrap();
        let model = models
            .get_mut(id)
            .ok_or_else(|| Error::NotFound("Model not found".into()))?;
        Ok(f(model))
    }

    fn stored_nodes(&self, id: &str) -> Vec<Node> {
        self.models.lock().unwrap()[id].nodes.clone()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn list_architectures(&self) -> Result<Vec<ArchitectureSummary>, Error> {
        self.check()?;
        let models = self.models.lock().unwrap();
        Ok(models
            .values()
            .map(|m| ArchitectureSummary {
                id: m.id.clone(),
                name: m.name.clone(),
                kind: m.kind,
                has_dataset: m.has_dataset,
                last_trained: None,
                updated_at: None,
            })
            .collect())
    }

    async fn create_architecture(&self, new: &NewArchitecture) -> Result<Architecture, Error> {
        self.check()?;
        let id = format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let model = Architecture {
            id: id.clone(),
            name: new.name.clone(),
            kind: new.kind,
            nodes: new.nodes.clone(),
            edges: new.edges.clone(),
            connections: vec![],
            project_name: None,
            has_dataset: false,
            dataset: None,
            last_trained: None,
            last_opened: None,
            created_at: None,
            updated_at: None,
        };
        self.models.lock().unwrap().insert(id, model.clone());
        Ok(model)
    }

    async fn fetch_architecture(&self, id: &str) -> Result<Architecture, Error> {
        self.with_model(id, |m| m.clone())
    }

    async fn update_architecture(
        &self,
        id: &str,
        patch: &ArchitecturePatch,
    ) -> Result<Architecture, Error> {
        self.with_model(id, |m| {
            if let Some(name) = &patch.name {
                m.name = name.clone();
            }
            if let Some(edges) = &patch.edges {
                m.edges = edges.clone();
            }
            if let Some(nodes) = &patch.nodes {
                m.nodes = nodes.clone();
            }
            m.clone()
        })
    }

    async fn delete_architecture(&self, id: &str) -> Result<String, Error> {
        self.check()?;
        self.models
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| "Model deleted successfully".to_string())
            .ok_or_else(|| Error::NotFound("Model not found".into()))
    }

    async fn fetch_nodes(&self, id: &str) -> Result<Vec<Node>, Error> {
        self.with_model(id, |m| m.nodes.clone())
    }

    async fn replace_nodes(&self, id: &str, nodes: &[Node]) -> Result<Vec<Node>, Error> {
        self.with_model(id, |m| {
            m.nodes = nodes.to_vec();
            m.nodes.clone()
        })
    }

    async fn fetch_connections(&self, id: &str) -> Result<Vec<Connection>, Error> {
        self.with_model(id, |m| m.connections.clone())
    }

    async fn replace_connections(
        &self,
        id: &str,
        connections: &[Connection],
    ) -> Result<Vec<Connection>, Error> {
        self.with_model(id, |m| {
            m.connections = connections.to_vec();
            m.connections.clone()
        })
    }

    async fn attach_dataset(&self, id: &str, upload: &DatasetUpload) -> Result<Dataset, Error> {
        self.with_model(id, |m| {
            let dataset = Dataset {
                name: Some(upload.filename.clone()),
                size: Some(upload.size.clone()),
                filename: Some(upload.filename.clone()),
                display_name: Some(upload.display_name.clone()),
                uploaded_at: None,
            };
            m.dataset = Some(dataset.clone());
            m.has_dataset = true;
            dataset
        })
    }

    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, Error> {
        self.check()?;
        let is_valid = request.nodes.iter().any(|n| n.kind() == NodeKind::Output);
        Ok(Verdict {
            is_valid,
            response: format!("{} layers checked", request.nodes.len()),
        })
    }

    async fn generate(&self, id: &str) -> Result<String, Error> {
        self.with_model(id, |m| format!("# {}", m.name))
    }
}

async fn gateway_with_model(kind: ArchitectureType) -> (SyncGateway<MockRemote>, String) {
    let gateway = SyncGateway::new(MockRemote::default());
    let created = gateway.create("net", kind).await.unwrap();
    (gateway, created.id)
}

fn dense(id: &str) -> Node {
    Node::of_kind(id, NodeKind::Dense, "Dense", Position::new(0.0, 0.0))
}

#[tokio::test]
async fn failed_save_leaves_session_untouched() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    let mut session = gateway.open(&id, None).await.unwrap();
    session.instantiate_template(ArchitectureType::Cnn).unwrap();
    let before = session.graph().clone();
    let revision = session.revision();

    gateway.remote().go_offline();
    let err = gateway.save_session(&id, &mut session).await.unwrap_err();

    assert!(matches!(err, Error::RemoteUnavailable(_)));
    assert_eq!(session.graph(), &before);
    assert_eq!(session.revision(), revision);
    assert!(session.is_dirty());
}

#[tokio::test]
async fn save_marks_session_clean() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Rnn).await;
    let mut session = gateway.open(&id, None).await.unwrap();
    assert!(!session.is_dirty());

    session.instantiate_template(ArchitectureType::Rnn).unwrap();
    assert!(session.is_dirty());

    let applied = gateway.save_session(&id, &mut session).await.unwrap();
    assert_eq!(applied, Applied::Applied);
    assert!(!session.is_dirty());
    assert_eq!(gateway.remote().stored_nodes(&id), session.nodes());
}

#[tokio::test]
async fn edits_during_a_save_keep_the_session_dirty() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Feedforward).await;
    let mut session = gateway.open(&id, None).await.unwrap();
    session.add_node(dense("d1")).unwrap();
    let revision = session.revision();

    let pending = gateway.save(&id, SaveRequest::from_session(&session));
    session.add_node(dense("d2")).unwrap();
    let saved = pending.await.unwrap();
    assert_eq!(saved.value.revision, revision);
    assert_eq!(saved.value.nodes.len(), 1);

    assert_eq!(gateway.acknowledge_save(&mut session, &saved), Applied::Applied);
    assert_eq!(session.nodes().len(), 2);
    assert_eq!(gateway.remote().stored_nodes(&id).len(), 1);
    assert!(session.is_dirty());
}

#[tokio::test]
async fn out_of_order_saves_keep_the_newest_acknowledgement() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Feedforward).await;
    let mut session = gateway.open(&id, None).await.unwrap();

    session.add_node(dense("d1")).unwrap();
    let first = gateway.save(&id, SaveRequest::from_session(&session));
    session.add_node(dense("d2")).unwrap();
    let latest = session.revision();
    let second = gateway.save(&id, SaveRequest::from_session(&session));

    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.stamp.channel, Channel::Save);
    assert!(second.stamp.seq > first.stamp.seq);

    assert_eq!(gateway.acknowledge_save(&mut session, &second), Applied::Applied);
    assert_eq!(gateway.acknowledge_save(&mut session, &first), Applied::Stale);
    assert_eq!(session.saved_revision(), Some(latest));
    assert_eq!(second.value.revision, latest);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn stale_load_is_discarded() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    let mut session = gateway.open(&id, None).await.unwrap();

    let older = gateway.load(&id);
    gateway.remote().replace_nodes(&id, &[dense("fresh")]).await.unwrap();
    let newer = gateway.load(&id);

    let (older, newer) = tokio::join!(older, newer);
    let (older, newer) = (older.unwrap(), newer.unwrap());

    assert_eq!(gateway.apply_load(&mut session, newer), Applied::Applied);
    assert_eq!(gateway.apply_load(&mut session, older), Applied::Stale);
    let ids: Vec<_> = session.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["fresh"]);
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn loads_do_not_enter_history() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    gateway.remote().replace_nodes(&id, &[dense("remote")]).await.unwrap();
    let mut session = EditorSession::new();
    session.add_node(dense("local")).unwrap();
    let entries = session.history().len();

    assert_eq!(gateway.load_session(&id, &mut session).await.unwrap(), Applied::Applied);

    assert_eq!(session.history().len(), entries);
    assert!(session.graph().contains_node("remote"));
    assert!(!session.graph().contains_node("local"));
}

#[tokio::test]
async fn loaded_nodes_survive_undo_then_redo() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    gateway.remote().replace_nodes(&id, &[dense("server")]).await.unwrap();
    let mut session = EditorSession::new();
    session.add_node(dense("a")).unwrap();

    gateway.load_session(&id, &mut session).await.unwrap();
    assert!(session.undo());
    assert!(session.nodes().is_empty());
    assert!(session.redo());

    let ids: Vec<_> = session.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["server"]);
}

#[tokio::test]
async fn template_creation_stores_the_chain() {
    let gateway = SyncGateway::new(MockRemote::default());
    let session = gateway
        .create_from_template("digits", ArchitectureType::Cnn, Some(20))
        .await
        .unwrap();

    let id = session.architecture().unwrap().id.clone();
    assert_eq!(gateway.remote().stored_nodes(&id), session.nodes());
    assert_eq!(session.edges().len(), 5);
    assert!(!session.is_dirty());
    assert!(!session.history().can_undo());
}

#[tokio::test]
async fn missing_template_creates_nothing() {
    let gateway = SyncGateway::new(MockRemote::default());
    let result = gateway
        .create_from_template("attn", ArchitectureType::Transformer, None)
        .await;

    assert!(matches!(
        result,
        Err(Error::Graph(GraphError::UnsupportedTemplate(ArchitectureType::Transformer)))
    ));
    assert!(gateway.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn channels_are_sequenced_independently() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    let mut session = gateway.open(&id, None).await.unwrap();

    let load = gateway.load(&id);
    let save = gateway.save(&id, SaveRequest::from_session(&session));
    let (load, save) = tokio::join!(load, save);

    assert_eq!(gateway.apply_load(&mut session, load.unwrap()), Applied::Applied);
    assert_eq!(gateway.acknowledge_save(&mut session, &save.unwrap()), Applied::Applied);
}

#[tokio::test]
async fn only_the_latest_verdict_is_kept() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    let mut session = gateway.open(&id, None).await.unwrap();

    let first = gateway.validate(vec![], vec![], &id);
    session.instantiate_template(ArchitectureType::Cnn).unwrap();
    let second = gateway.validate(session.nodes().to_vec(), session.edges().to_vec(), &id);

    let (first, second) = tokio::join!(first, second);
    assert_eq!(gateway.apply_verdict(&mut session, second.unwrap()), Applied::Applied);
    assert_eq!(gateway.apply_verdict(&mut session, first.unwrap()), Applied::Stale);

    let verdict = session.verdict().unwrap();
    assert!(verdict.is_valid);
    assert_eq!(verdict.response, "6 layers checked");
}

#[tokio::test]
async fn connections_and_edges_persist() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Feedforward).await;
    let mut session = gateway.open(&id, None).await.unwrap();
    session.instantiate_template(ArchitectureType::Feedforward).unwrap();
    session.add_node(dense("extra")).unwrap();
    let conn = session.add_connection("dense2", "extra").unwrap();

    let saved = gateway
        .save_connections(&id, session.connections().to_vec())
        .await
        .unwrap();
    assert_eq!(saved, vec![conn.clone()]);
    assert_eq!(gateway.load_connections(&id).await.unwrap(), saved);

    session.commit_connection(&conn.id).unwrap();
    let edges = gateway.save_edges(&id, session.edges().to_vec()).await.unwrap();
    assert_eq!(edges.len(), 4);
    assert!(edges.iter().any(|e| e.id == "edense2-extra"));
}

#[tokio::test]
async fn dataset_reaches_the_matching_session_only() {
    let (gateway, id) = gateway_with_model(ArchitectureType::Cnn).await;
    let upload = DatasetUpload {
        filename: "mnist.csv".into(),
        size: "12 MB".into(),
        display_name: "MNIST".into(),
    };

    let mut other = EditorSession::new();
    other.attach(ArchitectureInfo {
        id: "someone-else".into(),
        name: "other".into(),
        kind: ArchitectureType::Rnn,
        dataset: None,
    });
    gateway.attach_dataset(&id, &upload, &mut other).await.unwrap();
    assert!(other.architecture().unwrap().dataset.is_none());

    let mut session = gateway.open(&id, None).await.unwrap();
    let dataset = gateway.attach_dataset(&id, &upload, &mut session).await.unwrap();
    assert_eq!(session.architecture().unwrap().dataset.as_ref(), Some(&dataset));

    let reopened = gateway.open(&id, None).await.unwrap();
    assert_eq!(reopened.architecture().unwrap().dataset, Some(dataset));
}

#[tokio::test]
async fn missing_architecture_is_not_found() {
    let gateway = SyncGateway::new(MockRemote::default());
    assert!(matches!(
        gateway.open("nope", None).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(gateway.delete("nope").await, Err(Error::NotFound(_))));
    assert!(gateway.list().await.unwrap().is_empty());
}
