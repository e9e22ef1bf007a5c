// In-process stand-in for the model service's REST contract
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use graph_builder::ApiClient;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Any request touching this id fails with a 500.
pub const BROKEN_ID: &str = "broken";

type Store = Arc<Mutex<HashMap<String, Value>>>;
type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub struct StubService {
    pub base_url: String,
    pub store: Store,
}

impl StubService {
    pub fn client(&self) -> ApiClient {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client builds");
        ApiClient::with_client(&self.base_url, client)
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.store.lock().unwrap().get(id).cloned()
    }
}

pub async fn spawn() -> StubService {
    let store: Store = Arc::default();
    let app = Router::new().nest("/api", router(store.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    StubService {
        base_url: format!("http://{}/api", addr),
        store,
    }
}

fn router(store: Store) -> Router {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route("/models/{id}/nodes", get(get_nodes).put(put_nodes))
        .route(
            "/models/{id}/connections",
            get(get_connections).put(put_connections),
        )
        .route("/models/{id}/dataset", post(attach_dataset))
        .route("/models/{id}/generate", post(generate))
        .route("/validate", post(validate))
        .with_state(store)
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn not_found() -> (StatusCode, Json<Value>) {
    failure(StatusCode::NOT_FOUND, "Model not found")
}

fn guard(id: &str) -> Result<(), (StatusCode, Json<Value>)> {
    if id == BROKEN_ID {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable"));
    }
    Ok(())
}

async fn list_models(State(store): State<Store>) -> Json<Value> {
    let models: Vec<Value> = store.lock().unwrap().values().cloned().collect();
    Json(Value::Array(models))
}

async fn create_model(State(store): State<Store>, Json(body): Json<Value>) -> Reply {
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return Err(failure(StatusCode::BAD_REQUEST, "name is required"));
    };
    let id = uuid::Uuid::new_v4().simple().to_string();
    let document = json!({
        "_id": id,
        "name": name,
        "type": body.get("type").cloned().unwrap_or(json!("feedforward")),
        "nodes": body.get("nodes").cloned().unwrap_or(json!([])),
        "edges": body.get("edges").cloned().unwrap_or(json!([])),
        "connections": [],
        "history": [],
        "historyIndex": -1,
        "projectName": "Untitled Project",
        "hasDataset": false,
        "createdAt": "2024-05-01T09:00:00.000Z",
        "updatedAt": "2024-05-01T09:00:00.000Z",
        "__v": 0
    });
    store.lock().unwrap().insert(id, document.clone());
    Ok(Json(document))
}

async fn get_model(State(store): State<Store>, Path(id): Path<String>) -> Reply {
    guard(&id)?;
    store
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn update_model(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Reply {
    guard(&id)?;
    let mut store = store.lock().unwrap();
    let document = store.get_mut(&id).ok_or_else(not_found)?;
    if let (Some(target), Some(fields)) = (document.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(Json(document.clone()))
}

async fn delete_model(State(store): State<Store>, Path(id): Path<String>) -> Reply {
    guard(&id)?;
    store.lock().unwrap().remove(&id).ok_or_else(not_found)?;
    Ok(Json(json!({ "message": "Model deleted successfully" })))
}

fn field(store: &Store, id: &str, key: &str) -> Reply {
    guard(id)?;
    let store = store.lock().unwrap();
    let document = store.get(id).ok_or_else(not_found)?;
    Ok(Json(document.get(key).cloned().unwrap_or(json!([]))))
}

fn replace_field(store: &Store, id: &str, key: &str, value: Value) -> Reply {
    guard(id)?;
    let mut store = store.lock().unwrap();
    let document = store.get_mut(id).ok_or_else(not_found)?;
    document[key] = value.clone();
    Ok(Json(value))
}

async fn get_nodes(State(store): State<Store>, Path(id): Path<String>) -> Reply {
    field(&store, &id, "nodes")
}

async fn put_nodes(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(nodes): Json<Value>,
) -> Reply {
    replace_field(&store, &id, "nodes", nodes)
}

async fn get_connections(State(store): State<Store>, Path(id): Path<String>) -> Reply {
    field(&store, &id, "connections")
}

async fn put_connections(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(connections): Json<Value>,
) -> Reply {
    replace_field(&store, &id, "connections", connections)
}

async fn attach_dataset(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(upload): Json<Value>,
) -> Reply {
    guard(&id)?;
    let mut store = store.lock().unwrap();
    let document = store.get_mut(&id).ok_or_else(not_found)?;
    let dataset = json!({
        "name": upload["filename"],
        "size": upload["size"],
        "filename": upload["filename"],
        "displayName": upload["displayName"],
        "uploadedAt": "2024-05-02T08:30:00.000Z"
    });
    document["dataset"] = dataset.clone();
    document["hasDataset"] = json!(true);
    Ok(Json(json!({ "dataset": dataset })))
}

async fn generate(State(store): State<Store>, Path(id): Path<String>) -> Reply {
    guard(&id)?;
    let store = store.lock().unwrap();
    let document = store.get(&id).ok_or_else(not_found)?;
    let layers = document["nodes"].as_array().map_or(0, Vec::len);
    Ok(Json(json!({ "code": format!("# {} layers\nmodel = Sequential()\n", layers) })))
}

/// Valid when the graph has at least one output layer.
async fn validate(Json(request): Json<Value>) -> Reply {
    let model_id = request["modelId"].as_str().unwrap_or_default();
    guard(model_id)?;
    let has_output = request["nodes"]
        .as_array()
        .is_some_and(|nodes| nodes.iter().any(|node| node["type"] == "output"));
    let response = if has_output {
        "Architecture looks good"
    } else {
        "Architecture has no output layer"
    };
    Ok(Json(json!({ "isValid": has_output, "response": response })))
}
