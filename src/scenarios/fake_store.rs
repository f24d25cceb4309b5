//! In-memory pet store served through wiremock, used to run the real
//! suites end-to-end in tests. Mirrors the public pet-store's status codes
//! and `{code, type, message}` envelopes; [`Faults`] break individual
//! behaviours on purpose.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const BASE_PATH: &str = "/v2";

#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub reject_user_create: bool,
    pub reject_pet_create: bool,
    /// Answer DELETE with 200 but keep the pet.
    pub keep_deleted_pets: bool,
    /// Answer PUT with 200 but keep the old pet.
    pub ignore_pet_updates: bool,
}

#[derive(Default)]
struct StoreState {
    users: HashMap<String, Value>,
    pets: HashMap<i64, Value>,
    sessions: u64,
    pet_writes: usize,
}

#[derive(Clone, Default)]
pub struct FakePetStore {
    state: Arc<Mutex<StoreState>>,
    faults: Faults,
}

impl FakePetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    /// Starts a mock server answering every request from this store.
    pub async fn serve(&self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(self.clone()).mount(&server).await;
        server
    }

    pub fn base_url(server: &MockServer) -> String {
        format!("{}{BASE_PATH}", server.uri())
    }

    pub fn pet(&self, id: i64) -> Option<Value> {
        self.state.lock().pets.get(&id).cloned()
    }

    pub fn user(&self, username: &str) -> Option<Value> {
        self.state.lock().users.get(username).cloned()
    }

    pub fn pet_writes(&self) -> usize {
        self.state.lock().pet_writes
    }
}

fn envelope(status: u16, kind: &str, message: impl Into<String>) -> ResponseTemplate {
    let code = if status == 200 { 200 } else { 1 };
    ResponseTemplate::new(status).set_body_json(json!({
        "code": code,
        "type": kind,
        "message": message.into(),
    }))
}

fn not_found(what: &str) -> ResponseTemplate {
    envelope(404, "error", format!("{what} not found"))
}

impl Respond for FakePetStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(path) = request.url.path().strip_prefix(BASE_PATH) else {
            return ResponseTemplate::new(404);
        };
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let body: Option<Value> = serde_json::from_slice(&request.body).ok();
        let mut state = self.state.lock();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["user"]) => {
                if self.faults.reject_user_create {
                    return envelope(500, "unknown", "something bad happened");
                }
                let Some(user) = body.filter(|user| user["username"].is_string()) else {
                    return envelope(400, "error", "Invalid user supplied");
                };
                let username = user["username"].as_str().unwrap_or_default().to_string();
                state.users.insert(username, user);
                envelope(200, "unknown", "9223372036854775807")
            }
            ("GET", ["user", "login"]) => {
                let query: HashMap<_, _> = request.url.query_pairs().into_owned().collect();
                let known = query
                    .get("username")
                    .and_then(|name| state.users.get(name))
                    .is_some_and(|user| {
                        query.get("password").map(String::as_str) == user["password"].as_str()
                    });
                if !known {
                    return envelope(400, "error", "Invalid username/password supplied");
                }
                state.sessions += 1;
                let session = 1_700_000_000 + state.sessions;
                envelope(200, "unknown", format!("logged in user session:{session}"))
            }
            ("GET", ["user", "logout"]) => envelope(200, "unknown", "ok"),
            ("POST", ["user", "createWithList"]) => {
                let Some(Value::Array(users)) = body else {
                    return envelope(400, "error", "Invalid input");
                };
                for user in users {
                    if let Some(username) = user["username"].as_str() {
                        state.users.insert(username.to_string(), user.clone());
                    }
                }
                envelope(200, "unknown", "ok")
            }
            ("GET", ["user", username]) => match state.users.get(*username) {
                Some(user) => ResponseTemplate::new(200).set_body_json(user.clone()),
                None => not_found("User"),
            },
            ("POST", ["pet"]) => {
                if self.faults.reject_pet_create {
                    return envelope(500, "unknown", "something bad happened");
                }
                let Some(pet) = body.filter(|pet| pet["id"].is_i64()) else {
                    return envelope(405, "unknown", "Invalid input");
                };
                let id = pet["id"].as_i64().unwrap_or_default();
                state.pets.insert(id, pet.clone());
                state.pet_writes += 1;
                ResponseTemplate::new(200).set_body_json(pet)
            }
            ("PUT", ["pet"]) => {
                let Some(pet) = body.filter(|pet| pet["id"].is_i64()) else {
                    return envelope(400, "unknown", "Invalid ID supplied");
                };
                let id = pet["id"].as_i64().unwrap_or_default();
                if !state.pets.contains_key(&id) {
                    return not_found("Pet");
                }
                if !self.faults.ignore_pet_updates {
                    state.pets.insert(id, pet.clone());
                }
                state.pet_writes += 1;
                ResponseTemplate::new(200).set_body_json(pet)
            }
            ("GET", ["pet", id]) => {
                match id.parse::<i64>().ok().and_then(|id| state.pets.get(&id)) {
                    Some(pet) => ResponseTemplate::new(200).set_body_json(pet.clone()),
                    None => not_found("Pet"),
                }
            }
            ("DELETE", ["pet", id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    return envelope(400, "unknown", "Invalid ID supplied");
                };
                let existed = if self.faults.keep_deleted_pets {
                    state.pets.contains_key(&id)
                } else {
                    state.pets.remove(&id).is_some()
                };
                if existed {
                    envelope(200, "unknown", id.to_string())
                } else {
                    ResponseTemplate::new(404)
                }
            }
            _ => envelope(405, "unknown", "Method not allowed"),
        }
    }
}
