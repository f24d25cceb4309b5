//! # Data Factory
//!
//! Schema-driven generation of user and pet payloads. Identity fields are
//! drawn from large spaces and additionally checked against every identity
//! the factory has issued during the run, so two generated entities never
//! share a username or pet id.

pub mod entity;

use std::collections::HashSet;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ContractError, Result};

pub use entity::{Category, Entity, EntityKind, Identity, Pet, PetStatus, Tag, User};

const MAX_PET_ID: i64 = 9_999_999;
const USERNAME_SUFFIX_SPACE: u32 = 1_000_000;

const FIRST_NAMES: [&str; 24] = [
    "Alice", "Bruno", "Chloe", "Dmitri", "Elena", "Farid", "Greta", "Hugo", "Ines", "Jonas",
    "Keiko", "Liam", "Maya", "Nils", "Olga", "Pablo", "Quinn", "Rosa", "Sven", "Tara", "Umar",
    "Vera", "Wes", "Yara",
];

const LAST_NAMES: [&str; 20] = [
    "Adler", "Baptiste", "Castro", "Dubois", "Eriksen", "Fischer", "Garcia", "Hansen", "Ivanova",
    "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov", "Rossi", "Silva",
    "Tanaka", "Weber",
];

const EMAIL_DOMAINS: [&str; 4] = ["example.com", "example.org", "mail.test", "petstore.test"];

const CATEGORIES: [(i64, &str); 4] = [(1, "Dogs"), (2, "Cats"), (3, "Fish"), (4, "Birds")];

const USERNAME_SEPARATORS: [&str; 3] = [".", "_", ""];

struct FactoryState {
    rng: StdRng,
    issued: HashSet<Identity>,
}

/// Produces randomized entities. Shareable across concurrently running
/// suites; the identity ledger spans the whole run.
pub struct DataFactory {
    state: Mutex<FactoryState>,
}

impl Default for DataFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFactory {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible factory for replaying a run.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(FactoryState {
                rng,
                issued: HashSet::new(),
            }),
        }
    }

    /// Generates a fully populated entity of `kind` with `overrides` (a JSON
    /// object, or `null` for none) merged over the random payload.
    pub fn generate(&self, kind: EntityKind, overrides: &Value) -> Result<Entity> {
        let overrides = match overrides {
            Value::Null => None,
            Value::Object(map) => Some(map),
            other => {
                return Err(ContractError::configuration(format!(
                    "Overrides for {kind} must be a JSON object, got {other}"
                )));
            }
        };

        let mut state = self.state.lock();
        let generated = match kind {
            EntityKind::User => Entity::User(random_user(&mut state)),
            EntityKind::Pet => Entity::Pet(random_pet(&mut state)),
        };

        let Some(overrides) = overrides else {
            debug!(%kind, identity = %generated.identity(), "generated entity");
            return Ok(generated);
        };

        let mut payload = generated.to_json();
        if let Value::Object(fields) = &mut payload {
            for key in overrides.keys() {
                if !fields.contains_key(key) {
                    return Err(ContractError::configuration(format!(
                        "Override field `{key}` is not part of the {kind} schema"
                    )));
                }
            }
            merge_objects(fields, overrides);
        }

        let entity = Entity::from_json(kind, payload)?;
        let identity = entity.identity();
        if identity != generated.identity() && !state.issued.insert(identity.clone()) {
            return Err(ContractError::configuration(format!(
                "Pinned {kind} identity `{identity}` was already issued in this run"
            )));
        }

        debug!(%kind, %identity, "generated entity with overrides");
        Ok(entity)
    }

    pub fn user(&self) -> User {
        random_user(&mut self.state.lock())
    }

    pub fn pet(&self) -> Pet {
        random_pet(&mut self.state.lock())
    }

    /// A random pet name different from `current`.
    pub fn pet_name(&self, current: &str) -> String {
        let mut state = self.state.lock();
        loop {
            let name = pick(&mut state.rng, &FIRST_NAMES);
            if name != current {
                return name.to_string();
            }
        }
    }

    pub fn users(&self, count: usize) -> Vec<User> {
        let mut state = self.state.lock();
        (0..count).map(|_| random_user(&mut state)).collect()
    }

    /// Number of identities issued so far in this run.
    pub fn issued(&self) -> usize {
        self.state.lock().issued.len()
    }
}

/// Deep merge: nested objects are merged key by key, anything else replaces.
pub(crate) fn merge_objects(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_objects(existing, nested)
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn pick<T: Copy>(rng: &mut StdRng, pool: &[T]) -> T {
    pool[rng.gen_range(0..pool.len())]
}

fn random_user(state: &mut FactoryState) -> User {
    let first_name = pick(&mut state.rng, &FIRST_NAMES);
    let last_name = pick(&mut state.rng, &LAST_NAMES);

    let username = loop {
        let separator = pick(&mut state.rng, &USERNAME_SEPARATORS);
        let suffix = state.rng.gen_range(0..USERNAME_SUFFIX_SPACE);
        let candidate = format!("{first_name}{separator}{last_name}{suffix:06}");
        if state.issued.insert(Identity::Username(candidate.clone())) {
            break candidate;
        }
    };

    let email = format!(
        "{}.{}{}@{}",
        first_name.to_ascii_lowercase(),
        last_name.to_ascii_lowercase(),
        state.rng.gen_range(10..100),
        pick(&mut state.rng, &EMAIL_DOMAINS)
    );
    let phone = format!(
        "555-{:03}-{:04}",
        state.rng.gen_range(100..1000),
        state.rng.gen_range(0..10_000)
    );

    User {
        id: 0,
        username,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        password: format!("Pw{}!", state.rng.gen_range(100_000..1_000_000)),
        phone,
        user_status: 0,
    }
}

fn random_pet(state: &mut FactoryState) -> Pet {
    let id = loop {
        let candidate = state.rng.gen_range(1..=MAX_PET_ID);
        if state.issued.insert(Identity::Id(candidate)) {
            break candidate;
        }
    };

    let (category_id, category_name) = pick(&mut state.rng, &CATEGORIES);
    let photo = format!(
        "https://images.petstore.test/{}/{}.jpg",
        category_name.to_ascii_lowercase(),
        state.rng.gen_range(1..100_000)
    );

    Pet {
        id,
        category: Category {
            id: category_id,
            name: category_name.to_string(),
        },
        name: pick(&mut state.rng, &FIRST_NAMES).to_string(),
        photo_urls: vec![photo],
        tags: vec![Tag {
            id: category_id,
            name: category_name.to_ascii_lowercase(),
        }],
        status: pick(&mut state.rng, &PetStatus::ALL),
    }
}
