//! Suite-scoped fixture state.
//!
//! A [`FixtureContext`] is created by the orchestrator for exactly one suite
//! run and handed to each case in turn, so later cases observe what setup
//! and earlier cases wrote. Nothing here is global.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ContractError, Result};
use crate::factory::{Entity, EntityKind, Identity, merge_objects};

/// One bound entity: its immutable identity and the last field values the
/// service accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub role: String,
    pub kind: EntityKind,
    pub identity: Identity,
    pub snapshot: Value,
    /// Bumped on every accepted write.
    pub version: u64,
}

impl Fixture {
    /// Snapshot value at a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.snapshot.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// The last accepted state decoded into its typed variant.
    pub fn entity(&self) -> Result<Entity> {
        Entity::from_json(self.kind, self.snapshot.clone())
    }
}

#[derive(Debug, Default)]
pub struct FixtureContext {
    fixtures: BTreeMap<String, Fixture>,
}

impl FixtureContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `role` to an entity, replacing any previous binding.
    pub fn set(&mut self, role: impl Into<String>, entity: &Entity) -> &Fixture {
        self.bind(role.into(), entity.kind(), entity.identity(), entity.to_json())
    }

    /// Binds `role` to what the service echoed back, e.g. the body of a
    /// create response. The echo must decode as a `kind` entity.
    pub fn set_snapshot(
        &mut self,
        role: impl Into<String>,
        kind: EntityKind,
        echo: Value,
    ) -> Result<&Fixture> {
        let identity = Entity::from_json(kind, echo.clone())?.identity();
        Ok(self.bind(role.into(), kind, identity, echo))
    }

    fn bind(
        &mut self,
        role: String,
        kind: EntityKind,
        identity: Identity,
        snapshot: Value,
    ) -> &Fixture {
        let fixture = Fixture {
            role: role.clone(),
            kind,
            identity,
            snapshot,
            version: 0,
        };
        debug!(%role, identity = %fixture.identity, "fixture bound");
        match self.fixtures.entry(role) {
            Entry::Occupied(mut entry) => {
                entry.insert(fixture);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(fixture),
        }
    }

    pub fn get(&self, role: &str) -> Result<&Fixture> {
        self.fixtures
            .get(role)
            .ok_or_else(|| ContractError::FixtureNotFound { role: role.to_string() })
    }

    /// Deep-merges `patch` (a JSON object) into the snapshot. Must follow
    /// every successful mutating request so later cases read what the
    /// service holds. A patch whose result no longer fits the entity schema
    /// is rejected and the snapshot is left untouched.
    pub fn update(&mut self, role: &str, patch: Value) -> Result<&Fixture> {
        let fixture = self
            .fixtures
            .get_mut(role)
            .ok_or_else(|| ContractError::FixtureNotFound { role: role.to_string() })?;

        let Value::Object(patch) = patch else {
            return Err(ContractError::configuration(format!(
                "Patch for fixture `{role}` must be a JSON object"
            )));
        };

        let identity_field = fixture.kind.identity_field();
        if let Some(value) = patch.get(identity_field) {
            if *value != fixture.identity.to_value() {
                return Err(ContractError::IdentityMutation {
                    role: role.to_string(),
                    field: identity_field.to_string(),
                });
            }
        }

        let mut merged = match &fixture.snapshot {
            Value::Object(snapshot) => snapshot.clone(),
            _ => Map::new(),
        };
        merge_objects(&mut merged, &patch);
        let merged = Value::Object(merged);
        Entity::from_json(fixture.kind, merged.clone())?;

        fixture.snapshot = merged;
        fixture.version += 1;
        debug!(%role, version = fixture.version, "fixture updated");
        Ok(fixture)
    }

    /// Drops a binding, e.g. once the service has deleted the entity.
    pub fn remove(&mut self, role: &str) -> Result<Fixture> {
        self.fixtures
            .remove(role)
            .ok_or_else(|| ContractError::FixtureNotFound { role: role.to_string() })
    }

    pub fn contains(&self, role: &str) -> bool {
        self.fixtures.contains_key(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.fixtures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}
