use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ContractError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Pet,
}

impl EntityKind {
    /// Field the service uses to look the entity up again.
    pub fn identity_field(self) -> &'static str {
        match self {
            EntityKind::User => "username",
            EntityKind::Pet => "id",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::User => "user",
            EntityKind::Pet => "pet",
        };
        write!(f, "{label}")
    }
}

impl FromStr for EntityKind {
    type Err = ContractError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(EntityKind::User),
            "pet" => Ok(EntityKind::Pet),
            other => Err(ContractError::configuration(format!("Unknown entity kind `{other}`"))),
        }
    }
}

/// Identity of a stored entity: the pet id or the username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Identity {
    Id(i64),
    Username(String),
}

impl Identity {
    pub fn to_value(&self) -> Value {
        match self {
            Identity::Id(id) => Value::from(*id),
            Identity::Username(name) => Value::from(name.as_str()),
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Id(id) => write!(f, "{id}"),
            Identity::Username(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub user_status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "sold")]
    Sold,
    #[serde(rename = "not available")]
    NotAvailable,
}

impl PetStatus {
    pub const ALL: [PetStatus; 4] = [
        PetStatus::Available,
        PetStatus::Pending,
        PetStatus::Sold,
        PetStatus::NotAvailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Sold => "sold",
            PetStatus::NotAvailable => "not available",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    pub category: Category,
    pub name: String,
    pub photo_urls: Vec<String>,
    pub tags: Vec<Tag>,
    pub status: PetStatus,
}

/// A schema-conformant payload of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    User(User),
    Pet(Pet),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::User(_) => EntityKind::User,
            Entity::Pet(_) => EntityKind::Pet,
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            Entity::User(user) => Identity::Username(user.username.clone()),
            Entity::Pet(pet) => Identity::Id(pet.id),
        }
    }

    /// The JSON field map sent to the service.
    pub fn to_json(&self) -> Value {
        let encoded = match self {
            Entity::User(user) => serde_json::to_value(user),
            Entity::Pet(pet) => serde_json::to_value(pet),
        };
        // Both variants are plain structs of strings, numbers and lists.
        encoded.unwrap_or(Value::Null)
    }

    /// Decodes a field map back into the typed variant of `kind`.
    pub fn from_json(kind: EntityKind, value: Value) -> Result<Self> {
        let decoded = match kind {
            EntityKind::User => serde_json::from_value(value).map(Entity::User),
            EntityKind::Pet => serde_json::from_value(value).map(Entity::Pet),
        };
        decoded.map_err(|err| {
            ContractError::configuration(format!("Payload does not fit the {kind} schema: {err}"))
        })
    }
}

impl From<User> for Entity {
    fn from(user: User) -> Self {
        Entity::User(user)
    }
}

impl From<Pet> for Entity {
    fn from(pet: Pet) -> Self {
        Entity::Pet(pet)
    }
}
