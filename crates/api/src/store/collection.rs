/// Static description of an entity collection: what a valid document looks like.
#[derive(Debug)]
pub struct Collection {
    pub name: &'static str,
    /// Attributes that must be present, non-null and (for strings) non-empty on create.
    pub required: &'static [&'static str],
    /// Attribute groups whose combined values must be unique across the collection.
    pub unique: &'static [&'static [&'static str]],
    /// Stamp `createdAt` with the creation time when the input has none.
    pub stamps_created_at: bool,
}

pub const PROJECTS: Collection = Collection {
    name: "projects",
    required: &["name", "gitRepository"],
    unique: &[&["name"]],
    stamps_created_at: false,
};

pub const DEFINITIONS: Collection = Collection {
    name: "definitions",
    required: &["projectId", "name", "config"],
    unique: &[&["projectId", "name"]],
    stamps_created_at: false,
};

pub const INSTANCES: Collection = Collection {
    name: "instances",
    required: &["definitionId", "name"],
    unique: &[&["definitionId", "name"]],
    stamps_created_at: true,
};

pub const LOGS: Collection = Collection {
    name: "logs",
    required: &["instanceId", "message", "timestamp"],
    unique: &[],
    stamps_created_at: false,
};

pub const ASSETS: Collection = Collection {
    name: "assets",
    required: &["projectId"],
    unique: &[],
    stamps_created_at: true,
};

pub const USERS: Collection = Collection {
    name: "users",
    required: &["username", "email"],
    unique: &[&["username"], &["email"]],
    stamps_created_at: false,
};

pub const PUBLIC_SSH_KEYS: Collection = Collection {
    name: "publicSshKeys",
    required: &["content"],
    unique: &[],
    stamps_created_at: false,
};
