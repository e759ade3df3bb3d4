use async_graphql::dynamic::Schema;
use serde_json::Value;
use tracing::info;

use super::compose::{compose, ResolverMap, ScalarBinding, SchemaLimits};
use super::resolver::container::ContainerStateResolverFactory;
use super::resolver::date::{date_resolver, is_date_time, timestamp_resolver};
use super::resolver::factory::{derive_filter, derive_id, ResolverFactory};
use super::resolver::polymorphic::{type_resolver, AfterBuildTaskKind, BeforeBuildTaskKind};
use super::resolver::yaml::yaml_resolver;
use super::resolver::attribute;
use crate::error::SchemaAssemblyError;
use crate::state::AppState;
use crate::store::{Document, Filter};

pub type ApiSchema = Schema;

pub const TYPE_DEFS: &str = include_str!("schema.graphql");

/// Object fields that are derived rather than stored on the document.
const COMPUTED_FIELDS: &[(&str, &[&str])] = &[
    ("Project", &["definitions", "assets"]),
    ("Definition", &["project", "instances", "configAsYaml"]),
    ("Instance", &["definition", "createdAt", "logs"]),
    ("InstanceService", &["containerState"]),
    ("InstanceLog", &["createdAt"]),
    ("Asset", &["project", "createdAt"]),
];

/// Id of a parent document as a filter value.
fn id_of(document: &Document) -> Value {
    document.get("id").cloned().unwrap_or(Value::Null)
}

/// Bind every resolver factory onto the type definitions.
pub fn build_schema(state: &AppState) -> Result<ApiSchema, SchemaAssemblyError> {
    let repos = &state.repositories;

    let public_ssh_keys = ResolverFactory::new(repos.public_ssh_keys.clone());
    let users = ResolverFactory::new(repos.users.clone());
    let projects = ResolverFactory::new(repos.projects.clone());
    let definitions = ResolverFactory::new(repos.definitions.clone());
    let instances = ResolverFactory::new(repos.instances.clone());
    let assets = ResolverFactory::new(repos.assets.clone());
    let logs = ResolverFactory::new(repos.logs.clone());
    let containers = ContainerStateResolverFactory::new(state.docker.clone());

    let map = COMPUTED_FIELDS
        .iter()
        .fold(ResolverMap::new(), |map, (type_name, fields)| map.computed(type_name, fields))
        .scalar("JSON", ScalarBinding::passthrough())
        .scalar("DateTime", ScalarBinding::validated(is_date_time))
        .object(
            "Query",
            [
                ("publicSshKey", public_ssh_keys.single_resolver()),
                ("users", users.list_resolver(None)),
                ("projects", projects.list_resolver(None)),
                ("project", projects.item_resolver(None)),
                ("definitions", definitions.list_resolver(None)),
                ("definition", definitions.item_resolver(None)),
                ("instances", instances.list_resolver(None)),
                ("instance", instances.item_resolver(None)),
                ("asset", assets.item_resolver(None)),
            ],
        )
        .object(
            "Mutation",
            [
                ("createProject", projects.create_item_resolver()),
                ("createDefinition", definitions.create_item_resolver()),
                ("createInstance", instances.create_item_resolver()),
                ("removeInstance", instances.remove_item_resolver()),
                ("createAsset", assets.create_item_resolver()),
            ],
        )
        .object(
            "Project",
            [
                (
                    "definitions",
                    definitions.list_resolver(Some(derive_filter(|project, _| {
                        Filter::new().eq("projectId", id_of(project))
                    }))),
                ),
                (
                    "assets",
                    assets.list_resolver(Some(derive_filter(|project, _| {
                        Filter::new().eq("projectId", id_of(project)).non_empty("filename")
                    }))),
                ),
            ],
        )
        .object(
            "Definition",
            [
                (
                    "project",
                    projects.item_resolver(Some(derive_id(|definition| attribute(definition, "projectId")))),
                ),
                (
                    "instances",
                    instances.list_resolver(Some(derive_filter(|definition, _| {
                        Filter::new().eq("definitionId", id_of(definition))
                    }))),
                ),
                ("configAsYaml", yaml_resolver(|definition| definition.get("config").cloned())),
            ],
        )
        .object(
            "Instance",
            [
                (
                    "definition",
                    definitions.item_resolver(Some(derive_id(|instance| attribute(instance, "definitionId")))),
                ),
                ("createdAt", date_resolver(|instance| instance.get("createdAt").cloned())),
                (
                    "logs",
                    logs.list_resolver(Some(derive_filter(|instance, _| {
                        Filter::new().eq("instanceId", id_of(instance))
                    }))),
                ),
            ],
        )
        .object(
            "InstanceService",
            [(
                "containerState",
                containers.container_state_resolver(|service| attribute(service, "containerNamePrefix")),
            )],
        )
        .object(
            "InstanceLog",
            [("createdAt", timestamp_resolver(|log| log.get("timestamp").cloned()))],
        )
        .object(
            "Asset",
            [
                ("project", projects.item_resolver(Some(derive_id(|asset| attribute(asset, "projectId"))))),
                ("createdAt", date_resolver(|asset| asset.get("createdAt").cloned())),
            ],
        )
        .type_resolver("BeforeBuildTask", type_resolver::<BeforeBuildTaskKind>())
        .type_resolver("AfterBuildTask", type_resolver::<AfterBuildTaskKind>());

    let limits = SchemaLimits {
        max_depth: state.config.graphql.max_depth,
        max_complexity: state.config.graphql.max_complexity,
    };
    let schema = compose(TYPE_DEFS, map, limits)?;

    info!("GraphQL schema assembled");
    Ok(schema)
}
