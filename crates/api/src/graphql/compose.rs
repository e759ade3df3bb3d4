//! Schema composition: type definitions + resolver map → executable schema.
//!
//! The resolver map is checked against the type definitions before anything
//! is built, so a mismatch stops startup instead of surfacing per query.
//! Object fields without a binding resolve to the same-named attribute of
//! the parent document.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, TypeRef, Union,
};
use async_graphql::parser::parse_schema;
use async_graphql::parser::types::{
    BaseType, InputValueDefinition, Type, TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql::Name;
use serde_json::Value;

use super::resolver::{Args, Resolver, TypeResolver};
use crate::error::{ApiError, ApiResult, SchemaAssemblyError};

const TYPE_RESOLVER_FIELD: &str = "__resolveType";
const SCALAR_FIELD: &str = "__scalar";

static NULL_PARENT: Value = Value::Null;

/// How a custom scalar is handled. Values pass through unchanged; an
/// optional validator rejects malformed input literals and variables.
#[derive(Clone, Default)]
pub struct ScalarBinding {
    validator: Option<fn(&async_graphql::Value) -> bool>,
}

impl ScalarBinding {
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn validated(validator: fn(&async_graphql::Value) -> bool) -> Self {
        Self { validator: Some(validator) }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaLimits {
    pub max_depth: usize,
    pub max_complexity: usize,
}

/// Bindings by type name and field name.
#[derive(Default, Clone)]
pub struct ResolverMap {
    scalars: BTreeMap<String, ScalarBinding>,
    fields: BTreeMap<(String, String), Resolver>,
    type_resolvers: BTreeMap<String, TypeResolver>,
    computed: BTreeSet<(String, String)>,
    duplicates: Vec<(String, String)>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: &str, binding: ScalarBinding) -> Self {
        if self.scalars.insert(name.to_string(), binding).is_some() {
            self.duplicates.push((name.to_string(), SCALAR_FIELD.to_string()));
        }
        self
    }

    pub fn field(mut self, type_name: &str, field_name: &str, resolver: Resolver) -> Self {
        let key = (type_name.to_string(), field_name.to_string());
        if self.fields.contains_key(&key) {
            self.duplicates.push(key);
        } else {
            self.fields.insert(key, resolver);
        }
        self
    }

    /// Bind several fields of one type.
    pub fn object<I>(self, type_name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Resolver)>,
    {
        fields
            .into_iter()
            .fold(self, |map, (field_name, resolver)| map.field(type_name, field_name, resolver))
    }

    /// Declare object fields that have no stored attribute behind them.
    /// Assembly fails unless each one exists and is bound.
    pub fn computed(mut self, type_name: &str, field_names: &[&str]) -> Self {
        for field_name in field_names {
            self.computed.insert((type_name.to_string(), field_name.to_string()));
        }
        self
    }

    pub fn type_resolver(mut self, type_name: &str, resolver: TypeResolver) -> Self {
        if self.type_resolvers.insert(type_name.to_string(), resolver).is_some() {
            self.duplicates.push((type_name.to_string(), TYPE_RESOLVER_FIELD.to_string()));
        }
        self
    }
}

/// Build an executable schema from type definitions and a resolver map.
pub fn compose(
    type_defs: &str,
    map: ResolverMap,
    limits: SchemaLimits,
) -> Result<Schema, SchemaAssemblyError> {
    let definitions = Definitions::parse(type_defs)?;
    definitions.check(&map)?;

    let mut builder = Schema::build(
        &definitions.query,
        definitions.mutation.as_deref(),
        None,
    );

    for (name, definition) in &definitions.types {
        let description = definition.description.as_ref().map(|d| d.node.clone());
        builder = match &definition.kind {
            TypeKind::Scalar => {
                let mut scalar = Scalar::new(name.as_str());
                if let Some(validator) = map.scalars.get(name).and_then(|b| b.validator) {
                    scalar = scalar.validator(validator);
                }
                if let Some(description) = description {
                    scalar = scalar.description(description);
                }
                builder.register(scalar)
            }
            TypeKind::Object(object_type) => {
                let mut object = Object::new(name.as_str());
                for interface in &object_type.implements {
                    object = object.implement(interface.node.as_str());
                }
                for field in &object_type.fields {
                    let field = &field.node;
                    let field_name = field.name.node.to_string();
                    let plan = Arc::new(FieldPlan {
                        nullable: field.ty.node.nullable,
                        binding: map.fields.get(&(name.clone(), field_name.clone())).cloned(),
                        shape: definitions.shape_of(&field.ty.node, &map),
                        field_name: field_name.clone(),
                    });

                    let mut output = Field::new(field_name, type_ref(&field.ty.node), move |ctx| {
                        let plan = plan.clone();
                        FieldFuture::new(async move { plan.resolve(ctx).await })
                    });
                    for argument in &field.arguments {
                        output = output.argument(input_value(&argument.node));
                    }
                    if let Some(description) = &field.description {
                        output = output.description(description.node.clone());
                    }
                    object = object.field(output);
                }
                if let Some(description) = description {
                    object = object.description(description);
                }
                builder.register(object)
            }
            TypeKind::Interface(interface_type) => {
                let mut interface = Interface::new(name.as_str());
                for field in &interface_type.fields {
                    let field = &field.node;
                    let mut output = InterfaceField::new(field.name.node.as_str(), type_ref(&field.ty.node));
                    for argument in &field.arguments {
                        output = output.argument(input_value(&argument.node));
                    }
                    if let Some(description) = &field.description {
                        output = output.description(description.node.clone());
                    }
                    interface = interface.field(output);
                }
                if let Some(description) = description {
                    interface = interface.description(description);
                }
                builder.register(interface)
            }
            TypeKind::Union(union_type) => {
                let mut union = Union::new(name.as_str());
                for member in &union_type.members {
                    union = union.possible_type(member.node.as_str());
                }
                if let Some(description) = description {
                    union = union.description(description);
                }
                builder.register(union)
            }
            TypeKind::Enum(enum_type) => {
                let mut enumeration = Enum::new(name.as_str());
                for value in &enum_type.values {
                    let mut item = EnumItem::new(value.node.value.node.as_str());
                    if let Some(description) = &value.node.description {
                        item = item.description(description.node.clone());
                    }
                    enumeration = enumeration.item(item);
                }
                if let Some(description) = description {
                    enumeration = enumeration.description(description);
                }
                builder.register(enumeration)
            }
            TypeKind::InputObject(input_type) => {
                let mut input = InputObject::new(name.as_str());
                for field in &input_type.fields {
                    input = input.field(input_value(&field.node));
                }
                if let Some(description) = description {
                    input = input.description(description);
                }
                builder.register(input)
            }
        };
    }

    builder
        .limit_depth(limits.max_depth)
        .limit_complexity(limits.max_complexity)
        .finish()
        .map_err(|e| SchemaAssemblyError::Build(e.to_string()))
}

/// Parsed type definitions, indexed by name.
struct Definitions {
    types: BTreeMap<String, TypeDefinition>,
    query: String,
    mutation: Option<String>,
}

impl Definitions {
    fn parse(type_defs: &str) -> Result<Self, SchemaAssemblyError> {
        let document = parse_schema(type_defs).map_err(|e| SchemaAssemblyError::Parse(e.to_string()))?;

        let mut types = BTreeMap::new();
        let mut roots = None;
        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = schema.node;
                    if schema.extend {
                        return Err(SchemaAssemblyError::Unsupported("extend schema".to_string()));
                    }
                    if schema.subscription.is_some() {
                        return Err(SchemaAssemblyError::Unsupported("subscription root".to_string()));
                    }
                    roots = Some((
                        schema.query.map(|n| n.node.to_string()),
                        schema.mutation.map(|n| n.node.to_string()),
                    ));
                }
                TypeSystemDefinition::Type(definition) => {
                    let definition = definition.node;
                    let name = definition.name.node.to_string();
                    if definition.extend {
                        return Err(SchemaAssemblyError::Unsupported(format!("extend type {}", name)));
                    }
                    if let TypeKind::Interface(interface) = &definition.kind {
                        if !interface.implements.is_empty() {
                            return Err(SchemaAssemblyError::Unsupported(format!(
                                "interface {} implementing other interfaces",
                                name
                            )));
                        }
                    }
                    if types.insert(name.clone(), definition).is_some() {
                        return Err(SchemaAssemblyError::Parse(format!("type {} is defined twice", name)));
                    }
                }
                TypeSystemDefinition::Directive(directive) => {
                    return Err(SchemaAssemblyError::Unsupported(format!(
                        "directive @{}",
                        directive.node.name.node
                    )));
                }
            }
        }

        let (query, mutation) = match roots {
            Some((query, mutation)) => (query.unwrap_or_else(|| "Query".to_string()), mutation),
            None => {
                let mutation = types.contains_key("Mutation").then(|| "Mutation".to_string());
                ("Query".to_string(), mutation)
            }
        };

        let definitions = Self { types, query, mutation };
        for root in std::iter::once(&definitions.query).chain(definitions.mutation.as_ref()) {
            match definitions.types.get(root).map(|t| &t.kind) {
                Some(TypeKind::Object(_)) => {}
                Some(_) => {
                    return Err(SchemaAssemblyError::WrongKind {
                        type_name: root.clone(),
                        expected: "an object type",
                    })
                }
                None => return Err(SchemaAssemblyError::UnknownType(root.clone())),
            }
        }
        Ok(definitions)
    }

    /// Reject any mismatch between the resolver map and the definitions.
    fn check(&self, map: &ResolverMap) -> Result<(), SchemaAssemblyError> {
        if let Some((type_name, field_name)) = map.duplicates.first() {
            return Err(SchemaAssemblyError::DuplicateBinding {
                type_name: type_name.clone(),
                field_name: field_name.clone(),
            });
        }

        for (type_name, field_name) in map.fields.keys() {
            let definition = self
                .types
                .get(type_name)
                .ok_or_else(|| SchemaAssemblyError::UnknownType(type_name.clone()))?;
            let TypeKind::Object(object) = &definition.kind else {
                return Err(SchemaAssemblyError::WrongKind {
                    type_name: type_name.clone(),
                    expected: "an object type",
                });
            };
            if !object.fields.iter().any(|f| f.node.name.node.as_str() == field_name) {
                return Err(SchemaAssemblyError::UnknownField {
                    type_name: type_name.clone(),
                    field_name: field_name.clone(),
                });
            }
        }

        for type_name in map.type_resolvers.keys() {
            match self.types.get(type_name).map(|t| &t.kind) {
                Some(TypeKind::Union(_) | TypeKind::Interface(_)) => {}
                Some(_) => {
                    return Err(SchemaAssemblyError::WrongKind {
                        type_name: type_name.clone(),
                        expected: "a union or interface",
                    })
                }
                None => return Err(SchemaAssemblyError::UnknownType(type_name.clone())),
            }
        }

        for name in map.scalars.keys() {
            match self.types.get(name).map(|t| &t.kind) {
                Some(TypeKind::Scalar) => {}
                Some(_) => {
                    return Err(SchemaAssemblyError::WrongKind {
                        type_name: name.clone(),
                        expected: "a scalar",
                    })
                }
                None => return Err(SchemaAssemblyError::UnknownType(name.clone())),
            }
        }

        for (type_name, field_name) in &map.computed {
            let declared = match self.types.get(type_name).map(|t| &t.kind) {
                Some(TypeKind::Object(object)) => {
                    object.fields.iter().any(|f| f.node.name.node.as_str() == field_name)
                }
                Some(_) => {
                    return Err(SchemaAssemblyError::WrongKind {
                        type_name: type_name.clone(),
                        expected: "an object type",
                    })
                }
                None => return Err(SchemaAssemblyError::UnknownType(type_name.clone())),
            };
            if !declared {
                return Err(SchemaAssemblyError::UnknownField {
                    type_name: type_name.clone(),
                    field_name: field_name.clone(),
                });
            }
            if !map.fields.contains_key(&(type_name.clone(), field_name.clone())) {
                return Err(SchemaAssemblyError::MissingResolver {
                    type_name: type_name.clone(),
                    field_name: field_name.clone(),
                });
            }
        }

        // Root fields have no parent document to fall back on.
        for root in std::iter::once(&self.query).chain(self.mutation.as_ref()) {
            if let Some(TypeKind::Object(object)) = self.types.get(root).map(|t| &t.kind) {
                for field in &object.fields {
                    let field_name = field.node.name.node.to_string();
                    if !map.fields.contains_key(&(root.clone(), field_name.clone())) {
                        return Err(SchemaAssemblyError::MissingResolver {
                            type_name: root.clone(),
                            field_name,
                        });
                    }
                }
            }
        }

        for (name, definition) in &self.types {
            match definition.kind {
                TypeKind::Union(_) | TypeKind::Interface(_) if !map.type_resolvers.contains_key(name) => {
                    return Err(SchemaAssemblyError::MissingTypeResolver(name.clone()));
                }
                TypeKind::Scalar if !map.scalars.contains_key(name) => {
                    return Err(SchemaAssemblyError::MissingScalar(name.clone()));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn shape_of(&self, ty: &Type, map: &ResolverMap) -> Shape {
        match &ty.base {
            BaseType::List(inner) => Shape::List(Box::new(self.shape_of(inner, map))),
            BaseType::Named(name) => match self.types.get(name.as_str()).map(|t| &t.kind) {
                Some(TypeKind::Object(_)) => Shape::Object,
                Some(TypeKind::Enum(_)) => Shape::Enum,
                Some(TypeKind::Union(_) | TypeKind::Interface(_)) => match map.type_resolvers.get(name.as_str()) {
                    Some(resolver) => Shape::Abstract(resolver.clone()),
                    None => Shape::Object,
                },
                _ => Shape::Leaf,
            },
        }
    }
}

/// How a resolved JSON value is handed back to the executor.
#[derive(Clone)]
enum Shape {
    /// Built-in or custom scalar.
    Leaf,
    Enum,
    /// Object type; the value becomes the parent of its fields.
    Object,
    /// Union or interface; the concrete type is picked by the type resolver.
    Abstract(TypeResolver),
    List(Box<Shape>),
}

impl Shape {
    fn to_field_value<'a>(&self, value: Value) -> ApiResult<Option<FieldValue<'a>>> {
        if value.is_null() {
            return Ok(None);
        }
        let field_value = match self {
            Shape::Leaf => {
                let value = async_graphql::Value::from_json(value)
                    .map_err(|e| ApiError::InvalidValue(e.to_string()))?;
                FieldValue::value(value)
            }
            Shape::Enum => match value {
                Value::String(name) => FieldValue::value(async_graphql::Value::Enum(Name::new(name))),
                other => return Err(ApiError::InvalidValue(format!("expected an enum value, got {}", other))),
            },
            Shape::Object => FieldValue::owned_any(value),
            Shape::Abstract(resolver) => {
                let concrete = resolver.resolve(&value)?;
                FieldValue::owned_any(value).with_type(concrete)
            }
            Shape::List(inner) => {
                let Value::Array(items) = value else {
                    return Err(ApiError::InvalidValue(format!("expected a list, got {}", value)));
                };
                let items = items
                    .into_iter()
                    .map(|item| Ok(inner.to_field_value(item)?.unwrap_or(FieldValue::NULL)))
                    .collect::<ApiResult<Vec<_>>>()?;
                FieldValue::list(items)
            }
        };
        Ok(Some(field_value))
    }
}

struct FieldPlan {
    field_name: String,
    nullable: bool,
    binding: Option<Resolver>,
    shape: Shape,
}

impl FieldPlan {
    async fn resolve<'a>(&self, ctx: ResolverContext<'a>) -> async_graphql::Result<Option<FieldValue<'a>>> {
        match self.field_value(&ctx).await {
            Ok(value) => Ok(value),
            // A failed nullable field stays in the response as null, with the error beside it.
            Err(err) if self.nullable => {
                ctx.add_error(err.into_server_error(ctx.item.pos));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn field_value<'a>(
        &self,
        ctx: &ResolverContext<'a>,
    ) -> async_graphql::Result<Option<FieldValue<'a>>> {
        let parent = ctx
            .parent_value
            .try_downcast_ref::<Value>()
            .unwrap_or(&NULL_PARENT);

        let value = match &self.binding {
            Some(resolver) => {
                let args = arguments(ctx)?;
                resolver.resolve(parent, &args).await.map_err(ApiError::extend)?
            }
            None => parent.get(&self.field_name).cloned().unwrap_or(Value::Null),
        };

        self.shape.to_field_value(value).map_err(ApiError::extend)
    }
}

fn arguments(ctx: &ResolverContext<'_>) -> async_graphql::Result<Args> {
    let mut args = Args::new();
    for (name, value) in ctx.args.iter() {
        let value = value
            .as_value()
            .clone()
            .into_json()
            .map_err(|e| ApiError::InvalidValue(e.to_string()).extend())?;
        args.insert(name.to_string(), value);
    }
    Ok(args)
}

fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.as_str()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn input_value(definition: &InputValueDefinition) -> InputValue {
    let mut input = InputValue::new(definition.name.node.as_str(), type_ref(&definition.ty.node));
    if let Some(default) = &definition.default_value {
        input = input.default_value(default.node.clone());
    }
    if let Some(description) = &definition.description {
        input = input.description(description.node.clone());
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::resolver::polymorphic::{type_resolver, BeforeBuildTaskKind};
    use serde_json::json;

    const LIMITS: SchemaLimits = SchemaLimits { max_depth: 16, max_complexity: 1000 };

    const TYPE_DEFS: &str = r#"
        scalar JSON

        enum Color { RED GREEN }

        interface BeforeBuildTask { type: String! }
        type CopyBeforeBuildTask implements BeforeBuildTask { type: String! sourcePath: String }
        type InterpolateBeforeBuildTask implements BeforeBuildTask { type: String! targetPaths: [String!] }

        type Widget {
            id: ID!
            name: String
            color: Color
            meta: JSON
            tasks: [BeforeBuildTask!]!
            shout: String
            serial: String
        }

        input WidgetInput { name: String! }

        type Query {
            widget(id: ID!): Widget
        }

        type Mutation {
            echo(input: WidgetInput!, times: Int = 2): [String!]!
        }
    "#;

    fn widget() -> Value {
        json!({
            "id": "w1",
            "name": "gear",
            "color": "RED",
            "meta": {"weight": 3, "tags": ["a"]},
            "tasks": [
                {"type": "copy", "sourcePath": "/src"},
                {"type": "interpolate", "targetPaths": ["a.env"]}
            ]
        })
    }

    fn map() -> ResolverMap {
        ResolverMap::new()
            .scalar("JSON", ScalarBinding::passthrough())
            .type_resolver("BeforeBuildTask", type_resolver::<BeforeBuildTaskKind>())
            .field(
                "Query",
                "widget",
                Resolver::new(|_, args| {
                    let found = args.get("id") == Some(&json!("w1"));
                    async move { Ok(if found { widget() } else { Value::Null }) }
                }),
            )
            .field(
                "Mutation",
                "echo",
                Resolver::new(|_, args| {
                    let name = args["input"]["name"].as_str().unwrap_or_default().to_string();
                    let times = args["times"].as_u64().unwrap_or(0) as usize;
                    async move { Ok(json!(vec![name; times])) }
                }),
            )
            .object(
                "Widget",
                [
                    (
                        "shout",
                        Resolver::new(|widget, _| {
                            let name = widget["name"].as_str().map(str::to_uppercase);
                            async move { Ok(json!(name)) }
                        }),
                    ),
                    (
                        "serial",
                        Resolver::new(|_, _| async {
                            Err(ApiError::UpstreamUnavailable("registry offline".into()))
                        }),
                    ),
                ],
            )
    }

    async fn run(schema: &Schema, query: &str) -> async_graphql::Response {
        schema.execute(query).await
    }

    #[tokio::test]
    async fn test_default_and_bound_fields() {
        let schema = compose(TYPE_DEFS, map(), LIMITS).unwrap();
        let response = run(
            &schema,
            r#"{ widget(id: "w1") { id name color meta shout
                 tasks { __typename type ... on CopyBeforeBuildTask { sourcePath } ... on InterpolateBeforeBuildTask { targetPaths } } } }"#,
        )
        .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "widget": {
                    "id": "w1",
                    "name": "gear",
                    "color": "RED",
                    "meta": {"weight": 3, "tags": ["a"]},
                    "shout": "GEAR",
                    "tasks": [
                        {"__typename": "CopyBeforeBuildTask", "type": "copy", "sourcePath": "/src"},
                        {"__typename": "InterpolateBeforeBuildTask", "type": "interpolate", "targetPaths": ["a.env"]}
                    ]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_failed_nullable_field_is_null() {
        let schema = compose(TYPE_DEFS, map(), LIMITS).unwrap();
        let response = run(&schema, r#"{ widget(id: "w1") { id serial shout } }"#).await;

        assert_eq!(response.errors.len(), 1);
        let ext = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(ext["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({"widget": {"id": "w1", "serial": null, "shout": "GEAR"}})
        );
    }

    #[tokio::test]
    async fn test_missing_item_is_null() {
        let schema = compose(TYPE_DEFS, map(), LIMITS).unwrap();
        let response = run(&schema, r#"{ widget(id: "nope") { id } }"#).await;
        assert!(response.errors.is_empty());
        assert_eq!(response.data.into_json().unwrap(), json!({"widget": null}));
    }

    #[tokio::test]
    async fn test_arguments_and_defaults() {
        let schema = compose(TYPE_DEFS, map(), LIMITS).unwrap();
        let response = run(&schema, r#"mutation { echo(input: {name: "hi"}) }"#).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(response.data.into_json().unwrap(), json!({"echo": ["hi", "hi"]}));
    }

    #[test]
    fn test_unknown_field_fails_assembly() {
        let map = map().field("Widget", "weight", Resolver::new(|_, _| async { Ok(Value::Null) }));
        let err = compose(TYPE_DEFS, map, LIMITS).err().unwrap();
        assert_eq!(
            err,
            SchemaAssemblyError::UnknownField { type_name: "Widget".into(), field_name: "weight".into() }
        );
    }

    #[test]
    fn test_unbound_computed_field_fails_assembly() {
        let err = compose(TYPE_DEFS, map().computed("Widget", &["shout", "serial", "tasks"]), LIMITS)
            .err()
            .unwrap();
        assert_eq!(
            err,
            SchemaAssemblyError::MissingResolver { type_name: "Widget".into(), field_name: "tasks".into() }
        );

        let err = compose(TYPE_DEFS, map().computed("Widget", &["weight"]), LIMITS).err().unwrap();
        assert_eq!(
            err,
            SchemaAssemblyError::UnknownField { type_name: "Widget".into(), field_name: "weight".into() }
        );

        assert!(compose(TYPE_DEFS, map().computed("Widget", &["shout", "serial"]), LIMITS).is_ok());
    }

    #[test]
    fn test_unknown_type_fails_assembly() {
        let map = map().field("Gadget", "id", Resolver::new(|_, _| async { Ok(Value::Null) }));
        let err = compose(TYPE_DEFS, map, LIMITS).err().unwrap();
        assert_eq!(err, SchemaAssemblyError::UnknownType("Gadget".into()));
    }

    #[test]
    fn test_duplicate_binding_fails_assembly() {
        let map = map().field("Widget", "shout", Resolver::new(|_, _| async { Ok(Value::Null) }));
        let err = compose(TYPE_DEFS, map, LIMITS).err().unwrap();
        assert_eq!(
            err,
            SchemaAssemblyError::DuplicateBinding { type_name: "Widget".into(), field_name: "shout".into() }
        );
    }

    #[test]
    fn test_missing_root_resolver_fails_assembly() {
        let map = ResolverMap::new()
            .scalar("JSON", ScalarBinding::passthrough())
            .type_resolver("BeforeBuildTask", type_resolver::<BeforeBuildTaskKind>())
            .field("Query", "widget", Resolver::new(|_, _| async { Ok(Value::Null) }));
        let err = compose(TYPE_DEFS, map, LIMITS).err().unwrap();
        assert_eq!(
            err,
            SchemaAssemblyError::MissingResolver { type_name: "Mutation".into(), field_name: "echo".into() }
        );
    }

    #[test]
    fn test_missing_type_resolver_and_scalar() {
        let base = || {
            ResolverMap::new()
                .field("Query", "widget", Resolver::new(|_, _| async { Ok(Value::Null) }))
                .field("Mutation", "echo", Resolver::new(|_, _| async { Ok(json!([])) }))
        };

        let err = compose(TYPE_DEFS, base().scalar("JSON", ScalarBinding::passthrough()), LIMITS)
            .err()
            .unwrap();
        assert_eq!(err, SchemaAssemblyError::MissingTypeResolver("BeforeBuildTask".into()));

        let err = compose(
            TYPE_DEFS,
            base().type_resolver("BeforeBuildTask", type_resolver::<BeforeBuildTaskKind>()),
            LIMITS,
        )
        .err()
        .unwrap();
        assert_eq!(err, SchemaAssemblyError::MissingScalar("JSON".into()));
    }

    #[test]
    fn test_wrong_kinds_fail_assembly() {
        let err = compose(
            TYPE_DEFS,
            map().type_resolver("Widget", type_resolver::<BeforeBuildTaskKind>()),
            LIMITS,
        )
        .err()
        .unwrap();
        assert!(matches!(err, SchemaAssemblyError::WrongKind { ref type_name, .. } if type_name == "Widget"));

        let err = compose(TYPE_DEFS, map().scalar("Color", ScalarBinding::passthrough()), LIMITS)
            .err()
            .unwrap();
        assert!(matches!(err, SchemaAssemblyError::WrongKind { ref type_name, .. } if type_name == "Color"));
    }

    #[test]
    fn test_unsupported_definitions() {
        let err = compose("type Query { a: String } extend type Query { b: String }", ResolverMap::new(), LIMITS)
            .err()
            .unwrap();
        assert!(matches!(err, SchemaAssemblyError::Unsupported(_)));

        let err = compose("type Query { a: String", ResolverMap::new(), LIMITS).err().unwrap();
        assert!(matches!(err, SchemaAssemblyError::Parse(_)));

        let err = compose("type Mutation { a: String }", ResolverMap::new(), LIMITS).err().unwrap();
        assert_eq!(err, SchemaAssemblyError::UnknownType("Query".into()));
    }

    #[test]
    fn test_schema_definition_names_roots() {
        let map = ResolverMap::new().field("Root", "ping", Resolver::new(|_, _| async { Ok(json!("pong")) }));
        assert!(compose("schema { query: Root } type Root { ping: String }", map, LIMITS).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_variant_errors_the_field() {
        let map = ResolverMap::new()
            .scalar("JSON", ScalarBinding::passthrough())
            .type_resolver("BeforeBuildTask", type_resolver::<BeforeBuildTaskKind>())
            .field(
                "Query",
                "widget",
                Resolver::new(|_, _| async {
                    Ok(json!({"id": "w1", "tasks": [{"type": "rsync"}]}))
                }),
            )
            .field("Mutation", "echo", Resolver::new(|_, _| async { Ok(json!([])) }));
        let schema = compose(TYPE_DEFS, map, LIMITS).unwrap();

        let response = run(&schema, "{ widget(id: \"w1\") { id tasks { type } } }").await;
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("rsync"));
        let ext = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(ext["code"], "UNKNOWN_VARIANT");
    }
}
