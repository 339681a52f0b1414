//! Rust source generation for an authorization schema.
//!
//! For every type definition the generator emits:
//! - an entity struct with one `String` field per direct relation, plus a
//!   `perform` field when the type has computed relations
//! - a `<Type>Relation` selector enum whose variants carry static
//!   [`Member`](fluentfga_schema::Member) chains
//! - `Entity`, `Resource` and `Accessor` capability impls
//!
//! Conditions become `conditions::<name>::{build, check_context}` functions.
//! All paths in the output are fully qualified so the artifact can be
//! `include!`d anywhere.

use std::collections::HashSet;

use fluentfga_schema::{
    to_pascal_case, to_snake_case, AuthorizationModel, Condition, Parameter, ParameterKind,
    SchemaError, SchemaResult, TypeDefinition,
};
use tracing::{debug, info};

use crate::ident::{chain_const, type_ident, value_ident};
use crate::policy::AccessorPolicy;
use crate::writer::SourceWriter;

/// Name of the field and selector variant grouping computed relations.
pub const PERFORM: &str = "perform";

const STRING: &str = "::std::string::String";
const MEMBER: &str = "::fluentfga::Member";

/// Generates the Rust source for `model`.
///
/// The output is deterministic: the same model and policy always produce the
/// same text, with types, relations and parameters in schema order.
pub fn generate(model: &AuthorizationModel, policy: &AccessorPolicy) -> SchemaResult<String> {
    let mut types = Vec::with_capacity(model.type_definitions.len());
    let mut items = HashSet::new();
    for def in &model.type_definitions {
        let plan = TypePlan::new(def, policy)?;
        for item in plan.item_names() {
            if !items.insert(item.clone()) {
                return Err(malformed(format!(
                    "generated item '{item}' would be declared by more than one schema type"
                )));
            }
        }
        types.push(plan);
    }

    let mut modules = HashSet::new();
    let mut conditions = Vec::with_capacity(model.conditions.len());
    for condition in &model.conditions {
        let plan = ConditionPlan::new(condition)?;
        if !modules.insert(plan.module.clone()) {
            return Err(malformed(format!(
                "condition '{}' maps to module '{}' which is already taken",
                plan.name, plan.module
            )));
        }
        conditions.push(plan);
    }

    let mut w = SourceWriter::new();
    w.line("// @generated by fluentfga-codegen. Do not edit by hand.");
    w.line(format!("// Schema version: {}", model.schema_version));

    for plan in &types {
        debug!(
            type_name = %plan.schema_name,
            accessor = plan.accessor,
            "Emitting entity type"
        );
        w.blank();
        plan.emit(&mut w);
    }

    if !conditions.is_empty() {
        w.blank();
        emit_conditions(&mut w, &conditions);
    }

    info!(
        types = types.len(),
        conditions = conditions.len(),
        "Generated entity types"
    );

    Ok(w.finish())
}

fn malformed(message: String) -> SchemaError {
    SchemaError::Malformed { message }
}

fn ensure_unique<'a>(
    names: impl IntoIterator<Item = &'a str>,
    what: &str,
    type_name: &str,
) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(malformed(format!(
                "{what} '{name}' would be generated twice for type '{type_name}'"
            )));
        }
    }
    Ok(())
}

struct RelationPlan {
    /// Canonical relation name sent to the engine.
    name: String,
    field: String,
    variant: String,
}

impl RelationPlan {
    fn new(type_name: &str, name: &str) -> SchemaResult<Self> {
        match (value_ident(name), type_ident(&to_pascal_case(name))) {
            (Some(field), Some(variant)) => Ok(Self {
                name: name.to_string(),
                field,
                variant,
            }),
            _ => Err(malformed(format!(
                "relation '{name}' on type '{type_name}' is not a valid identifier"
            ))),
        }
    }
}

enum Perform {
    Absent,
    Scalar(RelationPlan),
    Group(Vec<RelationPlan>),
}

enum Shape {
    /// A type without relations: an accessor marker only.
    Marker,
    Relations {
        direct: Vec<RelationPlan>,
        perform: Perform,
    },
}

struct TypePlan {
    schema_name: String,
    entity_name: String,
    ident: String,
    accessor: bool,
    shape: Shape,
}

impl TypePlan {
    fn new(def: &TypeDefinition, policy: &AccessorPolicy) -> SchemaResult<Self> {
        let entity_name = to_pascal_case(&def.name);
        let ident = match type_ident(&entity_name) {
            Some(ident) if to_snake_case(&entity_name) == def.name => ident,
            _ => {
                return Err(SchemaError::NonCanonicalTypeName {
                    type_name: def.name.clone(),
                })
            }
        };
        let accessor = policy.is_accessor(def);

        if !def.has_relations() {
            return Ok(Self {
                schema_name: def.name.clone(),
                entity_name,
                ident,
                accessor,
                shape: Shape::Marker,
            });
        }

        let direct = def
            .direct_relations()
            .map(|r| RelationPlan::new(&def.name, &r.name))
            .collect::<SchemaResult<Vec<_>>>()?;
        let mut computed = def
            .computed_relations()
            .map(|r| RelationPlan::new(&def.name, &r.name))
            .collect::<SchemaResult<Vec<_>>>()?;

        let perform = match computed.len() {
            0 => Perform::Absent,
            1 => Perform::Scalar(computed.remove(0)),
            _ => Perform::Group(computed),
        };

        let has_group = !matches!(perform, Perform::Absent);
        if has_group && direct.iter().any(|r| r.name == PERFORM) {
            return Err(SchemaError::ReservedRelation {
                type_name: def.name.clone(),
            });
        }

        let perform_variant = has_group.then_some("Perform");
        let perform_field = has_group.then_some(PERFORM);
        ensure_unique(
            direct.iter().map(|r| r.variant.as_str()).chain(perform_variant),
            "selector variant",
            &def.name,
        )?;
        ensure_unique(
            direct.iter().map(|r| r.field.as_str()).chain(perform_field),
            "field",
            &def.name,
        )?;
        if let Perform::Group(group) = &perform {
            ensure_unique(
                group.iter().map(|r| r.variant.as_str()),
                "perform variant",
                &def.name,
            )?;
            ensure_unique(
                group.iter().map(|r| r.field.as_str()),
                "perform field",
                &def.name,
            )?;
        }

        Ok(Self {
            schema_name: def.name.clone(),
            entity_name,
            ident,
            accessor,
            shape: Shape::Relations { direct, perform },
        })
    }

    /// Type names this plan declares in the generated module.
    fn item_names(&self) -> Vec<String> {
        let mut names = vec![self.ident.clone()];
        if let Shape::Relations { perform, .. } = &self.shape {
            names.push(format!("{}Relation", self.ident));
            if let Perform::Group(_) = perform {
                names.push(format!("{}Perform", self.ident));
                names.push(format!("{}PerformRelation", self.ident));
            }
        }
        names
    }

    fn emit(&self, w: &mut SourceWriter) {
        match &self.shape {
            Shape::Marker => {
                w.line(format!("/// Schema type `{}`.", self.schema_name));
                w.line("#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]");
                w.line(format!("pub struct {};", self.ident));
            }
            Shape::Relations { direct, perform } => {
                self.emit_structs(w, direct, perform);
                w.blank();
                self.emit_selectors(w, direct, perform);
            }
        }
        w.blank();
        self.emit_capabilities(w);
    }

    fn emit_structs(&self, w: &mut SourceWriter, direct: &[RelationPlan], perform: &Perform) {
        let ident = &self.ident;

        w.line(format!("/// Schema type `{}`.", self.schema_name));
        w.line("#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]");
        w.open(format!("pub struct {ident}"));
        for r in direct {
            w.line(format!("pub {}: {STRING},", r.field));
        }
        match perform {
            Perform::Absent => {}
            Perform::Scalar(_) => w.line(format!("pub {PERFORM}: {STRING},")),
            Perform::Group(_) => w.line(format!("pub {PERFORM}: {ident}Perform,")),
        }
        w.close();

        if let Perform::Group(group) = perform {
            w.blank();
            w.line(format!("/// Computed relations of [`{ident}`]."));
            w.line("#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]");
            w.open(format!("pub struct {ident}Perform"));
            for r in group {
                w.line(format!("pub {}: {STRING},", r.field));
            }
            w.close();
        }
    }

    fn emit_selectors(&self, w: &mut SourceWriter, direct: &[RelationPlan], perform: &Perform) {
        let ident = &self.ident;
        let selector = format!("{ident}Relation");
        let group_selector = format!("{ident}PerformRelation");

        w.line(format!("/// Relation selectors for [`{ident}`]."));
        w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
        w.open(format!("pub enum {selector}"));
        for r in direct {
            w.line(format!("{},", r.variant));
        }
        match perform {
            Perform::Absent => {}
            Perform::Scalar(_) => w.line("Perform,"),
            Perform::Group(_) => w.line(format!("Perform({group_selector}),")),
        }
        w.close();

        if let Perform::Group(group) = perform {
            w.blank();
            w.line(format!("/// Selectors for the computed relations of [`{ident}`]."));
            w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
            w.open(format!("pub enum {group_selector}"));
            for r in group {
                w.line(format!("{},", r.variant));
            }
            w.close();
        }

        // Chain tables
        let has_scalar = matches!(perform, Perform::Scalar(_));
        if !direct.is_empty() || has_scalar {
            w.blank();
            w.open(format!("impl {selector}"));
            for r in direct {
                w.line(format!(
                    "const {}: &'static [{MEMBER}] = &[{MEMBER}::Named({:?})];",
                    chain_const(&r.name),
                    r.name
                ));
            }
            if let Perform::Scalar(r) = perform {
                w.line(format!(
                    "const {}: &'static [{MEMBER}] = &[{MEMBER}::Named({PERFORM:?}), {MEMBER}::Positional {{ index: 0, names: &[{:?}] }}];",
                    chain_const(PERFORM),
                    r.name
                ));
            }
            w.close();
        }

        if let Perform::Group(group) = perform {
            let elements = group
                .iter()
                .map(|r| format!("{:?}", r.name))
                .collect::<Vec<_>>()
                .join(", ");
            w.blank();
            w.open(format!("impl {group_selector}"));
            w.line(format!(
                "const ELEMENTS: &'static [&'static str] = &[{elements}];"
            ));
            for (index, r) in group.iter().enumerate() {
                w.line(format!(
                    "const {}: &'static [{MEMBER}] = &[{MEMBER}::Named({PERFORM:?}), {MEMBER}::Positional {{ index: {index}, names: Self::ELEMENTS }}];",
                    chain_const(&r.name)
                ));
            }
            w.close();
        }

        w.blank();
        w.open(format!("impl ::fluentfga::RelationSelector for {selector}"));
        w.open(format!("fn members(&self) -> &'static [{MEMBER}]"));
        w.open("match self");
        for r in direct {
            w.line(format!("Self::{} => Self::{},", r.variant, chain_const(&r.name)));
        }
        match perform {
            Perform::Absent => {}
            Perform::Scalar(_) => {
                w.line(format!("Self::Perform => Self::{},", chain_const(PERFORM)))
            }
            Perform::Group(_) => {
                w.line("Self::Perform(inner) => ::fluentfga::RelationSelector::members(inner),")
            }
        }
        w.close();
        w.close();
        w.close();

        if let Perform::Group(group) = perform {
            w.blank();
            w.open(format!("impl ::fluentfga::RelationSelector for {group_selector}"));
            w.open(format!("fn members(&self) -> &'static [{MEMBER}]"));
            w.open("match self");
            for r in group {
                w.line(format!("Self::{} => Self::{},", r.variant, chain_const(&r.name)));
            }
            w.close();
            w.close();
            w.close();
        }

        w.blank();
        emit_relation_name(w, ident, &selector);
        if let Perform::Group(_) = perform {
            w.blank();
            emit_relation_name(w, ident, &group_selector);
        }
    }

    fn emit_capabilities(&self, w: &mut SourceWriter) {
        let ident = &self.ident;
        w.open(format!("impl ::fluentfga::Entity for {ident}"));
        w.line(format!("const NAME: &'static str = {:?};", self.entity_name));
        w.close();

        if let Shape::Relations { .. } = self.shape {
            w.blank();
            w.line(format!("impl ::fluentfga::Resource for {ident} {{}}"));
        }
        if self.accessor {
            w.blank();
            w.line(format!("impl ::fluentfga::Accessor for {ident} {{}}"));
        }
    }
}

fn emit_relation_name(w: &mut SourceWriter, resource: &str, selector: &str) {
    w.open(format!(
        "impl ::fluentfga::RelationName<{resource}> for {selector}"
    ));
    w.open(format!("fn relation_name(&self) -> {STRING}"));
    w.line("::fluentfga::RelationSelector::resolve(self)");
    w.close();
    w.close();
}

struct ParamPlan {
    /// Parameter name as declared, used as the context key.
    key: String,
    arg: String,
    kind: ParameterKind,
}

struct ConditionPlan {
    name: String,
    module: String,
    expression: Option<String>,
    init: Vec<ParamPlan>,
    provided: Vec<ParamPlan>,
}

impl ConditionPlan {
    fn new(condition: &Condition) -> SchemaResult<Self> {
        let module = value_ident(&to_snake_case(&condition.name)).ok_or_else(|| {
            malformed(format!(
                "condition '{}' is not a valid identifier",
                condition.name
            ))
        })?;

        Ok(Self {
            name: condition.name.clone(),
            module,
            expression: condition.expression.clone(),
            init: param_plans(condition, condition.init_parameters())?,
            provided: param_plans(condition, condition.provided_parameters())?,
        })
    }
}

/// Chooses argument names for one phase of a condition.
///
/// The suffix is stripped for the argument name; when two parameters of the
/// same phase strip to the same name both keep their full names.
fn param_plans<'a>(
    condition: &Condition,
    params: impl Iterator<Item = &'a Parameter>,
) -> SchemaResult<Vec<ParamPlan>> {
    let params: Vec<&Parameter> = params.collect();
    let short_names: Vec<String> = params
        .iter()
        .map(|p| to_snake_case(p.display_name()))
        .collect();

    let mut args = HashSet::new();
    let mut plans = Vec::with_capacity(params.len());
    for (param, short) in params.iter().zip(&short_names) {
        let clashes = short_names.iter().filter(|other| *other == short).count() > 1;
        let arg_name = if clashes {
            to_snake_case(&param.name)
        } else {
            short.clone()
        };
        let arg = value_ident(&arg_name).ok_or_else(|| {
            malformed(format!(
                "parameter {}.{} is not a valid identifier",
                condition.name, param.name
            ))
        })?;
        if !args.insert(arg.clone()) {
            return Err(malformed(format!(
                "parameter {}.{} maps to argument '{arg}' which is already taken",
                condition.name, param.name
            )));
        }
        plans.push(ParamPlan {
            key: param.name.clone(),
            arg,
            kind: param.kind,
        });
    }
    Ok(plans)
}

fn argument_type(kind: ParameterKind) -> &'static str {
    match kind {
        ParameterKind::String => "impl ::std::string::ToString",
        ParameterKind::Int => "i64",
        ParameterKind::Bool => "bool",
        ParameterKind::Timestamp => "::fluentfga::chrono::DateTime<::fluentfga::chrono::Utc>",
        ParameterKind::Duration => "::std::time::Duration",
    }
}

fn serializer(kind: ParameterKind) -> &'static str {
    match kind {
        ParameterKind::String => "string",
        ParameterKind::Int => "int",
        ParameterKind::Bool => "boolean",
        ParameterKind::Timestamp => "timestamp",
        ParameterKind::Duration => "duration",
    }
}

fn signature(params: &[ParamPlan]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.arg, argument_type(p.kind)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn context_expr(params: &[ParamPlan]) -> String {
    if params.is_empty() {
        return "::fluentfga::ConditionContext::new()".to_string();
    }
    let pairs = params
        .iter()
        .map(|p| {
            format!(
                "({:?}, ::fluentfga::condition::{}({}))",
                p.key,
                serializer(p.kind),
                p.arg
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{pairs}].into_iter().collect()")
}

fn emit_conditions(w: &mut SourceWriter, conditions: &[ConditionPlan]) {
    w.line("/// Builders for the conditions declared in the schema.");
    w.open("pub mod conditions");
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        w.line(format!("/// Condition `{}`.", c.name));
        if let Some(expression) = &c.expression {
            w.line("///");
            w.line(format!(
                "/// `{}`",
                expression.replace('\n', " ").replace('`', "'")
            ));
        }
        w.open(format!("pub mod {}", c.module));
        w.line("/// The condition name as declared in the schema.");
        w.line(format!("pub const NAME: &str = {:?};", c.name));
        w.blank();
        w.line("/// Builds the condition attached to a tuple when it is written.");
        w.open(format!(
            "pub fn build({}) -> ::fluentfga::ConditionInstance",
            signature(&c.init)
        ));
        w.line(format!(
            "::fluentfga::ConditionInstance::new(NAME, {})",
            context_expr(&c.init)
        ));
        w.close();
        w.blank();
        w.line("/// Builds the context supplied when access is checked.");
        w.open(format!(
            "pub fn check_context({}) -> ::fluentfga::ConditionContext",
            signature(&c.provided)
        ));
        w.line(context_expr(&c.provided));
        w.close();
        w.close();
    }
    w.close();
}
