//! C# Entity Framework Core code generation.
//!
//! Rendering happens in two steps:
//!
//! 1. [`view`] turns a [`Schema`] into render-ready [`EntityView`]s: resolved
//!    C# identifiers, types, key order and navigation names.
//! 2. A [`ContextStyle`] strategy renders entities and the context from those
//!    views. [`annotation`] puts mapping metadata on the entity classes,
//!    [`builder`] puts it in `OnModelCreating`.
//!
//! Stored procedures are rendered separately by [`procedures`].
//!
//! Output is a pure function of the schema and options: iteration follows the
//! schema's table and column order, so repeated runs are byte-identical.

pub mod annotation;
pub mod builder;
pub mod procedures;
pub mod view;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::identifier::{doc_comment_text, validate_csharp_identifier, validate_namespace};
use crate::core::{Dialect, NamingConvention, Schema};
use crate::error::{GenError, Result};

pub use annotation::AnnotationStyle;
pub use builder::BuilderStyle;
pub use view::{EntityView, NavigationView, PropertyView};

/// How entity-to-table mapping is expressed in the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConfigurationStyle {
    /// Data annotation attributes on entity classes and properties.
    #[default]
    #[serde(
        rename = "annotation-based",
        alias = "annotations",
        alias = "data_annotations"
    )]
    AnnotationBased,
    /// Fluent `ModelBuilder` calls in the context's `OnModelCreating`.
    #[serde(rename = "builder-based", alias = "fluent", alias = "fluent_api")]
    BuilderBased,
}

impl ConfigurationStyle {
    /// Configuration-file spelling of this style.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationStyle::AnnotationBased => "annotation-based",
            ConfigurationStyle::BuilderBased => "builder-based",
        }
    }

    fn strategy(&self) -> &'static dyn ContextStyle {
        match self {
            ConfigurationStyle::AnnotationBased => &AnnotationStyle,
            ConfigurationStyle::BuilderBased => &BuilderStyle,
        }
    }
}

impl fmt::Display for ConfigurationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationStyle {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "annotation-based" | "annotations" | "data_annotations" => {
                Ok(ConfigurationStyle::AnnotationBased)
            }
            "builder-based" | "fluent" | "fluent_api" => Ok(ConfigurationStyle::BuilderBased),
            other => Err(GenError::Config(format!(
                "Invalid configuration style '{}'. Valid values: annotation-based, builder-based",
                other
            ))),
        }
    }
}

/// Options controlling code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// C# namespace of every generated unit.
    pub namespace: String,

    /// Name of the generated `DbContext` class.
    pub context_name: String,

    /// Naming convention for generated identifiers.
    pub naming: NamingConvention,

    /// Where mapping metadata goes.
    pub style: ConfigurationStyle,
}

impl GenerationOptions {
    /// Check that the namespace and context name are usable C# identifiers.
    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace)?;
        validate_csharp_identifier(&self.context_name, "context name")
    }
}

/// A configuration-style rendering strategy.
///
/// Implementations only decide what mapping metadata looks like; the shared
/// layout of entity and context units lives in this module.
pub trait ContextStyle: Sync {
    /// `using` directives of an entity unit.
    fn entity_usings(&self) -> &'static [&'static str];

    /// Attribute lines placed above an entity class.
    fn class_attributes(&self, entity: &EntityView) -> Vec<String>;

    /// Attribute lines placed above a column property.
    fn property_attributes(&self, entity: &EntityView, property: &PropertyView) -> Vec<String>;

    /// Attribute lines placed above a navigation property.
    fn navigation_attributes(&self, entity: &EntityView, navigation: &NavigationView)
        -> Vec<String>;

    /// Statements of `OnModelCreating`, without indentation.
    fn model_configuration(&self, entities: &[EntityView]) -> Vec<String>;
}

/// Generated source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Entity class name → entity unit, in table order.
    pub entities: IndexMap<String, String>,

    /// The `DbContext` unit.
    pub context: String,

    /// Stored-procedure wrapper unit; empty when the schema has no procedures.
    pub procedures: String,
}

impl GeneratedCode {
    /// Paths `write_to` would produce under `dir`, in write order.
    ///
    /// Files are named `{Entity}.cs`, `{context_name}.cs` and
    /// `{context_name}StoredProcedures.cs`; the last is skipped when there are
    /// no procedures.
    pub fn file_paths(&self, dir: &Path, context_name: &str) -> Vec<PathBuf> {
        self.units(context_name)
            .into_iter()
            .map(|(name, _)| dir.join(format!("{}.cs", name)))
            .collect()
    }

    /// Write every unit into `dir`, creating it if needed. Returns the written
    /// paths in order.
    pub fn write_to(&self, dir: &Path, context_name: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let units = self.units(context_name);
        let mut written = Vec::with_capacity(units.len());
        for (name, text) in units {
            let path = dir.join(format!("{}.cs", name));
            std::fs::write(&path, text)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!("Wrote {} files to {}", written.len(), dir.display());
        Ok(written)
    }

    fn units(&self, context_name: &str) -> Vec<(String, &str)> {
        let mut units: Vec<(String, &str)> = self
            .entities
            .iter()
            .map(|(name, text)| (name.clone(), text.as_str()))
            .collect();
        units.push((context_name.to_string(), self.context.as_str()));
        if !self.procedures.is_empty() {
            units.push((format!("{}StoredProcedures", context_name), self.procedures.as_str()));
        }
        units
    }
}

/// Render all units for `schema`.
///
/// `dialect` selects the procedure invocation syntax.
pub fn generate(
    schema: &Schema,
    dialect: Dialect,
    options: &GenerationOptions,
) -> Result<GeneratedCode> {
    options.validate()?;

    let entities = view::build_entities(schema, options.naming, &options.context_name);
    let style = options.style.strategy();

    let code = GeneratedCode {
        entities: entities
            .iter()
            .map(|entity| {
                (
                    entity.class_name.clone(),
                    render_entity(style, entity, &options.namespace),
                )
            })
            .collect(),
        context: render_context(style, &entities, options),
        procedures: procedures::render(schema, &entities, dialect, options),
    };

    info!(
        "Generated {} entities ({}, {}) and {} procedure wrappers",
        code.entities.len(),
        options.style,
        options.naming,
        schema.procedures.len()
    );
    Ok(code)
}

/// Append a `<summary>` doc comment at `indent`, if `description` is non-empty.
pub(crate) fn push_summary(out: &mut String, indent: &str, description: &str) {
    push_doc(out, indent, &doc_comment_text(description));
}

/// Append a `<summary>` holding already-escaped XML.
pub(crate) fn push_doc(out: &mut String, indent: &str, xml: &str) {
    if xml.is_empty() {
        return;
    }
    out.push_str(&format!("{indent}/// <summary>\n"));
    out.push_str(&format!("{indent}/// {xml}\n"));
    out.push_str(&format!("{indent}/// </summary>\n"));
}

pub(crate) fn push_usings(out: &mut String, usings: &[&str]) {
    for using in usings {
        out.push_str(&format!("using {};\n", using));
    }
    out.push('\n');
}

fn render_entity(style: &dyn ContextStyle, entity: &EntityView, namespace: &str) -> String {
    let mut out = String::new();
    push_usings(&mut out, style.entity_usings());
    out.push_str(&format!("namespace {}\n{{\n", namespace));

    push_summary(&mut out, "    ", &entity.description);
    for attribute in style.class_attributes(entity) {
        out.push_str(&format!("    {}\n", attribute));
    }
    out.push_str(&format!("    public class {}\n    {{\n", entity.class_name));

    let mut members = Vec::new();
    for property in &entity.properties {
        let mut member = String::new();
        push_summary(&mut member, "        ", &property.description);
        for attribute in style.property_attributes(entity, property) {
            member.push_str(&format!("        {}\n", attribute));
        }
        member.push_str(&format!(
            "        public {} {} {{ get; set; }}\n",
            property.csharp_type, property.name
        ));
        members.push(member);
    }
    for navigation in &entity.navigations {
        let mut member = String::new();
        push_summary(&mut member, "        ", &navigation.description);
        for attribute in style.navigation_attributes(entity, navigation) {
            member.push_str(&format!("        {}\n", attribute));
        }
        member.push_str(&format!(
            "        public virtual {} {} {{ get; set; }}\n",
            navigation.target_class, navigation.name
        ));
        members.push(member);
    }
    out.push_str(&members.join("\n"));

    out.push_str("    }\n}\n");
    out
}

fn render_context(
    style: &dyn ContextStyle,
    entities: &[EntityView],
    options: &GenerationOptions,
) -> String {
    let name = &options.context_name;
    let mut out = String::new();
    push_usings(&mut out, &["System", "Microsoft.EntityFrameworkCore"]);
    out.push_str(&format!("namespace {}\n{{\n", options.namespace));

    push_summary(&mut out, "    ", "Database context for the generated entities.");
    out.push_str(&format!("    public partial class {} : DbContext\n    {{\n", name));
    out.push_str(&format!(
        "        public {name}(DbContextOptions<{name}> options)\n            : base(options)\n        {{\n        }}\n"
    ));

    for entity in entities {
        out.push('\n');
        push_doc(
            &mut out,
            "        ",
            &format!("Gets or sets the <see cref=\"{}\"/> entities.", entity.class_name),
        );
        out.push_str(&format!(
            "        public virtual DbSet<{}> {} {{ get; set; }}\n",
            entity.class_name, entity.set_name
        ));
    }

    out.push('\n');
    out.push_str("        protected override void OnModelCreating(ModelBuilder modelBuilder)\n");
    out.push_str("        {\n");
    for statement in style.model_configuration(entities) {
        if statement.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("            {}\n", statement));
        }
    }
    out.push_str("        }\n    }\n}\n");
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::schema::{Column, ForeignKey, Parameter, ParameterDirection, Procedure, Table};
    use crate::typemap::CanonicalType;

    pub(crate) fn column(name: &str, data_type: &str, nullable: bool, ordinal: i32) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            canonical_type: CanonicalType::from_native(data_type),
            is_nullable: nullable,
            description: String::new(),
            ordinal_pos: ordinal,
        }
    }

    pub(crate) fn table(name: &str, columns: Vec<Column>, pk: &[&str], fks: Vec<ForeignKey>) -> Table {
        Table {
            name: name.to_string(),
            description: String::new(),
            columns,
            foreign_keys: fks,
            primary_key: pk.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn schema(tables: Vec<Table>) -> Schema {
        Schema {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
            procedures: IndexMap::new(),
        }
    }

    pub(crate) fn customer_schema() -> Schema {
        schema(vec![table(
            "customer",
            vec![column("id", "int", false, 1), column("name", "varchar", true, 2)],
            &["id"],
            vec![],
        )])
    }

    pub(crate) fn order_schema() -> Schema {
        schema(vec![
            table(
                "order",
                vec![
                    column("id", "int", false, 1),
                    column("customer_id", "int", false, 2),
                ],
                &["id"],
                vec![ForeignKey::new(Some("fk_order_customer"), "customer_id", "customer", "id")],
            ),
            table(
                "customer",
                vec![column("id", "int", false, 1), column("name", "varchar", true, 2)],
                &["id"],
                vec![],
            ),
        ])
    }

    pub(crate) fn options(style: ConfigurationStyle) -> GenerationOptions {
        GenerationOptions {
            namespace: "Shop.Data".to_string(),
            context_name: "ShopContext".to_string(),
            naming: NamingConvention::WordCapitalized,
            style,
        }
    }

    #[test]
    fn test_customer_scenario_annotation_based() {
        let code = generate(
            &customer_schema(),
            Dialect::Sqlite,
            &options(ConfigurationStyle::AnnotationBased),
        )
        .unwrap();

        assert_eq!(code.entities.len(), 1);
        let entity = &code.entities["Customer"];
        assert!(entity.contains("namespace Shop.Data"));
        assert!(entity.contains("[Table(\"customer\")]"));
        assert!(entity.contains("public class Customer"));
        assert!(entity.contains("        [Key]\n        [Required]\n        [Column(\"id\")]\n        public int Id { get; set; }"));
        assert!(entity.contains("        [Column(\"name\")]\n        public string Name { get; set; }"));

        assert!(code.context.contains("public partial class ShopContext : DbContext"));
        assert!(code.context.contains("public virtual DbSet<Customer> Customers { get; set; }"));
        assert!(code.procedures.is_empty());
    }

    #[test]
    fn test_order_navigation_in_both_styles() {
        for style in [ConfigurationStyle::AnnotationBased, ConfigurationStyle::BuilderBased] {
            let code = generate(&order_schema(), Dialect::Postgres, &options(style)).unwrap();
            let order = &code.entities["Order"];
            assert!(
                order.contains("public virtual Customer Customer { get; set; }"),
                "{style}: {order}"
            );
            assert!(order.contains("/// Foreign key constraint fk_order_customer referencing customer.id"));
        }

        let builder = generate(
            &order_schema(),
            Dialect::Postgres,
            &options(ConfigurationStyle::BuilderBased),
        )
        .unwrap();
        assert!(builder
            .context
            .contains("entity.HasOne(e => e.Customer).WithMany().HasForeignKey(e => e.CustomerId);"));

        let annotation = generate(
            &order_schema(),
            Dialect::Postgres,
            &options(ConfigurationStyle::AnnotationBased),
        )
        .unwrap();
        assert!(!annotation.context.contains("HasOne"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let schema = order_schema();
        for style in [ConfigurationStyle::AnnotationBased, ConfigurationStyle::BuilderBased] {
            let first = generate(&schema, Dialect::Mysql, &options(style)).unwrap();
            let second = generate(&schema, Dialect::Mysql, &options(style)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_entities_follow_table_order() {
        let code = generate(
            &order_schema(),
            Dialect::Mysql,
            &options(ConfigurationStyle::AnnotationBased),
        )
        .unwrap();
        let names: Vec<_> = code.entities.keys().cloned().collect();
        assert_eq!(names, vec!["Order", "Customer"]);
        let orders = code.context.find("DbSet<Order>").unwrap();
        let customers = code.context.find("DbSet<Customer>").unwrap();
        assert!(orders < customers);
    }

    #[test]
    fn test_verbatim_naming_keeps_native_names() {
        let mut opts = options(ConfigurationStyle::AnnotationBased);
        opts.naming = NamingConvention::Verbatim;
        let code = generate(&order_schema(), Dialect::Mysql, &opts).unwrap();
        let order = &code.entities["order"];
        assert!(order.contains("public class order"));
        assert!(order.contains("public int customer_id { get; set; }"));
        assert!(order.contains("public virtual customer customer { get; set; }"));
    }

    #[test]
    fn test_multiline_description_collapsed() {
        let mut schema = customer_schema();
        let customer = schema.tables.get_mut("customer").unwrap();
        customer.description = "People who\n   buy  things <often>".to_string();
        let code = generate(
            &schema,
            Dialect::Mysql,
            &options(ConfigurationStyle::AnnotationBased),
        )
        .unwrap();
        assert!(code.entities["Customer"].contains("    /// People who buy things &lt;often&gt;\n"));
    }

    #[test]
    fn test_entity_named_like_context_keeps_its_file() {
        let mut schema = schema(vec![table(
            "shop_context",
            vec![column("id", "int", false, 1)],
            &["id"],
            vec![],
        )]);
        schema.procedures.insert(
            "purge".to_string(),
            Procedure {
                name: "purge".to_string(),
                definition: String::new(),
                description: String::new(),
                parameters: vec![Parameter::new("days", "int", ParameterDirection::In)],
            },
        );
        let code = generate(
            &schema,
            Dialect::Postgres,
            &options(ConfigurationStyle::BuilderBased),
        )
        .unwrap();
        assert!(code.entities["ShopContext2"].contains("public class ShopContext2"));

        let dir = tempfile::tempdir().unwrap();
        let written = code.write_to(dir.path(), "ShopContext").unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["ShopContext2.cs", "ShopContext.cs", "ShopContextStoredProcedures.cs"]
        );
        assert_eq!(written, code.file_paths(dir.path(), "ShopContext"));

        let entity = std::fs::read_to_string(dir.path().join("ShopContext2.cs")).unwrap();
        assert!(entity.contains("public class ShopContext2"));
        let context = std::fs::read_to_string(dir.path().join("ShopContext.cs")).unwrap();
        assert!(context.contains("public virtual DbSet<ShopContext2> ShopContext2s { get; set; }"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut opts = options(ConfigurationStyle::AnnotationBased);
        opts.context_name = "class".to_string();
        assert!(matches!(
            generate(&customer_schema(), Dialect::Mysql, &opts),
            Err(GenError::Config(_))
        ));
    }

    #[test]
    fn test_configuration_style_parsing() {
        assert_eq!(
            "builder-based".parse::<ConfigurationStyle>().unwrap(),
            ConfigurationStyle::BuilderBased
        );
        assert_eq!(
            "Annotation-Based".parse::<ConfigurationStyle>().unwrap(),
            ConfigurationStyle::AnnotationBased
        );
        assert!("xml".parse::<ConfigurationStyle>().is_err());
    }

    #[test]
    fn test_write_to_skips_empty_procedures() {
        let dir = tempfile::tempdir().unwrap();
        let code = generate(
            &customer_schema(),
            Dialect::Sqlite,
            &options(ConfigurationStyle::AnnotationBased),
        )
        .unwrap();

        let written = code.write_to(dir.path(), "ShopContext").unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("Customer.cs").exists());
        assert!(dir.path().join("ShopContext.cs").exists());
        assert!(!dir.path().join("ShopContextStoredProcedures.cs").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Customer.cs")).unwrap(),
            code.entities["Customer"]
        );
    }

    #[test]
    fn test_write_to_includes_procedures() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = customer_schema();
        schema.procedures.insert(
            "get_customer".to_string(),
            Procedure {
                name: "get_customer".to_string(),
                definition: String::new(),
                description: String::new(),
                parameters: vec![Parameter::new("id", "int", ParameterDirection::In)],
            },
        );
        let code = generate(
            &schema,
            Dialect::Mysql,
            &options(ConfigurationStyle::BuilderBased),
        )
        .unwrap();

        let written = code.write_to(dir.path(), "ShopContext").unwrap();
        assert_eq!(written, code.file_paths(dir.path(), "ShopContext"));
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("ShopContextStoredProcedures.cs").exists());
    }
}
