//! Stored-procedure wrappers.
//!
//! Renders a `partial` extension of the context with one method per
//! procedure. Each method forwards its arguments positionally to
//! `Database.ExecuteSqlRaw`, which binds `{0}`, `{1}`, ... as parameters.

use std::collections::HashSet;

use crate::core::identifier::{csharp_identifier, csharp_string_literal, generated_identifier};
use crate::core::schema::{Parameter, ParameterDirection, Procedure};
use crate::core::{Dialect, NamingConvention, Schema};

use super::view::EntityView;
use super::{push_summary, push_usings, GenerationOptions};

/// Members the context already has, besides its `DbSet` properties.
const CONTEXT_MEMBERS: &[&str] = &["Database", "OnModelCreating", "OnConfiguring", "SaveChanges"];

/// Render the procedure unit; empty when the schema has no procedures.
///
/// `entities` are the views the context was rendered from; their `DbSet`
/// names are members of the same partial class.
pub fn render(
    schema: &Schema,
    entities: &[EntityView],
    dialect: Dialect,
    options: &GenerationOptions,
) -> String {
    if schema.procedures.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    push_usings(&mut out, &["System", "Microsoft.EntityFrameworkCore"]);
    out.push_str(&format!("namespace {}\n{{\n", options.namespace));
    out.push_str(&format!("    public partial class {}\n    {{\n", options.context_name));

    let mut method_names: HashSet<String> = entities
        .iter()
        .map(|entity| entity.set_name.clone())
        .chain(CONTEXT_MEMBERS.iter().map(|m| m.to_string()))
        .collect();
    method_names.insert(options.context_name.clone());
    let methods: Vec<String> = schema
        .procedures
        .values()
        .map(|procedure| {
            let name = unique(
                &mut method_names,
                generated_identifier(options.naming, &procedure.name),
            );
            render_method(procedure, &name, dialect, options.naming)
        })
        .collect();
    out.push_str(&methods.join("\n"));

    out.push_str("    }\n}\n");
    out
}

fn render_method(
    procedure: &Procedure,
    method_name: &str,
    dialect: Dialect,
    naming: NamingConvention,
) -> String {
    let mut taken = HashSet::new();
    let arguments: Vec<(String, &Parameter)> = procedure
        .parameters
        .iter()
        .enumerate()
        .map(|(idx, param)| (unique(&mut taken, argument_name(param, idx, naming)), param))
        .collect();

    let mut out = String::new();
    push_summary(&mut out, "        ", &procedure.description);
    for (name, param) in &arguments {
        if param.direction == ParameterDirection::Out {
            push_param_doc(&mut out, name, "Output parameter; its value is not read back.");
        }
    }

    let signature: Vec<String> = arguments
        .iter()
        .map(|(name, param)| format!("{} {}", param.canonical_type.csharp_type(), name))
        .collect();
    out.push_str(&format!(
        "        public int {}({})\n        {{\n",
        method_name,
        signature.join(", ")
    ));

    let sql = csharp_string_literal(&invocation_sql(&procedure.name, arguments.len(), dialect));
    let mut call = vec![sql];
    call.extend(arguments.iter().map(|(name, _)| name.clone()));
    out.push_str(&format!(
        "            return Database.ExecuteSqlRaw({});\n",
        call.join(", ")
    ));
    out.push_str("        }\n");
    out
}

fn push_param_doc(out: &mut String, name: &str, text: &str) {
    out.push_str(&format!(
        "        /// <param name=\"{}\">{}</param>\n",
        name.trim_start_matches('@'),
        text
    ));
}

/// SQL invoking `procedure` with `count` positional placeholders.
fn invocation_sql(procedure: &str, count: usize, dialect: Dialect) -> String {
    // ExecuteSqlRaw treats braces as placeholders
    let name = procedure.replace('{', "{{").replace('}', "}}");
    let placeholders: Vec<String> = (0..count).map(|i| format!("{{{}}}", i)).collect();

    match dialect {
        Dialect::Mssql if placeholders.is_empty() => format!("EXEC {}", name),
        Dialect::Mssql => format!("EXEC {} {}", name, placeholders.join(", ")),
        _ => format!("CALL {}({})", name, placeholders.join(", ")),
    }
}

/// C# argument name: native name without `@`, formatted, camelCased under
/// word capitalization. Unnamed parameters become `p{idx}`.
fn argument_name(param: &Parameter, idx: usize, naming: NamingConvention) -> String {
    let native = param.name.trim_start_matches('@');
    if native.is_empty() {
        return format!("p{}", idx);
    }

    let formatted = naming.format(native);
    let formatted = match naming {
        NamingConvention::WordCapitalized => lower_first(&formatted),
        NamingConvention::Verbatim => formatted,
    };
    csharp_identifier(&formatted)
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn unique(taken: &mut HashSet<String>, base: String) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::{customer_schema, options};
    use crate::codegen::view::build_entities;
    use crate::codegen::ConfigurationStyle;

    fn rendered(schema: &Schema, dialect: Dialect, options: &GenerationOptions) -> String {
        let entities = build_entities(schema, options.naming, &options.context_name);
        render(schema, &entities, dialect, options)
    }

    fn procedure(name: &str, params: Vec<Parameter>) -> Procedure {
        Procedure {
            name: name.to_string(),
            definition: "BEGIN END".to_string(),
            description: String::new(),
            parameters: params,
        }
    }

    fn with_procedures(procedures: Vec<Procedure>) -> Schema {
        let mut schema = customer_schema();
        for p in procedures {
            schema.procedures.insert(p.name.clone(), p);
        }
        schema
    }

    #[test]
    fn test_no_procedures_renders_nothing() {
        let opts = options(ConfigurationStyle::AnnotationBased);
        assert_eq!(rendered(&customer_schema(), Dialect::Sqlite, &opts), "");
    }

    #[test]
    fn test_mssql_procedure_wrapper() {
        let schema = with_procedures(vec![procedure(
            "get_orders_by_customer",
            vec![
                Parameter::new("@customer_id", "int", ParameterDirection::In),
                Parameter::new("@since", "datetime", ParameterDirection::In),
                Parameter::new("@total", "decimal", ParameterDirection::Out),
            ],
        )]);
        let opts = options(ConfigurationStyle::BuilderBased);
        let text = rendered(&schema, Dialect::Mssql, &opts);

        assert!(text.contains("    public partial class ShopContext\n"));
        assert!(text.contains(
            "        public int GetOrdersByCustomer(int customerId, DateTime since, decimal total)\n"
        ));
        assert!(text.contains(
            "            return Database.ExecuteSqlRaw(\"EXEC get_orders_by_customer {0}, {1}, {2}\", customerId, since, total);\n"
        ));
        assert!(text.contains("/// <param name=\"total\">Output parameter"));
    }

    #[test]
    fn test_call_syntax_and_unknown_types() {
        let schema = with_procedures(vec![
            procedure("refresh_stats", vec![]),
            procedure(
                "tag_item",
                vec![Parameter::new("item_id", "geometry", ParameterDirection::In)],
            ),
        ]);
        let opts = options(ConfigurationStyle::AnnotationBased);
        let text = rendered(&schema, Dialect::Postgres, &opts);

        assert!(text.contains("public int RefreshStats()\n"));
        assert!(text.contains("Database.ExecuteSqlRaw(\"CALL refresh_stats()\");"));
        assert!(text.contains("public int TagItem(object itemId)\n"));
        assert!(text.contains("Database.ExecuteSqlRaw(\"CALL tag_item({0})\", itemId);"));

        let refresh = text.find("RefreshStats").unwrap();
        let tag = text.find("TagItem").unwrap();
        assert!(refresh < tag);
    }

    #[test]
    fn test_verbatim_names_and_unnamed_parameters() {
        let schema = with_procedures(vec![procedure(
            "sp_Archive",
            vec![
                Parameter::new("", "int", ParameterDirection::In),
                Parameter::new("class", "varchar", ParameterDirection::In),
            ],
        )]);
        let mut opts = options(ConfigurationStyle::AnnotationBased);
        opts.naming = NamingConvention::Verbatim;
        let text = rendered(&schema, Dialect::Mysql, &opts);

        assert!(text.contains("public int sp_Archive(int p0, string @class)\n"));
        assert!(text.contains("Database.ExecuteSqlRaw(\"CALL sp_Archive({0}, {1})\", p0, @class);"));
    }

    #[test]
    fn test_procedure_description_is_documented() {
        let mut p = procedure("purge", vec![]);
        p.description = "Removes\nold rows".to_string();
        let schema = with_procedures(vec![p]);
        let text = rendered(&schema, Dialect::Mssql, &options(ConfigurationStyle::AnnotationBased));
        assert!(text.contains("        /// Removes old rows\n"));
        assert!(text.contains("ExecuteSqlRaw(\"EXEC purge\")"));
    }

    #[test]
    fn test_methods_avoid_context_members() {
        let schema = with_procedures(vec![
            procedure("customers", vec![]),
            procedure("database", vec![]),
            procedure("shop_context", vec![]),
        ]);
        let text = rendered(&schema, Dialect::Mysql, &options(ConfigurationStyle::BuilderBased));

        assert!(text.contains("public int Customers2()\n"));
        assert!(text.contains("public int Database2()\n"));
        assert!(text.contains("public int ShopContext2()\n"));
        assert!(text.contains("ExecuteSqlRaw(\"CALL customers()\");"));
    }
}
