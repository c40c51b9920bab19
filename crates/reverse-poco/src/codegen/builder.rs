//! Builder-based configuration: mapping metadata as `ModelBuilder` calls.

use crate::core::identifier::csharp_string_literal;

use super::view::{EntityView, NavigationView, PropertyView};
use super::ContextStyle;

/// Leaves entity classes plain and configures table, key, column and
/// relationship mapping in `OnModelCreating`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderStyle;

impl ContextStyle for BuilderStyle {
    fn entity_usings(&self) -> &'static [&'static str] {
        &["System", "System.Collections.Generic"]
    }

    fn class_attributes(&self, _entity: &EntityView) -> Vec<String> {
        Vec::new()
    }

    fn property_attributes(&self, _entity: &EntityView, _property: &PropertyView) -> Vec<String> {
        Vec::new()
    }

    fn navigation_attributes(
        &self,
        _entity: &EntityView,
        _navigation: &NavigationView,
    ) -> Vec<String> {
        Vec::new()
    }

    fn model_configuration(&self, entities: &[EntityView]) -> Vec<String> {
        let mut lines = Vec::new();
        for (idx, entity) in entities.iter().enumerate() {
            if idx > 0 {
                lines.push(String::new());
            }
            lines.push(format!("modelBuilder.Entity<{}>(entity =>", entity.class_name));
            lines.push("{".to_string());
            lines.push(format!(
                "    entity.ToTable({});",
                csharp_string_literal(&entity.table_name)
            ));
            lines.push(format!("    {}", key_statement(entity)));
            for property in &entity.properties {
                lines.push(format!("    {}", property_statement(property)));
            }
            for navigation in &entity.navigations {
                lines.push(format!("    {}", relationship_statement(navigation)));
            }
            lines.push("});".to_string());
        }
        lines
    }
}

fn key_statement(entity: &EntityView) -> String {
    if entity.key.is_empty() {
        return "entity.HasNoKey();".to_string();
    }
    format!("entity.HasKey({});", members("e", &entity.key))
}

fn property_statement(property: &PropertyView) -> String {
    let mut statement = format!(
        "entity.Property(e => e.{}).HasColumnName({})",
        property.name,
        csharp_string_literal(&property.column_name)
    );
    if !property.is_nullable {
        statement.push_str(".IsRequired()");
    }
    statement.push(';');
    statement
}

fn relationship_statement(navigation: &NavigationView) -> String {
    let mut statement = format!(
        "entity.HasOne(e => e.{}).WithMany().HasForeignKey({})",
        navigation.name,
        members("e", &navigation.foreign_key_properties)
    );
    if !navigation.principal_key_properties.is_empty() {
        statement.push_str(&format!(
            ".HasPrincipalKey({})",
            members("p", &navigation.principal_key_properties)
        ));
    }
    statement.push(';');
    statement
}

/// `e => e.A` for one member, `e => new { e.A, e.B }` for several.
fn members(param: &str, names: &[String]) -> String {
    match names {
        [single] => format!("{param} => {param}.{single}"),
        several => {
            let list: Vec<String> = several.iter().map(|n| format!("{param}.{n}")).collect();
            format!("{param} => new {{ {} }}", list.join(", "))
        }
    }
}
