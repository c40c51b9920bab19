//! Annotation-based configuration: mapping metadata as data annotation attributes.

use crate::core::identifier::csharp_string_literal;

use super::view::{EntityView, NavigationView, PropertyView};
use super::ContextStyle;

/// Puts `[Table]`, `[Key]`, `[Required]`, `[Column]` and `[ForeignKey]` on the
/// entity classes and leaves `OnModelCreating` empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationStyle;

impl ContextStyle for AnnotationStyle {
    fn entity_usings(&self) -> &'static [&'static str] {
        &[
            "System",
            "System.Collections.Generic",
            "System.ComponentModel.DataAnnotations",
            "System.ComponentModel.DataAnnotations.Schema",
            "Microsoft.EntityFrameworkCore",
        ]
    }

    fn class_attributes(&self, entity: &EntityView) -> Vec<String> {
        let mut attributes = vec![format!(
            "[Table({})]",
            csharp_string_literal(&entity.table_name)
        )];

        if entity.key.is_empty() {
            attributes.push("[Keyless]".to_string());
        } else if entity.has_composite_key() {
            // [Key] alone cannot express a composite key
            let members: Vec<String> = entity
                .key
                .iter()
                .map(|name| format!("nameof({})", name))
                .collect();
            attributes.push(format!("[PrimaryKey({})]", members.join(", ")));
        }
        attributes
    }

    fn property_attributes(&self, entity: &EntityView, property: &PropertyView) -> Vec<String> {
        let mut attributes = Vec::new();
        if property.is_key() && !entity.has_composite_key() {
            attributes.push("[Key]".to_string());
        }
        if !property.is_nullable {
            attributes.push("[Required]".to_string());
        }

        let column = csharp_string_literal(&property.column_name);
        match property.key_order {
            Some(order) if entity.has_composite_key() => {
                attributes.push(format!("[Column({}, Order = {})]", column, order));
            }
            _ => attributes.push(format!("[Column({})]", column)),
        }
        attributes
    }

    fn navigation_attributes(
        &self,
        _entity: &EntityView,
        navigation: &NavigationView,
    ) -> Vec<String> {
        match navigation.foreign_key_properties.as_slice() {
            [single] => vec![format!("[ForeignKey(nameof({}))]", single)],
            // Composite keys are named as one comma-separated string
            composite => vec![format!(
                "[ForeignKey({})]",
                csharp_string_literal(&composite.join(","))
            )],
        }
    }

    fn model_configuration(&self, _entities: &[EntityView]) -> Vec<String> {
        Vec::new()
    }
}
