//! Render-ready view of a schema.
//!
//! All identifier decisions are made here, once, so both configuration
//! styles emit the same names: class names, property names, DbSet names and
//! navigation names are formatted, made legal C# identifiers, and made unique
//! within their scope.

use std::collections::{HashMap, HashSet};

use crate::core::identifier::{generated_identifier, NamingConvention};
use crate::core::schema::{ForeignKey, Schema, Table};

/// One entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    /// C# class name.
    pub class_name: String,

    /// Name of the context's `DbSet` property.
    pub set_name: String,

    /// Native table name.
    pub table_name: String,

    /// Table description, raw.
    pub description: String,

    /// Column properties in ordinal order.
    pub properties: Vec<PropertyView>,

    /// One navigation per foreign key constraint, in foreign key order.
    pub navigations: Vec<NavigationView>,

    /// Key property names in key order.
    pub key: Vec<String>,
}

impl EntityView {
    /// Property mapped to a native column.
    pub fn property_for(&self, column: &str) -> Option<&PropertyView> {
        self.properties.iter().find(|p| p.column_name == column)
    }

    /// Whether the key spans more than one column.
    pub fn has_composite_key(&self) -> bool {
        self.key.len() > 1
    }
}

/// One column property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyView {
    /// C# property name.
    pub name: String,

    /// Native column name.
    pub column_name: String,

    /// C# type, with `?` for nullable value types.
    pub csharp_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// 0-based position in the primary key, if the column is part of it.
    pub key_order: Option<usize>,

    /// Column description, raw.
    pub description: String,
}

impl PropertyView {
    pub fn is_key(&self) -> bool {
        self.key_order.is_some()
    }
}

/// One navigation property, derived from a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationView {
    /// C# property name.
    pub name: String,

    /// Class name of the referenced entity.
    pub target_class: String,

    /// Foreign key properties on this entity, in constraint order.
    pub foreign_key_properties: Vec<String>,

    /// Referenced properties on the target, in constraint order. Empty when
    /// they are exactly the target's primary key or the target is unknown.
    pub principal_key_properties: Vec<String>,

    /// Foreign key description, raw.
    pub description: String,
}

/// Build the entity views for every table, in table order.
///
/// Entity classes share a namespace and an output directory with the context
/// and its procedure unit, so those names are reserved first.
pub fn build_entities(
    schema: &Schema,
    naming: NamingConvention,
    context_name: &str,
) -> Vec<EntityView> {
    let mut class_names = HashSet::from([
        context_name.to_string(),
        format!("{}StoredProcedures", context_name),
    ]);
    let mut entities: Vec<EntityView> = schema
        .tables
        .values()
        .map(|table| {
            let class_name = claim(
                &mut class_names,
                &generated_identifier(naming, &table.name),
                2,
            );
            entity_without_navigations(table, class_name, naming)
        })
        .collect();

    let by_table: HashMap<&str, usize> = schema
        .tables
        .keys()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let navigations: Vec<Vec<NavigationView>> = schema
        .tables
        .values()
        .zip(&entities)
        .map(|(table, entity)| navigations(table, entity, &entities, &by_table, naming))
        .collect();

    for (entity, navs) in entities.iter_mut().zip(navigations) {
        entity.navigations = navs;
    }
    entities
}

fn entity_without_navigations(
    table: &Table,
    class_name: String,
    naming: NamingConvention,
) -> EntityView {
    // A member may not share its enclosing type's name
    let mut taken = HashSet::from([class_name.clone()]);

    let properties: Vec<PropertyView> = table
        .columns
        .iter()
        .map(|column| PropertyView {
            name: claim(&mut taken, &generated_identifier(naming, &column.name), 1),
            column_name: column.name.clone(),
            csharp_type: column.canonical_type.csharp_type_nullable(column.is_nullable),
            is_nullable: column.is_nullable,
            key_order: table.key_position(&column.name),
            description: column.description.clone(),
        })
        .collect();

    let key = table
        .primary_key
        .iter()
        .filter_map(|col| properties.iter().find(|p| &p.column_name == col))
        .map(|p| p.name.clone())
        .collect();

    EntityView {
        set_name: format!("{}s", class_name),
        class_name,
        table_name: table.name.clone(),
        description: table.description.clone(),
        properties,
        navigations: Vec::new(),
        key,
    }
}

fn navigations(
    table: &Table,
    entity: &EntityView,
    entities: &[EntityView],
    by_table: &HashMap<&str, usize>,
    naming: NamingConvention,
) -> Vec<NavigationView> {
    let mut taken: HashSet<String> = entity.properties.iter().map(|p| p.name.clone()).collect();
    taken.insert(entity.class_name.clone());

    constraints(&table.foreign_keys)
        .into_iter()
        .map(|columns| {
            let ref_table = columns[0].ref_table.as_str();
            let target = by_table.get(ref_table).map(|&idx| &entities[idx]);
            let target_class = match target {
                Some(target) => target.class_name.clone(),
                None => generated_identifier(naming, ref_table),
            };

            let foreign_key_properties: Vec<String> = columns
                .iter()
                .map(|fk| {
                    entity
                        .property_for(&fk.column)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| generated_identifier(naming, &fk.column))
                })
                .collect();

            let name = if taken.insert(target_class.clone()) {
                target_class.clone()
            } else {
                let qualified = format!("{}{}", target_class, foreign_key_properties.concat());
                claim(&mut taken, &qualified, 2)
            };

            let principal_key_properties = target
                .and_then(|target| {
                    let referenced = columns
                        .iter()
                        .map(|fk| target.property_for(&fk.ref_column).map(|p| p.name.clone()))
                        .collect::<Option<Vec<String>>>()?;
                    (referenced != target.key).then_some(referenced)
                })
                .unwrap_or_default();

            let descriptions: Vec<&str> = columns.iter().map(|fk| fk.description.as_str()).collect();

            NavigationView {
                name,
                target_class,
                foreign_key_properties,
                principal_key_properties,
                description: descriptions.join("; "),
            }
        })
        .collect()
}

/// Split foreign keys into constraints: runs of adjacent columns where each
/// continues the previous one.
fn constraints(foreign_keys: &[ForeignKey]) -> Vec<&[ForeignKey]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for idx in 1..=foreign_keys.len() {
        if idx == foreign_keys.len() || !foreign_keys[idx].continues(&foreign_keys[idx - 1]) {
            groups.push(&foreign_keys[start..idx]);
            start = idx;
        }
    }
    groups
}

/// Take `base` if free, otherwise the first free `{base}{n}` from `first_suffix`.
fn claim(taken: &mut HashSet<String>, base: &str, first_suffix: usize) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = first_suffix;
    loop {
        let candidate = format!("{}{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
