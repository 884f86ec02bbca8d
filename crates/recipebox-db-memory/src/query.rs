//! Listing and filtering over the in-memory tables.
//!
//! Recipes come back newest id first; tags and ingredients by name
//! descending. Membership filters never yield the same row twice.

use std::collections::BTreeSet;

use recipebox_core::{Child, ChildId, ChildKind, Recipe, Relation, UserId};
use recipebox_storage::{ChildFilter, RecipeFilter};

use crate::tables::Tables;

pub(crate) fn list_recipes(tables: &Tables, owner: UserId, filter: &RecipeFilter) -> Vec<Recipe> {
    let tags = filter.tags.as_deref().map(id_set);
    let ingredients = filter.ingredients.as_deref().map(id_set);

    tables
        .recipes
        .iter()
        .rev()
        .filter(|(_, row)| row.owner == owner)
        .filter(|(id, _)| {
            matches_any(tables, **id, Relation::Tags, tags.as_ref())
                && matches_any(tables, **id, Relation::Ingredients, ingredients.as_ref())
        })
        .map(|(id, row)| tables.materialize(*id, row))
        .collect()
}

pub(crate) fn list_children(
    tables: &Tables,
    kind: ChildKind,
    owner: UserId,
    filter: &ChildFilter,
) -> Vec<Child> {
    let assigned: Option<BTreeSet<ChildId>> = filter.assigned_only.then(|| {
        tables
            .links(kind.relation())
            .iter()
            .map(|(_, child)| *child)
            .collect()
    });

    let mut children: Vec<Child> = tables
        .children(kind)
        .keys()
        .filter(|id| assigned.as_ref().is_none_or(|set| set.contains(id)))
        .filter_map(|id| tables.owned_child(kind, owner, *id))
        .collect();
    children.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id)));
    children
}

fn id_set(ids: &[ChildId]) -> BTreeSet<ChildId> {
    ids.iter().copied().collect()
}

/// `None` means the relation is not filtered.
fn matches_any(
    tables: &Tables,
    recipe: recipebox_core::RecipeId,
    relation: Relation,
    wanted: Option<&BTreeSet<ChildId>>,
) -> bool {
    match wanted {
        None => true,
        Some(wanted) => tables
            .member_ids(recipe, relation)
            .any(|id| wanted.contains(&id)),
    }
}
