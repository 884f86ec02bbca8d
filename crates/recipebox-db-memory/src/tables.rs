use std::collections::{BTreeMap, BTreeSet};

use recipebox_core::{Child, ChildId, ChildKind, Recipe, RecipeFields, RecipeId, Relation, UserId};
use recipebox_storage::StorageError;

#[derive(Debug, Clone)]
pub(crate) struct ChildRow {
    pub owner: UserId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RecipeRow {
    pub owner: UserId,
    pub fields: RecipeFields,
    pub image: Option<String>,
}

/// Every relational table of the backend. Cloned whole for transaction snapshots.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub recipes: BTreeMap<RecipeId, RecipeRow>,
    tags: BTreeMap<ChildId, ChildRow>,
    ingredients: BTreeMap<ChildId, ChildRow>,
    /// (recipe, tag) pairs
    recipe_tags: BTreeSet<(RecipeId, ChildId)>,
    /// (recipe, ingredient) pairs
    recipe_ingredients: BTreeSet<(RecipeId, ChildId)>,
    recipe_seq: i64,
    tag_seq: i64,
    ingredient_seq: i64,
}

impl Tables {
    pub fn children(&self, kind: ChildKind) -> &BTreeMap<ChildId, ChildRow> {
        match kind {
            ChildKind::Tag => &self.tags,
            ChildKind::Ingredient => &self.ingredients,
        }
    }

    fn children_mut(&mut self, kind: ChildKind) -> &mut BTreeMap<ChildId, ChildRow> {
        match kind {
            ChildKind::Tag => &mut self.tags,
            ChildKind::Ingredient => &mut self.ingredients,
        }
    }

    pub fn links(&self, relation: Relation) -> &BTreeSet<(RecipeId, ChildId)> {
        match relation {
            Relation::Tags => &self.recipe_tags,
            Relation::Ingredients => &self.recipe_ingredients,
        }
    }

    fn links_mut(&mut self, relation: Relation) -> &mut BTreeSet<(RecipeId, ChildId)> {
        match relation {
            Relation::Tags => &mut self.recipe_tags,
            Relation::Ingredients => &mut self.recipe_ingredients,
        }
    }

    fn next_child_id(&mut self, kind: ChildKind) -> ChildId {
        let seq = match kind {
            ChildKind::Tag => &mut self.tag_seq,
            ChildKind::Ingredient => &mut self.ingredient_seq,
        };
        *seq += 1;
        ChildId::new(*seq)
    }

    // ==================== Children ====================

    pub fn child(&self, kind: ChildKind, id: ChildId) -> Option<Child> {
        self.children(kind)
            .get(&id)
            .map(|row| to_child(kind, id, row))
    }

    pub fn owned_child(&self, kind: ChildKind, owner: UserId, id: ChildId) -> Option<Child> {
        self.child(kind, id).filter(|c| c.owner == owner)
    }

    pub fn find_child(&self, kind: ChildKind, owner: UserId, name: &str) -> Option<Child> {
        self.children(kind)
            .iter()
            .find(|(_, row)| row.owner == owner && row.name == name)
            .map(|(id, row)| to_child(kind, *id, row))
    }

    pub fn insert_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        name: &str,
    ) -> Result<Child, StorageError> {
        if self.find_child(kind, owner, name).is_some() {
            return Err(StorageError::already_exists(kind.as_str(), name));
        }
        let id = self.next_child_id(kind);
        let row = ChildRow {
            owner,
            name: name.to_string(),
        };
        let child = to_child(kind, id, &row);
        self.children_mut(kind).insert(id, row);
        Ok(child)
    }

    pub fn rename_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
        name: &str,
    ) -> Result<Child, StorageError> {
        if self.owned_child(kind, owner, id).is_none() {
            return Err(StorageError::not_found(kind.as_str(), id));
        }
        if self
            .find_child(kind, owner, name)
            .is_some_and(|other| other.id != id)
        {
            return Err(StorageError::already_exists(kind.as_str(), name));
        }
        let row = self
            .children_mut(kind)
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(kind.as_str(), id))?;
        row.name = name.to_string();
        Ok(to_child(kind, id, row))
    }

    pub fn remove_child(
        &mut self,
        kind: ChildKind,
        owner: UserId,
        id: ChildId,
    ) -> Result<(), StorageError> {
        if self.owned_child(kind, owner, id).is_none() {
            return Err(StorageError::not_found(kind.as_str(), id));
        }
        self.children_mut(kind).remove(&id);
        self.links_mut(kind.relation())
            .retain(|(_, child)| *child != id);
        Ok(())
    }

    // ==================== Recipes ====================

    pub fn insert_recipe(&mut self, owner: UserId, fields: RecipeFields) -> RecipeId {
        self.recipe_seq += 1;
        let id = RecipeId::new(self.recipe_seq);
        self.recipes.insert(
            id,
            RecipeRow {
                owner,
                fields,
                image: None,
            },
        );
        id
    }

    pub fn owned_recipe_mut(
        &mut self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<&mut RecipeRow, StorageError> {
        self.recipes
            .get_mut(&id)
            .filter(|row| row.owner == owner)
            .ok_or_else(|| StorageError::not_found("recipe", id))
    }

    pub fn remove_recipe(&mut self, owner: UserId, id: RecipeId) -> Result<Recipe, StorageError> {
        let recipe = self
            .recipe(owner, id)
            .ok_or_else(|| StorageError::not_found("recipe", id))?;
        self.recipes.remove(&id);
        self.recipe_tags.retain(|(recipe, _)| *recipe != id);
        self.recipe_ingredients.retain(|(recipe, _)| *recipe != id);
        Ok(recipe)
    }

    /// Loads an owned recipe with both relations, members ordered by id.
    pub fn recipe(&self, owner: UserId, id: RecipeId) -> Option<Recipe> {
        let row = self.recipes.get(&id).filter(|row| row.owner == owner)?;
        Some(self.materialize(id, row))
    }

    pub fn materialize(&self, id: RecipeId, row: &RecipeRow) -> Recipe {
        let fields = row.fields.clone();
        Recipe {
            id,
            owner: row.owner,
            title: fields.title,
            time_minutes: fields.time_minutes,
            price: fields.price,
            link: fields.link,
            description: fields.description,
            image: row.image.clone(),
            tags: self.members(id, Relation::Tags),
            ingredients: self.members(id, Relation::Ingredients),
        }
    }

    pub fn member_ids(&self, recipe: RecipeId, relation: Relation) -> impl Iterator<Item = ChildId> + '_ {
        self.links(relation)
            .range((recipe, ChildId::new(i64::MIN))..=(recipe, ChildId::new(i64::MAX)))
            .map(|(_, child)| *child)
    }

    fn members(&self, recipe: RecipeId, relation: Relation) -> Vec<Child> {
        self.member_ids(recipe, relation)
            .filter_map(|id| self.child(relation.kind(), id))
            .collect()
    }

    // ==================== Relations ====================

    pub fn clear_relation(&mut self, recipe: RecipeId, relation: Relation) -> Result<(), StorageError> {
        if !self.recipes.contains_key(&recipe) {
            return Err(StorageError::not_found("recipe", recipe));
        }
        self.links_mut(relation).retain(|(r, _)| *r != recipe);
        Ok(())
    }

    pub fn add_to_relation(
        &mut self,
        recipe: RecipeId,
        relation: Relation,
        child: ChildId,
    ) -> Result<(), StorageError> {
        let recipe_owner = self
            .recipes
            .get(&recipe)
            .map(|row| row.owner)
            .ok_or_else(|| StorageError::not_found("recipe", recipe))?;
        let kind = relation.kind();
        let child_owner = self
            .children(kind)
            .get(&child)
            .map(|row| row.owner)
            .ok_or_else(|| StorageError::not_found(kind.as_str(), child))?;
        if recipe_owner != child_owner {
            return Err(StorageError::invalid_relation(format!(
                "{kind} {child} is not owned by the owner of recipe {recipe}"
            )));
        }
        self.links_mut(relation).insert((recipe, child));
        Ok(())
    }
}

fn to_child(kind: ChildKind, id: ChildId, row: &ChildRow) -> Child {
    Child {
        id,
        kind,
        owner: row.owner,
        name: row.name.clone(),
    }
}
