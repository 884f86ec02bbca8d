//! Nested tag/ingredient reconciliation.
//!
//! A recipe write may carry `tags` and `ingredients` as lists of name
//! descriptors. Each descriptor is resolved to one of the acting owner's
//! children (reused when the name already exists, created otherwise) and
//! attached to the recipe. [`apply_relation_update`] layers the absent /
//! empty / populated policy on top of [`reconcile`].
//!
//! Children that lose their last recipe are kept.

use recipebox_api::ApiError;
use recipebox_auth::AuthContext;
use recipebox_core::{
    Child, ChildDescriptor, ChildKind, CoreError, RecipeId, Relation, RelationUpdate, UserId,
    WriteMode,
};
use recipebox_storage::{ChildStore, StorageError};

/// Identity a write is performed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    owner: Option<UserId>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { owner: None }
    }

    pub fn for_owner(owner: UserId) -> Self {
        Self { owner: Some(owner) }
    }

    /// The acting owner.
    ///
    /// # Errors
    ///
    /// `ReconcileError::Unauthenticated` when the request carries no identity.
    pub fn owner(&self) -> Result<UserId, ReconcileError> {
        self.owner.ok_or(ReconcileError::Unauthenticated)
    }
}

impl From<&AuthContext> for RequestContext {
    fn from(auth: &AuthContext) -> Self {
        Self::for_owner(auth.owner())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    #[error("Invalid {relation} entry: {source}")]
    InvalidDescriptor {
        relation: Relation,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Unauthenticated => ApiError::unauthorized(err.to_string()),
            ReconcileError::InvalidDescriptor { relation, source } => {
                let message = match source.field() {
                    Some(field) => format!("{field}: {}", field_message(&source)),
                    None => source.to_string(),
                };
                ApiError::field(relation.as_str(), message)
            }
            ReconcileError::Storage(err) => err.into(),
        }
    }
}

fn field_message(err: &CoreError) -> String {
    match err {
        CoreError::InvalidField { message, .. } => message.clone(),
        CoreError::MissingField(_) => "This field is required.".to_string(),
        CoreError::InvalidId(id) => format!("Invalid id '{id}'"),
    }
}

/// Resolves every descriptor to an owned child and attaches it to `recipe`.
///
/// Attachment is additive: members already present stay. Descriptors that
/// resolve to the same child are attached once.
pub async fn reconcile<S>(
    store: &mut S,
    ctx: &RequestContext,
    recipe: RecipeId,
    relation: Relation,
    descriptors: &[ChildDescriptor],
) -> Result<(), ReconcileError>
where
    S: ChildStore + ?Sized,
{
    let owner = ctx.owner()?;
    let kind = relation.kind();

    // Reject the whole batch before touching storage.
    let names = descriptors
        .iter()
        .map(|d| d.natural_key())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ReconcileError::InvalidDescriptor { relation, source })?;

    let mut resolved: Vec<Child> = Vec::with_capacity(names.len());
    for name in names {
        let child = get_or_create(store, kind, owner, name).await?;
        if !resolved.iter().any(|c| c.id == child.id) {
            resolved.push(child);
        }
    }

    for child in &resolved {
        store.add_to_relation(recipe, relation, child.id).await?;
    }

    tracing::debug!(
        recipe_id = %recipe,
        relation = %relation,
        attached = resolved.len(),
        "Relation reconciled"
    );
    Ok(())
}

/// Applies one relation field of a write payload.
///
/// `resolve(mode)` decides: `None` leaves the relation untouched, an empty
/// slice clears it, and a populated slice clears it and reconciles.
pub async fn apply_relation_update<S>(
    store: &mut S,
    ctx: &RequestContext,
    recipe: RecipeId,
    relation: Relation,
    update: &RelationUpdate<ChildDescriptor>,
    mode: WriteMode,
) -> Result<(), ReconcileError>
where
    S: ChildStore + ?Sized,
{
    ctx.owner()?;
    let Some(descriptors) = update.resolve(mode) else {
        return Ok(());
    };

    store.clear_relation(recipe, relation).await?;
    if descriptors.is_empty() {
        return Ok(());
    }
    reconcile(store, ctx, recipe, relation, descriptors).await
}

/// Find, else insert. A uniqueness violation on insert means a concurrent
/// writer created the row first; the row is then looked up and reused.
async fn get_or_create<S>(
    store: &mut S,
    kind: ChildKind,
    owner: UserId,
    name: &str,
) -> Result<Child, ReconcileError>
where
    S: ChildStore + ?Sized,
{
    if let Some(existing) = store.find_child(kind, owner, name).await? {
        tracing::trace!(kind = %kind, child_id = %existing.id, name = %name, "Reusing existing child");
        return Ok(existing);
    }

    match store.create_child(kind, owner, name).await {
        Ok(child) => {
            tracing::debug!(kind = %kind, child_id = %child.id, name = %name, "Created child");
            Ok(child)
        }
        Err(err) if err.is_already_exists() => match store.find_child(kind, owner, name).await? {
            Some(child) => {
                tracing::warn!(
                    kind = %kind,
                    child_id = %child.id,
                    name = %name,
                    "Lost create race, reusing concurrently created child"
                );
                Ok(child)
            }
            None => Err(err.into()),
        },
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use recipebox_core::ChildId;

    use super::*;

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);
    const RECIPE: RecipeId = RecipeId::new(10);

    /// Child store over plain maps. With `lose_races` set, the first insert
    /// of each name is committed "by someone else" and reported as a conflict.
    #[derive(Default)]
    struct FakeStore {
        children: BTreeMap<ChildId, Child>,
        links: Vec<(RecipeId, Relation, ChildId)>,
        creates: usize,
        lose_races: bool,
        clears: usize,
    }

    impl FakeStore {
        fn insert(&mut self, kind: ChildKind, owner: UserId, name: &str) -> Child {
            let child = Child {
                id: ChildId::new(self.children.len() as i64 + 1),
                kind,
                owner,
                name: name.to_string(),
            };
            self.children.insert(child.id, child.clone());
            child
        }

        fn members(&self, relation: Relation) -> Vec<String> {
            self.links
                .iter()
                .filter(|(r, rel, _)| *r == RECIPE && *rel == relation)
                .map(|(_, _, id)| self.children[id].name.clone())
                .collect()
        }

        fn owned(&self, owner: UserId) -> Vec<&Child> {
            self.children.values().filter(|c| c.owner == owner).collect()
        }
    }

    #[async_trait]
    impl ChildStore for FakeStore {
        async fn find_child(
            &mut self,
            kind: ChildKind,
            owner: UserId,
            name: &str,
        ) -> Result<Option<Child>, StorageError> {
            Ok(self
                .children
                .values()
                .find(|c| c.kind == kind && c.owner == owner && c.name == name)
                .cloned())
        }

        async fn create_child(
            &mut self,
            kind: ChildKind,
            owner: UserId,
            name: &str,
        ) -> Result<Child, StorageError> {
            if self.lose_races {
                self.insert(kind, owner, name);
                return Err(StorageError::already_exists(kind.as_str(), name));
            }
            self.creates += 1;
            Ok(self.insert(kind, owner, name))
        }

        async fn clear_relation(
            &mut self,
            recipe: RecipeId,
            relation: Relation,
        ) -> Result<(), StorageError> {
            self.clears += 1;
            self.links
                .retain(|(r, rel, _)| !(*r == recipe && *rel == relation));
            Ok(())
        }

        async fn add_to_relation(
            &mut self,
            recipe: RecipeId,
            relation: Relation,
            child: ChildId,
        ) -> Result<(), StorageError> {
            if !self.links.contains(&(recipe, relation, child)) {
                self.links.push((recipe, relation, child));
            }
            Ok(())
        }
    }

    fn names(list: &[&str]) -> Vec<ChildDescriptor> {
        list.iter().map(|n| ChildDescriptor::new(*n)).collect()
    }

    fn alice() -> RequestContext {
        RequestContext::for_owner(ALICE)
    }

    #[tokio::test]
    async fn reconciling_twice_is_idempotent() {
        let mut store = FakeStore::default();
        let tags = names(&["Vegan"]);

        reconcile(&mut store, &alice(), RECIPE, Relation::Tags, &tags)
            .await
            .unwrap();
        reconcile(&mut store, &alice(), RECIPE, Relation::Tags, &tags)
            .await
            .unwrap();

        assert_eq!(store.creates, 1);
        assert_eq!(store.members(Relation::Tags), vec!["Vegan"]);
    }

    #[tokio::test]
    async fn owners_never_share_children() {
        let mut store = FakeStore::default();
        store.insert(ChildKind::Tag, BOB, "Lunch");

        reconcile(&mut store, &alice(), RECIPE, Relation::Tags, &names(&["Lunch"]))
            .await
            .unwrap();

        assert_eq!(store.creates, 1);
        let lunch = store.owned(ALICE);
        assert_eq!(lunch.len(), 1);
        assert_eq!(lunch[0].name, "Lunch");
        assert_eq!(store.owned(BOB).len(), 1);
    }

    #[tokio::test]
    async fn duplicate_descriptors_create_once() {
        let mut store = FakeStore::default();
        apply_relation_update(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Tags,
            &RelationUpdate::Replace(names(&["X", "X"])),
            WriteMode::Full,
        )
        .await
        .unwrap();

        assert_eq!(store.creates, 1);
        assert_eq!(store.members(Relation::Tags), vec!["X"]);
    }

    #[tokio::test]
    async fn lost_race_reuses_the_winner() {
        let mut store = FakeStore {
            lose_races: true,
            ..FakeStore::default()
        };

        reconcile(&mut store, &alice(), RECIPE, Relation::Ingredients, &names(&["Salt"]))
            .await
            .unwrap();

        assert_eq!(store.creates, 0);
        assert_eq!(store.owned(ALICE).len(), 1);
        assert_eq!(store.members(Relation::Ingredients), vec!["Salt"]);
    }

    #[tokio::test]
    async fn anonymous_requests_are_rejected() {
        let mut store = FakeStore::default();
        let err = reconcile(
            &mut store,
            &RequestContext::anonymous(),
            RECIPE,
            Relation::Tags,
            &names(&["Vegan"]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ReconcileError::Unauthenticated));
        assert!(store.children.is_empty());
    }

    #[tokio::test]
    async fn blank_descriptor_is_invalid_input() {
        let mut store = FakeStore::default();
        let err = reconcile(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Tags,
            &names(&["Vegan", "  "]),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::InvalidDescriptor {
                relation: Relation::Tags,
                ..
            }
        ));
        assert!(store.children.is_empty());

        let api: ApiError = err.into();
        let doc = api.to_document();
        assert_eq!(doc.status, 400);
        assert!(doc.errors.unwrap()["tags"].is_array());
    }

    #[tokio::test]
    async fn partial_update_tri_state() {
        let mut store = FakeStore::default();
        reconcile(&mut store, &alice(), RECIPE, Relation::Tags, &names(&["A", "B"]))
            .await
            .unwrap();

        // Absent: untouched
        apply_relation_update(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Tags,
            &RelationUpdate::Unchanged,
            WriteMode::Partial,
        )
        .await
        .unwrap();
        assert_eq!(store.members(Relation::Tags), vec!["A", "B"]);
        assert_eq!(store.clears, 0);

        // Populated: replaced
        apply_relation_update(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Tags,
            &RelationUpdate::Replace(names(&["C"])),
            WriteMode::Partial,
        )
        .await
        .unwrap();
        assert_eq!(store.members(Relation::Tags), vec!["C"]);

        // Empty: cleared
        apply_relation_update(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Tags,
            &RelationUpdate::Replace(Vec::new()),
            WriteMode::Partial,
        )
        .await
        .unwrap();
        assert!(store.members(Relation::Tags).is_empty());

        // Orphans are kept.
        assert_eq!(store.owned(ALICE).len(), 3);
    }

    #[tokio::test]
    async fn full_replace_clears_absent_relation() {
        let mut store = FakeStore::default();
        reconcile(&mut store, &alice(), RECIPE, Relation::Ingredients, &names(&["Salt"]))
            .await
            .unwrap();

        apply_relation_update(
            &mut store,
            &alice(),
            RECIPE,
            Relation::Ingredients,
            &RelationUpdate::Unchanged,
            WriteMode::Full,
        )
        .await
        .unwrap();

        assert!(store.members(Relation::Ingredients).is_empty());
        assert_eq!(store.clears, 1);
    }

    #[tokio::test]
    async fn relations_are_independent() {
        let mut store = FakeStore::default();
        reconcile(&mut store, &alice(), RECIPE, Relation::Tags, &names(&["Thai"]))
            .await
            .unwrap();
        reconcile(&mut store, &alice(), RECIPE, Relation::Ingredients, &names(&["Thai"]))
            .await
            .unwrap();

        assert_eq!(store.creates, 2);
        assert_eq!(store.members(Relation::Tags), vec!["Thai"]);
        assert_eq!(store.members(Relation::Ingredients), vec!["Thai"]);
    }
}
