use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Local};
use tokio::sync::RwLock;

use crate::data_types::{
    recipe_data_types::{Classification, Comment, Recipe, User},
    ItemKey,
};
use crate::recipe_engine::{
    match_annotator::AnnotatedRecipe,
    recipe_filter::{ChipAvailability, FilterCriteria},
    selection_store::SelectionStore,
    visible_recipes, ItemKind,
};

/// chat_id -> session. Lives in memory only, a restart forgets everything.
pub type SessionStore = Arc<RwLock<BTreeMap<i64, ScanSession>>>;

/// Last photo sent to the classifier, kept so a manual pick can be sent back as training data.
#[derive(Debug, Clone)]
pub struct ScannedPhoto {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub classification: Classification,
}

#[derive(Debug, Clone)]
pub struct CandidateList {
    pub recipes: Vec<Recipe>,
    pub chips: ChipAvailability,
}

impl CandidateList {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        CandidateList {
            chips: ChipAvailability::from_candidates(&recipes),
            recipes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipState {
    pub name: String,
    pub enabled: bool,
    pub selected: bool,
}

/// One scanning session, from /start until the next /start.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub started_at: DateTime<Local>,
    pub selection: SelectionStore,
    pub criteria: FilterCriteria,
    pub candidates: Option<CandidateList>,
    pub last_photo: Option<ScannedPhoto>,
    pub user: Option<User>,
    // names behind the last option keyboard of each kind
    search_options: BTreeMap<ItemKind, Vec<String>>,
    // recipe_id -> comments written in this chat, newest first
    local_comments: BTreeMap<i64, Vec<Comment>>,
}

impl Default for ScanSession {
    fn default() -> Self {
        ScanSession {
            started_at: Local::now(),
            selection: SelectionStore::default(),
            criteria: FilterCriteria::default(),
            candidates: None,
            last_photo: None,
            user: None,
            search_options: BTreeMap::new(),
            local_comments: BTreeMap::new(),
        }
    }
}

impl ScanSession {
    /// Back to the landing state. The logged in user survives.
    pub fn restart(&mut self) {
        let user = self.user.take();
        *self = ScanSession {
            user,
            ..ScanSession::default()
        };
    }

    /// Adds to the history. A beverage consumes the pending photo, which is handed
    /// back for retraining only when the name was picked by hand.
    pub fn add_history_entry(
        &mut self,
        kind: ItemKind,
        name: &str,
        retrain: bool,
    ) -> (bool, Option<ScannedPhoto>) {
        let added = self.selection.add(kind, name);
        let photo = match kind {
            ItemKind::Beverage => self.last_photo.take().filter(|_| retrain),
            ItemKind::Ingredient => None,
        };
        (added, photo)
    }

    /// Removes an entry and its filter chip.
    pub fn remove_history_entry(&mut self, kind: ItemKind, name: &str) -> bool {
        self.criteria.deselect(kind, name);
        self.selection.remove(kind, name)
    }

    pub fn history_entry(&self, kind: ItemKind, key: ItemKey) -> Option<String> {
        key.find(self.selection.entries(kind)).cloned()
    }

    pub fn offer_search_options(&mut self, kind: ItemKind, options: Vec<String>) {
        self.search_options.insert(kind, options);
    }

    pub fn search_option(&self, kind: ItemKind, key: ItemKey) -> Option<String> {
        key.find(self.search_options.get(&kind)?).cloned()
    }

    /// The recognized name of the pending photo, if the key still points at it.
    pub fn recognized_name(&self, key: ItemKey) -> Option<String> {
        match &self.last_photo.as_ref()?.classification {
            Classification::Recognized(name) if ItemKey::of(name) == key => Some(name.clone()),
            _ => None,
        }
    }

    /// A new candidate list invalidates chip availability and the previous filter.
    pub fn set_candidates(&mut self, recipes: Vec<Recipe>) {
        self.candidates = Some(CandidateList::new(recipes));
        self.criteria.reset();
    }

    /// Ranked and filtered view, `None` until recipes were fetched.
    pub fn visible_recipes(&self) -> Option<Vec<AnnotatedRecipe<'_>>> {
        let candidates = self.candidates.as_ref()?;
        Some(visible_recipes(
            &candidates.recipes,
            &self.selection.snapshot(),
            &self.criteria,
        ))
    }

    pub fn candidate(&self, recipe_id: i64) -> Option<&Recipe> {
        self.candidates
            .as_ref()?
            .recipes
            .iter()
            .find(|r| r.id == recipe_id)
    }

    /// Replaces a candidate with fresher data from the detail endpoint. A detail
    /// without any links keeps the cached ones.
    pub fn refresh_candidate(&mut self, mut recipe: Recipe) {
        if let Some(candidates) = self.candidates.as_mut() {
            if let Some(slot) = candidates.recipes.iter_mut().find(|r| r.id == recipe.id) {
                if recipe.beverages.is_empty() && recipe.ingredients.is_empty() {
                    recipe.beverages = std::mem::take(&mut slot.beverages);
                    recipe.ingredients = std::mem::take(&mut slot.ingredients);
                }
                *slot = recipe;
            }
        }
    }

    /// Filter chips are offered for the history, disabled when no candidate uses them.
    pub fn chips(&self, kind: ItemKind) -> Vec<ChipState> {
        self.selection
            .entries(kind)
            .iter()
            .map(|name| ChipState {
                name: name.clone(),
                enabled: self
                    .candidates
                    .as_ref()
                    .map(|c| c.chips.is_enabled(kind, name))
                    .unwrap_or(false),
                selected: self.criteria.is_selected(kind, name),
            })
            .collect()
    }

    pub fn prepend_local_comment(&mut self, comment: Comment) {
        if let Some(recipe_id) = comment.recipe_id {
            self.local_comments
                .entry(recipe_id)
                .or_default()
                .insert(0, comment);
        }
    }

    /// Local comments first, then server ones. A server comment with the same
    /// author and text replaces its local copy.
    pub fn merged_comments(&mut self, recipe_id: i64, remote: Vec<Comment>) -> Vec<Comment> {
        let local = self.local_comments.entry(recipe_id).or_default();
        local.retain(|l| {
            !remote
                .iter()
                .any(|r| r.user_id == l.user_id && r.content == l.content)
        });

        let mut merged = local.clone();
        for comment in remote {
            if !merged.iter().any(|c| c.id == comment.id) {
                merged.push(comment);
            }
        }
        merged
    }
}

/// Runs `f` on the session of `chat_id`, creating it on first use.
pub async fn with_session<R>(
    sessions: &SessionStore,
    chat_id: i64,
    f: impl FnOnce(&mut ScanSession) -> R,
) -> R {
    let mut sessions = sessions.write().await;
    f(sessions.entry(chat_id).or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::recipe_data_types::CommentId;
    use crate::test_support::recipe;

    fn remote_comment(id: i64, user_id: i64, content: &str) -> Comment {
        Comment {
            id: CommentId::Remote(id),
            content: content.to_string(),
            user_id: Some(user_id),
            recipe_id: Some(1),
        }
    }

    #[test]
    fn scenario_fernet_ranks_first_and_filters_alone() {
        let mut session = ScanSession::default();
        session.selection.add(ItemKind::Beverage, "Fernet");
        session.set_candidates(vec![
            recipe(1, "Gin Tonic", &["Gin", "Tonica"], &["Hielo", "Pepino"]),
            recipe(2, "Fernet", &["Fernet"], &["Hielo"]),
        ]);

        let visible = session.visible_recipes().unwrap();
        assert_eq!(visible[0].recipe.name, "Fernet");
        assert_eq!((visible[0].beverages_actual, visible[0].beverages_total), (1, 1));
        assert_eq!((visible[1].beverages_actual, visible[1].beverages_total), (0, 2));

        session.criteria.toggle(ItemKind::Beverage, "fernet");
        let visible = session.visible_recipes().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].recipe.id, 2);
    }

    #[test]
    fn no_candidates_is_not_an_empty_list() {
        let mut session = ScanSession::default();
        assert!(session.visible_recipes().is_none());

        session.set_candidates(vec![]);
        assert_eq!(session.visible_recipes().map(|v| v.len()), Some(0));
    }

    #[test]
    fn new_candidates_reset_filters() {
        let mut session = ScanSession::default();
        session.criteria.set_search_text("gin");
        session.set_candidates(vec![recipe(1, "Mojito", &["Ron"], &[])]);

        assert!(session.criteria.is_empty());
    }

    #[test]
    fn chips_follow_history_and_candidates() {
        let mut session = ScanSession::default();
        session.selection.add(ItemKind::Beverage, "Ron");
        session.selection.add(ItemKind::Beverage, "Vino");
        session.set_candidates(vec![recipe(1, "Mojito", &["Ron"], &[])]);
        session.criteria.toggle(ItemKind::Beverage, "ron");

        let chips = session.chips(ItemKind::Beverage);
        assert_eq!(
            chips,
            [
                ChipState {
                    name: "Ron".into(),
                    enabled: true,
                    selected: true
                },
                ChipState {
                    name: "Vino".into(),
                    enabled: false,
                    selected: false
                },
            ]
        );
    }

    #[test]
    fn bare_detail_keeps_cached_links() {
        let mut session = ScanSession::default();
        session.set_candidates(vec![recipe(2, "Fernet", &["Fernet"], &["Hielo"])]);

        let mut detail = recipe(2, "Fernet con coca", &[], &[]);
        detail.comments = vec![remote_comment(1, 5, "clásico")];
        session.refresh_candidate(detail);

        let cached = session.candidate(2).unwrap();
        assert_eq!(cached.name, "Fernet con coca");
        assert_eq!(cached.beverages.len(), 1);
        assert_eq!(cached.comments.len(), 1);
    }

    fn photo(classification: Classification) -> ScannedPhoto {
        ScannedPhoto {
            bytes: vec![0xff, 0xd8],
            file_name: "file_1.jpg".into(),
            classification,
        }
    }

    #[test]
    fn removing_history_entry_clears_its_chip() {
        let mut session = ScanSession::default();
        session.selection.add(ItemKind::Beverage, "Ron");
        session.selection.add(ItemKind::Beverage, "Vino");
        session.set_candidates(vec![
            recipe(1, "Mojito", &["Ron"], &[]),
            recipe(2, "Clerico", &["Vino"], &[]),
        ]);
        session.criteria.toggle(ItemKind::Beverage, "ron");

        assert!(session.remove_history_entry(ItemKind::Beverage, "Ron"));

        assert!(session.criteria.is_empty());
        let names: Vec<_> = session
            .visible_recipes()
            .unwrap()
            .iter()
            .map(|r| r.recipe.name.clone())
            .collect();
        assert_eq!(names, ["Mojito", "Clerico"]);
    }

    #[test]
    fn ingredient_pick_keeps_photo_for_beverage_retrain() {
        let mut session = ScanSession::default();
        session.last_photo = Some(photo(Classification::Unrecognized));

        let (_, photo) = session.add_history_entry(ItemKind::Ingredient, "Hielo", true);
        assert!(photo.is_none());
        assert!(session.last_photo.is_some());

        let (added, photo) = session.add_history_entry(ItemKind::Beverage, "Fernet", true);
        assert!(added);
        assert_eq!(photo.map(|p| p.file_name), Some("file_1.jpg".to_string()));
        assert!(session.last_photo.is_none());
    }

    #[test]
    fn confirmed_scan_drops_photo_without_retrain() {
        let mut session = ScanSession::default();
        session.last_photo = Some(photo(Classification::Recognized("Vino".into())));

        let (_, photo) = session.add_history_entry(ItemKind::Beverage, "Vino", false);

        assert!(photo.is_none());
        assert!(session.last_photo.is_none());
    }

    #[test]
    fn keys_resolve_against_what_was_offered() {
        let mut session = ScanSession::default();
        let long = "licor de café artesanal añejado en barrica de roble francés";
        session.offer_search_options(ItemKind::Ingredient, vec![long.to_string()]);
        session.selection.add(ItemKind::Beverage, "Gancia");
        session.last_photo = Some(photo(Classification::Recognized("Ron".into())));

        assert_eq!(
            session.search_option(ItemKind::Ingredient, ItemKey::of(long)),
            Some(long.to_string())
        );
        assert_eq!(session.search_option(ItemKind::Beverage, ItemKey::of(long)), None);
        assert_eq!(
            session.history_entry(ItemKind::Beverage, ItemKey::of("gancia")),
            Some("Gancia".to_string())
        );
        assert_eq!(session.recognized_name(ItemKey::of("ron")), Some("Ron".to_string()));
        assert_eq!(session.recognized_name(ItemKey::of("vino")), None);
    }

    #[test]
    fn restart_keeps_user_but_forgets_history() {
        let mut session = ScanSession::default();
        session.user = Some(User {
            id: 7,
            name: None,
            username: Some("ana".into()),
            email: None,
        });
        session.selection.add(ItemKind::Ingredient, "Hielo");

        session.restart();

        assert!(session.selection.is_empty());
        assert_eq!(session.user.map(|u| u.id), Some(7));
    }

    #[test]
    fn local_comments_are_newest_first_and_deduped_against_server() {
        let mut session = ScanSession::default();
        session.prepend_local_comment(Comment::new_local("primero".into(), 3, 1));
        session.prepend_local_comment(Comment::new_local("segundo".into(), 3, 1));

        let merged = session.merged_comments(1, vec![remote_comment(10, 5, "viejo")]);
        let texts: Vec<_> = merged.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, ["segundo", "primero", "viejo"]);

        // server now knows "primero"
        let merged = session.merged_comments(
            1,
            vec![remote_comment(11, 3, "primero"), remote_comment(10, 5, "viejo")],
        );
        let texts: Vec<_> = merged.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, ["segundo", "primero", "viejo"]);
        assert_eq!(merged[1].id, CommentId::Remote(11));
    }

    #[tokio::test]
    async fn with_session_creates_on_first_use() {
        let sessions = SessionStore::default();

        let added = with_session(&sessions, 42, |s| s.selection.add(ItemKind::Beverage, "Gancia")).await;
        let again = with_session(&sessions, 42, |s| s.selection.add(ItemKind::Beverage, "gancia")).await;

        assert!(added);
        assert!(!again);
        assert_eq!(sessions.read().await.len(), 1);
    }
}
