//! Local collections kept in step with server-confirmed results.
//!
//! A [`Catalog`] holds the authoritative list plus a derived view (ids that
//! pass the current filter). The view is always recomputed from the list, so
//! applying the same filter twice yields the same view.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_TEAM_IMAGE, FavoriteKind, FavoriteLists, Match, STADIUM_IMAGES, Team};

/// Favorite ids for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesIndex {
    pub teams: BTreeSet<String>,
    pub matches: BTreeSet<String>,
}

impl FavoritesIndex {
    pub fn from_lists(lists: &FavoriteLists) -> Self {
        Self {
            teams: lists.teams.iter().cloned().collect(),
            matches: lists.matches.iter().cloned().collect(),
        }
    }

    pub fn to_lists(&self) -> FavoriteLists {
        FavoriteLists {
            teams: self.teams.iter().cloned().collect(),
            matches: self.matches.iter().cloned().collect(),
        }
    }

    pub fn set(&self, kind: FavoriteKind) -> &BTreeSet<String> {
        match kind {
            FavoriteKind::Team => &self.teams,
            FavoriteKind::Match => &self.matches,
        }
    }

    fn set_mut(&mut self, kind: FavoriteKind) -> &mut BTreeSet<String> {
        match kind {
            FavoriteKind::Team => &mut self.teams,
            FavoriteKind::Match => &mut self.matches,
        }
    }

    pub fn contains(&self, kind: FavoriteKind, id: &str) -> bool {
        self.set(kind).contains(id)
    }

    /// Records a server-confirmed add (`added == true`) or remove.
    pub fn apply_confirmed(&mut self, kind: FavoriteKind, id: &str, added: bool) {
        let set = self.set_mut(kind);
        if added {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }
}

/// Entities that can live in a [`Catalog`].
pub trait Listable: Clone {
    type Filter: Clone + Default;

    fn id(&self) -> &str;
    /// Presentation-only image picked once when the entity is first listed.
    fn pick_image(&self) -> String;
    fn passes(&self, filter: &Self::Filter, favorites: &FavoritesIndex) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter {
    pub search: String,
    pub group: Option<String>,
    pub favorites_only: bool,
}

impl Listable for Team {
    type Filter = TeamFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn pick_image(&self) -> String {
        self.flag_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEAM_IMAGE.to_string())
    }

    fn passes(&self, filter: &TeamFilter, favorites: &FavoritesIndex) -> bool {
        if filter.favorites_only && !favorites.contains(FavoriteKind::Team, &self.id) {
            return false;
        }
        if let Some(group) = filter.group.as_deref().filter(|g| !g.is_empty())
            && self.group.as_deref() != Some(group)
        {
            return false;
        }
        let needle = filter.search.trim();
        needle.is_empty()
            || contains_ci(&self.name, needle)
            || contains_ci(&self.country_name, needle)
            || self.code.as_deref().is_some_and(|c| contains_ci(c, needle))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub live_only: bool,
    pub favorites_only: bool,
    pub team_search: String,
}

impl Listable for Match {
    type Filter = MatchFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn pick_image(&self) -> String {
        STADIUM_IMAGES
            .choose(&mut rand::thread_rng())
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    fn passes(&self, filter: &MatchFilter, favorites: &FavoritesIndex) -> bool {
        if filter.live_only && !self.is_live() {
            return false;
        }
        if filter.favorites_only && !favorites.contains(FavoriteKind::Match, &self.id) {
            return false;
        }
        let needle = filter.team_search.trim();
        needle.is_empty()
            || contains_ci(&self.team_a.name, needle)
            || contains_ci(&self.team_b.name, needle)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listed<T> {
    pub entity: T,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct Catalog<T: Listable> {
    items: Vec<Listed<T>>,
    filter: T::Filter,
    view: Vec<String>,
}

impl<T: Listable> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filter: T::Filter::default(),
            view: Vec::new(),
        }
    }
}

impl<T: Listable> Catalog<T> {
    /// Replaces the whole list (initial load or manual refresh).
    ///
    /// Images already chosen for known ids are carried over.
    pub fn load(&mut self, entities: Vec<T>, favorites: &FavoritesIndex) {
        let previous = std::mem::take(&mut self.items);
        self.items = entities
            .into_iter()
            .map(|entity| {
                let image = previous
                    .iter()
                    .find(|l| l.entity.id() == entity.id())
                    .map(|l| l.image.clone())
                    .unwrap_or_else(|| entity.pick_image());
                Listed { entity, image }
            })
            .collect();
        self.refilter(favorites);
    }

    pub fn items(&self) -> &[Listed<T>] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Listed<T>> {
        self.items.iter().find(|l| l.entity.id() == id)
    }

    pub fn filter(&self) -> &T::Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: T::Filter, favorites: &FavoritesIndex) {
        self.filter = filter;
        self.refilter(favorites);
    }

    pub fn view_ids(&self) -> &[String] {
        &self.view
    }

    pub fn view(&self) -> Vec<&Listed<T>> {
        self.view.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Replaces a server-confirmed entity in place, keeping its image.
    ///
    /// Returns `false` (and changes nothing) when the id is not listed.
    pub fn apply_update(&mut self, entity: T, favorites: &FavoritesIndex) -> bool {
        let Some(slot) = self.items.iter_mut().find(|l| l.entity.id() == entity.id()) else {
            return false;
        };
        slot.entity = entity;
        self.refilter(favorites);
        true
    }

    /// Appends a newly created entity.
    pub fn insert(&mut self, entity: T, favorites: &FavoritesIndex) {
        if self.apply_update(entity.clone(), favorites) {
            return;
        }
        let image = entity.pick_image();
        self.items.push(Listed { entity, image });
        self.refilter(favorites);
    }

    pub fn remove(&mut self, id: &str, favorites: &FavoritesIndex) -> bool {
        let before = self.items.len();
        self.items.retain(|l| l.entity.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.refilter(favorites);
        }
        removed
    }

    /// Recomputes the derived view from the list and the current filter.
    pub fn refilter(&mut self, favorites: &FavoritesIndex) {
        self.view = self
            .items
            .iter()
            .filter(|l| l.entity.passes(&self.filter, favorites))
            .map(|l| l.entity.id().to_string())
            .collect();
    }
}
