//! Person and relationship records.
//!
//! This is the edge where loosely shaped payloads become typed records.
//! Everything downstream (layout, rendering, export) trusts what comes out
//! of here and never re-validates it.

use crate::ir::{GraphSnapshot, Person, RelationKind, Relationship};
use crate::layout::normalize;
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("person '{0}' not found")]
    NotFound(String),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse graph snapshot: {0}")]
    Parse(String),
}

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("url pattern is valid")
});

/// Anything that can hand the layout its input for the signed-in user.
pub trait GraphSource {
    fn fetch_root_and_graph(&self, session: &Session) -> Result<GraphSnapshot, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub father_name: Option<String>,
    pub birth_city: Option<String>,
    pub ethnicity: Option<String>,
    pub dialect: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

impl NewPerson {
    pub fn named(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

/// Partial edit of the root profile. A missing field is left alone; an
/// explicit `null` clears one of the optional attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootUpdate {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "fatherName", deserialize_with = "nullable")]
    pub father_name: Option<Option<String>>,
    #[serde(default, alias = "birthCity", deserialize_with = "nullable")]
    pub birth_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub ethnicity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub dialect: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, alias = "avatarUrl", deserialize_with = "nullable")]
    pub avatar_url: Option<Option<String>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RootUpdate {
    fn validate(&self) -> Result<(), StoreError> {
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(StoreError::Invalid(format!("{field} must not be empty")));
            }
        }
        if let Some(Some(url)) = &self.avatar_url {
            if !URL_RE.is_match(url.trim()) {
                return Err(StoreError::Invalid(format!("avatar_url '{url}' is not a URL")));
            }
        }
        Ok(())
    }

    fn apply(self, person: &mut Person) {
        if let Some(v) = self.first_name {
            person.first_name = v.trim().to_string();
        }
        if let Some(v) = self.last_name {
            person.last_name = v.trim().to_string();
        }
        let optional = [
            (self.father_name, &mut person.father_name),
            (self.birth_city, &mut person.birth_city),
            (self.ethnicity, &mut person.ethnicity),
            (self.dialect, &mut person.dialect),
            (self.description, &mut person.description),
            (self.avatar_url, &mut person.avatar_url),
        ];
        for (value, slot) in optional {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Direct parents and children of one person.
#[derive(Debug, Clone)]
pub struct Family {
    pub person: Person,
    pub parents: Vec<Person>,
    pub children: Vec<Person>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone)]
struct StoredPerson {
    seq: u64,
    person: Person,
}

/// In-process record store, scoped by owner the same way the hosted
/// tables are.
#[derive(Debug, Default)]
pub struct MemoryStore {
    persons: Vec<StoredPerson>,
    relationships: Vec<Relationship>,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_person(&mut self, session: &Session, new: NewPerson) -> Result<Person, StoreError> {
        let first_name = new.first_name.trim();
        let last_name = new.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(StoreError::Invalid(
                "first and last name are required".to_string(),
            ));
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        let id = match new.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            Some(_) => return Err(StoreError::Invalid("person id is blank".to_string())),
            None => format!("p{seq}"),
        };
        if self.persons.iter().any(|stored| stored.person.id == id) {
            return Err(StoreError::Invalid(format!("person id '{id}' already exists")));
        }
        let person = Person {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            father_name: new.father_name,
            birth_city: new.birth_city,
            ethnicity: new.ethnicity,
            dialect: new.dialect,
            description: new.description,
            avatar_url: new.avatar_url,
            created_at: None,
            owner_user_id: Some(session.user_id().to_string()),
        };
        self.persons.push(StoredPerson {
            seq,
            person: person.clone(),
        });
        tracing::debug!(id = %person.id, "person added");
        Ok(person)
    }

    pub fn add_relationship(
        &mut self,
        session: &Session,
        from: &str,
        to: &str,
        kind: RelationKind,
    ) -> Result<Relationship, StoreError> {
        if from == to {
            return Err(StoreError::Invalid(
                "a person cannot be related to themselves".to_string(),
            ));
        }
        for id in [from, to] {
            if self.owned_person(session, id).is_none() {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        let rel = Relationship {
            id: format!("r{}", self.relationships.len() + 1),
            from_person_id: from.to_string(),
            to_person_id: to.to_string(),
            relation_type: kind,
            owner_user_id: Some(session.user_id().to_string()),
        };
        self.relationships.push(rel.clone());
        tracing::debug!(id = %rel.id, from, to, kind = kind.as_str(), "relationship added");
        Ok(rel)
    }

    /// Edits the owner's root person (their earliest-created one).
    pub fn update_root(&mut self, session: &Session, update: RootUpdate) -> Result<Person, StoreError> {
        update.validate()?;
        let stored = self
            .persons
            .iter_mut()
            .filter(|stored| is_owner(session, &stored.person.owner_user_id))
            .min_by_key(|stored| stored.seq)
            .ok_or_else(|| StoreError::NotFound(format!("root of {}", session.user_id())))?;
        update.apply(&mut stored.person);
        tracing::debug!(id = %stored.person.id, "root profile updated");
        Ok(stored.person.clone())
    }

    /// Owned persons in creation order.
    pub fn persons(&self, session: &Session) -> Vec<Person> {
        let mut owned: Vec<&StoredPerson> = self
            .persons
            .iter()
            .filter(|stored| is_owner(session, &stored.person.owner_user_id))
            .collect();
        owned.sort_by_key(|stored| stored.seq);
        owned.into_iter().map(|stored| stored.person.clone()).collect()
    }

    pub fn person(&self, session: &Session, id: &str) -> Result<Person, StoreError> {
        self.owned_person(session, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Parents and children of `person_id`, whichever way the rows were
    /// written.
    pub fn family_of(&self, session: &Session, person_id: &str) -> Result<Family, StoreError> {
        let person = self.person(session, person_id)?;
        let mut parents: Vec<String> = Vec::new();
        let mut children: Vec<String> = Vec::new();
        let mut relationships = Vec::new();

        for rel in self.owned_relationships(session) {
            if rel.from_person_id != person_id && rel.to_person_id != person_id {
                continue;
            }
            relationships.push(rel.clone());
            let pc = normalize(rel);
            if pc.child_id == person_id && pc.parent_id != person_id {
                push_unique(&mut parents, pc.parent_id);
            } else if pc.parent_id == person_id && pc.child_id != person_id {
                push_unique(&mut children, pc.child_id);
            }
        }

        Ok(Family {
            person,
            parents: self.resolve(session, &parents),
            children: self.resolve(session, &children),
            relationships,
        })
    }

    /// Outgoing relationships of one person and the persons they point to.
    pub fn expand(
        &self,
        session: &Session,
        person_id: &str,
    ) -> (Vec<Relationship>, Vec<Person>) {
        let rels: Vec<Relationship> = self
            .owned_relationships(session)
            .filter(|rel| rel.from_person_id == person_id)
            .cloned()
            .collect();
        let mut ids = Vec::new();
        for rel in &rels {
            push_unique(&mut ids, &rel.to_person_id);
        }
        let persons = self.resolve(session, &ids);
        (rels, persons)
    }

    fn owned_person(&self, session: &Session, id: &str) -> Option<&Person> {
        self.persons
            .iter()
            .map(|stored| &stored.person)
            .find(|person| person.id == id && is_owner(session, &person.owner_user_id))
    }

    fn owned_relationships<'a>(
        &'a self,
        session: &'a Session,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .iter()
            .filter(move |rel| is_owner(session, &rel.owner_user_id))
    }

    fn resolve(&self, session: &Session, ids: &[String]) -> Vec<Person> {
        ids.iter()
            .filter_map(|id| {
                let found = self.owned_person(session, id).cloned();
                if found.is_none() {
                    tracing::warn!(id = %id, "relationship references a missing person");
                }
                found
            })
            .collect()
    }
}

impl GraphSource for MemoryStore {
    fn fetch_root_and_graph(&self, session: &Session) -> Result<GraphSnapshot, StoreError> {
        let Some(root) = self.persons(session).into_iter().next() else {
            return Ok(GraphSnapshot::default());
        };
        let relationships: Vec<Relationship> =
            self.owned_relationships(session).cloned().collect();

        let mut ids = Vec::new();
        for rel in &relationships {
            push_unique(&mut ids, &rel.from_person_id);
            push_unique(&mut ids, &rel.to_person_id);
        }
        ids.retain(|id| *id != root.id);
        let related_persons = self.resolve(session, &ids);

        Ok(GraphSnapshot {
            root: Some(root),
            relationships,
            related_persons,
        })
    }
}

fn is_owner(session: &Session, owner: &Option<String>) -> bool {
    owner.as_deref() == Some(session.user_id())
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

/// A snapshot saved to disk, in the same shape the tree endpoint returns.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    snapshot: GraphSnapshot,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Strict JSON first; JSON5 (comments, trailing commas) for hand-edited
    /// files.
    pub fn parse(contents: &str) -> Result<Self, StoreError> {
        let snapshot = match serde_json::from_str::<GraphSnapshot>(contents) {
            Ok(snapshot) => snapshot,
            Err(json_err) => json5::from_str::<GraphSnapshot>(contents)
                .map_err(|_| StoreError::Parse(json_err.to_string()))?,
        };
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_snapshot(mut snapshot: GraphSnapshot) -> Self {
        if let Some(root) = &snapshot.root {
            let root_id = root.id.clone();
            snapshot.related_persons.retain(|person| person.id != root_id);
        }
        let mut seen = HashSet::new();
        snapshot
            .related_persons
            .retain(|person| seen.insert(person.id.clone()));
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }
}

impl GraphSource for SnapshotFile {
    fn fetch_root_and_graph(&self, _session: &Session) -> Result<GraphSnapshot, StoreError> {
        Ok(self.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeMode;

    fn session(user: &str) -> Session {
        Session::sign_in(user, ThemeMode::Light)
    }

    #[test]
    fn earliest_person_is_root() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        let root = store.add_person(&me, NewPerson::named("Ali", "Rahimi")).unwrap();
        let father = store.add_person(&me, NewPerson::named("Reza", "Rahimi")).unwrap();
        store
            .add_relationship(&me, &root.id, &father.id, RelationKind::Father)
            .unwrap();

        let snapshot = store.fetch_root_and_graph(&me).unwrap();
        assert_eq!(snapshot.root.unwrap().id, root.id);
        assert_eq!(snapshot.relationships.len(), 1);
        assert_eq!(snapshot.related_persons.len(), 1);
        assert_eq!(snapshot.related_persons[0].id, father.id);
    }

    #[test]
    fn no_person_means_no_root() {
        let store = MemoryStore::new();
        let snapshot = store.fetch_root_and_graph(&session("u1")).unwrap();
        assert!(snapshot.root.is_none());
        assert!(snapshot.relationships.is_empty());
    }

    #[test]
    fn records_are_owner_scoped() {
        let me = session("u1");
        let other = session("u2");
        let mut store = MemoryStore::new();
        let mine = store.add_person(&me, NewPerson::named("Ali", "Rahimi")).unwrap();
        let theirs = store.add_person(&other, NewPerson::named("Sara", "Karimi")).unwrap();

        assert!(matches!(
            store.add_relationship(&me, &mine.id, &theirs.id, RelationKind::Child),
            Err(StoreError::NotFound(id)) if id == theirs.id
        ));
        assert_eq!(store.persons(&me).len(), 1);
        let snapshot = store.fetch_root_and_graph(&other).unwrap();
        assert_eq!(snapshot.root.unwrap().id, theirs.id);
    }

    #[test]
    fn rejects_invalid_input() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.add_person(&me, NewPerson::named(" ", "Rahimi")),
            Err(StoreError::Invalid(_))
        ));
        let p = store.add_person(&me, NewPerson::named("Ali", "Rahimi")).unwrap();
        assert!(matches!(
            store.add_relationship(&me, &p.id, &p.id, RelationKind::Child),
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.add_person(&me, NewPerson::named("Ali", "Again").with_id(&p.id)),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn family_reads_both_encodings() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        let r = store.add_person(&me, NewPerson::named("Ali", "R").with_id("R")).unwrap();
        store.add_person(&me, NewPerson::named("Reza", "R").with_id("F")).unwrap();
        store.add_person(&me, NewPerson::named("Mina", "M").with_id("M")).unwrap();
        store.add_person(&me, NewPerson::named("Kian", "R").with_id("K")).unwrap();
        store.add_person(&me, NewPerson::named("Nika", "R").with_id("N")).unwrap();

        store.add_relationship(&me, "R", "F", RelationKind::Father).unwrap();
        store.add_relationship(&me, "M", "R", RelationKind::Child).unwrap();
        store.add_relationship(&me, "R", "K", RelationKind::Child).unwrap();
        store.add_relationship(&me, "N", "R", RelationKind::Mother).unwrap();
        // Same fact twice.
        store.add_relationship(&me, "F", "R", RelationKind::Child).unwrap();

        let family = store.family_of(&me, &r.id).unwrap();
        let parents: Vec<&str> = family.parents.iter().map(|p| p.id.as_str()).collect();
        let children: Vec<&str> = family.children.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(parents, ["F", "M"]);
        assert_eq!(children, ["K", "N"]);
        assert_eq!(family.relationships.len(), 5);
    }

    #[test]
    fn expand_follows_outgoing_rows() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        store.add_person(&me, NewPerson::named("Ali", "R").with_id("R")).unwrap();
        store.add_person(&me, NewPerson::named("Reza", "R").with_id("F")).unwrap();
        store.add_person(&me, NewPerson::named("Kian", "R").with_id("K")).unwrap();
        store.add_relationship(&me, "R", "F", RelationKind::Father).unwrap();
        store.add_relationship(&me, "K", "R", RelationKind::Father).unwrap();

        let (rels, persons) = store.expand(&me, "R");
        assert_eq!(rels.len(), 1);
        assert_eq!(persons[0].id, "F");
    }

    #[test]
    fn root_update_edits_earliest_person() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        let root = store
            .add_person(
                &me,
                NewPerson {
                    ethnicity: Some("Kurd".to_string()),
                    dialect: Some("Sorani".to_string()),
                    ..NewPerson::named("Ali", "Rahimi")
                },
            )
            .unwrap();
        store.add_person(&me, NewPerson::named("Reza", "Rahimi")).unwrap();

        let update: RootUpdate = serde_json::from_str(
            r#"{"first_name": "Aliakbar", "dialect": null, "avatar_url": "https://example.org/a.png"}"#,
        )
        .unwrap();
        let updated = store.update_root(&me, update).unwrap();
        assert_eq!(updated.id, root.id);
        assert_eq!(updated.first_name, "Aliakbar");
        assert_eq!(updated.last_name, "Rahimi");
        assert_eq!(updated.ethnicity.as_deref(), Some("Kurd"));
        assert_eq!(updated.dialect, None);
        assert_eq!(updated.avatar_url.as_deref(), Some("https://example.org/a.png"));

        let snapshot = store.fetch_root_and_graph(&me).unwrap();
        assert_eq!(snapshot.root.unwrap().first_name, "Aliakbar");
    }

    #[test]
    fn root_update_rejects_bad_fields() {
        let me = session("u1");
        let mut store = MemoryStore::new();
        store.add_person(&me, NewPerson::named("Ali", "Rahimi")).unwrap();

        let blank = RootUpdate {
            last_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.update_root(&me, blank), Err(StoreError::Invalid(_))));

        let bad_url = RootUpdate {
            avatar_url: Some(Some("not a url".to_string())),
            ..Default::default()
        };
        assert!(matches!(store.update_root(&me, bad_url), Err(StoreError::Invalid(_))));
        assert_eq!(store.persons(&me)[0].last_name, "Rahimi");
    }

    #[test]
    fn root_update_needs_a_person() {
        let me = session("u1");
        let other = session("u2");
        let mut store = MemoryStore::new();
        store.add_person(&other, NewPerson::named("Sara", "Karimi")).unwrap();
        assert!(matches!(
            store.update_root(&me, RootUpdate::default()),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.persons(&other)[0].first_name, "Sara");
    }

    #[test]
    fn snapshot_file_accepts_json5() {
        let file = SnapshotFile::parse(
            r#"{
                // hand edited
                root: {id: "R", first_name: "Ali", last_name: "R"},
                relationships: [
                    {id: "1", from_person_id: "R", to_person_id: "F", relation_type: "FATHER"},
                ],
                relatedPersons: [
                    {id: "F", first_name: "Reza", last_name: "R"},
                    {id: "R", first_name: "Ali", last_name: "R"},
                ],
            }"#,
        )
        .unwrap();
        let snapshot = file.fetch_root_and_graph(&session("u1")).unwrap();
        assert_eq!(snapshot.relationships.len(), 1);
        assert_eq!(snapshot.related_persons.len(), 1);
    }

    #[test]
    fn snapshot_file_reports_parse_errors() {
        assert!(matches!(
            SnapshotFile::parse("{ not json"),
            Err(StoreError::Parse(_))
        ));
        assert!(matches!(
            SnapshotFile::load(Path::new("/definitely/missing.json")),
            Err(StoreError::Io { .. })
        ));
    }
}
