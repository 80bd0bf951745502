use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a relationship row reads. The two encodings describe the same
/// parent/child fact from opposite ends:
/// `CHILD` points from the parent to the child, `FATHER`/`MOTHER` point
/// from the child to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum RelationKind {
    Father,
    Mother,
    Child,
}

impl RelationKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "FATHER" => Some(Self::Father),
            "MOTHER" => Some(Self::Mother),
            "CHILD" => Some(Self::Child),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Father => "FATHER",
            Self::Mother => "MOTHER",
            Self::Child => "CHILD",
        }
    }
}

impl TryFrom<String> for RelationKind {
    type Error = String;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Self::from_token(&token).ok_or_else(|| format!("unknown relation type '{token}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default, alias = "fatherName")]
    pub father_name: Option<String>,
    #[serde(default, alias = "birthCity")]
    pub birth_city: Option<String>,
    #[serde(default)]
    pub ethnicity: Option<String>,
    #[serde(default)]
    pub dialect: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "ownerUserId")]
    pub owner_user_id: Option<String>,
}

impl Person {
    pub fn new(id: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.id.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(alias = "fromPersonId", alias = "from")]
    pub from_person_id: String,
    #[serde(alias = "toPersonId", alias = "to")]
    pub to_person_id: String,
    #[serde(alias = "relationType", alias = "kind")]
    pub relation_type: RelationKind,
    #[serde(default, alias = "ownerUserId", skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
}

impl Relationship {
    pub fn new(id: &str, from: &str, to: &str, relation_type: RelationKind) -> Self {
        Self {
            id: id.to_string(),
            from_person_id: from.to_string(),
            to_person_id: to.to_string(),
            relation_type,
            owner_user_id: None,
        }
    }
}

/// A relationship resolved to a single parent -> child direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalEdge {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
}

/// Everything the layout needs for one render: the root person, every
/// relationship owned by the signed-in user and the persons they touch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    #[serde(default)]
    pub root: Option<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, alias = "related_persons")]
    pub related_persons: Vec<Person>,
}

impl GraphSnapshot {
    /// Root plus related persons keyed by id. The root record wins over a
    /// duplicate entry in `related_persons`.
    pub fn person_map(&self) -> HashMap<String, Person> {
        let mut map = HashMap::with_capacity(self.related_persons.len() + 1);
        for person in &self.related_persons {
            map.insert(person.id.clone(), person.clone());
        }
        if let Some(root) = &self.root {
            map.insert(root.id.clone(), root.clone());
        }
        map
    }
}
