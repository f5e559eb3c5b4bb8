//! Authorization rule records and creation drafts.
//!
//! # Responsibility
//! - Define the persisted rule row shape (`larke_auth_rules`).
//! - Define nested, config-friendly drafts used to create rule trees.
//!
//! # Invariants
//! - `parent_id == ROOT_RULE_PARENT_ID` marks a root-level rule.
//! - `parent_id` is a plain back-reference; deleting a parent never cascades.

use serde::{Deserialize, Serialize};

/// Parent id used for root-level rules.
pub const ROOT_RULE_PARENT_ID: i64 = 0;

/// Persisted authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRule {
    pub id: i64,
    #[serde(rename = "parentid")]
    pub parent_id: i64,
    /// Display order, assigned as `max(listorder) + 1` on insert.
    #[serde(rename = "listorder")]
    pub list_order: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Field values for one rule insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthRule {
    pub parent_id: i64,
    pub list_order: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Declarative rule definition, usually read from extension configuration.
///
/// Missing fields stay `None`; they are not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<RuleDraft>,
}

impl RuleDraft {
    /// Creates a draft carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<RuleDraft>) -> Self {
        self.children = children;
        self
    }

    /// A draft with no field set and no children carries no data.
    ///
    /// Keys other than the rule columns and `children` are ignored when
    /// deserializing, so an entry made only of unknown keys is empty too.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.method.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.children.is_empty()
    }

    /// Depth of the subtree rooted at this draft (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + Self::forest_depth(&self.children)
    }

    /// Deepest subtree among `drafts`; `0` when there are none.
    ///
    /// Walks the drafts with an explicit stack so arbitrarily deep trees
    /// built in code cannot exhaust the call stack.
    pub fn forest_depth(drafts: &[RuleDraft]) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&RuleDraft, usize)> =
            drafts.iter().map(|draft| (draft, 1)).collect();
        while let Some((draft, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(draft.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Row values for inserting this draft under `parent_id`.
    pub fn to_new_rule(&self, parent_id: i64, list_order: i64) -> NewAuthRule {
        NewAuthRule {
            parent_id,
            list_order,
            title: self.title.clone(),
            url: self.url.clone(),
            method: self.method.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
        }
    }
}
