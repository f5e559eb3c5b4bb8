//! Authorization rule tree creation from nested drafts.
//!
//! # Responsibility
//! - Create one rule per draft, children under their parent's new id.
//! - Assign `listorder` as `max(listorder) + 1` before every insert.
//!
//! # Invariants
//! - An empty draft creates nothing and yields `Ok(None)`.
//! - Tree depth is checked before the first insert; an over-deep tree
//!   leaves the store untouched.
//! - `listorder` is unique and increasing across sequential calls; a store
//!   already at `i64::MAX` yields `ListOrderOverflow` instead of wrapping.

use crate::model::auth_rule::{AuthRule, RuleDraft};
use crate::repo::rule_repo::RuleRepository;
use crate::repo::RepoError;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default maximum nesting depth for rule trees.
pub const DEFAULT_MAX_RULE_DEPTH: usize = 16;

/// Rule tree creation errors.
#[derive(Debug)]
pub enum RuleTreeError {
    Repo(RepoError),
    DepthExceeded { depth: usize, max_depth: usize },
    /// The stored maximum `listorder` has no successor.
    ListOrderOverflow { max_list_order: i64 },
}

impl Display for RuleTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::DepthExceeded { depth, max_depth } => write!(
                f,
                "rule tree depth {depth} exceeds maximum of {max_depth}"
            ),
            Self::ListOrderOverflow { max_list_order } => write!(
                f,
                "cannot assign listorder after stored maximum {max_list_order}"
            ),
        }
    }
}

impl Error for RuleTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::DepthExceeded { .. } | Self::ListOrderOverflow { .. } => None,
        }
    }
}

impl From<RepoError> for RuleTreeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Creates rule trees through a [`RuleRepository`].
pub struct RuleTreeBuilder<'r, R: RuleRepository> {
    repo: &'r R,
    max_depth: usize,
}

impl<'r, R: RuleRepository> RuleTreeBuilder<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self {
            repo,
            max_depth: DEFAULT_MAX_RULE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Creates `data` under `parent_id`, then `children` under the new rule.
    ///
    /// The `children` field of `data` itself is not read at this level; each
    /// entry of `children` forwards its own nested `children`.
    pub fn create_rule(
        &self,
        data: &RuleDraft,
        parent_id: i64,
        children: &[RuleDraft],
    ) -> Result<Option<AuthRule>, RuleTreeError> {
        if data.is_empty() {
            debug!("event=rule_create module=rules status=skip reason=empty_draft");
            return Ok(None);
        }

        let depth = 1 + RuleDraft::forest_depth(children);
        if depth > self.max_depth {
            return Err(RuleTreeError::DepthExceeded {
                depth,
                max_depth: self.max_depth,
            });
        }

        let mut created = 0usize;
        let root = self.insert_subtree(data, parent_id, children, &mut created)?;
        info!(
            "event=rule_tree_create module=rules status=ok root_id={} parent_id={} created={}",
            root.id, parent_id, created
        );
        Ok(Some(root))
    }

    /// Creates `draft` and its nested `children` under `parent_id`.
    pub fn create_rule_tree(
        &self,
        draft: &RuleDraft,
        parent_id: i64,
    ) -> Result<Option<AuthRule>, RuleTreeError> {
        self.create_rule(draft, parent_id, &draft.children)
    }

    fn insert_subtree(
        &self,
        data: &RuleDraft,
        parent_id: i64,
        children: &[RuleDraft],
        created: &mut usize,
    ) -> Result<AuthRule, RuleTreeError> {
        let max_list_order = self.repo.max_list_order()?;
        let list_order = max_list_order
            .checked_add(1)
            .ok_or(RuleTreeError::ListOrderOverflow { max_list_order })?;
        let rule = self.repo.insert_rule(&data.to_new_rule(parent_id, list_order))?;
        *created += 1;

        for child in children.iter().filter(|child| !child.is_empty()) {
            self.insert_subtree(child, rule.id, &child.children, created)?;
        }
        Ok(rule)
    }
}
