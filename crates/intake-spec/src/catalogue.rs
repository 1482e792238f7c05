use std::collections::HashMap;

use thiserror::Error;

use crate::lint::{LintReport, lint};
use crate::spec::{Branch, CatalogueSpec, Question, QuestionGroup};

const BUILTIN_CATALOGUE: &str = include_str!("../catalogue/iacuc_protocol.json");

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to parse catalogue: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("catalogue '{id}' is invalid: {report}")]
    Lint { id: String, report: LintReport },
}

/// Immutable registry of question groups and branches.
///
/// Every constructor runs the lint pass, so a `Catalogue` value never holds
/// dangling references.
#[derive(Debug, Clone)]
pub struct Catalogue {
    spec: CatalogueSpec,
    groups_by_id: HashMap<String, usize>,
    questions_by_id: HashMap<String, (usize, usize)>,
    branches_by_id: HashMap<String, usize>,
}

impl Catalogue {
    pub fn new(spec: CatalogueSpec) -> Result<Self, CatalogueError> {
        let report = lint(&spec);
        if !report.is_clean() {
            return Err(CatalogueError::Lint {
                id: spec.id.clone(),
                report,
            });
        }

        let mut groups_by_id = HashMap::new();
        let mut questions_by_id = HashMap::new();
        for (group_idx, group) in spec.groups.iter().enumerate() {
            groups_by_id.insert(group.id.clone(), group_idx);
            for (question_idx, question) in group.questions.iter().enumerate() {
                questions_by_id.insert(question.id.clone(), (group_idx, question_idx));
            }
        }
        let branches_by_id = spec
            .branches
            .iter()
            .enumerate()
            .map(|(idx, branch)| (branch.id.clone(), idx))
            .collect();

        log::debug!(
            "loaded catalogue '{}' v{}: {} groups, {} questions, {} branches",
            spec.id,
            spec.version,
            spec.groups.len(),
            questions_by_id.len(),
            spec.branches.len()
        );

        Ok(Self {
            spec,
            groups_by_id,
            questions_by_id,
            branches_by_id,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogueError> {
        let spec: CatalogueSpec = serde_json::from_str(json).map_err(CatalogueError::Parse)?;
        Self::new(spec)
    }

    /// The embedded IACUC protocol intake catalogue.
    pub fn builtin() -> Result<Self, CatalogueError> {
        Self::from_json_str(BUILTIN_CATALOGUE)
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn version(&self) -> &str {
        &self.spec.version
    }

    pub fn spec(&self) -> &CatalogueSpec {
        &self.spec
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &[QuestionGroup] {
        &self.spec.groups
    }

    /// Branches in declaration order.
    pub fn branches(&self) -> &[Branch] {
        &self.spec.branches
    }

    pub fn base_groups(&self) -> impl Iterator<Item = &QuestionGroup> {
        self.spec.groups.iter().filter(|group| group.is_base())
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.spec
            .groups
            .iter()
            .flat_map(|group| group.questions.iter())
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        let (group_idx, question_idx) = *self.questions_by_id.get(id)?;
        self.spec
            .groups
            .get(group_idx)
            .and_then(|group| group.questions.get(question_idx))
    }

    pub fn group(&self, id: &str) -> Option<&QuestionGroup> {
        self.groups_by_id
            .get(id)
            .and_then(|idx| self.spec.groups.get(*idx))
    }

    pub fn branch(&self, id: &str) -> Option<&Branch> {
        self.branches_by_id
            .get(id)
            .and_then(|idx| self.spec.branches.get(*idx))
    }

    /// Group that owns the given question.
    pub fn group_of(&self, question_id: &str) -> Option<&QuestionGroup> {
        let (group_idx, _) = *self.questions_by_id.get(question_id)?;
        self.spec.groups.get(group_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogue_loads() {
        let catalogue = Catalogue::builtin().expect("builtin catalogue");
        assert_eq!(catalogue.id(), "iacuc-protocol");
        assert!(catalogue.group("basic_info").is_some());
        assert!(catalogue.question("species").is_some());
        assert!(catalogue.branch("surgery_branch").is_some());
    }

    #[test]
    fn lookups_return_none_on_miss() {
        let catalogue = Catalogue::builtin().expect("builtin catalogue");
        assert!(catalogue.question("no_such_question").is_none());
        assert!(catalogue.group("no_such_group").is_none());
        assert!(catalogue.branch("no_such_branch").is_none());
    }

    #[test]
    fn every_branch_group_links_back() {
        let catalogue = Catalogue::builtin().expect("builtin catalogue");
        for branch in catalogue.branches() {
            let group = catalogue
                .group(&branch.question_group_id)
                .expect("branch group exists");
            assert_eq!(group.branch_id.as_deref(), Some(branch.id.as_str()));
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Catalogue::from_json_str("{ not json").expect_err("parse error");
        assert!(matches!(err, CatalogueError::Parse(_)));
    }

    #[test]
    fn catalogue_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalogue>();
    }
}
