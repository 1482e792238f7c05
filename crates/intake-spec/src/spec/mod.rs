pub mod branch;
pub mod catalogue;
pub mod group;
pub mod literal;
pub mod question;

pub use branch::{Branch, BranchCondition, Operator};
pub use catalogue::CatalogueSpec;
pub use group::QuestionGroup;
pub use literal::Literal;
pub use question::{Question, QuestionOption, QuestionType, RuleType, ValidationRule};
