// Rule engine: typed facts and a forward-chaining inference loop.

pub mod fact;
pub mod engine;

pub use engine::{KnowledgeBase, RuleEngine};
pub use fact::{Condition, Fact, FactValue, Operator, Rule};
