use crate::rules::fact::{Condition, Fact, Rule};
use std::cmp::Reverse;
use tracing::debug;

/// Facts asserted so far plus the rules that may derive more.
///
/// One knowledge base backs exactly one inference run. It is moved into a
/// [`RuleEngine`] and handed back by [`RuleEngine::into_knowledge_base`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    facts: Vec<Fact>,
    rules: Vec<Rule>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            facts: Vec::new(),
            rules,
        }
    }

    /// Facts in assertion order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.iter().any(|f| f == fact)
    }

    /// Most recently asserted fact for `(predicate, subject)`.
    pub fn latest(&self, predicate: &str, subject: &str) -> Option<&Fact> {
        self.facts.iter().rev().find(|f| f.is_about(predicate, subject))
    }

    pub fn query(&self, predicate: &str, subject: &str) -> Vec<&Fact> {
        self.facts
            .iter()
            .filter(|f| f.is_about(predicate, subject))
            .collect()
    }

    fn holds(&self, condition: &Condition) -> bool {
        self.latest(&condition.predicate, &condition.subject)
            .is_some_and(|fact| condition.operator.apply(&fact.value, &condition.value))
    }

    fn insert(&mut self, fact: Fact) -> bool {
        if self.contains(&fact) {
            return false;
        }
        self.facts.push(fact);
        true
    }
}

/// Forward-chaining production system over a [`KnowledgeBase`].
///
/// Facts are never retracted, and every rule has a fixed conclusion, so each
/// rule can add at most one fact and [`RuleEngine::infer`] always reaches a
/// fixpoint.
pub struct RuleEngine {
    kb: KnowledgeBase,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            kb: KnowledgeBase::new(),
        }
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self::from_knowledge_base(KnowledgeBase::with_rules(rules))
    }

    pub fn from_knowledge_base(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Adds a fact unless the identical triple is already known.
    /// Returns whether the fact was new.
    pub fn assert_fact(&mut self, fact: Fact) -> bool {
        self.kb.insert(fact)
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.kb.rules.push(rule);
    }

    pub fn query(&self, predicate: &str, subject: &str) -> Vec<&Fact> {
        self.kb.query(predicate, subject)
    }

    pub fn facts(&self) -> &[Fact] {
        self.kb.facts()
    }

    pub fn into_knowledge_base(self) -> KnowledgeBase {
        self.kb
    }

    /// Runs full passes over the rules until one adds nothing.
    /// Rules are visited by descending priority, ties in registration order.
    /// Returns the newly derived facts in derivation order.
    pub fn infer(&mut self) -> Vec<Fact> {
        let mut order: Vec<usize> = (0..self.kb.rules.len()).collect();
        order.sort_by_key(|&i| Reverse(self.kb.rules[i].priority));

        let mut derived = Vec::new();
        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;
            for &i in &order {
                let rule = &self.kb.rules[i];
                if !rule.conditions.iter().all(|c| self.kb.holds(c)) {
                    continue;
                }
                let conclusion = rule.conclusion.clone();
                if self.kb.contains(&conclusion) {
                    continue;
                }
                debug!("rule '{}' fired: {}", rule.id, conclusion);
                self.kb.facts.push(conclusion.clone());
                derived.push(conclusion);
                changed = true;
            }
            if !changed {
                break;
            }
        }

        debug!("fixpoint after {} passes, {} new facts", passes, derived.len());
        derived
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fact::Operator;

    fn chain_rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "cheap",
                vec![Condition::new("percent_of_average", "product", Operator::Lt, 80.0)],
                Fact::new("price_class", "product", "CHEAP"),
                3,
            ),
            Rule::new(
                "opportunity",
                vec![
                    Condition::new("price_class", "product", Operator::Eq, "CHEAP"),
                    Condition::new("trend", "product", Operator::Eq, "FALLING"),
                ],
                Fact::new("opportunity", "product", "EXCELLENT"),
                5,
            ),
        ]
    }

    #[test]
    fn chains_across_passes() {
        let mut engine = RuleEngine::with_rules(chain_rules());
        engine.assert_fact(Fact::new("percent_of_average", "product", 70.0));
        engine.assert_fact(Fact::new("trend", "product", "FALLING"));

        // "opportunity" is visited first but can only fire on the second pass
        let derived = engine.infer();
        assert_eq!(
            derived,
            vec![
                Fact::new("price_class", "product", "CHEAP"),
                Fact::new("opportunity", "product", "EXCELLENT"),
            ]
        );
    }

    #[test]
    fn second_run_derives_nothing() {
        let mut engine = RuleEngine::with_rules(chain_rules());
        engine.assert_fact(Fact::new("percent_of_average", "product", 70.0));
        engine.assert_fact(Fact::new("trend", "product", "FALLING"));
        assert_eq!(engine.infer().len(), 2);
        assert!(engine.infer().is_empty());
        assert_eq!(engine.facts().len(), 4);
    }

    #[test]
    fn asserting_is_idempotent_but_values_coexist() {
        let mut engine = RuleEngine::new();
        assert!(engine.assert_fact(Fact::new("trend", "product", "FALLING")));
        assert!(!engine.assert_fact(Fact::new("trend", "product", "FALLING")));
        assert!(engine.assert_fact(Fact::new("trend", "product", "RISING")));
        assert_eq!(engine.query("trend", "product").len(), 2);
        assert!(engine.query("trend", "date").is_empty());
    }

    #[test]
    fn conditions_read_the_latest_fact() {
        let mut engine = RuleEngine::with_rules(vec![Rule::new(
            "rising",
            vec![Condition::new("trend", "product", Operator::Eq, "RISING")],
            Fact::new("signal", "product", "UP"),
            1,
        )]);
        engine.assert_fact(Fact::new("trend", "product", "RISING"));
        engine.assert_fact(Fact::new("trend", "product", "FALLING"));
        assert!(engine.infer().is_empty());
    }

    #[test]
    fn missing_or_mistyped_facts_never_fire() {
        let mut engine = RuleEngine::with_rules(vec![
            Rule::new(
                "absent",
                vec![Condition::new("volatility", "product", Operator::Eq, "HIGH")],
                Fact::new("x", "product", true),
                1,
            ),
            Rule::new(
                "mistyped",
                vec![Condition::new("trend", "product", Operator::Gt, 1.0)],
                Fact::new("y", "product", true),
                1,
            ),
        ]);
        engine.assert_fact(Fact::new("trend", "product", "FALLING"));
        assert!(engine.infer().is_empty());
    }

    #[test]
    fn unconditional_rules_fire_once() {
        let mut engine = RuleEngine::new();
        engine.add_rule(Rule::new("always", vec![], Fact::new("ready", "engine", true), 0));
        assert_eq!(engine.infer(), vec![Fact::new("ready", "engine", true)]);
        assert!(engine.infer().is_empty());
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let rules = vec![
            Rule::new("b", vec![], Fact::new("seen", "b", true), 1),
            Rule::new("a", vec![], Fact::new("seen", "a", true), 1),
            Rule::new("c", vec![], Fact::new("seen", "c", true), 2),
        ];
        let derived = RuleEngine::with_rules(rules).infer();
        let subjects: Vec<&str> = derived.iter().map(|f| f.subject.as_str()).collect();
        assert_eq!(subjects, ["c", "b", "a"]);
    }

    #[test]
    fn registration_order_does_not_change_the_fact_base() {
        let mut rules = chain_rules();
        rules.push(Rule::new(
            "wait",
            vec![Condition::new("trend", "product", Operator::Eq, "FALLING")],
            Fact::new("recommendation", "product", "WAIT"),
            4,
        ));

        let run = |rules: Vec<Rule>| {
            let mut engine = RuleEngine::with_rules(rules);
            engine.assert_fact(Fact::new("percent_of_average", "product", 70.0));
            engine.assert_fact(Fact::new("trend", "product", "FALLING"));
            engine.infer();
            let mut facts: Vec<String> = engine.facts().iter().map(|f| f.to_string()).collect();
            facts.sort();
            facts
        };

        let forward = run(rules.clone());
        rules.reverse();
        assert_eq!(forward, run(rules));
    }

    #[test]
    fn knowledge_base_round_trips_through_the_engine() {
        let mut engine = RuleEngine::from_knowledge_base(KnowledgeBase::with_rules(chain_rules()));
        engine.assert_fact(Fact::new("percent_of_average", "product", 10.0));
        engine.infer();
        let kb = engine.into_knowledge_base();
        assert_eq!(kb.rules().len(), 2);
        assert_eq!(
            kb.latest("price_class", "product"),
            Some(&Fact::new("price_class", "product", "CHEAP"))
        );
    }
}
