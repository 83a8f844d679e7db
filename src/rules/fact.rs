use serde::{Deserialize, Serialize};
use std::fmt;

/// Value carried by a fact or compared against by a condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl FactValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Identity equality. NaN equals NaN so that a fact can always be found again.
impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FactValue::Number(a), FactValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (FactValue::Text(a), FactValue::Text(b)) => a == b,
            (FactValue::Boolean(a), FactValue::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Number(n) => write!(f, "{}", n),
            FactValue::Text(s) => f.write_str(s),
            FactValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for FactValue {
    fn from(n: f64) -> Self {
        FactValue::Number(n)
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        FactValue::Text(s.to_string())
    }
}

impl From<String> for FactValue {
    fn from(s: String) -> Self {
        FactValue::Text(s)
    }
}

impl From<bool> for FactValue {
    fn from(b: bool) -> Self {
        FactValue::Boolean(b)
    }
}

/// A `(predicate, subject, value)` triple. The whole triple is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub predicate: String,
    pub subject: String,
    pub value: FactValue,
}

impl Fact {
    pub fn new(predicate: &str, subject: &str, value: impl Into<FactValue>) -> Self {
        Self {
            predicate: predicate.to_string(),
            subject: subject.to_string(),
            value: value.into(),
        }
    }

    pub fn is_about(&self, predicate: &str, subject: &str) -> bool {
        self.predicate == predicate && self.subject == subject
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) = {}", self.predicate, self.subject, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
}

impl Operator {
    /// Compares a fact's value (left) with a condition's operand (right).
    /// Unsupported type combinations are simply false.
    pub fn apply(&self, left: &FactValue, right: &FactValue) -> bool {
        match self {
            Operator::Eq => left == right,
            Operator::Contains => match (left, right) {
                (FactValue::Text(l), FactValue::Text(r)) => l.contains(r.as_str()),
                _ => left.to_string().contains(&right.to_string()),
            },
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => {
                let (Some(l), Some(r)) = (left.as_number(), right.as_number()) else {
                    return false;
                };
                match self {
                    Operator::Gt => l > r,
                    Operator::Lt => l < r,
                    Operator::Ge => l >= r,
                    _ => l <= r,
                }
            }
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            "contains" => Ok(Operator::Contains),
            other => Err(format!("unknown operator: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub predicate: String,
    pub subject: String,
    pub operator: Operator,
    pub value: FactValue,
}

impl Condition {
    pub fn new(predicate: &str, subject: &str, operator: Operator, value: impl Into<FactValue>) -> Self {
        Self {
            predicate: predicate.to_string(),
            subject: subject.to_string(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    /// Conjunction; an empty list always holds.
    pub conditions: Vec<Condition>,
    pub conclusion: Fact,
    pub priority: i32,
}

impl Rule {
    pub fn new(id: &str, conditions: Vec<Condition>, conclusion: Fact, priority: i32) -> Self {
        Self {
            id: id.to_string(),
            conditions,
            conclusion,
            priority,
        }
    }
}
