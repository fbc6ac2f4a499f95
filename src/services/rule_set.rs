use std::collections::HashSet;
use std::time::Duration;

use crate::config::{ContextRulesConfig, RuleConfig};
use crate::events::WindowInfo;

/// Условие правила. Пустой список процессов или подстрок означает "любое".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Any,
    Process(HashSet<String>),
    Title(Vec<String>),
    ProcessAndTitle {
        processes: HashSet<String>,
        title_substrings: Vec<String>,
    },
}

impl Condition {
    fn from_parts(processes: HashSet<String>, title_substrings: Vec<String>) -> Self {
        match (processes.is_empty(), title_substrings.is_empty()) {
            (true, true) => Condition::Any,
            (false, true) => Condition::Process(processes),
            (true, false) => Condition::Title(title_substrings),
            (false, false) => Condition::ProcessAndTitle {
                processes,
                title_substrings,
            },
        }
    }

    /// `process_lower` и `title_lower` уже приведены к нижнему регистру
    fn matches(&self, process_lower: &str, title_lower: &str) -> bool {
        match self {
            Condition::Any => true,
            Condition::Process(processes) => processes.contains(process_lower),
            Condition::Title(subs) => subs.iter().any(|sub| title_lower.contains(sub.as_str())),
            Condition::ProcessAndTitle {
                processes,
                title_substrings,
            } => {
                processes.contains(process_lower)
                    && title_substrings
                        .iter()
                        .any(|sub| title_lower.contains(sub.as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub condition: Condition,
    /// Пустая категория означает категорию по умолчанию
    pub category: String,
}

impl Rule {
    pub fn new(processes: &[String], title_substrings: &[String], category: impl Into<String>) -> Self {
        let processes = processes.iter().map(|p| p.to_lowercase()).collect();
        let title_substrings = title_substrings
            .iter()
            .map(|sub| sub.to_lowercase())
            .collect();

        Self {
            condition: Condition::from_parts(processes, title_substrings),
            category: category.into(),
        }
    }
}

impl From<&RuleConfig> for Rule {
    fn from(config: &RuleConfig) -> Self {
        Rule::new(&config.process, &config.title_contains, config.category.clone())
    }
}

/// Упорядоченный набор правил: побеждает первое совпавшее
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    default_category: String,
    poll_interval: Duration,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, default_category: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            rules,
            default_category: default_category.into(),
            poll_interval,
        }
    }

    pub fn from_config(config: &ContextRulesConfig) -> Self {
        Self::new(
            config.rules.iter().map(Rule::from).collect(),
            config.default_category.clone(),
            config.poll_interval(),
        )
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Чистая функция: одинаковый вход всегда даёт одинаковую категорию
    pub fn classify(&self, info: Option<&WindowInfo>) -> &str {
        let Some(info) = info else {
            return &self.default_category;
        };

        let process_lower = info.process_name.to_lowercase();
        let title_lower = info.window_title.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.condition.matches(&process_lower, &title_lower))
            .map(|rule| rule.category.as_str())
            .filter(|category| !category.is_empty())
            .unwrap_or(self.default_category.as_str())
    }
}
