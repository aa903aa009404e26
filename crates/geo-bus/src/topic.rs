//! # Topic Filters
//!
//! MQTT 3.1.1 topic filter parsing and matching.

use crate::LEVEL_SEPARATOR;
use std::fmt;
use thiserror::Error;

const MULTI_LEVEL: &str = "#";
const SINGLE_LEVEL: &str = "+";

/// Errors from topic and filter validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicFilterError {
    /// Topics and filters must contain at least one character.
    #[error("topic must not be empty")]
    Empty,

    /// `#` must occupy the whole final level.
    #[error("multi-level wildcard must be the last level: {0}")]
    MisplacedMultiLevelWildcard(String),

    /// `+` and `#` may not share a level with other characters.
    #[error("wildcard must occupy an entire level: {0}")]
    PartialLevelWildcard(String),

    /// Publish topics may not contain wildcards.
    #[error("wildcards are not allowed in topic names: {0}")]
    WildcardInTopicName(String),
}

/// A validated subscription filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter {
    raw: String,
    levels: Vec<String>,
}

impl TopicFilter {
    /// Parse and validate a filter.
    pub fn parse(filter: &str) -> Result<Self, TopicFilterError> {
        if filter.is_empty() {
            return Err(TopicFilterError::Empty);
        }

        let levels: Vec<String> = filter.split(LEVEL_SEPARATOR).map(str::to_owned).collect();
        let last = levels.len() - 1;
        for (i, level) in levels.iter().enumerate() {
            if level == MULTI_LEVEL {
                if i != last {
                    return Err(TopicFilterError::MisplacedMultiLevelWildcard(
                        filter.to_owned(),
                    ));
                }
            } else if level != SINGLE_LEVEL && (level.contains('#') || level.contains('+')) {
                return Err(TopicFilterError::PartialLevelWildcard(filter.to_owned()));
            }
        }

        Ok(Self {
            raw: filter.to_owned(),
            levels,
        })
    }

    /// Whether a concrete topic matches this filter.
    pub fn matches(&self, topic: &str) -> bool {
        // `$`-prefixed system topics are invisible to leading wildcards.
        if topic.starts_with('$')
            && matches!(
                self.levels.first().map(String::as_str),
                Some(MULTI_LEVEL) | Some(SINGLE_LEVEL)
            )
        {
            return false;
        }

        let mut topic_levels = topic.split(LEVEL_SEPARATOR);
        for level in &self.levels {
            match level.as_str() {
                MULTI_LEVEL => return true,
                SINGLE_LEVEL => {
                    if topic_levels.next().is_none() {
                        return false;
                    }
                }
                exact => {
                    if topic_levels.next() != Some(exact) {
                        return false;
                    }
                }
            }
        }
        topic_levels.next().is_none()
    }

    /// Whether the filter contains any wildcard.
    pub fn has_wildcards(&self) -> bool {
        self.levels
            .iter()
            .any(|l| l == MULTI_LEVEL || l == SINGLE_LEVEL)
    }

    /// The filter as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validate a publish topic name (non-empty, wildcard-free).
pub fn validate_topic_name(topic: &str) -> Result<(), TopicFilterError> {
    if topic.is_empty() {
        return Err(TopicFilterError::Empty);
    }
    if topic.contains('#') || topic.contains('+') {
        return Err(TopicFilterError::WildcardInTopicName(topic.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(s: &str) -> TopicFilter {
        TopicFilter::parse(s).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let f = filter("/api/register");
        assert!(f.matches("/api/register"));
        assert!(!f.matches("/api/unregister"));
        assert!(!f.matches("/api/register/extra"));
        assert!(!f.has_wildcards());
    }

    #[test]
    fn test_multi_level_matches_descendants_and_parent() {
        let f = filter("/1/2/#");
        assert!(f.matches("/1/2"));
        assert!(f.matches("/1/2/3"));
        assert!(f.matches("/1/2/3/0/1"));
        assert!(!f.matches("/1/3/2"));
        assert!(!f.matches("/1"));
    }

    #[test]
    fn test_single_level_matches_one_level() {
        let f = filter("/1/+/3");
        assert!(f.matches("/1/2/3"));
        assert!(f.matches("/1/0/3"));
        assert!(!f.matches("/1/2/2/3"));
        assert!(!f.matches("/1/2"));
    }

    #[test]
    fn test_system_topics_hidden_from_leading_wildcards() {
        assert!(!filter("#").matches("$SYS/uptime"));
        assert!(!filter("+/uptime").matches("$SYS/uptime"));
        assert!(filter("$SYS/#").matches("$SYS/uptime"));
    }

    #[test]
    fn test_invalid_filters_rejected() {
        assert_eq!(TopicFilter::parse(""), Err(TopicFilterError::Empty));
        assert!(matches!(
            TopicFilter::parse("/1/#/2"),
            Err(TopicFilterError::MisplacedMultiLevelWildcard(_))
        ));
        assert!(matches!(
            TopicFilter::parse("/1/2#"),
            Err(TopicFilterError::PartialLevelWildcard(_))
        ));
        assert!(matches!(
            TopicFilter::parse("/1+/2"),
            Err(TopicFilterError::PartialLevelWildcard(_))
        ));
    }

    #[test]
    fn test_validate_topic_name() {
        assert!(validate_topic_name("/forward/1/2").is_ok());
        assert_eq!(validate_topic_name(""), Err(TopicFilterError::Empty));
        assert!(matches!(
            validate_topic_name("/1/#"),
            Err(TopicFilterError::WildcardInTopicName(_))
        ));
    }
}
