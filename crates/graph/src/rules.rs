use crate::types::Archetype;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the edge heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRules {
    /// Strength of profile -> angle edges
    pub profile_strength: f64,

    /// Minimum shared tags for an angle -> story edge
    pub angle_story_min_shared: usize,

    /// Base strength of angle -> story edges
    pub angle_story_base: f64,

    /// Minimum shared tags for a story -> detail edge
    pub story_detail_min_shared: usize,

    /// Base strength of story -> detail edges
    pub story_detail_base: f64,

    /// Strength added per shared tag (rules 2 and 3)
    pub per_shared_tag: f64,

    /// Strength of tension edges
    pub tension_strength: f64,

    /// Tension rules, applied in order
    pub tensions: Vec<TensionRule>,
}

impl Default for EdgeRules {
    fn default() -> Self {
        Self {
            profile_strength: 0.9,
            angle_story_min_shared: 2,
            angle_story_base: 0.7,
            story_detail_min_shared: 1,
            story_detail_base: 0.6,
            per_shared_tag: 0.05,
            tension_strength: 0.5,
            tensions: vec![
                TensionRule::failure_vs_achievement(),
                TensionRule::leadership_vs_solitary(),
            ],
        }
    }
}

impl EdgeRules {
    /// Rules without any tension detection
    pub fn without_tensions() -> Self {
        Self {
            tensions: Vec::new(),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let strengths = [
            ("profile_strength", self.profile_strength),
            ("angle_story_base", self.angle_story_base),
            ("story_detail_base", self.story_detail_base),
            ("per_shared_tag", self.per_shared_tag),
            ("tension_strength", self.tension_strength),
        ];
        for (name, value) in strengths {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }

        if self.story_detail_min_shared == 0 {
            return Err("story_detail_min_shared must be > 0".to_string());
        }

        if self.angle_story_min_shared == 0 {
            return Err("angle_story_min_shared must be > 0".to_string());
        }

        for rule in &self.tensions {
            rule.validate()?;
        }

        Ok(())
    }
}

/// How candidate pairs of a tension rule are turned into edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TensionPairing {
    /// First matching angle against first matching story
    FirstOnly,

    /// Every (angle, story) candidate pair, up to `max` edges
    AllPairs { max: usize },
}

impl Default for TensionPairing {
    fn default() -> Self {
        Self::FirstOnly
    }
}

/// Contrast between a kind of angle and a kind of story.
///
/// An angle matches when its archetype is in `angle_archetypes` or it carries
/// one of `angle_tags`; a story matches when it carries one of `story_tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensionRule {
    pub name: String,

    #[serde(default)]
    pub angle_archetypes: Vec<Archetype>,

    #[serde(default)]
    pub angle_tags: Vec<String>,

    pub story_tags: Vec<String>,

    #[serde(default)]
    pub pairing: TensionPairing,
}

impl TensionRule {
    pub fn failure_vs_achievement() -> Self {
        Self {
            name: "failure_vs_achievement".to_string(),
            angle_archetypes: vec![Archetype::Achiever, Archetype::Builder],
            angle_tags: Vec::new(),
            story_tags: vec!["failure".to_string()],
            pairing: TensionPairing::FirstOnly,
        }
    }

    pub fn leadership_vs_solitary() -> Self {
        Self {
            name: "leadership_vs_solitary".to_string(),
            angle_archetypes: vec![Archetype::Leader, Archetype::Advocate],
            angle_tags: vec!["leadership".to_string()],
            story_tags: vec![
                "solitary".to_string(),
                "deep_work".to_string(),
                "independent".to_string(),
            ],
            pairing: TensionPairing::FirstOnly,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.story_tags.is_empty() {
            return Err(format!("tension rule '{}' has no story_tags", self.name));
        }
        if self.angle_archetypes.is_empty() && self.angle_tags.is_empty() {
            return Err(format!(
                "tension rule '{}' matches no angles (set angle_archetypes or angle_tags)",
                self.name
            ));
        }
        if let TensionPairing::AllPairs { max: 0 } = self.pairing {
            return Err(format!("tension rule '{}' has max = 0", self.name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_valid() {
        assert!(EdgeRules::default().validate().is_ok());
        assert!(EdgeRules::without_tensions().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_strength() {
        let rules = EdgeRules {
            tension_strength: 1.5,
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_rejects_rule_without_angle_matcher() {
        let mut rules = EdgeRules::default();
        rules.tensions.push(TensionRule {
            name: "empty".to_string(),
            angle_archetypes: vec![],
            angle_tags: vec![],
            story_tags: vec!["failure".to_string()],
            pairing: TensionPairing::FirstOnly,
        });
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_rules_parse_from_partial_json() {
        let rules: EdgeRules = serde_json::from_value(serde_json::json!({
            "tension_strength": 0.4,
            "tensions": [{
                "name": "failure_vs_achievement",
                "angle_archetypes": ["achiever"],
                "story_tags": ["failure"],
                "pairing": { "mode": "all_pairs", "max": 3 }
            }]
        }))
        .unwrap();

        assert_eq!(rules.profile_strength, 0.9);
        assert_eq!(rules.tensions.len(), 1);
        assert_eq!(rules.tensions[0].pairing, TensionPairing::AllPairs { max: 3 });
    }
}
