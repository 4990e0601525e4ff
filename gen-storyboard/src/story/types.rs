//! Story configuration schema.
//!
//! The canonical nested form: identity, style throughline, camera
//! baseline, and free-text global constraints. All descriptive fields
//! are optional; consumers default them at render time.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Structured description of a recurring character and visual style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    pub identity_core: IdentityCore,
    #[serde(default)]
    pub style_throughline: StyleThroughline,
    #[serde(default)]
    pub camera_baseline: CameraBaseline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_constraints: Option<String>,
}

/// Who the character is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCore {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_progression: Option<AgeProgression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_general: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demeanor: Option<String>,
}

/// Consistent artistic direction across segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleThroughline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette_base: Option<String>,
}

/// Default camera treatment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraBaseline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_of_field: Option<String>,
}

/// Age changes across the segment sequence, keyed by index ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeProgression {
    #[serde(default)]
    pub enabled: bool,
    /// Milestones in declaration order; the first matching range wins.
    #[serde(
        default,
        serialize_with = "milestones_as_map",
        deserialize_with = "milestones_in_order"
    )]
    pub milestones: Vec<(String, Milestone)>,
}

/// A single age milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A milestone key: `"N+"` (index >= N) or `"N-M"` (N <= index <= M).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneRange {
    From(usize),
    Between(usize, usize),
}

impl MilestoneRange {
    /// Parse a milestone key. Returns None for malformed keys.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Some(start) = key.strip_suffix('+') {
            return start.trim().parse().ok().map(Self::From);
        }
        let (lo, hi) = key.split_once('-')?;
        let lo: usize = lo.trim().parse().ok()?;
        let hi: usize = hi.trim().parse().ok()?;
        (lo <= hi).then_some(Self::Between(lo, hi))
    }

    /// Whether a segment index falls inside this range.
    pub fn contains(&self, index: usize) -> bool {
        match *self {
            Self::From(start) => index >= start,
            Self::Between(lo, hi) => index >= lo && index <= hi,
        }
    }
}

/// Resolve the character's effective age for a segment.
///
/// With progression enabled, milestones are checked in declaration order
/// and the first matching range wins; otherwise (or when no range
/// matches) the base age applies. Pure and total over all indices.
pub fn resolve_age(identity: &IdentityCore, segment_index: usize) -> Option<u32> {
    if let Some(progression) = &identity.age_progression
        && progression.enabled
    {
        for (key, milestone) in &progression.milestones {
            if let Some(range) = MilestoneRange::parse(key)
                && range.contains(segment_index)
            {
                return Some(milestone.age);
            }
        }
    }

    identity.base_age
}

// Milestones arrive as a JSON object but their declaration order is
// semantically meaningful, so they are carried as an ordered list of
// entries rather than a sorted map.

fn milestones_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, Milestone)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedEntries;

    impl<'de> Visitor<'de> for OrderedEntries {
        type Value = Vec<(String, Milestone)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of milestone ranges to milestones")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedEntries)
}

fn milestones_as_map<S>(
    milestones: &[(String, Milestone)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(milestones.len()))?;
    for (key, milestone) in milestones {
        map.serialize_entry(key, milestone)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_with_progression(enabled: bool) -> IdentityCore {
        IdentityCore {
            name: "Mira".to_string(),
            base_age: Some(1),
            age_progression: Some(AgeProgression {
                enabled,
                milestones: vec![
                    (
                        "0-2".to_string(),
                        Milestone {
                            age: 5,
                            description: None,
                        },
                    ),
                    (
                        "3+".to_string(),
                        Milestone {
                            age: 10,
                            description: None,
                        },
                    ),
                ],
            }),
            origin: None,
            domains: None,
            values: None,
            hair_general: None,
            demeanor: None,
        }
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!(MilestoneRange::parse("3+"), Some(MilestoneRange::From(3)));
        assert_eq!(
            MilestoneRange::parse("0-2"),
            Some(MilestoneRange::Between(0, 2))
        );
        assert_eq!(MilestoneRange::parse(" 4 - 9 "), Some(MilestoneRange::Between(4, 9)));
        assert_eq!(MilestoneRange::parse("9-4"), None);
        assert_eq!(MilestoneRange::parse("abc"), None);
        assert_eq!(MilestoneRange::parse(""), None);
    }

    #[test]
    fn test_range_contains() {
        let from = MilestoneRange::From(3);
        assert!(!from.contains(2));
        assert!(from.contains(3));
        assert!(from.contains(100));

        let between = MilestoneRange::Between(0, 2);
        assert!(between.contains(0));
        assert!(between.contains(2));
        assert!(!between.contains(3));
    }

    #[test]
    fn test_resolve_age_milestones() {
        let identity = identity_with_progression(true);
        assert_eq!(resolve_age(&identity, 1), Some(5));
        assert_eq!(resolve_age(&identity, 3), Some(10));
        assert_eq!(resolve_age(&identity, 99), Some(10));
    }

    #[test]
    fn test_resolve_age_disabled_falls_back_to_base() {
        let identity = identity_with_progression(false);
        assert_eq!(resolve_age(&identity, 1), Some(1));
        assert_eq!(resolve_age(&identity, 3), Some(1));
    }

    #[test]
    fn test_resolve_age_no_matching_range() {
        let mut identity = identity_with_progression(true);
        if let Some(progression) = identity.age_progression.as_mut() {
            progression.milestones = vec![(
                "10+".to_string(),
                Milestone {
                    age: 40,
                    description: None,
                },
            )];
        }
        assert_eq!(resolve_age(&identity, 2), Some(1));
        assert_eq!(resolve_age(&identity, 10), Some(40));
    }

    #[test]
    fn test_first_matching_milestone_wins() {
        let identity = IdentityCore {
            age_progression: Some(AgeProgression {
                enabled: true,
                milestones: vec![
                    (
                        "0+".to_string(),
                        Milestone {
                            age: 7,
                            description: None,
                        },
                    ),
                    (
                        "0-5".to_string(),
                        Milestone {
                            age: 3,
                            description: None,
                        },
                    ),
                ],
            }),
            ..identity_with_progression(true)
        };
        assert_eq!(resolve_age(&identity, 4), Some(7));
    }

    #[test]
    fn test_milestone_order_preserved_through_json() {
        let json = r#"{
            "enabled": true,
            "milestones": {
                "5+": {"age": 30},
                "0-4": {"age": 12}
            }
        }"#;
        let progression: AgeProgression = serde_json::from_str(json).unwrap();
        assert_eq!(progression.milestones[0].0, "5+");
        assert_eq!(progression.milestones[1].0, "0-4");

        let round_trip = serde_json::to_string(&progression).unwrap();
        let reparsed: AgeProgression = serde_json::from_str(&round_trip).unwrap();
        assert_eq!(reparsed.milestones[0].0, "5+");
    }
}
