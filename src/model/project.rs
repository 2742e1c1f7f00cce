use egui::Color32;
use serde::{Deserialize, Serialize};

use super::assignment::{ProjectId, ResourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectPriority {
    Low,
    Medium,
    High,
}

/// A person, machine or team that assignments are booked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    #[serde(with = "hex_color")]
    pub color: Color32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Availability in percent (0–100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<u8>,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>, color: Color32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
            department: None,
            skills: Vec::new(),
            availability: None,
        }
    }
}

/// A project grouping assignments across resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(with = "hex_color")]
    pub color: Color32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<ProjectPriority>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>, color: Color32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color,
            status: None,
            priority: None,
        }
    }
}

/// Serde helper for `Color32` stored as `#RRGGBB` / `#RRGGBBAA`.
pub mod hex_color {
    use egui::Color32;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let [r, g, b, a] = color.to_array();
        if a == 255 {
            serializer.serialize_str(&format!("#{:02X}{:02X}{:02X}", r, g, b))
        } else {
            serializer.serialize_str(&format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_hex_color(s: &str) -> Result<Color32, String> {
        let s = s.trim().trim_start_matches('#');
        let channel = |i: usize| {
            s.get(i..i + 2)
                .ok_or_else(|| format!("Invalid hex color '{}'", s))
                .and_then(|c| u8::from_str_radix(c, 16).map_err(|e| e.to_string()))
        };
        match s.len() {
            6 => Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color32::from_rgba_unmultiplied(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => Err(format!("Invalid hex color '{}': expected 6 or 8 hex digits", s)),
        }
    }
}
