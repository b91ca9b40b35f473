use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to parse level {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown platform image '{0}'")]
    UnknownPlatformImage(String),
    #[error("no level with index {0}")]
    MissingLevel(usize),
    #[error("level set '{0}' contains no levels")]
    Empty(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Platform placed by its top-left corner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub image: String,
}

/// One hand-authored level, read-only during play
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelDescriptor {
    pub platforms: Vec<PlatformDef>,
    pub spiders: Vec<Point>,
    pub spider_boss: Vec<Point>,
    pub coins: Vec<Point>,
    pub door: Point,
    pub key: Point,
    pub hero: Point,
}

impl LevelDescriptor {
    pub fn from_json(name: &str, raw: &str) -> Result<Self, LevelError> {
        let level: LevelDescriptor =
            serde_json::from_str(raw).map_err(|source| LevelError::Parse {
                name: name.to_string(),
                source,
            })?;
        for platform in &level.platforms {
            platform_size(&platform.image)?;
        }
        Ok(level)
    }
}

/// Footprint of each platform image.
pub fn platform_size(image: &str) -> Result<(f32, f32), LevelError> {
    match image {
        "ground" => Ok((960.0, 54.0)),
        "grass:8x1" => Ok((336.0, 42.0)),
        "grass:6x1" => Ok((252.0, 42.0)),
        "grass:4x1" => Ok((168.0, 42.0)),
        "grass:2x1" => Ok((84.0, 42.0)),
        "grass:1x1" => Ok((42.0, 42.0)),
        other => Err(LevelError::UnknownPlatformImage(other.to_string())),
    }
}

const EMBEDDED_LEVELS: [(&str, &str); 5] = [
    ("level00.json", include_str!("../assets/data/level00.json")),
    ("level01.json", include_str!("../assets/data/level01.json")),
    ("level02.json", include_str!("../assets/data/level02.json")),
    ("level03.json", include_str!("../assets/data/level03.json")),
    ("level04.json", include_str!("../assets/data/level04.json")),
];

/// All playable levels, indexed from 0.
#[derive(Resource, Clone, Debug, Default)]
pub struct LevelSet {
    pub levels: Vec<LevelDescriptor>,
    pub source: String,
}

impl LevelSet {
    pub fn embedded() -> Result<Self, LevelError> {
        let levels = EMBEDDED_LEVELS
            .iter()
            .map(|(name, raw)| LevelDescriptor::from_json(name, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            levels,
            source: "embedded".to_string(),
        })
    }

    /// Loads `level00.json`, `level01.json`, ... from `dir`, stopping at the
    /// first missing index.
    pub fn from_dir(dir: &Path) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        for (name, _) in EMBEDDED_LEVELS.iter() {
            let path = dir.join(name);
            if !path.exists() {
                break;
            }
            let raw = std::fs::read_to_string(&path).map_err(|source| LevelError::Io {
                path: path.clone(),
                source,
            })?;
            levels.push(LevelDescriptor::from_json(name, &raw)?);
        }
        if levels.is_empty() {
            return Err(LevelError::Empty(dir.display().to_string()));
        }
        Ok(Self {
            levels,
            source: dir.display().to_string(),
        })
    }

    pub fn get(&self, index: usize) -> Result<&LevelDescriptor, LevelError> {
        self.levels.get(index).ok_or(LevelError::MissingLevel(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_levels_parse() {
        let set = LevelSet::embedded().expect("embedded levels");
        assert_eq!(set.levels.len(), 5);
        for level in &set.levels {
            assert!(!level.platforms.is_empty());
            assert!(level.hero.y > 0.0 && level.hero.y < 600.0);
        }
        assert!(!set.levels[4].spider_boss.is_empty());
        assert!(matches!(set.get(5), Err(LevelError::MissingLevel(5))));
    }

    #[test]
    fn descriptor_uses_source_field_names() {
        let raw = r#"{
            "platforms": [{"x": 0, "y": 546, "image": "ground"}],
            "spiderBoss": [{"x": 400, "y": 500}],
            "door": {"x": 900, "y": 546},
            "key": {"x": 50, "y": 100},
            "hero": {"x": 20, "y": 525}
        }"#;
        let level = LevelDescriptor::from_json("inline", raw).expect("parse");
        assert_eq!(level.spider_boss, vec![Point { x: 400.0, y: 500.0 }]);
        assert!(level.spiders.is_empty());
        assert!(level.coins.is_empty());
    }

    #[test]
    fn unknown_platform_image_is_rejected() {
        let raw = r#"{"platforms": [{"x": 0, "y": 0, "image": "lava:3x1"}]}"#;
        let err = LevelDescriptor::from_json("bad", raw).expect_err("unknown image");
        assert!(matches!(err, LevelError::UnknownPlatformImage(ref i) if i == "lava:3x1"));

        let err = LevelDescriptor::from_json("broken", "{").expect_err("bad json");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = std::env::temp_dir().join("keyrunner-empty-levels-test");
        let _ = std::fs::create_dir_all(&dir);
        assert!(matches!(LevelSet::from_dir(&dir), Err(LevelError::Empty(_))));
    }
}
