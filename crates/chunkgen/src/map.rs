//! Ordinary map model shared by hand-authored chunk maps and generated composites.

use serde::{Deserialize, Serialize};

use crate::types::{Direction, Pos, Rect};

pub const COLLISION_LAYER: &str = "collision";

/// Role a chunk map declares in its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcgenRole {
    Start,
    End,
    Normal,
    Key,
    DoorNorthSouth,
    DoorWestEast,
    Links,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// Row-major tile ids: `tiles[y * width + x]`.
    pub tiles: Vec<u16>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    OnTrigger,
    OnInteract,
    OnMapExit,
    OnLeave,
    OnLoad,
    OnClear,
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerTarget {
    Hero,
    At(Pos),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventComponent {
    Tooltip { text: String },
    Msg { text: String },
    Music { file: String },
    Power { id: u32 },
    PowerPath { source: Pos, target: PowerTarget },
    Intermap { map: String, pos: Option<Pos> },
    Intramap { pos: Pos },
    MapMod { layer: String, pos: Pos, value: u16 },
    SoundFx { file: String, pos: Option<Pos>, loops: bool },
    Spawn { category: String, pos: Pos },
    RequiresStatus { status: String },
    RequiresNotStatus { status: String },
    SetStatus { status: String },
    UnsetStatus { status: String },
    ProcgenFilename { file: String },
    ProcgenLink { direction: Direction },
}

impl EventComponent {
    pub fn is_procgen_metadata(&self) -> bool {
        matches!(self, Self::ProcgenFilename { .. } | Self::ProcgenLink { .. })
    }

    pub fn translate(&mut self, offset: Pos) {
        match self {
            Self::PowerPath { source, target } => {
                *source = source.offset_by(offset);
                if let PowerTarget::At(pos) = target {
                    *pos = pos.offset_by(offset);
                }
            }
            Self::Intramap { pos } | Self::MapMod { pos, .. } | Self::Spawn { pos, .. } => {
                *pos = pos.offset_by(offset);
            }
            Self::SoundFx { pos: Some(pos), .. } => *pos = pos.offset_by(offset),
            _ => {}
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEvent {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub activate: Activation,
    pub location: Rect,
    #[serde(default)]
    pub hotspot: Rect,
    #[serde(default)]
    pub center: Option<Pos>,
    #[serde(default)]
    pub reachable_from: Rect,
    #[serde(default)]
    pub requires_door_level: Option<u32>,
    #[serde(default)]
    pub components: Vec<EventComponent>,
}

impl MapEvent {
    pub fn is_procgen_metadata(&self) -> bool {
        self.components.iter().any(EventComponent::is_procgen_metadata)
    }

    pub fn translate(&mut self, offset: Pos) {
        self.location = self.location.offset_by(offset);
        if !self.hotspot.is_empty() {
            self.hotspot = self.hotspot.offset_by(offset);
        }
        if let Some(center) = &mut self.center {
            *center = center.offset_by(offset);
        }
        if !self.reachable_from.is_empty() {
            self.reachable_from = self.reachable_from.offset_by(offset);
        }
        for component in &mut self.components {
            component.translate(offset);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyGroup {
    #[serde(default)]
    pub category: String,
    pub location: Rect,
    #[serde(default)]
    pub level_min: u32,
    #[serde(default)]
    pub level_max: u32,
    #[serde(default = "one")]
    pub number_min: u32,
    #[serde(default = "one")]
    pub number_max: u32,
    #[serde(default = "full_chance")]
    pub chance: u8,
    #[serde(default)]
    pub direction: Option<u8>,
    #[serde(default)]
    pub waypoints: Vec<Pos>,
    #[serde(default = "default_group_wander_radius")]
    pub wander_radius: u32,
    #[serde(default)]
    pub requires_status: Vec<String>,
    #[serde(default)]
    pub requires_door_level: Option<u32>,
}

impl EnemyGroup {
    pub fn translate(&mut self, offset: Pos) {
        self.location = self.location.offset_by(offset);
        for waypoint in &mut self.waypoints {
            *waypoint = waypoint.offset_by(offset);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapNpc {
    pub filename: String,
    pub pos: Pos,
    #[serde(default)]
    pub direction: Option<u8>,
    #[serde(default)]
    pub waypoints: Vec<Pos>,
    #[serde(default)]
    pub wander_radius: u32,
    #[serde(default)]
    pub requires_status: Vec<String>,
    #[serde(default)]
    pub requires_door_level: Option<u32>,
}

impl MapNpc {
    pub fn translate(&mut self, offset: Pos) {
        self.pos = self.pos.offset_by(offset);
        for waypoint in &mut self.waypoints {
            *waypoint = waypoint.offset_by(offset);
        }
    }
}

fn one() -> u32 {
    1
}

fn full_chance() -> u8 {
    100
}

fn default_group_wander_radius() -> u32 {
    4
}

/// Rules file and target area named by a hosting map's procgen event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcgenTrigger {
    pub rules_file: String,
    pub area: Rect,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tileset: String,
    #[serde(default)]
    pub music: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub hero_pos: Option<Pos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procgen_role: Option<ProcgenRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procgen_reset_status: Option<String>,
    /// Set on freshly generated maps so the hero spawns at `hero_pos`
    /// instead of any previously saved position.
    #[serde(skip)]
    pub force_spawn_pos: bool,
    #[serde(default)]
    pub layers: Vec<TileLayer>,
    #[serde(default)]
    pub events: Vec<MapEvent>,
    #[serde(default)]
    pub enemy_groups: Vec<EnemyGroup>,
    #[serde(default)]
    pub npcs: Vec<MapNpc>,
}

impl Map {
    /// Blank map whose layers are all zero-filled.
    pub fn with_layers<S: AsRef<str>>(width: usize, height: usize, layer_names: &[S]) -> Self {
        Self {
            width,
            height,
            layers: layer_names
                .iter()
                .map(|name| TileLayer {
                    name: name.as_ref().to_string(),
                    tiles: vec![0; width * height],
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn tile(&self, layer_index: usize, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.layers.get(layer_index)?.tiles.get(y * self.width + x).copied()
    }

    pub fn set_tile(&mut self, layer_index: usize, x: usize, y: usize, value: u16) {
        if x >= self.width || y >= self.height {
            return;
        }
        let width = self.width;
        if let Some(tile) =
            self.layers.get_mut(layer_index).and_then(|layer| layer.tiles.get_mut(y * width + x))
        {
            *tile = value;
        }
    }

    pub fn ensure_collision_layer(&mut self) {
        if self.layer(COLLISION_LAYER).is_none() {
            self.layers.push(TileLayer {
                name: COLLISION_LAYER.to_string(),
                tiles: vec![0; self.width * self.height],
            });
        }
    }

    pub fn procgen_trigger(&self) -> Option<ProcgenTrigger> {
        self.events.iter().find_map(|event| {
            event.components.iter().find_map(|component| match component {
                EventComponent::ProcgenFilename { file } => {
                    Some(ProcgenTrigger { rules_file: file.clone(), area: event.location })
                }
                _ => None,
            })
        })
    }

    /// Connector rectangles declared by a links chunk, indexed by [`Direction::index`].
    /// Directions without a declaration stay zero-sized.
    pub fn link_rects(&self) -> [Rect; 4] {
        let mut rects = [Rect::default(); 4];
        for event in &self.events {
            for component in &event.components {
                if let EventComponent::ProcgenLink { direction } = component {
                    rects[direction.index()] = event.location;
                }
            }
        }
        rects
    }
}
