//! Small hand-authored chunk set used by tests and the fuzz harness.
//!
//! Every chunk is 10x10 with `background`, `object` and `collision` layers.
//! Backgrounds are filled with a per-role tile id so stitched output can be
//! traced back to the chunk it came from.

use std::collections::BTreeSet;

use crate::map::{COLLISION_LAYER, EnemyGroup, EventComponent, Map, MapEvent, MapNpc, ProcgenRole};
use crate::map_file::MemoryMapSource;
use crate::procgen::{CampaignStatus, ChunkLibrary};
use crate::rules::RulesConfig;
use crate::types::{Direction, Pos, Rect};

pub const CHUNK_SIZE: usize = 10;
pub const CONNECTOR_TILE: u16 = 90;
pub const HOST_MAP: &str = "maps/crypt_entrance.json";
pub const RULES_FILE: &str = "rules/crypt.toml";
pub const RESET_STATUS: &str = "crypt_reset";

pub const CHUNK_FILES: [(&str, ProcgenRole); 7] = [
    ("chunks/start.json", ProcgenRole::Start),
    ("chunks/end.json", ProcgenRole::End),
    ("chunks/normal.json", ProcgenRole::Normal),
    ("chunks/key.json", ProcgenRole::Key),
    ("chunks/door_ns.json", ProcgenRole::DoorNorthSouth),
    ("chunks/door_we.json", ProcgenRole::DoorWestEast),
    ("chunks/links.json", ProcgenRole::Links),
];

pub const RULES_TEXT: &str = r#"
doors_max = 1
main_path_length_min = 4
main_path_length_max = 8
chunks = [
    "chunks/start.json",
    "chunks/end.json",
    "chunks/normal.json",
    "chunks/key.json",
    "chunks/door_ns.json",
    "chunks/door_we.json",
    "chunks/links.json",
]
"#;

pub const START_HERO_POS: Pos = Pos { x: 5, y: 5 };
pub const NORMAL_EVENT_POS: Pos = Pos { x: 3, y: 3 };
/// Normal-chunk NPC, present only on door level 1.
pub const NORMAL_LEVEL_ONE_NPC_POS: Pos = Pos { x: 6, y: 6 };
/// North connector event inside the links chunk.
pub const CONNECTOR_EVENT_POS: Pos = Pos { x: 4, y: 1 };

pub fn role_tile(role: ProcgenRole) -> u16 {
    match role {
        ProcgenRole::Start => 10,
        ProcgenRole::End => 20,
        ProcgenRole::Normal => 30,
        ProcgenRole::Key => 40,
        ProcgenRole::DoorNorthSouth => 50,
        ProcgenRole::DoorWestEast => 60,
        ProcgenRole::Links => CONNECTOR_TILE,
    }
}

/// Connector rectangle the links chunk declares for `direction`.
pub fn link_rect(direction: Direction) -> Rect {
    let size = CHUNK_SIZE as i32;
    match direction {
        Direction::North => Rect::new(0, 0, size, 2),
        Direction::South => Rect::new(0, size - 2, size, 2),
        Direction::West => Rect::new(0, 0, 2, size),
        Direction::East => Rect::new(size - 2, 0, 2, size),
    }
}

pub fn chunk_map(role: ProcgenRole) -> Map {
    let mut map =
        Map::with_layers(CHUNK_SIZE, CHUNK_SIZE, &["background", "object", COLLISION_LAYER]);
    map.procgen_role = Some(role);
    map.layers[0].tiles.fill(role_tile(role));

    match role {
        ProcgenRole::Start => map.hero_pos = Some(START_HERO_POS),
        ProcgenRole::Normal => {
            map.events.push(MapEvent {
                kind: "tooltip".into(),
                location: Rect::new(NORMAL_EVENT_POS.x, NORMAL_EVENT_POS.y, 1, 1),
                hotspot: Rect::new(NORMAL_EVENT_POS.x, NORMAL_EVENT_POS.y, 1, 1),
                components: vec![EventComponent::Tooltip { text: "Cold air".into() }],
                ..MapEvent::default()
            });
            map.npcs.push(MapNpc {
                filename: "npcs/keeper.txt".into(),
                pos: NORMAL_LEVEL_ONE_NPC_POS,
                direction: None,
                waypoints: Vec::new(),
                wander_radius: 0,
                requires_status: Vec::new(),
                requires_door_level: Some(1),
            });
            map.enemy_groups.push(EnemyGroup {
                category: "skeleton".into(),
                location: Rect::new(2, 7, 2, 2),
                level_min: 1,
                level_max: 3,
                number_min: 1,
                number_max: 2,
                chance: 100,
                direction: None,
                waypoints: vec![Pos::new(2, 7), Pos::new(7, 7)],
                wander_radius: 4,
                requires_status: Vec::new(),
                requires_door_level: Some(0),
            });
        }
        ProcgenRole::Links => {
            for direction in Direction::ALL {
                map.events.push(MapEvent {
                    location: link_rect(direction),
                    components: vec![EventComponent::ProcgenLink { direction }],
                    ..MapEvent::default()
                });
            }
            map.events.push(MapEvent {
                kind: "connector".into(),
                location: Rect::new(CONNECTOR_EVENT_POS.x, CONNECTOR_EVENT_POS.y, 1, 1),
                components: vec![EventComponent::MapMod {
                    layer: "object".into(),
                    pos: CONNECTOR_EVENT_POS,
                    value: 7,
                }],
                ..MapEvent::default()
            });
        }
        _ => {}
    }
    map
}

pub fn host_map() -> Map {
    let mut host = Map::with_layers(40, 40, &["background", COLLISION_LAYER]);
    host.title = "Sunken Crypt".into();
    host.tileset = "tilesets/dungeon.txt".into();
    host.music = "music/crypt.ogg".into();
    host.procgen_reset_status = Some(RESET_STATUS.into());
    host.events.push(MapEvent {
        kind: "procgen".into(),
        location: Rect::new(0, 0, 30, 30),
        components: vec![EventComponent::ProcgenFilename { file: RULES_FILE.into() }],
        ..MapEvent::default()
    });
    host
}

pub fn scenario_rules() -> RulesConfig {
    RulesConfig {
        doors_max: 1,
        main_path_length_min: 4,
        main_path_length_max: 8,
        chunks: CHUNK_FILES.map(|(name, _)| name.to_string()).to_vec(),
        ..RulesConfig::default()
    }
}

/// Source holding the chunk files, the rules file and the hosting map.
pub fn scenario_source() -> MemoryMapSource {
    let mut source = MemoryMapSource::new();
    for (name, role) in CHUNK_FILES {
        source.insert_map(name, &chunk_map(role)).expect("fixture chunk serializes");
    }
    source.insert_text(RULES_FILE, RULES_TEXT);
    source.insert_map(HOST_MAP, &host_map()).expect("fixture host map serializes");
    source
}

pub fn scenario_library() -> (ChunkLibrary, RulesConfig) {
    let rules = scenario_rules();
    let library = ChunkLibrary::load(&scenario_source(), &rules);
    (library, rules)
}

/// In-memory campaign status store.
#[derive(Clone, Debug, Default)]
pub struct MemoryCampaign {
    pub set: BTreeSet<String>,
    pub registered: BTreeSet<String>,
}

impl CampaignStatus for MemoryCampaign {
    fn is_set(&self, status: &str) -> bool {
        self.set.contains(status)
    }

    fn register(&mut self, status: &str) {
        self.registered.insert(status.to_string());
    }
}
