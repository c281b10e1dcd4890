//! String-keyed game parameters: a typed union mirroring the
//! configuration surface of the simulator.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One game parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameParameter {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

pub type GameParameters = FxHashMap<String, GameParameter>;

/// Default parameters for a fresh game.
pub fn default_game_params() -> GameParameters {
    let mut params = GameParameters::default();
    // Flag to show object ids in the observation instead of binary channels
    // (reserved, not consumed by the core).
    params.insert("obs_show_ids".into(), GameParameter::Bool(false));
    // Number of scans before a magic wall expires.
    params.insert("magic_wall_steps".into(), GameParameter::Int(140));
    // Chance (out of 256) for a blob to spawn another blob.
    params.insert("blob_chance".into(), GameParameter::Int(20));
    // Max blob size before collapse, as a fraction of the board area.
    params.insert("blob_max_percentage".into(), GameParameter::Float(0.16));
    // Seed for everything that uses the rng.
    params.insert("rng_seed".into(), GameParameter::Int(0));
    // Starting board.
    params.insert(
        "game_board_str".into(),
        GameParameter::Str("2|2|-1|0|0|1|1|8".into()),
    );
    // Whether stones/gems fall.
    params.insert("gravity".into(), GameParameter::Bool(true));
    // Hidden element blobs collapse into (-1 = unset).
    params.insert("blob_swap".into(), GameParameter::Int(-1));
    params
}

// Typed getters. A missing key or mismatched type is a configuration bug in
// the caller, not a recoverable condition, so these fail fast.

pub fn bool_param(params: &GameParameters, key: &str) -> bool {
    match params.get(key) {
        Some(GameParameter::Bool(v)) => *v,
        Some(other) => panic!("parameter {key:?} is not a bool: {other:?}"),
        None => panic!("missing parameter {key:?}"),
    }
}

pub fn int_param(params: &GameParameters, key: &str) -> i64 {
    match params.get(key) {
        Some(GameParameter::Int(v)) => *v,
        Some(other) => panic!("parameter {key:?} is not an int: {other:?}"),
        None => panic!("missing parameter {key:?}"),
    }
}

pub fn float_param(params: &GameParameters, key: &str) -> f64 {
    match params.get(key) {
        Some(GameParameter::Float(v)) => *v,
        Some(other) => panic!("parameter {key:?} is not a float: {other:?}"),
        None => panic!("missing parameter {key:?}"),
    }
}

pub fn str_param<'a>(params: &'a GameParameters, key: &str) -> &'a str {
    match params.get(key) {
        Some(GameParameter::Str(v)) => v,
        Some(other) => panic!("parameter {key:?} is not a string: {other:?}"),
        None => panic!("missing parameter {key:?}"),
    }
}
