//! Behavioral tests for the scan-based update rules.

use crate::element::{reward, AGENT_POS_DIE};
use crate::params::GameParameter;
use crate::{default_game_params, GameParameters, GameState};

use crate::HiddenCellType as H;

const NOOP: usize = 0;
const UP: usize = 1;
const RIGHT: usize = 2;
const DOWN: usize = 3;
const LEFT: usize = 4;

fn params_for(board_str: &str) -> GameParameters {
    let mut params = default_game_params();
    params.insert(
        "game_board_str".into(),
        GameParameter::Str(board_str.into()),
    );
    params
}

fn state_from(board_str: &str) -> GameState {
    GameState::new(&params_for(board_str)).unwrap()
}

#[test]
fn default_board_is_solvable_in_two_moves() {
    let mut s = GameState::new(&default_game_params()).unwrap();
    assert!(!s.is_solution());
    s.apply_action(RIGHT);
    s.apply_action(DOWN);
    assert!(s.is_solution());
    assert!(s.is_terminal());
    assert_ne!(s.get_reward_signal() & reward::WALK_THROUGH_EXIT, 0);
}

#[test]
fn corridor_diamond_is_collected() {
    // Agent, gap, diamond on a dirt bed.
    let mut s = state_from("3|3|10|1|0|1|5|2|2|2|2|2|2");
    s.apply_action(RIGHT);
    assert_eq!(s.gems_collected(), 0);
    s.apply_action(RIGHT);
    assert_eq!(s.gems_collected(), 1);
    assert_ne!(s.get_reward_signal() & reward::COLLECT_DIAMOND, 0);
    // No exit on this board, so collecting is not solving.
    assert!(!s.is_solution());
    assert!(!s.is_terminal());
}

#[test]
fn stone_falls_under_gravity_and_comes_to_rest() {
    let mut s = state_from("3|3|10|0|1|1|1|3|1|1|1|1|1");
    s.apply_action(NOOP);
    // One scan: the stone starts falling and advances one row.
    assert_eq!(s.get_hidden_item(3), H::Empty);
    assert_eq!(s.get_hidden_item(6), H::StoneFalling);
    s.apply_action(NOOP);
    // Floor reached: back to stationary.
    assert_eq!(s.get_hidden_item(6), H::Stone);
}

#[test]
fn gravity_off_freezes_loose_elements() {
    let mut params = params_for("3|3|10|0|3|5|39|1|1|1|1|1|41");
    params.insert("gravity".into(), GameParameter::Bool(false));
    let mut s = GameState::new(&params).unwrap();
    let before = s.board().grid.clone();
    for _ in 0..4 {
        s.apply_action(NOOP);
    }
    assert_eq!(s.board().grid, before);
}

#[test]
fn stone_rolls_off_a_stone_pile() {
    let mut s = state_from("3|3|10|0|1|1|1|3|1|1|3|1|1");
    s.apply_action(NOOP);
    // Top stone cannot roll left (border), so it rolls right.
    assert_eq!(s.get_hidden_item(3), H::Empty);
    assert_eq!(s.get_hidden_item(4), H::StoneFalling);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(7), H::StoneFalling);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(7), H::Stone);
}

#[test]
fn falling_stone_cracks_a_nut_into_a_diamond() {
    let mut s = state_from("2|1|10|0|4|39");
    let nut_id = s.get_index_id(1).unwrap();
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(0), H::StoneFalling);
    assert_eq!(s.get_hidden_item(1), H::Diamond);
    // The cracked nut is a new item.
    let diamond_id = s.get_index_id(1).unwrap();
    assert_ne!(diamond_id, nut_id);
    assert_eq!(s.get_id_index(nut_id), None);
    s.apply_action(NOOP);
    // Stone rests on the diamond.
    assert_eq!(s.get_hidden_item(0), H::Stone);
}

#[test]
fn magic_wall_converts_a_falling_stone() {
    let mut params = params_for("4|1|10|0|3|1|20|1");
    params.insert("magic_wall_steps".into(), GameParameter::Int(10));
    let mut s = GameState::new(&params).unwrap();

    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(1), H::StoneFalling);
    assert!(!s.local.magic_active);

    s.apply_action(NOOP);
    // Stone passed through and came out a diamond; the wall lit up.
    assert_eq!(s.get_hidden_item(1), H::Empty);
    assert_eq!(s.get_hidden_item(2), H::WallMagicOn);
    assert_eq!(s.get_hidden_item(3), H::DiamondFalling);
    assert!(s.local.magic_active);
    assert_eq!(s.local.magic_wall_steps, 9);
}

#[test]
fn magic_wall_expires_after_its_step_budget() {
    let mut params = params_for("4|1|20|0|3|1|20|1");
    params.insert("magic_wall_steps".into(), GameParameter::Int(2));
    let mut s = GameState::new(&params).unwrap();
    s.apply_action(NOOP);
    s.apply_action(NOOP); // activation scan
    s.apply_action(NOOP);
    s.apply_action(NOOP);
    assert!(!s.local.magic_active);
    assert_eq!(s.local.magic_wall_steps, 0);
    assert_eq!(s.get_hidden_item(2), H::WallMagicExpired);
}

#[test]
fn bomb_chain_detonates_and_kills_adjacent_agent() {
    // Falling bomb wedged above a row of bombs, agent in the blast radius.
    let mut s = state_from("3|3|10|0|1|42|1|41|41|41|0|1|1");
    s.apply_action(NOOP);
    assert_eq!(s.get_agent_pos(), AGENT_POS_DIE);
    assert!(s.is_terminal());
    assert!(!s.is_solution());
    // The whole neighborhood went up.
    for i in [0usize, 1, 2, 3, 4, 5, 6] {
        assert!(
            s.get_hidden_item(i).is_explosion(),
            "cell {i} is {:?}",
            s.get_hidden_item(i)
        );
    }
}

#[test]
fn explosions_settle_on_the_next_scan() {
    let mut s = state_from("1|3|10|0|24|25|26");
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(0), H::Diamond);
    assert_eq!(s.get_hidden_item(1), H::Stone);
    assert_eq!(s.get_hidden_item(2), H::Empty);
    // Settled diamonds and stones are trackable again.
    assert!(s.get_index_id(0).is_some());
    assert!(s.get_index_id(1).is_some());
}

#[test]
fn key_then_gate_walkthrough() {
    let mut s = state_from("1|6|20|0|0|29|27|1|1|1");
    s.apply_action(RIGHT);
    assert_eq!(s.get_agent_pos(), 1);
    let sig = s.get_reward_signal();
    assert_ne!(sig & reward::COLLECT_KEY, 0);
    assert_ne!(sig & reward::COLLECT_KEY_RED, 0);
    // Collecting the key opened the gate.
    assert_eq!(s.get_hidden_item(2), H::GateRedOpen);

    s.apply_action(RIGHT);
    // Teleported through the gate onto the empty cell beyond.
    assert_eq!(s.get_agent_pos(), 3);
    assert_eq!(s.get_hidden_item(3), H::Agent);
    assert_eq!(s.get_hidden_item(2), H::GateRedOpen);
    assert_eq!(s.get_hidden_item(1), H::Empty);
    let sig = s.get_reward_signal();
    assert_ne!(sig & reward::WALK_THROUGH_GATE, 0);
    assert_ne!(sig & reward::WALK_THROUGH_GATE_RED, 0);
}

#[test]
fn gate_blocked_by_wall_is_not_traversable() {
    let mut s = state_from("1|4|20|0|0|28|19|1");
    s.apply_action(RIGHT);
    // Steel beyond the open gate: the agent stays put.
    assert_eq!(s.get_agent_pos(), 0);
    assert_eq!(s.get_reward_signal(), 0);
}

#[test]
fn agent_pushes_a_stone() {
    let mut s = state_from("1|4|10|0|1|0|3|1");
    s.apply_action(RIGHT);
    assert_eq!(s.get_hidden_item(1), H::Empty);
    assert_eq!(s.get_hidden_item(2), H::Agent);
    assert_eq!(s.get_hidden_item(3), H::Stone);
    assert_eq!(s.get_agent_pos(), 2);
}

#[test]
fn push_against_a_wall_fails() {
    let mut s = state_from("1|3|10|0|0|3|19");
    s.apply_action(RIGHT);
    assert_eq!(s.get_hidden_item(0), H::Agent);
    assert_eq!(s.get_hidden_item(1), H::Stone);
    assert_eq!(s.get_agent_pos(), 0);
}

#[test]
fn pushed_stone_falls_into_a_hole() {
    // Second row gives the pushed stone somewhere to drop.
    let mut s = state_from("2|4|10|0|1|0|3|1|18|18|18|1");
    s.apply_action(RIGHT);
    assert_eq!(s.get_hidden_item(2), H::Agent);
    // Past-cell had an empty cell below it, so the stone left falling.
    assert_eq!(s.get_hidden_item(3), H::StoneFalling);
}

#[test]
fn closed_exit_opens_once_gems_suffice() {
    let mut s = state_from("1|3|10|1|0|5|7");
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(2), H::ExitClosed);
    s.apply_action(RIGHT); // collect the diamond
    assert_eq!(s.gems_collected(), 1);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(2), H::ExitOpen);
    s.apply_action(RIGHT);
    assert!(s.is_solution());
}

#[test]
fn timeout_terminates_and_blocks_solution() {
    let mut s = state_from("1|3|2|0|0|1|8");
    s.apply_action(NOOP);
    assert!(!s.is_terminal());
    s.apply_action(NOOP);
    assert!(s.is_terminal());
    assert!(!s.is_solution());
    assert_eq!(s.steps_remaining(), 0);
}

#[test]
fn zero_max_steps_disables_the_timeout() {
    let mut s = state_from("1|3|0|0|0|1|1");
    for _ in 0..10 {
        s.apply_action(NOOP);
        assert!(!s.is_terminal());
    }
    assert_eq!(s.steps_remaining(), 0);
}

#[test]
fn butterfly_prefers_turning_right() {
    let mut s = state_from("3|3|10|0|1|1|1|1|14|1|1|1|1");
    s.apply_action(NOOP);
    // Facing up in open space: rotate right and move right.
    assert_eq!(s.get_hidden_item(4), H::Empty);
    assert_eq!(s.get_hidden_item(5), H::ButterflyRight);
}

#[test]
fn firefly_prefers_turning_left() {
    let mut s = state_from("3|3|10|0|1|1|1|1|10|1|1|1|1");
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::Empty);
    assert_eq!(s.get_hidden_item(3), H::FireflyLeft);
}

#[test]
fn cornered_firefly_rotates_in_place() {
    // Bricks everywhere: no move possible, only the heading changes.
    let mut s = state_from("3|3|10|0|18|18|18|18|10|18|18|18|18");
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::FireflyRight);
}

#[test]
fn firefly_next_to_agent_explodes_and_kills_it() {
    let mut s = state_from("1|3|10|0|0|10|1");
    s.apply_action(NOOP);
    assert_eq!(s.get_agent_pos(), AGENT_POS_DIE);
    assert!(s.is_terminal());
}

#[test]
fn butterfly_explosion_leaves_diamond_seeds() {
    // Stone dropped on a butterfly: the blast is diamond-flavored.
    let mut s = state_from("3|3|10|0|1|4|1|1|14|1|1|1|1");
    s.apply_action(NOOP);
    assert!(s
        .board()
        .grid
        .iter()
        .any(|&c| c == H::ExplosionDiamond));
    s.apply_action(NOOP);
    assert!(s.board().grid.iter().any(|&c| c == H::Diamond));
}

#[test]
fn firefly_explosion_leaves_boulder_seeds() {
    // Stone dropped on a firefly: the blast is boulder-flavored.
    let mut s = state_from("3|3|10|0|1|4|1|1|10|1|1|1|1");
    s.apply_action(NOOP);
    assert!(s
        .board()
        .grid
        .iter()
        .any(|&c| c == H::ExplosionBoulder));
    s.apply_action(NOOP);
    assert!(s.board().grid.iter().any(|&c| c == H::Stone));
    // The settled stones are trackable items.
    assert!(s.get_index_id(4).is_some());
}

#[test]
fn orange_moves_forward_until_blocked() {
    let mut s = state_from("1|4|10|0|46|1|1|19");
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(0), H::Empty);
    assert_eq!(s.get_hidden_item(1), H::OrangeRight);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(2), H::OrangeRight);
    s.apply_action(NOOP);
    // Blocked by steel with open cells behind: picks a fresh heading.
    let cell = s.get_hidden_item(2);
    assert!(
        crate::element::orange_direction(cell).is_some(),
        "expected an orange, got {cell:?}"
    );
}

#[test]
fn enclosed_blob_collapses_to_diamond() {
    let mut params = params_for("3|3|10|0|18|18|18|18|23|18|18|18|18");
    params.insert("blob_chance".into(), GameParameter::Int(0));
    let mut s = GameState::new(&params).unwrap();
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::Blob);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::Diamond);
    assert!(s.get_index_id(4).is_some());
}

#[test]
fn oversized_blob_collapses_to_stone() {
    // Cap of zero and an open neighbor: one blob already exceeds the cap.
    let mut params = params_for("3|3|50|0|1|1|1|1|23|1|1|1|1");
    params.insert("blob_chance".into(), GameParameter::Int(0));
    params.insert("blob_max_percentage".into(), GameParameter::Float(0.01));
    let mut s = GameState::new(&params).unwrap();
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::Blob);
    s.apply_action(NOOP);
    assert_eq!(s.get_hidden_item(4), H::Stone);
}

#[test]
fn blob_with_zero_chance_never_grows() {
    let mut params = params_for("3|3|50|0|1|1|1|1|23|1|1|1|1");
    params.insert("blob_chance".into(), GameParameter::Int(0));
    // Generous cap so the blob survives the whole run.
    params.insert("blob_max_percentage".into(), GameParameter::Float(1.0));
    let mut s = GameState::new(&params).unwrap();
    for _ in 0..8 {
        s.apply_action(NOOP);
        assert_eq!(s.board().find_all(H::Blob).len(), 1);
    }
}

#[test]
fn blob_growth_is_seed_deterministic() {
    let mk = || {
        let mut params = params_for("5|5|200|0|\
            1|1|1|1|1|\
            1|1|1|1|1|\
            1|1|23|1|1|\
            1|1|1|1|1|\
            1|1|1|1|1");
        params.insert("blob_chance".into(), GameParameter::Int(128));
        params.insert("blob_max_percentage".into(), GameParameter::Float(1.0));
        params.insert("rng_seed".into(), GameParameter::Int(7));
        GameState::new(&params).unwrap()
    };
    let mut a = mk();
    let mut b = mk();
    for _ in 0..12 {
        a.apply_action(NOOP);
        b.apply_action(NOOP);
    }
    assert_eq!(a, b);
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.local.random_state, b.local.random_state);
}

#[test]
fn agent_walks_and_digs() {
    let mut s = state_from("2|2|10|0|0|2|1|1");
    s.apply_action(RIGHT);
    assert_eq!(s.get_agent_pos(), 1);
    assert_eq!(s.get_hidden_item(0), H::Empty);
    s.apply_action(DOWN);
    assert_eq!(s.get_agent_pos(), 3);
    s.apply_action(LEFT);
    assert_eq!(s.get_agent_pos(), 2);
    s.apply_action(UP);
    assert_eq!(s.get_agent_pos(), 0);
}

#[test]
fn agent_blocked_by_walls_stays_put() {
    let mut s = state_from("1|2|10|0|0|19");
    s.apply_action(RIGHT);
    assert_eq!(s.get_agent_pos(), 0);
    s.apply_action(LEFT); // board edge
    assert_eq!(s.get_agent_pos(), 0);
}
