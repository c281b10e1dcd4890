//! Static element catalogue: cell types, property bits, and the dense
//! direction/conversion tables the simulator dispatches through.

/// Actions the agent can take (noop + 4 orthogonal moves).
pub const NUM_ACTIONS: usize = 5;
/// All movement directions, including diagonals (used by explosions).
pub const NUM_DIRECTIONS: usize = 9;

/// Agent position sentinel: agent walked into the open exit.
pub const AGENT_POS_EXIT: i32 = -1;
/// Agent position sentinel: agent died.
pub const AGENT_POS_DIE: i32 = -2;

/// Movement directions. The first `NUM_ACTIONS` double as agent actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Direction {
    Noop = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Left = 4,
    UpRight = 5,
    DownRight = 6,
    DownLeft = 7,
    UpLeft = 8,
}

pub const DIRECTIONS: [Direction; NUM_DIRECTIONS] = [
    Direction::Noop,
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::UpRight,
    Direction::DownRight,
    Direction::DownLeft,
    Direction::UpLeft,
];

/// 90-degree counter-clockwise rotation, indexed by direction.
pub const ROTATE_LEFT: [Direction; NUM_DIRECTIONS] = [
    Direction::Noop,
    Direction::Left,
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::UpLeft,
    Direction::UpRight,
    Direction::DownRight,
    Direction::DownLeft,
];

/// 90-degree clockwise rotation, indexed by direction.
pub const ROTATE_RIGHT: [Direction; NUM_DIRECTIONS] = [
    Direction::Noop,
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::Up,
    Direction::DownRight,
    Direction::DownLeft,
    Direction::UpLeft,
    Direction::UpRight,
];

impl Direction {
    /// Direction for an agent action index. Panics on out-of-range input:
    /// passing an unknown action is a contract violation by the caller.
    pub fn from_action(action: usize) -> Direction {
        assert!(action < NUM_ACTIONS, "action out of range: {action}");
        DIRECTIONS[action]
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Hidden cell types: the full simulation-level catalogue, including
/// falling and directional variants. Discriminants are the board-string
/// cell codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum HiddenCellType {
    Agent = 0,
    Empty = 1,
    Dirt = 2,
    Stone = 3,
    StoneFalling = 4,
    Diamond = 5,
    DiamondFalling = 6,
    ExitClosed = 7,
    ExitOpen = 8,
    AgentInExit = 9,
    FireflyUp = 10,
    FireflyLeft = 11,
    FireflyDown = 12,
    FireflyRight = 13,
    ButterflyUp = 14,
    ButterflyLeft = 15,
    ButterflyDown = 16,
    ButterflyRight = 17,
    WallBrick = 18,
    WallSteel = 19,
    WallMagicDormant = 20,
    WallMagicOn = 21,
    WallMagicExpired = 22,
    Blob = 23,
    ExplosionDiamond = 24,
    ExplosionBoulder = 25,
    ExplosionEmpty = 26,
    GateRedClosed = 27,
    GateRedOpen = 28,
    KeyRed = 29,
    GateBlueClosed = 30,
    GateBlueOpen = 31,
    KeyBlue = 32,
    GateGreenClosed = 33,
    GateGreenOpen = 34,
    KeyGreen = 35,
    GateYellowClosed = 36,
    GateYellowOpen = 37,
    KeyYellow = 38,
    Nut = 39,
    NutFalling = 40,
    Bomb = 41,
    BombFalling = 42,
    OrangeUp = 43,
    OrangeLeft = 44,
    OrangeDown = 45,
    OrangeRight = 46,
}

pub const NUM_HIDDEN_CELL_TYPES: usize = 47;

/// Visible cell types: what observations expose. Falling variants collapse
/// onto their stationary element, directional variants onto one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum VisibleCellType {
    Agent = 0,
    Empty = 1,
    Dirt = 2,
    Stone = 3,
    Diamond = 4,
    ExitClosed = 5,
    ExitOpen = 6,
    AgentInExit = 7,
    Firefly = 8,
    Butterfly = 9,
    WallBrick = 10,
    WallSteel = 11,
    WallMagicOff = 12,
    WallMagicOn = 13,
    Blob = 14,
    Explosion = 15,
    GateRedClosed = 16,
    GateRedOpen = 17,
    KeyRed = 18,
    GateBlueClosed = 19,
    GateBlueOpen = 20,
    KeyBlue = 21,
    GateGreenClosed = 22,
    GateGreenOpen = 23,
    KeyGreen = 24,
    GateYellowClosed = 25,
    GateYellowOpen = 26,
    KeyYellow = 27,
    Nut = 28,
    Bomb = 29,
    Orange = 30,
}

pub const NUM_VISIBLE_CELL_TYPES: usize = 31;

/// Element property bits.
pub mod properties {
    pub const NONE: u32 = 0;
    /// Items roll off elements with this bit (stones, diamonds, brick walls).
    pub const ROUNDED: u32 = 1 << 0;
    /// Element chains when caught in an explosion.
    pub const CAN_EXPLODE: u32 = 1 << 1;
    /// Element is destroyed (consumed) by an adjacent explosion.
    pub const CONSUMABLE: u32 = 1 << 2;
    /// Agent may land on this element when passing through a gate.
    pub const TRAVERSABLE: u32 = 1 << 3;
    /// Agent can push this element horizontally.
    pub const PUSHABLE: u32 = 1 << 4;
}

/// Reward-signal bits, OR-accumulated into a `u64` per scan.
pub mod reward {
    pub const COLLECT_DIAMOND: u64 = 1 << 0;
    pub const WALK_THROUGH_EXIT: u64 = 1 << 1;
    pub const WALK_THROUGH_GATE: u64 = 1 << 2;
    pub const COLLECT_KEY: u64 = 1 << 3;
    pub const COLLECT_KEY_RED: u64 = 1 << 4;
    pub const COLLECT_KEY_BLUE: u64 = 1 << 5;
    pub const COLLECT_KEY_GREEN: u64 = 1 << 6;
    pub const COLLECT_KEY_YELLOW: u64 = 1 << 7;
    pub const WALK_THROUGH_GATE_RED: u64 = 1 << 8;
    pub const WALK_THROUGH_GATE_BLUE: u64 = 1 << 9;
    pub const WALK_THROUGH_GATE_GREEN: u64 = 1 << 10;
    pub const WALK_THROUGH_GATE_YELLOW: u64 = 1 << 11;
}

/// Value-type descriptor for one hidden cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub cell_type: HiddenCellType,
    pub visible_type: VisibleCellType,
    pub properties: u32,
    /// Single-character id used when printing boards.
    pub id: char,
}

use self::properties as p;
use self::HiddenCellType as H;
use self::VisibleCellType as V;

const fn el(cell_type: H, visible_type: V, properties: u32, id: char) -> Element {
    Element {
        cell_type,
        visible_type,
        properties,
        id,
    }
}

/// The static catalogue, indexed by hidden cell code.
pub const ELEMENTS: [Element; NUM_HIDDEN_CELL_TYPES] = [
    el(H::Agent, V::Agent, p::CAN_EXPLODE | p::CONSUMABLE, '@'),
    el(H::Empty, V::Empty, p::CONSUMABLE | p::TRAVERSABLE, ' '),
    el(H::Dirt, V::Dirt, p::CONSUMABLE | p::TRAVERSABLE, '.'),
    el(H::Stone, V::Stone, p::ROUNDED | p::CONSUMABLE | p::PUSHABLE, 'o'),
    el(H::StoneFalling, V::Stone, p::CONSUMABLE, 'o'),
    el(
        H::Diamond,
        V::Diamond,
        p::ROUNDED | p::CONSUMABLE | p::TRAVERSABLE,
        '*',
    ),
    el(H::DiamondFalling, V::Diamond, p::CONSUMABLE | p::TRAVERSABLE, '*'),
    el(H::ExitClosed, V::ExitClosed, p::NONE, 'C'),
    el(H::ExitOpen, V::ExitOpen, p::NONE, 'E'),
    el(H::AgentInExit, V::AgentInExit, p::NONE, '!'),
    el(H::FireflyUp, V::Firefly, p::CAN_EXPLODE | p::CONSUMABLE, 'F'),
    el(H::FireflyLeft, V::Firefly, p::CAN_EXPLODE | p::CONSUMABLE, 'F'),
    el(H::FireflyDown, V::Firefly, p::CAN_EXPLODE | p::CONSUMABLE, 'F'),
    el(H::FireflyRight, V::Firefly, p::CAN_EXPLODE | p::CONSUMABLE, 'F'),
    el(H::ButterflyUp, V::Butterfly, p::CAN_EXPLODE | p::CONSUMABLE, 'U'),
    el(H::ButterflyLeft, V::Butterfly, p::CAN_EXPLODE | p::CONSUMABLE, 'U'),
    el(H::ButterflyDown, V::Butterfly, p::CAN_EXPLODE | p::CONSUMABLE, 'U'),
    el(H::ButterflyRight, V::Butterfly, p::CAN_EXPLODE | p::CONSUMABLE, 'U'),
    el(H::WallBrick, V::WallBrick, p::ROUNDED | p::CONSUMABLE, '#'),
    el(H::WallSteel, V::WallSteel, p::NONE, '&'),
    el(H::WallMagicDormant, V::WallMagicOff, p::NONE, 'M'),
    el(H::WallMagicOn, V::WallMagicOn, p::NONE, 'W'),
    el(H::WallMagicExpired, V::WallMagicOff, p::NONE, 'Q'),
    el(H::Blob, V::Blob, p::CONSUMABLE, 'm'),
    el(H::ExplosionDiamond, V::Explosion, p::NONE, '^'),
    el(H::ExplosionBoulder, V::Explosion, p::NONE, '^'),
    el(H::ExplosionEmpty, V::Explosion, p::NONE, '^'),
    el(H::GateRedClosed, V::GateRedClosed, p::NONE, 'r'),
    el(H::GateRedOpen, V::GateRedOpen, p::NONE, 'R'),
    el(H::KeyRed, V::KeyRed, p::TRAVERSABLE, '1'),
    el(H::GateBlueClosed, V::GateBlueClosed, p::NONE, 'b'),
    el(H::GateBlueOpen, V::GateBlueOpen, p::NONE, 'B'),
    el(H::KeyBlue, V::KeyBlue, p::TRAVERSABLE, '2'),
    el(H::GateGreenClosed, V::GateGreenClosed, p::NONE, 'g'),
    el(H::GateGreenOpen, V::GateGreenOpen, p::NONE, 'G'),
    el(H::KeyGreen, V::KeyGreen, p::TRAVERSABLE, '3'),
    el(H::GateYellowClosed, V::GateYellowClosed, p::NONE, 'y'),
    el(H::GateYellowOpen, V::GateYellowOpen, p::NONE, 'Y'),
    el(H::KeyYellow, V::KeyYellow, p::TRAVERSABLE, '4'),
    el(H::Nut, V::Nut, p::ROUNDED | p::CONSUMABLE | p::PUSHABLE, 'n'),
    el(H::NutFalling, V::Nut, p::CONSUMABLE, 'n'),
    el(H::Bomb, V::Bomb, p::ROUNDED | p::CAN_EXPLODE | p::CONSUMABLE | p::PUSHABLE, 'x'),
    el(H::BombFalling, V::Bomb, p::CAN_EXPLODE | p::CONSUMABLE, 'x'),
    el(H::OrangeUp, V::Orange, p::CAN_EXPLODE | p::CONSUMABLE, 'O'),
    el(H::OrangeLeft, V::Orange, p::CAN_EXPLODE | p::CONSUMABLE, 'O'),
    el(H::OrangeDown, V::Orange, p::CAN_EXPLODE | p::CONSUMABLE, 'O'),
    el(H::OrangeRight, V::Orange, p::CAN_EXPLODE | p::CONSUMABLE, 'O'),
];

impl HiddenCellType {
    /// Decode a board-string cell code. `None` for codes outside the catalogue.
    pub fn from_code(code: i8) -> Option<HiddenCellType> {
        if (0..NUM_HIDDEN_CELL_TYPES as i8).contains(&code) {
            Some(ELEMENTS[code as usize].cell_type)
        } else {
            None
        }
    }

    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn element(self) -> &'static Element {
        &ELEMENTS[self as usize]
    }

    pub fn visible(self) -> VisibleCellType {
        self.element().visible_type
    }

    pub fn has_property(self, property: u32) -> bool {
        self.element().properties & property != 0
    }

    /// Elements with persistent identity across moves.
    pub fn is_trackable(self) -> bool {
        matches!(
            self,
            H::Stone | H::StoneFalling | H::Diamond | H::DiamondFalling | H::Nut | H::NutFalling
        )
    }

    pub fn is_key(self) -> bool {
        matches!(self, H::KeyRed | H::KeyBlue | H::KeyGreen | H::KeyYellow)
    }

    pub fn is_open_gate(self) -> bool {
        matches!(
            self,
            H::GateRedOpen | H::GateBlueOpen | H::GateGreenOpen | H::GateYellowOpen
        )
    }

    pub fn is_magic_wall(self) -> bool {
        matches!(self, H::WallMagicDormant | H::WallMagicOn | H::WallMagicExpired)
    }

    pub fn is_explosion(self) -> bool {
        matches!(self, H::ExplosionDiamond | H::ExplosionBoulder | H::ExplosionEmpty)
    }
}

/// Direction a butterfly element is facing, `None` for non-butterflies.
pub fn butterfly_direction(cell: HiddenCellType) -> Option<Direction> {
    match cell {
        H::ButterflyUp => Some(Direction::Up),
        H::ButterflyLeft => Some(Direction::Left),
        H::ButterflyDown => Some(Direction::Down),
        H::ButterflyRight => Some(Direction::Right),
        _ => None,
    }
}

pub fn firefly_direction(cell: HiddenCellType) -> Option<Direction> {
    match cell {
        H::FireflyUp => Some(Direction::Up),
        H::FireflyLeft => Some(Direction::Left),
        H::FireflyDown => Some(Direction::Down),
        H::FireflyRight => Some(Direction::Right),
        _ => None,
    }
}

pub fn orange_direction(cell: HiddenCellType) -> Option<Direction> {
    match cell {
        H::OrangeUp => Some(Direction::Up),
        H::OrangeLeft => Some(Direction::Left),
        H::OrangeDown => Some(Direction::Down),
        H::OrangeRight => Some(Direction::Right),
        _ => None,
    }
}

/// Butterfly variant facing `dir`. Panics on diagonal/noop input: compound
/// elements only ever face orthogonally (a catalogue bug otherwise).
pub fn direction_to_butterfly(dir: Direction) -> HiddenCellType {
    match dir {
        Direction::Up => H::ButterflyUp,
        Direction::Left => H::ButterflyLeft,
        Direction::Down => H::ButterflyDown,
        Direction::Right => H::ButterflyRight,
        _ => panic!("no butterfly variant for direction {dir:?}"),
    }
}

pub fn direction_to_firefly(dir: Direction) -> HiddenCellType {
    match dir {
        Direction::Up => H::FireflyUp,
        Direction::Left => H::FireflyLeft,
        Direction::Down => H::FireflyDown,
        Direction::Right => H::FireflyRight,
        _ => panic!("no firefly variant for direction {dir:?}"),
    }
}

pub fn direction_to_orange(dir: Direction) -> HiddenCellType {
    match dir {
        Direction::Up => H::OrangeUp,
        Direction::Left => H::OrangeLeft,
        Direction::Down => H::OrangeDown,
        Direction::Right => H::OrangeRight,
        _ => panic!("no orange variant for direction {dir:?}"),
    }
}

/// Explosion element spawned when `cell` is destroyed. Butterflies burst
/// into diamond explosions, fireflies into boulder explosions; everything
/// else clears to empty.
pub fn element_to_explosion(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::ButterflyUp | H::ButterflyLeft | H::ButterflyDown | H::ButterflyRight => {
            H::ExplosionDiamond
        }
        H::FireflyUp | H::FireflyLeft | H::FireflyDown | H::FireflyRight => H::ExplosionBoulder,
        _ => H::ExplosionEmpty,
    }
}

/// Element an explosion stage settles into on the next scan.
pub fn explosion_to_element(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::ExplosionDiamond => H::Diamond,
        H::ExplosionBoulder => H::Stone,
        H::ExplosionEmpty => H::Empty,
        _ => panic!("{cell:?} is not an explosion element"),
    }
}

/// Magic-wall pass-through conversion (stone <-> diamond, falling variants).
pub fn magic_wall_conversion(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::StoneFalling => H::DiamondFalling,
        H::DiamondFalling => H::StoneFalling,
        _ => panic!("{cell:?} cannot pass through a magic wall"),
    }
}

/// Falling variant of a pushable element.
pub fn to_falling(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::Stone => H::StoneFalling,
        H::Nut => H::NutFalling,
        H::Bomb => H::BombFalling,
        _ => panic!("{cell:?} has no falling variant"),
    }
}

/// Closed gate opened by a key.
pub fn key_to_gate(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::KeyRed => H::GateRedClosed,
        H::KeyBlue => H::GateBlueClosed,
        H::KeyGreen => H::GateGreenClosed,
        H::KeyYellow => H::GateYellowClosed,
        _ => panic!("{cell:?} is not a key"),
    }
}

/// Open variant of a closed gate.
pub fn gate_open(cell: HiddenCellType) -> HiddenCellType {
    match cell {
        H::GateRedClosed => H::GateRedOpen,
        H::GateBlueClosed => H::GateBlueOpen,
        H::GateGreenClosed => H::GateGreenOpen,
        H::GateYellowClosed => H::GateYellowOpen,
        _ => panic!("{cell:?} is not a closed gate"),
    }
}

pub fn key_signal(cell: HiddenCellType) -> u64 {
    match cell {
        H::KeyRed => reward::COLLECT_KEY_RED,
        H::KeyBlue => reward::COLLECT_KEY_BLUE,
        H::KeyGreen => reward::COLLECT_KEY_GREEN,
        H::KeyYellow => reward::COLLECT_KEY_YELLOW,
        _ => panic!("{cell:?} is not a key"),
    }
}

pub fn gate_signal(cell: HiddenCellType) -> u64 {
    match cell {
        H::GateRedOpen => reward::WALK_THROUGH_GATE_RED,
        H::GateBlueOpen => reward::WALK_THROUGH_GATE_BLUE,
        H::GateGreenOpen => reward::WALK_THROUGH_GATE_GREEN,
        H::GateYellowOpen => reward::WALK_THROUGH_GATE_YELLOW,
        _ => panic!("{cell:?} is not an open gate"),
    }
}

/// Points awarded when the agent collects `cell`.
pub fn points(cell: HiddenCellType) -> u8 {
    match cell {
        H::Diamond | H::DiamondFalling => 2,
        _ => 0,
    }
}

/// Reward-signal bit a cell type can produce, for reward reachability
/// queries. `None` for elements with no associated signal.
pub fn element_reward(cell: HiddenCellType) -> Option<u64> {
    match cell {
        H::Diamond | H::DiamondFalling => Some(reward::COLLECT_DIAMOND),
        H::ExitClosed | H::ExitOpen => Some(reward::WALK_THROUGH_EXIT),
        H::KeyRed | H::KeyBlue | H::KeyGreen | H::KeyYellow => Some(reward::COLLECT_KEY),
        H::GateRedClosed | H::GateRedOpen | H::GateBlueClosed | H::GateBlueOpen
        | H::GateGreenClosed | H::GateGreenOpen | H::GateYellowClosed | H::GateYellowOpen => {
            Some(reward::WALK_THROUGH_GATE)
        }
        _ => None,
    }
}
