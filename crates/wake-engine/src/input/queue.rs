use std::collections::HashMap;

/// Input event types the core understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
}

/// A queue of input events.
/// The host pushes events; the simulation reads them each tick and the
/// host drains afterwards.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Logical movement keys, independent of the physical key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKey {
    Up,
    Down,
    Left,
    Right,
}

impl LogicalKey {
    fn bit(self) -> u8 {
        match self {
            LogicalKey::Up => 1,
            LogicalKey::Down => 1 << 1,
            LogicalKey::Left => 1 << 2,
            LogicalKey::Right => 1 << 3,
        }
    }
}

/// Set of currently pressed logical keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressedKeys(u8);

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: LogicalKey) -> Self {
        self.press(key);
        self
    }

    pub fn press(&mut self, key: LogicalKey) {
        self.0 |= key.bit();
    }

    pub fn release(&mut self, key: LogicalKey) {
        self.0 &= !key.bit();
    }

    pub fn contains(&self, key: LogicalKey) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Apply one raw input event through the bindings. Unbound keys are ignored.
    pub fn apply(&mut self, event: &InputEvent, bindings: &KeyBindings) {
        match *event {
            InputEvent::KeyDown { key_code } => {
                if let Some(key) = bindings.lookup(key_code) {
                    self.press(key);
                }
            }
            InputEvent::KeyUp { key_code } => {
                if let Some(key) = bindings.lookup(key_code) {
                    self.release(key);
                }
            }
        }
    }
}

/// Physical key code → logical key map.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<u32, LogicalKey>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn bind(mut self, key_code: u32, key: LogicalKey) -> Self {
        self.map.insert(key_code, key);
        self
    }

    pub fn lookup(&self, key_code: u32) -> Option<LogicalKey> {
        self.map.get(&key_code).copied()
    }
}

impl Default for KeyBindings {
    /// Arrow keys and WASD (DOM key codes).
    fn default() -> Self {
        Self::empty()
            .bind(38, LogicalKey::Up)
            .bind(40, LogicalKey::Down)
            .bind(37, LogicalKey::Left)
            .bind(39, LogicalKey::Right)
            .bind(87, LogicalKey::Up)
            .bind(83, LogicalKey::Down)
            .bind(65, LogicalKey::Left)
            .bind(68, LogicalKey::Right)
    }
}
