//! Key bindings grouped into modes
//!
//! A mode is a named set of handlers with an optional parent. A key is
//! looked up in the active mode, then up the parent chain; if nobody handles
//! it and echo is on, printable keys are written at the cursor.

use std::collections::HashMap;

use log::debug;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::input::Key;
use crate::terminal::TerminalBackend;

/// A key handler. It receives the engine, the text of the cursor's line and
/// the cursor column.
pub type Handler<B> = Box<dyn FnMut(&mut Engine<B>, &str, usize) -> Result<()>>;

/// What became of a key passed to `Keymap::handle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A bound handler ran (in the named mode or one of its parents).
    Handled,
    /// No handler; the key was echoed.
    Echoed,
    /// No handler and nothing to echo.
    Ignored,
}

struct Mode<B: TerminalBackend> {
    parent: Option<String>,
    handlers: HashMap<Key, Handler<B>>,
}

impl<B: TerminalBackend> Mode<B> {
    fn new(parent: Option<String>) -> Self {
        Self {
            parent,
            handlers: HashMap::new(),
        }
    }
}

pub struct Keymap<B: TerminalBackend> {
    modes: HashMap<String, Mode<B>>,
    active: String,
    echo: bool,
}

impl<B: TerminalBackend + 'static> Keymap<B> {
    pub const INSERT: &'static str = "insert";
    pub const READ: &'static str = "read";

    /// A keymap with the default `insert` and `read` modes, `insert` active.
    ///
    /// In `insert`, arrows move the cursor, `delete` removes one character and
    /// `enter` starts a new line. `read` inherits from `insert` but ignores
    /// `up` and `down`, keeping the cursor on the line being read.
    pub fn new(echo: bool) -> Self {
        let mut keymap = Self {
            modes: HashMap::new(),
            active: Self::INSERT.to_string(),
            echo,
        };
        keymap.install_defaults();
        keymap
    }

    fn install_defaults(&mut self) {
        self.modes.clear();
        self.modes.insert(Self::INSERT.to_string(), Mode::new(None));
        self.modes
            .insert(Self::READ.to_string(), Mode::new(Some(Self::INSERT.to_string())));

        let arrows = [
            (Key::Up, -1, 0),
            (Key::Down, 1, 0),
            (Key::Left, 0, -1),
            (Key::Right, 0, 1),
        ];
        for (key, rows, cols) in arrows {
            self.insert_handler(Self::INSERT, key, move |engine, _, _| {
                engine.move_cursor(rows, cols)
            });
        }
        self.insert_handler(Self::INSERT, Key::Delete, |engine, _, _| engine.delete(1));
        self.insert_handler(Self::INSERT, Key::Enter, |engine, _, _| engine.write("\n"));

        for key in [Key::Up, Key::Down] {
            self.insert_handler(Self::READ, key, |_, _, _| Ok(()));
        }
    }

    /// Drop every mode and binding and go back to the defaults.
    pub fn reset(&mut self) {
        self.install_defaults();
        self.active = Self::INSERT.to_string();
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    pub fn active_mode(&self) -> &str {
        &self.active
    }

    pub fn has_mode(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    /// Add (or replace) a mode. A parent must already exist.
    pub fn add_mode(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        if let Some(parent) = parent {
            if parent == name || !self.has_mode(parent) {
                return Err(Error::UnknownMode(parent.to_string()));
            }
        }
        self.modes
            .insert(name.to_string(), Mode::new(parent.map(str::to_string)));
        debug!("added mode {} (parent: {:?})", name, parent);
        Ok(())
    }

    pub fn set_mode(&mut self, name: &str) -> Result<()> {
        if !self.has_mode(name) {
            return Err(Error::UnknownMode(name.to_string()));
        }
        debug!("mode {} -> {}", self.active, name);
        self.active = name.to_string();
        Ok(())
    }

    /// Bind `handler` to the key called `key_name` in `mode`, replacing any
    /// previous binding.
    pub fn on<F>(&mut self, mode: &str, key_name: &str, handler: F) -> Result<()>
    where
        F: FnMut(&mut Engine<B>, &str, usize) -> Result<()> + 'static,
    {
        let key = Key::from_name(key_name)?;
        self.bind(mode, key, handler)
    }

    /// Like `on`, with an already decoded key.
    pub fn bind<F>(&mut self, mode: &str, key: Key, handler: F) -> Result<()>
    where
        F: FnMut(&mut Engine<B>, &str, usize) -> Result<()> + 'static,
    {
        if !self.has_mode(mode) {
            return Err(Error::UnknownMode(mode.to_string()));
        }
        self.insert_handler(mode, key, handler);
        Ok(())
    }

    fn insert_handler<F>(&mut self, mode: &str, key: Key, handler: F)
    where
        F: FnMut(&mut Engine<B>, &str, usize) -> Result<()> + 'static,
    {
        if let Some(mode) = self.modes.get_mut(mode) {
            mode.handlers.insert(key, Box::new(handler));
        }
    }

    /// Run whatever `key` is bound to, falling back to echo.
    pub fn handle(&mut self, key: Key, engine: &mut Engine<B>) -> Result<Dispatch> {
        let mut current = Some(self.active.clone());
        // Bounded walk: a mode replaced after its children were added can
        // close a loop in the parent chain.
        for _ in 0..self.modes.len() {
            let Some(name) = current.take() else {
                break;
            };
            let Some(mode) = self.modes.get_mut(&name) else {
                break;
            };
            if let Some(handler) = mode.handlers.get_mut(&key) {
                let line = engine.current_line().to_string();
                let x = engine.cursor().x;
                handler(engine, &line, x)?;
                return Ok(Dispatch::Handled);
            }
            current = mode.parent.clone();
        }

        match key.printable() {
            Some(c) if self.echo => {
                let mut buf = [0u8; 4];
                engine.write(c.encode_utf8(&mut buf))?;
                Ok(Dispatch::Echoed)
            }
            _ => {
                debug!("no binding for {} in mode {}", key, self.active);
                Ok(Dispatch::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Cursor;
    use crate::terminal::MemoryTerminal;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Keymap<MemoryTerminal>, Engine<MemoryTerminal>) {
        (Keymap::new(true), Engine::new(MemoryTerminal::new()))
    }

    fn type_keys(keymap: &mut Keymap<MemoryTerminal>, engine: &mut Engine<MemoryTerminal>, keys: &[Key]) {
        for key in keys {
            keymap.handle(*key, engine).unwrap();
        }
    }

    #[test]
    fn test_echo_and_default_bindings() {
        let (mut keymap, mut engine) = setup();
        type_keys(
            &mut keymap,
            &mut engine,
            &[Key::Char('h'), Key::Char('i'), Key::Enter, Key::Char('x'), Key::Up, Key::Right],
        );
        assert_eq!(engine.lines(), ["hi", "x"]);
        assert_eq!(engine.cursor(), Cursor::new(2, 0));

        type_keys(&mut keymap, &mut engine, &[Key::Down, Key::Delete, Key::Left]);
        assert_eq!(engine.lines(), ["hi", ""]);
        assert_eq!(engine.cursor(), Cursor::new(0, 1));
    }

    #[test]
    fn test_echo_off_ignores_unbound_keys() {
        let mut keymap = Keymap::new(false);
        let mut engine = Engine::new(MemoryTerminal::new());
        assert_eq!(keymap.handle(Key::Char('a'), &mut engine).unwrap(), Dispatch::Ignored);
        assert_eq!(engine.contents(), "");
    }

    #[test]
    fn test_unbound_control_keys_are_not_echoed() {
        let (mut keymap, mut engine) = setup();
        assert_eq!(keymap.handle(Key::Ctrl('x'), &mut engine).unwrap(), Dispatch::Ignored);
        assert_eq!(keymap.handle(Key::Tab, &mut engine).unwrap(), Dispatch::Ignored);
        assert_eq!(engine.contents(), "");
    }

    #[test]
    fn test_handler_receives_line_and_column() {
        let (mut keymap, mut engine) = setup();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        keymap
            .on(Keymap::<MemoryTerminal>::INSERT, "ctrl+x", move |engine, line, x| {
                *sink.borrow_mut() = Some((line.to_string(), x));
                engine.delete(x)
            })
            .unwrap();

        engine.write("abc\ndefg").unwrap();
        engine.move_cursor(0, -1).unwrap();
        assert_eq!(keymap.handle(Key::Ctrl('x'), &mut engine).unwrap(), Dispatch::Handled);
        assert_eq!(*seen.borrow(), Some(("defg".to_string(), 3)));
        assert_eq!(engine.lines(), ["abc", "g"]);
    }

    #[test]
    fn test_unknown_key_name_is_rejected() {
        let (mut keymap, _) = setup();
        let err = keymap
            .on(Keymap::<MemoryTerminal>::INSERT, "garbage key", |_, _, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownKey(ref name) if name == "garbage key"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let (mut keymap, _) = setup();
        assert!(matches!(
            keymap.on("normal", "i", |_, _, _| Ok(())),
            Err(Error::UnknownMode(_))
        ));
        assert!(matches!(keymap.set_mode("normal"), Err(Error::UnknownMode(_))));
        assert!(matches!(
            keymap.add_mode("normal", Some("visual")),
            Err(Error::UnknownMode(_))
        ));
        assert_eq!(keymap.active_mode(), "insert");
    }

    #[test]
    fn test_read_mode_pins_the_line() {
        let (mut keymap, mut engine) = setup();
        engine.write("first\nsecond").unwrap();
        keymap.set_mode(Keymap::<MemoryTerminal>::READ).unwrap();
        type_keys(&mut keymap, &mut engine, &[Key::Up, Key::Left, Key::Char('!')]);
        assert_eq!(engine.lines(), ["first", "secon!d"]);
    }

    #[test]
    fn test_parent_chain_fallback() {
        let (mut keymap, mut engine) = setup();
        keymap.add_mode("normal", Some("insert")).unwrap();
        keymap
            .on("normal", "i", |engine, _, _| engine.move_cursor_to_beginning(0))
            .unwrap();
        keymap.set_mode("normal").unwrap();

        engine.write("xyz").unwrap();
        type_keys(&mut keymap, &mut engine, &[Key::Left, Key::Char('i')]);
        assert_eq!(engine.cursor(), Cursor::ORIGIN);
        // Unbound in normal and insert: echoed.
        type_keys(&mut keymap, &mut engine, &[Key::Char('q')]);
        assert_eq!(engine.contents(), "qxyz");
    }

    #[test]
    fn test_parent_cycle_does_not_hang() {
        let (mut keymap, mut engine) = setup();
        keymap.add_mode("a", Some("insert")).unwrap();
        keymap.add_mode("insert", Some("a")).unwrap();
        keymap.set_mode("a").unwrap();
        assert_eq!(keymap.handle(Key::Char('z'), &mut engine).unwrap(), Dispatch::Echoed);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut keymap, _) = setup();
        keymap.add_mode("normal", None).unwrap();
        keymap.set_mode("normal").unwrap();
        keymap.reset();
        assert_eq!(keymap.active_mode(), "insert");
        assert!(!keymap.has_mode("normal"));
        assert!(keymap.has_mode("read"));
    }
}
