// Physical input simulation.
//
// All positions arrive screen-normalized (0–1000) and are denormalized against the
// display size enigo reports. Every call runs on a blocking thread with its own
// `Enigo` handle.
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, InputError, Key, Keyboard, Mouse, Settings};

use crate::errors::{DeskPilotError, DeskPilotResult};
use crate::executor::action::ClickKind;

/// Normalized screen position.
pub type NormPoint = (u32, u32);

const CLICK_INTERVAL: Duration = Duration::from_millis(60);
const DRAG_STEPS: u32 = 20;
const DRAG_STEP_DELAY: Duration = Duration::from_millis(15);
const MODIFIER_SETTLE: Duration = Duration::from_millis(30);

/// Low-level mouse and keyboard primitives.
#[async_trait]
pub trait InputDriver: Send + Sync {
    async fn click(&self, at: NormPoint, kind: ClickKind) -> DeskPilotResult<()>;
    async fn move_to(&self, at: NormPoint) -> DeskPilotResult<()>;
    async fn press_and_hold(&self, at: NormPoint, seconds: f64) -> DeskPilotResult<()>;
    async fn drag(&self, from: NormPoint, to: NormPoint) -> DeskPilotResult<()>;
    /// Positive `amount` scrolls up (vertical) or right (horizontal).
    async fn scroll(&self, amount: i32, horizontal: bool) -> DeskPilotResult<()>;
    async fn type_text(&self, text: &str) -> DeskPilotResult<()>;
    async fn press_key(&self, key: &str) -> DeskPilotResult<()>;
    async fn hotkey(&self, keys: &[String]) -> DeskPilotResult<()>;
    async fn hold_key(&self, key: &str, seconds: f64) -> DeskPilotResult<()>;
}

/// Map a key name as the model writes it (`enter`, `ctrl`, `f5`, `a`) to an enigo key.
pub fn parse_key(name: &str) -> Option<Key> {
    let lower = name.trim().to_lowercase();
    let key = match lower.as_str() {
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "backspace" => Key::Backspace,
        "tab" => Key::Tab,
        "space" | "spacebar" => Key::Space,
        "up" | "arrowup" => Key::UpArrow,
        "down" | "arrowdown" => Key::DownArrow,
        "left" | "arrowleft" => Key::LeftArrow,
        "right" | "arrowright" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "delete" | "del" => Key::Delete,
        "ctrl" | "control" => Key::Control,
        "shift" => Key::Shift,
        "alt" | "option" => Key::Alt,
        "win" | "windows" | "super" | "meta" | "cmd" | "command" => Key::Meta,
        "capslock" => Key::CapsLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return None,
            }
        }
    };
    Some(key)
}

fn resolve_key(name: &str) -> DeskPilotResult<Key> {
    parse_key(name).ok_or_else(|| DeskPilotError::Executor(format!("unknown key '{name}'")))
}

/// Normalized → pixel position on a `width`×`height` display.
pub fn denormalize(at: NormPoint, width: i32, height: i32) -> (i32, i32) {
    let scale = |v: u32, extent: i32| -> i32 {
        let extent = extent.max(1);
        let px = (v.min(1000) as f64 / 1000.0 * extent as f64).round() as i32;
        px.clamp(0, extent - 1)
    };
    (scale(at.0, width), scale(at.1, height))
}

fn move_norm(enigo: &mut Enigo, at: NormPoint) -> Result<(), InputError> {
    let (w, h) = enigo.main_display()?;
    let (x, y) = denormalize(at, w, h);
    enigo.move_mouse(x, y, Coordinate::Abs)
}

fn secs(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds.clamp(0.0, 30.0))
}

/// Press `keys` in order, hold for `hold`, release in reverse order.
///
/// Every key that went down is released again, also when a later press or
/// release fails; the first error is returned.
fn press_chord<E>(
    keys: &[Key],
    hold: Duration,
    mut key: impl FnMut(Key, Direction) -> Result<(), E>,
) -> Result<(), E> {
    let mut pressed = 0;
    let mut result = Ok(());
    for k in keys {
        if let Err(e) = key(*k, Direction::Press) {
            result = Err(e);
            break;
        }
        pressed += 1;
    }
    if result.is_ok() && !hold.is_zero() {
        thread::sleep(hold);
    }
    for k in keys[..pressed].iter().rev() {
        if let Err(e) = key(*k, Direction::Release) {
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

/// enigo-backed input; a fresh connection per call.
#[derive(Debug, Default)]
pub struct EnigoDriver;

impl EnigoDriver {
    pub fn new() -> Self {
        Self
    }

    async fn run<F>(&self, op: &'static str, f: F) -> DeskPilotResult<()>
    where
        F: FnOnce(&mut Enigo) -> Result<(), InputError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut enigo = Enigo::new(&Settings::default())
                .map_err(|e| DeskPilotError::Executor(format!("input backend unavailable: {e}")))?;
            f(&mut enigo).map_err(|e| DeskPilotError::Executor(format!("{op}: {e}")))
        })
        .await
        .map_err(|e| DeskPilotError::join(op, e))?
    }
}

#[async_trait]
impl InputDriver for EnigoDriver {
    async fn click(&self, at: NormPoint, kind: ClickKind) -> DeskPilotResult<()> {
        tracing::debug!(x = at.0, y = at.1, ?kind, "click");
        self.run("click", move |e| {
            move_norm(e, at)?;
            let modifier = match kind {
                ClickKind::Shift => Some(Key::Shift),
                ClickKind::Ctrl => Some(Key::Control),
                ClickKind::Alt => Some(Key::Alt),
                _ => None,
            };
            let (button, count) = match kind {
                ClickKind::Right => (Button::Right, 1),
                ClickKind::Middle => (Button::Middle, 1),
                ClickKind::Double => (Button::Left, 2),
                ClickKind::Triple => (Button::Left, 3),
                _ => (Button::Left, 1),
            };
            if let Some(m) = modifier {
                e.key(m, Direction::Press)?;
                thread::sleep(MODIFIER_SETTLE);
            }
            let mut result = Ok(());
            for i in 0..count {
                if i > 0 {
                    thread::sleep(CLICK_INTERVAL);
                }
                result = e.button(button, Direction::Click);
                if result.is_err() {
                    break;
                }
            }
            if let Some(m) = modifier {
                e.key(m, Direction::Release)?;
            }
            result
        })
        .await
    }

    async fn move_to(&self, at: NormPoint) -> DeskPilotResult<()> {
        self.run("move mouse", move |e| move_norm(e, at)).await
    }

    async fn press_and_hold(&self, at: NormPoint, seconds: f64) -> DeskPilotResult<()> {
        self.run("click and hold", move |e| {
            move_norm(e, at)?;
            e.button(Button::Left, Direction::Press)?;
            thread::sleep(secs(seconds));
            e.button(Button::Left, Direction::Release)
        })
        .await
    }

    async fn drag(&self, from: NormPoint, to: NormPoint) -> DeskPilotResult<()> {
        tracing::debug!(?from, ?to, "drag");
        self.run("drag", move |e| {
            let (w, h) = e.main_display()?;
            let (x0, y0) = denormalize(from, w, h);
            let (x1, y1) = denormalize(to, w, h);
            e.move_mouse(x0, y0, Coordinate::Abs)?;
            e.button(Button::Left, Direction::Press)?;
            let mut moved = Ok(());
            for step in 1..=DRAG_STEPS {
                let t = step as f64 / DRAG_STEPS as f64;
                let x = x0 + ((x1 - x0) as f64 * t).round() as i32;
                let y = y0 + ((y1 - y0) as f64 * t).round() as i32;
                moved = e.move_mouse(x, y, Coordinate::Abs);
                if moved.is_err() {
                    break;
                }
                thread::sleep(DRAG_STEP_DELAY);
            }
            // the button comes up even if a move failed
            let released = e.button(Button::Left, Direction::Release);
            moved.and(released)
        })
        .await
    }

    async fn scroll(&self, amount: i32, horizontal: bool) -> DeskPilotResult<()> {
        self.run("scroll", move |e| {
            if horizontal {
                e.scroll(amount, Axis::Horizontal)
            } else {
                // enigo scrolls down for positive lengths
                e.scroll(-amount, Axis::Vertical)
            }
        })
        .await
    }

    async fn type_text(&self, text: &str) -> DeskPilotResult<()> {
        let text = text.to_string();
        self.run("type", move |e| e.text(&text)).await
    }

    async fn press_key(&self, key: &str) -> DeskPilotResult<()> {
        let key = resolve_key(key)?;
        self.run("press", move |e| e.key(key, Direction::Click)).await
    }

    async fn hotkey(&self, keys: &[String]) -> DeskPilotResult<()> {
        let keys = keys.iter().map(|k| resolve_key(k)).collect::<DeskPilotResult<Vec<_>>>()?;
        self.run("hotkey", move |e| press_chord(&keys, MODIFIER_SETTLE, |k, d| e.key(k, d)))
        .await
    }

    async fn hold_key(&self, key: &str, seconds: f64) -> DeskPilotResult<()> {
        let key = resolve_key(key)?;
        self.run("hold key", move |e| press_chord(&[key], secs(seconds), |k, d| e.key(k, d)))
        .await
    }
}
