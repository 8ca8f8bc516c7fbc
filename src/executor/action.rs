//! `ACTION: NAME(args)` grammar.
//!
//! One line of model output becomes one [`ParsedAction`]. Names are looked up in a
//! static command table; every coordinate-bearing name also accepts an `_ABS`
//! suffix, which marks its coordinates as already screen-normalized.
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Which space an action's coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSpace {
    /// Normalized against the image the model saw; mapped through the capture context.
    Image,
    /// Normalized against the full screen (`_ABS` actions).
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionPoint {
    pub x: f64,
    pub y: f64,
    pub space: CoordSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Double,
    Triple,
    Right,
    Middle,
    Shift,
    Ctrl,
    Alt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionCommand {
    Click { at: ActionPoint, kind: ClickKind },
    MoveMouse { at: ActionPoint },
    ClickAndHold { at: ActionPoint, seconds: f64 },
    Drag { from: ActionPoint, to: ActionPoint },
    /// Positive scrolls up.
    Scroll { amount: i32 },
    ScrollAt { at: ActionPoint, amount: i32 },
    /// Positive scrolls right.
    HorizontalScroll { amount: i32 },
    Type { text: String },
    TypeUnicode { text: String },
    Press { key: String },
    Hotkey { keys: Vec<String> },
    HoldKey { key: String, seconds: f64 },
    ClearField { at: ActionPoint },
    Copy,
    Paste,
    SetClipboard { text: String },
    OpenApp { name: String },
    MaximizeWindow,
    Shell { command: String },
    Wait { seconds: f64 },
    Done,
    Unrecognized { name: String, args: Vec<String> },
}

/// Broad category of an action, used for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Pointer,
    Typing,
    Scrolling,
    Waiting,
    Other,
}

impl ActionCommand {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionCommand::Click { .. }
            | ActionCommand::ClickAndHold { .. }
            | ActionCommand::Drag { .. }
            | ActionCommand::ClearField { .. } => ActionKind::Pointer,
            ActionCommand::Type { .. } | ActionCommand::TypeUnicode { .. } => ActionKind::Typing,
            ActionCommand::Scroll { .. }
            | ActionCommand::ScrollAt { .. }
            | ActionCommand::HorizontalScroll { .. } => ActionKind::Scrolling,
            ActionCommand::Wait { .. } => ActionKind::Waiting,
            _ => ActionKind::Other,
        }
    }
}

/// A parsed line: the name as written (upper-cased) plus the typed command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    pub name: String,
    pub command: ActionCommand,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionParseError {
    #[error("Could not parse action: {0}")]
    Malformed(String),

    #[error("Invalid arguments for {name}: expected {expected}, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Invalid argument for {name}: {value:?} is not a valid {kind}")]
    BadArgument {
        name: String,
        value: String,
        kind: &'static str,
    },
}

// ── Command table ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Normalized coordinate (0–1000).
    Coord,
    Int,
    Seconds,
    /// Free text; as the last parameter it absorbs surplus arguments.
    Text,
    Key,
    /// Variadic list of keys.
    Keys,
}

impl ArgKind {
    fn label(self) -> &'static str {
        match self {
            ArgKind::Coord => "coordinate",
            ArgKind::Int => "integer",
            ArgKind::Seconds => "duration",
            ArgKind::Text => "text",
            ArgKind::Key => "key",
            ArgKind::Keys => "key list",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ArgValue {
    Num(f64),
    Text(String),
    Keys(Vec<String>),
}

struct Args {
    values: Vec<ArgValue>,
    space: CoordSpace,
}

impl Args {
    fn num(&self, i: usize, default: f64) -> f64 {
        match self.values.get(i) {
            Some(ArgValue::Num(n)) => *n,
            _ => default,
        }
    }

    fn int(&self, i: usize) -> i32 {
        self.num(i, 0.0).round() as i32
    }

    fn text(&self, i: usize) -> String {
        match self.values.get(i) {
            Some(ArgValue::Text(t)) => t.clone(),
            _ => String::new(),
        }
    }

    fn keys(&self, i: usize) -> Vec<String> {
        match self.values.get(i) {
            Some(ArgValue::Keys(k)) => k.clone(),
            _ => Vec::new(),
        }
    }

    fn point(&self, i: usize) -> ActionPoint {
        ActionPoint {
            x: self.num(i, 0.0),
            y: self.num(i + 1, 0.0),
            space: self.space,
        }
    }
}

pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub params: &'static [ArgKind],
    /// Leading parameters that must be present; the rest take defaults.
    pub required: usize,
    /// Number of coordinate arguments routed through the mapper.
    pub coordinate_args: usize,
    build: fn(&Args) -> ActionCommand,
}

impl CommandSpec {
    fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

const XY: &[ArgKind] = &[ArgKind::Coord, ArgKind::Coord];

macro_rules! click {
    ($name:literal, $kind:expr) => {
        CommandSpec {
            name: $name,
            aliases: &[],
            params: XY,
            required: 2,
            coordinate_args: 2,
            build: |a| ActionCommand::Click { at: a.point(0), kind: $kind },
        }
    };
}

static COMMANDS: &[CommandSpec] = &[
    click!("CLICK", ClickKind::Left),
    click!("DOUBLE_CLICK", ClickKind::Double),
    click!("TRIPLE_CLICK", ClickKind::Triple),
    click!("RIGHT_CLICK", ClickKind::Right),
    click!("MIDDLE_CLICK", ClickKind::Middle),
    click!("SHIFT_CLICK", ClickKind::Shift),
    click!("CTRL_CLICK", ClickKind::Ctrl),
    click!("ALT_CLICK", ClickKind::Alt),
    CommandSpec {
        name: "MOVE_MOUSE",
        aliases: &[],
        params: XY,
        required: 2,
        coordinate_args: 2,
        build: |a| ActionCommand::MoveMouse { at: a.point(0) },
    },
    CommandSpec {
        name: "CLICK_AND_HOLD",
        aliases: &[],
        params: &[ArgKind::Coord, ArgKind::Coord, ArgKind::Seconds],
        required: 2,
        coordinate_args: 2,
        build: |a| ActionCommand::ClickAndHold { at: a.point(0), seconds: a.num(2, 1.0) },
    },
    CommandSpec {
        name: "DRAG",
        aliases: &[],
        params: &[ArgKind::Coord, ArgKind::Coord, ArgKind::Coord, ArgKind::Coord],
        required: 4,
        coordinate_args: 4,
        build: |a| ActionCommand::Drag { from: a.point(0), to: a.point(2) },
    },
    CommandSpec {
        name: "SCROLL",
        aliases: &[],
        params: &[ArgKind::Int],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Scroll { amount: a.int(0) },
    },
    CommandSpec {
        name: "SCROLL_AT",
        aliases: &[],
        params: &[ArgKind::Coord, ArgKind::Coord, ArgKind::Int],
        required: 3,
        coordinate_args: 2,
        build: |a| ActionCommand::ScrollAt { at: a.point(0), amount: a.int(2) },
    },
    CommandSpec {
        name: "HORIZONTAL_SCROLL",
        aliases: &[],
        params: &[ArgKind::Int],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::HorizontalScroll { amount: a.int(0) },
    },
    CommandSpec {
        name: "TYPE",
        aliases: &[],
        params: &[ArgKind::Text],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Type { text: a.text(0) },
    },
    CommandSpec {
        name: "TYPE_UNICODE",
        aliases: &[],
        params: &[ArgKind::Text],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::TypeUnicode { text: a.text(0) },
    },
    CommandSpec {
        name: "PRESS",
        aliases: &[],
        params: &[ArgKind::Key],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Press { key: a.text(0) },
    },
    CommandSpec {
        name: "HOTKEY",
        aliases: &[],
        params: &[ArgKind::Keys],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Hotkey { keys: a.keys(0) },
    },
    CommandSpec {
        name: "HOLD_KEY",
        aliases: &[],
        params: &[ArgKind::Key, ArgKind::Seconds],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::HoldKey { key: a.text(0), seconds: a.num(1, 0.5) },
    },
    CommandSpec {
        name: "CLEAR_FIELD",
        aliases: &[],
        params: XY,
        required: 2,
        coordinate_args: 2,
        build: |a| ActionCommand::ClearField { at: a.point(0) },
    },
    CommandSpec {
        name: "COPY",
        aliases: &[],
        params: &[],
        required: 0,
        coordinate_args: 0,
        build: |_| ActionCommand::Copy,
    },
    CommandSpec {
        name: "PASTE",
        aliases: &[],
        params: &[],
        required: 0,
        coordinate_args: 0,
        build: |_| ActionCommand::Paste,
    },
    CommandSpec {
        name: "SET_CLIPBOARD",
        aliases: &[],
        params: &[ArgKind::Text],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::SetClipboard { text: a.text(0) },
    },
    CommandSpec {
        name: "OPEN_APP",
        aliases: &[],
        params: &[ArgKind::Text],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::OpenApp { name: a.text(0) },
    },
    CommandSpec {
        name: "MAXIMIZE_WINDOW",
        aliases: &["MAXIMIZE", "MAXIMIZE_ACTIVE_WINDOW"],
        params: &[],
        required: 0,
        coordinate_args: 0,
        build: |_| ActionCommand::MaximizeWindow,
    },
    CommandSpec {
        name: "SHELL",
        aliases: &[],
        params: &[ArgKind::Text],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Shell { command: a.text(0) },
    },
    CommandSpec {
        name: "WAIT",
        aliases: &[],
        params: &[ArgKind::Seconds],
        required: 1,
        coordinate_args: 0,
        build: |a| ActionCommand::Wait { seconds: a.num(0, 0.0) },
    },
];

/// Look up a command by its canonical name or an alias (upper-case, no `_ABS`).
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.matches(name))
}

// ── Line parsing ────────────────────────────────────────────────────────────

fn action_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)ACTION:\s*(\w+)\s*\((.*)\)").ok())
        .as_ref()
}

fn done_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bDONE\b").ok()).as_ref()
}

/// Drop quoted spans so argument text never reads as a marker.
fn without_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    for ch in text.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None => out.push(ch),
        }
    }
    out
}

/// True for an `ACTION:` line carrying a standalone `DONE` token outside quoted
/// arguments, however the rest of the line is formatted. `ACTION: **DONE**` and
/// `ACTION: TYPE('hi') DONE` are terminal; `TYPE('done')` is not.
pub fn is_done_line(line: &str) -> bool {
    let line = line.trim();
    let Some(prefix) = line.get(..7) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("ACTION:") {
        return false;
    }
    done_regex().is_some_and(|re| re.is_match(&without_quoted(&line[7..])))
}

/// Split on commas that are not inside double quotes. Parts are returned raw.
pub fn split_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in raw.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn clean_arg(raw: &str) -> String {
    raw.trim().trim_matches('\'').trim_matches('"').to_string()
}

fn parse_number(name: &str, raw: &str, kind: ArgKind) -> Result<f64, ActionParseError> {
    let value = clean_arg(raw);
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ActionParseError::BadArgument {
            name: name.to_string(),
            value,
            kind: kind.label(),
        })
}

/// Parse a single `ACTION:` line.
pub fn parse_action_line(line: &str) -> Result<ParsedAction, ActionParseError> {
    if is_done_line(line) {
        return Ok(ParsedAction {
            name: "DONE".into(),
            command: ActionCommand::Done,
        });
    }

    let caps = action_regex()
        .and_then(|re| re.captures(line))
        .ok_or_else(|| ActionParseError::Malformed(line.trim().to_string()))?;
    let name = caps[1].to_uppercase();
    let raw_args = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let parts = split_args(raw_args);

    let (base, space) = match name.strip_suffix("_ABS") {
        Some(base) => (base, CoordSpace::Screen),
        None => (name.as_str(), CoordSpace::Image),
    };

    let spec = match lookup(base) {
        Some(spec) if space == CoordSpace::Image || spec.coordinate_args > 0 => spec,
        _ => {
            return Ok(ParsedAction {
                command: ActionCommand::Unrecognized {
                    name: name.clone(),
                    args: parts.iter().map(|p| clean_arg(p)).collect(),
                },
                name,
            })
        }
    };

    let values = convert_args(&name, spec, parts)?;
    let command = (spec.build)(&Args { values, space });
    Ok(ParsedAction { name, command })
}

fn convert_args(
    name: &str,
    spec: &CommandSpec,
    mut parts: Vec<String>,
) -> Result<Vec<ArgValue>, ActionParseError> {
    let arity_error = |got: usize| ActionParseError::Arity {
        name: name.to_string(),
        expected: if spec.required == spec.params.len() {
            spec.params.len().to_string()
        } else {
            format!("{}..={}", spec.required, spec.params.len())
        },
        got,
    };

    let variadic = spec.params.last() == Some(&ArgKind::Keys);
    let absorbs_text = spec.params.last() == Some(&ArgKind::Text);

    if parts.len() < spec.required {
        return Err(arity_error(parts.len()));
    }
    if parts.len() > spec.params.len() {
        if absorbs_text {
            let keep = spec.params.len() - 1;
            let tail = parts.split_off(keep).join(",");
            parts.push(tail);
        } else if !variadic {
            return Err(arity_error(parts.len()));
        }
    }

    let mut values = Vec::with_capacity(spec.params.len());
    for (i, kind) in spec.params.iter().enumerate() {
        let Some(raw) = parts.get(i) else {
            break;
        };
        let value = match kind {
            ArgKind::Coord | ArgKind::Int | ArgKind::Seconds => {
                ArgValue::Num(parse_number(name, raw, *kind)?)
            }
            ArgKind::Text | ArgKind::Key => ArgValue::Text(clean_arg(raw)),
            ArgKind::Keys => {
                let keys: Vec<String> = parts[i..]
                    .iter()
                    .map(|p| clean_arg(p))
                    .filter(|k| !k.is_empty())
                    .collect();
                if keys.is_empty() {
                    return Err(arity_error(0));
                }
                ArgValue::Keys(keys)
            }
        };
        values.push(value);
    }
    Ok(values)
}

// ── Reply-level plan ────────────────────────────────────────────────────────

/// The action lines of one model reply, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionPlan {
    /// Trimmed `ACTION:` lines including any DONE line.
    pub lines: Vec<String>,
    pub done: bool,
    /// Newline-joined non-DONE action lines; empty when the reply had no actions.
    pub signature: String,
}

impl ActionPlan {
    pub fn from_reply(reply: &str) -> Self {
        let lines: Vec<String> = reply
            .lines()
            .map(str::trim)
            .filter(|l| l.to_uppercase().starts_with("ACTION:"))
            .map(str::to_string)
            .collect();
        let done = lines.iter().any(|l| is_done_line(l));
        let signature = lines
            .iter()
            .filter(|l| !is_done_line(l))
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        Self { lines, done, signature }
    }

    pub fn action_count(&self) -> usize {
        self.lines.iter().filter(|l| !is_done_line(l)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ActionCommand {
        parse_action_line(line).unwrap().command
    }

    fn img(x: f64, y: f64) -> ActionPoint {
        ActionPoint { x, y, space: CoordSpace::Image }
    }

    #[test]
    fn regex_compiles() {
        assert!(action_regex().unwrap().is_match("ACTION: CLICK(1, 2)"));
    }

    #[test]
    fn quoted_commas_stay_in_one_argument() {
        assert_eq!(parse(r#"ACTION: TYPE("hello, world")"#), ActionCommand::Type { text: "hello, world".into() });
    }

    #[test]
    fn surplus_arguments_are_absorbed_by_trailing_text() {
        assert_eq!(parse("ACTION: TYPE('a, b')"), ActionCommand::Type { text: "a, b".into() });
        assert_eq!(
            parse("ACTION: SHELL('echo 1,2,3')"),
            ActionCommand::Shell { command: "echo 1,2,3".into() }
        );
    }

    #[test]
    fn hotkey_keys_are_unquoted() {
        assert_eq!(
            parse("ACTION: HOTKEY('ctrl','shift','esc')"),
            ActionCommand::Hotkey { keys: vec!["ctrl".into(), "shift".into(), "esc".into()] }
        );
    }

    #[test]
    fn keyword_and_name_are_case_insensitive() {
        let parsed = parse_action_line("action: double_click(10, 20)").unwrap();
        assert_eq!(parsed.name, "DOUBLE_CLICK");
        assert_eq!(parsed.command, ActionCommand::Click { at: img(10.0, 20.0), kind: ClickKind::Double });
    }

    #[test]
    fn abs_suffix_switches_coordinate_space() {
        let cmd = parse("ACTION: DRAG_ABS(1, 2, 3, 4)");
        let abs = |x, y| ActionPoint { x, y, space: CoordSpace::Screen };
        assert_eq!(cmd, ActionCommand::Drag { from: abs(1.0, 2.0), to: abs(3.0, 4.0) });
        // no coordinates, no _ABS variant
        assert!(matches!(parse("ACTION: TYPE_ABS('x')"), ActionCommand::Unrecognized { .. }));
    }

    #[test]
    fn optional_durations_take_defaults() {
        assert_eq!(
            parse("ACTION: CLICK_AND_HOLD(5, 6)"),
            ActionCommand::ClickAndHold { at: img(5.0, 6.0), seconds: 1.0 }
        );
        assert_eq!(
            parse("ACTION: HOLD_KEY('shift')"),
            ActionCommand::HoldKey { key: "shift".into(), seconds: 0.5 }
        );
        assert_eq!(
            parse("ACTION: HOLD_KEY('shift', 2)"),
            ActionCommand::HoldKey { key: "shift".into(), seconds: 2.0 }
        );
    }

    #[test]
    fn empty_parens_and_aliases() {
        assert_eq!(parse("ACTION: COPY()"), ActionCommand::Copy);
        assert_eq!(parse("ACTION: MAXIMIZE()"), ActionCommand::MaximizeWindow);
        assert_eq!(parse("ACTION: MAXIMIZE_ACTIVE_WINDOW()"), ActionCommand::MaximizeWindow);
    }

    #[test]
    fn done_is_recognised_even_when_malformed() {
        assert_eq!(parse("ACTION: DONE"), ActionCommand::Done);
        assert_eq!(parse("  action: done."), ActionCommand::Done);
        assert_eq!(parse("ACTION: DONE()"), ActionCommand::Done);
        assert!(!is_done_line("ACTION: TYPE('done')"));
        assert!(!is_done_line("ACTION: DONE_LATER(1)"));
        assert!(!is_done_line("DONE"));
    }

    #[test]
    fn done_survives_markdown_and_trailing_text() {
        for line in [
            "ACTION: **DONE**",
            "ACTION: `DONE`",
            "ACTION: [DONE]",
            "ACTION: TYPE('hi') DONE",
            "ACTION: Task complete - done.",
        ] {
            assert!(is_done_line(line), "{line}");
            assert_eq!(parse(line), ActionCommand::Done, "{line}");
        }
        assert!(!is_done_line("ACTION: TYPE(\"all done\")"));
        assert!(!is_done_line("ACTION: TYPE('it''s done')"));
        assert!(!is_done_line("ACTION: UNDONE()"));
    }

    #[test]
    fn wrapped_done_is_kept_out_of_signature() {
        let plan = ActionPlan::from_reply("ACTION: CLICK(500, 500)\nACTION: **DONE**");
        assert!(plan.done);
        assert_eq!(plan.action_count(), 1);
        assert_eq!(plan.signature, "ACTION: CLICK(500, 500)");
    }

    #[test]
    fn unknown_names_are_preserved() {
        assert_eq!(
            parse("ACTION: FLY(1, 'up')"),
            ActionCommand::Unrecognized { name: "FLY".into(), args: vec!["1".into(), "up".into()] }
        );
    }

    #[test]
    fn malformed_and_bad_arguments_are_errors() {
        let err = parse_action_line("ACTION: CLICK 5 5").unwrap_err();
        assert_eq!(err.to_string(), "Could not parse action: ACTION: CLICK 5 5");

        let err = parse_action_line("ACTION: CLICK(5)").unwrap_err();
        assert!(matches!(err, ActionParseError::Arity { ref name, got: 1, .. } if name == "CLICK"));

        let err = parse_action_line("ACTION: SCROLL(lots)").unwrap_err();
        assert!(err.to_string().contains("SCROLL"));

        assert!(parse_action_line("ACTION: CLICK(1, 2, 3)").is_err());
    }

    #[test]
    fn plan_collects_actions_and_signature() {
        let reply = "REASONING: open it\nACTION: OPEN_APP('notepad')\n  ACTION: WAIT(0.5)  \nACTION: DONE\nsome trailing text";
        let plan = ActionPlan::from_reply(reply);
        assert_eq!(plan.lines.len(), 3);
        assert!(plan.done);
        assert_eq!(plan.action_count(), 2);
        assert_eq!(plan.signature, "ACTION: OPEN_APP('notepad')\nACTION: WAIT(0.5)");
    }

    #[test]
    fn reply_without_actions_has_empty_signature() {
        let plan = ActionPlan::from_reply("REASONING: nothing to do yet");
        assert!(plan.lines.is_empty());
        assert!(plan.signature.is_empty());
        assert!(!plan.done);
    }

    #[test]
    fn command_kinds() {
        assert_eq!(parse("ACTION: SCROLL_AT(1,2,3)").kind(), ActionKind::Scrolling);
        assert_eq!(parse("ACTION: TYPE_UNICODE('é')").kind(), ActionKind::Typing);
        assert_eq!(parse("ACTION: DRAG(1,2,3,4)").kind(), ActionKind::Pointer);
        assert_eq!(parse("ACTION: WAIT(1)").kind(), ActionKind::Waiting);
        assert_eq!(parse("ACTION: PRESS('enter')").kind(), ActionKind::Other);
    }
}
