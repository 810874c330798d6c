//! Maps the free-text replies of the model onto the Gameboy's inputs.

use derive_more::Display;

/// The eight physical inputs of a Gameboy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Button {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
}

/// The closed set of things a decision can resolve to. Every reply from the model, no matter how
/// garbled, becomes exactly one of these.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
    /// Nothing was recognized, or the model explicitly answered "none".
    #[default]
    NoOp,
}

impl Action {
    /// The button that needs to be pressed to carry out this action, if any.
    pub fn button(self) -> Option<Button> {
        match self {
            Action::A => Some(Button::A),
            Action::B => Some(Button::B),
            Action::Start => Some(Button::Start),
            Action::Select => Some(Button::Select),
            Action::Up => Some(Button::Up),
            Action::Down => Some(Button::Down),
            Action::Left => Some(Button::Left),
            Action::Right => Some(Button::Right),
            Action::NoOp => None,
        }
    }
}

impl From<Button> for Action {
    fn from(button: Button) -> Self {
        match button {
            Button::A => Action::A,
            Button::B => Action::B,
            Button::Start => Action::Start,
            Button::Select => Action::Select,
            Button::Up => Action::Up,
            Button::Down => Action::Down,
            Button::Left => Action::Left,
            Button::Right => Action::Right,
        }
    }
}

/// Translates a raw reply into an action. This never fails; anything that isn't one of the known
/// phrases is a `NoOp`.
///
/// Phrases are compared whole after normalization. A reply that merely contains a phrase (e.g.
/// "B" inside a sentence) is not a match.
pub fn translate(raw: &str) -> Action {
    match normalize(raw).as_str() {
        "A" | "PRESS A" => Action::A,
        "B" | "PRESS B" | "CLOSE MENU" => Action::B,
        "START" | "PRESS START" | "OPEN MENU" => Action::Start,
        "SELECT" | "PRESS SELECT" => Action::Select,
        "UP" | "GO UP" | "MOVE UP" => Action::Up,
        "DOWN" | "GO DOWN" | "MOVE DOWN" => Action::Down,
        "LEFT" | "GO LEFT" | "MOVE LEFT" => Action::Left,
        "RIGHT" | "GO RIGHT" | "MOVE RIGHT" => Action::Right,
        _ => Action::NoOp,
    }
}

/// Upper-cases the reply, collapses runs of whitespace, and strips the list bullets, quotes, and
/// trailing punctuation that chat models like to wrap their answers in.
fn normalize(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c.is_whitespace() || "-*•\"'`".contains(c))
        .trim_end_matches(|c: char| c.is_whitespace() || "\"'`.!".contains(c))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_phrases() {
        for (raw, action) in [
            ("A", Action::A),
            ("Press A", Action::A),
            ("press b", Action::B),
            ("Close MENU", Action::B),
            ("Open MENU", Action::Start),
            ("start", Action::Start),
            ("Select", Action::Select),
            ("Go Up", Action::Up),
            ("Move DOWN", Action::Down),
            ("left", Action::Left),
            ("Move RIGHT", Action::Right),
        ] {
            assert_eq!(translate(raw), action, "{raw:?}");
        }
    }

    #[test]
    fn casing_and_whitespace_do_not_matter() {
        for raw in ["Move RIGHT", "move right", "  MOVE RIGHT  ", "Move\tRIGHT", "MOVE   right\n"] {
            assert_eq!(translate(raw), Action::Right, "{raw:?}");
        }
    }

    #[test]
    fn list_decoration_is_stripped() {
        assert_eq!(translate("- Move LEFT"), Action::Left);
        assert_eq!(translate("\"Press A\""), Action::A);
        assert_eq!(translate("`Open MENU`."), Action::Start);
        assert_eq!(translate("* Move UP!"), Action::Up);
    }

    #[test]
    fn unknown_text_is_a_no_op() {
        for raw in [
            "",
            "NONE",
            "none",
            "banana",
            "[ERROR] inference timed out",
            "I think you should press B to back out",
            "Move diagonally",
            "AB",
        ] {
            assert_eq!(translate(raw), Action::NoOp, "{raw:?}");
        }
    }

    #[test]
    fn actions_round_trip_through_buttons() {
        for button in [
            Button::A,
            Button::B,
            Button::Start,
            Button::Select,
            Button::Up,
            Button::Down,
            Button::Left,
            Button::Right,
        ] {
            assert_eq!(Action::from(button).button(), Some(button));
            assert_eq!(translate(&button.to_string()), Action::from(button));
        }
        assert_eq!(Action::NoOp.button(), None);
        assert_eq!(Action::default(), Action::NoOp);
    }
}
