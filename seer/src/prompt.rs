/// The only replies the model is asked to choose from. Each one is understood by
/// [`pilot::translate`].
pub const ALLOWED_REPLIES: [&str; 9] = [
    "Press A",
    "Press B",
    "Move UP",
    "Move DOWN",
    "Move LEFT",
    "Move RIGHT",
    "Open MENU",
    "Close MENU",
    "Select",
];

pub fn system_prompt(game: &str) -> String {
    format!(
        "You are a helpful assistant playing {game}. Only reply with one of: {}.",
        ALLOWED_REPLIES.join(", ")
    )
}

pub fn user_prompt(game: &str, history: &str) -> String {
    let history = if history.trim().is_empty() {
        "(nothing yet)"
    } else {
        history
    };
    format!(
        "You are playing {game}. This is the current screen.\nRecent history:\n{history}\nWhat should the player do next?"
    )
}
