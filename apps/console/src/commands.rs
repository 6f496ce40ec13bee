//! Line commands read from stdin.

use shared::domain::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Select(RecordId),
    Save { id: RecordId, username: Option<String> },
    Add,
    Cancel,
    Delete,
    Back,
    Forward,
    More,
    State,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  search [query]          filter the record list
  select <id>             open a record for editing
  save <id> [username]    save a record and select it
  add | cancel | delete   switch views / drop the selection
  back | forward          walk the history
  more                    load the next page of contributors
  state | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let id = |raw: &str| -> Result<RecordId, String> {
        raw.parse::<RecordId>()
            .map_err(|_| format!("expected a numeric record id, got '{raw}'"))
    };

    match verb.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(Command::Search(rest.to_string())),
        "select" | "edit" => id(rest).map(Command::Select),
        "save" => {
            let (raw_id, username) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let username = username.trim();
            Ok(Command::Save {
                id: id(raw_id)?,
                username: (!username.is_empty()).then(|| username.to_string()),
            })
        }
        "add" => Ok(Command::Add),
        "cancel" => Ok(Command::Cancel),
        "delete" => Ok(Command::Delete),
        "back" => Ok(Command::Back),
        "forward" => Ok(Command::Forward),
        "more" => Ok(Command::More),
        "state" | "" => Ok(Command::State),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}
