//! Command text parsing.

/// An inbound bot command. Arguments are carried raw where the handler owns
/// the validation (and the corrective reply text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { ref_token: Option<String> },
    Help,
    Invite,
    Status,
    AddLinks(Vec<String>),
    ShowLinks,
    RemoveLink { arg: Option<String> },
    Leaderboard,
    // Admin
    SetChat { chat: Option<String> },
    SetInterval { arg: Option<String> },
    StartRotation,
    StopRotation,
    Broadcast { text: String },
    GetBackup,
}

impl Command {
    /// Parse `/command arg…` text. Tolerates the `@botname` suffix Telegram
    /// appends in groups. Non-command text yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?;
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "start" => Command::Start { ref_token: args.first().map(|s| s.to_string()) },
            "help" => Command::Help,
            "invite" => Command::Invite,
            "status" => Command::Status,
            "addlinks" => Command::AddLinks(args.iter().map(|s| s.to_string()).collect()),
            "showlinks" => Command::ShowLinks,
            "removelink" => Command::RemoveLink { arg: args.first().map(|s| s.to_string()) },
            "leaderboard" => Command::Leaderboard,
            "setchat" => Command::SetChat { chat: args.first().map(|s| s.to_string()) },
            "setinterval" => Command::SetInterval { arg: args.first().map(|s| s.to_string()) },
            "startrotation" => Command::StartRotation,
            "stoprotation" => Command::StopRotation,
            "broadcast" => Command::Broadcast { text: args.join(" ") },
            "getbackup" => Command::GetBackup,
            _ => return None,
        };
        Some(command)
    }

    /// Commands accepted only from the configured owner identity.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Command::SetChat { .. }
                | Command::SetInterval { .. }
                | Command::StartRotation
                | Command::StopRotation
                | Command::Broadcast { .. }
                | Command::GetBackup
        )
    }
}
