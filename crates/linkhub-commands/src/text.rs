//! User-facing reply text. Kept in one place so wording changes do not
//! touch handler logic.

use linkhub_channels::InlineKeyboard;

pub const WELCOME: &str = "👋 Welcome to LinkHub!\n\n\
📌 Your links are managed and rotated into the target chat automatically.\n\
Start with 5 link slots for FREE.\n\n\
📈 Unlock more slots by inviting friends:\n\
➡️ 20 Invites = 10 slots\n\
➡️ 40 Invites = 20 slots\n\
➡️ 60 Invites = 30 slots\n\n\
Use these commands:\n\
🧩 /addlinks <link1> <link2> ... — Add links (within your limit)\n\
🔗 /invite — Get your referral link to invite users\n\
📊 /status — View your stats\n\
❓ /help — Learn how to use the bot\n\n\
Let's automate your link growth 💫";

pub const HELP_PROMPT: &str = "Choose a topic:";

pub const HELP_GETTING_STARTED: &str = "🚀 Getting Started:\n\
1) Use /invite to get your personal referral link.\n\
2) Share it — when people join via it, you earn invite credits.\n\
3) Use /addlinks to add up to your unlocked slots.\n\
4) The hub rotates links into the target chat automatically.";

pub const HELP_EARNING: &str = "🏆 Earning Slots:\n\
• Start with 5 free slots.\n\
• 20 invites → 10 slots\n\
• 40 invites → 20 slots\n\
• 60 invites → 30 slots\n\
Use /status to check your current invites and limit.";

pub const HELP_COMMANDS: &str = "📚 Commands:\n\
/start — Intro\n\
/invite — Your referral link\n\
/addlinks l1 l2 ... — Add links (within your limit)\n\
/removelink <index> — Remove your link\n\
/showlinks — See your added links\n\
/status — Your stats\n\
/leaderboard — Top inviters\n\
/help — This menu";

pub const USAGE_ADDLINKS: &str = "Usage: /addlinks <link1> <link2> ... (space-separated)";
pub const USAGE_REMOVELINK: &str = "Usage: /removelink <index_from_showlinks>";
pub const USAGE_SETCHAT: &str = "Usage: /setchat <@username or chat_id>";
pub const USAGE_SETINTERVAL: &str = "Usage: /setinterval <minutes>";
pub const USAGE_BROADCAST: &str = "Usage: /broadcast <message>";

pub fn help_keyboard() -> InlineKeyboard {
    InlineKeyboard::new()
        .row("Getting Started", "help_getting_started")
        .row("Earning Slots", "help_earning")
        .row("Commands", "help_commands")
        .row("Contact Admin", "help_admin")
}

pub fn contact_admin(bot_username: &str) -> String {
    format!("Need help? Contact admin: @{bot_username}")
}

pub fn referral_credited(invites: u32, limit: u32) -> String {
    format!(
        "🎉 Good news! You gained 1 invite. Total invites: {invites}. \
         Your slot limit is now {limit}."
    )
}

pub fn invite_link(bot_username: &str, token: &str) -> String {
    format!(
        "🔗 Your referral link:\nhttps://t.me/{bot_username}?start={token}\n\n\
         Share this — each person who joins using it increases your invite count."
    )
}

pub fn quota_reached(limit: u32) -> String {
    format!(
        "⚠️ You have reached your slot limit ({limit}). \
         Invite more users to increase your limit."
    )
}

pub fn links_added(admitted: usize, total: u32) -> String {
    format!("✅ Added {admitted} link(s). Total your links in pool: {total}")
}
