//! Command router — reads and mutates the store under the shared guard,
//! builds replies, and fires best-effort notifications after release.

use std::path::PathBuf;
use std::sync::Arc;

use linkhub_channels::InlineKeyboard;
use linkhub_core::error::LinkHubError;
use linkhub_core::traits::Messenger;
use linkhub_core::types::Identity;
use linkhub_store::SharedHub;

use crate::command::Command;
use crate::text;

/// What goes back to the originating chat.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self { text: text.into(), keyboard: Some(keyboard) }
    }
}

pub struct CommandRouter {
    hub: SharedHub,
    messenger: Arc<dyn Messenger>,
    admin_id: i64,
}

impl CommandRouter {
    pub fn new(hub: SharedHub, messenger: Arc<dyn Messenger>, admin_id: i64) -> Self {
        Self { hub, messenger, admin_id }
    }

    /// Parse and dispatch. `None` means no reply at all (unknown command, or
    /// an admin command from a non-admin identity).
    pub async fn handle_text(&self, who: &Identity, text: &str) -> Option<Reply> {
        let command = Command::parse(text)?;
        self.handle(who, command).await
    }

    pub async fn handle(&self, who: &Identity, command: Command) -> Option<Reply> {
        // Admin commands from anyone else are dropped without a response.
        if command.is_admin() && who.id != self.admin_id {
            return None;
        }

        match command {
            Command::Start { ref_token } => Some(self.start(who, ref_token).await),
            Command::Help => Some(Reply::with_keyboard(text::HELP_PROMPT, text::help_keyboard())),
            Command::Invite => Some(self.invite(who).await),
            Command::Status => Some(self.status(who).await),
            Command::AddLinks(links) => Some(self.add_links(who, links).await),
            Command::ShowLinks => Some(self.show_links(who).await),
            Command::RemoveLink { arg } => Some(self.remove_link(who, arg).await),
            Command::Leaderboard => Some(self.leaderboard().await),
            Command::SetChat { chat } => Some(self.set_chat(chat).await),
            Command::SetInterval { arg } => Some(self.set_interval(arg).await),
            Command::StartRotation => Some(self.start_rotation().await),
            Command::StopRotation => Some(self.stop_rotation().await),
            Command::Broadcast { text } => Some(self.broadcast(text).await),
            Command::GetBackup => self.get_backup().await,
        }
    }

    /// Help topic text for a callback button press.
    pub async fn help_topic(&self, data: &str) -> String {
        match data {
            "help_getting_started" => text::HELP_GETTING_STARTED.into(),
            "help_earning" => text::HELP_EARNING.into(),
            "help_commands" => text::HELP_COMMANDS.into(),
            _ => {
                let bot = self
                    .messenger
                    .bot_username()
                    .await
                    .unwrap_or_else(|_| "admin".into());
                text::contact_admin(&bot)
            }
        }
    }

    // ── User commands ───────────────────────────────────

    async fn start(&self, who: &Identity, ref_token: Option<String>) -> Reply {
        // Record creation and referral credit are one exclusive unit.
        let credit = {
            let mut hub = self.hub.lock().await;
            hub.ensure_user(who);
            ref_token.and_then(|token| hub.credit_referral(&token, who.id))
        };

        // Referrer DM is best-effort and must not roll back the credit.
        if let Some(credit) = credit {
            if let Err(e) = self
                .messenger
                .notify(credit.referrer, &text::referral_credited(credit.invites, credit.limit))
                .await
            {
                tracing::info!("Could not DM referrer {}: {e}", credit.referrer);
            }
        }

        Reply::with_keyboard(text::WELCOME, text::help_keyboard())
    }

    async fn invite(&self, who: &Identity) -> Reply {
        let token = {
            let mut hub = self.hub.lock().await;
            hub.ensure_user(who).token
        };
        match self.messenger.bot_username().await {
            Ok(bot) => Reply::text(text::invite_link(&bot, &token)),
            Err(e) => {
                tracing::warn!("Could not resolve bot username: {e}");
                Reply::text("⚠️ Could not build your referral link right now. Try again later.")
            }
        }
    }

    async fn status(&self, who: &Identity) -> Reply {
        let record = {
            let mut hub = self.hub.lock().await;
            hub.ensure_user(who)
        };
        let interval = record
            .interval
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Default".into());
        Reply::text(format!(
            "📊 Your Stats:\n\
             👤 Username: {}\n\
             🔢 Invites: {}\n\
             🔗 Links added: {}\n\
             🎯 Slot limit: {}\n\
             ⏱ Per-user interval: {interval} minutes",
            who.display(),
            record.invites,
            record.links_added,
            record.limit,
        ))
    }

    async fn add_links(&self, who: &Identity, links: Vec<String>) -> Reply {
        if links.is_empty() {
            return Reply::text(text::USAGE_ADDLINKS);
        }
        let mut hub = self.hub.lock().await;
        match hub.admit_links(who, &links) {
            Ok(outcome) => Reply::text(text::links_added(outcome.admitted, outcome.total_owned)),
            Err(LinkHubError::QuotaExceeded { limit }) => Reply::text(text::quota_reached(limit)),
            Err(e) => {
                tracing::error!("addlinks failed: {e}");
                Reply::text("⚠️ Could not add links. Try again later.")
            }
        }
    }

    async fn show_links(&self, who: &Identity) -> Reply {
        let links = {
            let hub = self.hub.lock().await;
            hub.links_of(who.id)
        };
        if links.is_empty() {
            return Reply::text("You have no links in the pool.");
        }
        let listing = links
            .iter()
            .enumerate()
            .map(|(i, l)| format!("{}. {}", i + 1, l.link))
            .collect::<Vec<_>>()
            .join("\n");
        Reply::text(format!("🔗 Your Links:\n{listing}"))
    }

    async fn remove_link(&self, who: &Identity, arg: Option<String>) -> Reply {
        let Some(arg) = arg else {
            return Reply::text(text::USAGE_REMOVELINK);
        };
        let Ok(index) = arg.parse::<usize>() else {
            return Reply::text("Provide a valid index number.");
        };
        let mut hub = self.hub.lock().await;
        match hub.remove_link(who.id, index) {
            Ok(_) => Reply::text("✅ Link removed."),
            Err(LinkHubError::InvalidIndex) => Reply::text("Invalid index."),
            Err(e) => {
                tracing::error!("removelink failed: {e}");
                Reply::text("Could not remove link.")
            }
        }
    }

    async fn leaderboard(&self) -> Reply {
        let ranked = {
            let hub = self.hub.lock().await;
            hub.leaderboard(10)
        };
        if ranked.is_empty() {
            return Reply::text("No invites yet.");
        }
        let mut listing = String::from("🏆 Top Inviters:\n");
        for (i, (id, record)) in ranked.iter().enumerate() {
            let name = if record.username.is_empty() {
                id.to_string()
            } else {
                format!("@{}", record.username)
            };
            listing.push_str(&format!("{}. {} — {} invites\n", i + 1, name, record.invites));
        }
        Reply::text(listing)
    }

    // ── Admin commands ──────────────────────────────────

    async fn set_chat(&self, chat: Option<String>) -> Reply {
        let Some(chat) = chat else {
            return Reply::text(text::USAGE_SETCHAT);
        };
        let mut hub = self.hub.lock().await;
        hub.set_chat(chat.clone());
        Reply::text(format!("✅ Target chat set to {chat}"))
    }

    async fn set_interval(&self, arg: Option<String>) -> Reply {
        let Some(arg) = arg else {
            return Reply::text(text::USAGE_SETINTERVAL);
        };
        let Ok(minutes) = arg.parse::<u32>() else {
            return Reply::text("Provide integer minutes.");
        };
        let mut hub = self.hub.lock().await;
        match hub.set_interval(minutes) {
            Ok(()) => Reply::text(format!("✅ Interval set to {minutes} minutes")),
            Err(e) => Reply::text(format!("⚠️ {e}")),
        }
    }

    async fn start_rotation(&self) -> Reply {
        let mut hub = self.hub.lock().await;
        match hub.start() {
            Ok(()) => Reply::text("✅ Rotation started (admin)"),
            Err(LinkHubError::Validation(msg)) => Reply::text(msg),
            Err(e) => Reply::text(format!("⚠️ {e}")),
        }
    }

    async fn stop_rotation(&self) -> Reply {
        let mut hub = self.hub.lock().await;
        hub.stop();
        Reply::text("⏹ Rotation stopped (admin)")
    }

    async fn broadcast(&self, message: String) -> Reply {
        if message.trim().is_empty() {
            return Reply::text(text::USAGE_BROADCAST);
        }
        // Snapshot the audience under the lock; fan out after release.
        let users = {
            let hub = self.hub.lock().await;
            hub.user_ids()
        };
        let mut sent = 0usize;
        for user in users {
            let body = format!("📣 Broadcast from admin:\n\n{message}");
            if self.messenger.notify(user, &body).await.is_ok() {
                sent += 1;
            }
        }
        Reply::text(format!("Broadcast sent to {sent} users (attempted)."))
    }

    async fn get_backup(&self) -> Option<Reply> {
        let path: PathBuf = {
            let hub = self.hub.lock().await;
            hub.snapshot_path().to_path_buf()
        };
        match self.messenger.send_document(self.admin_id, &path).await {
            Ok(()) => None, // the document itself is the response
            Err(e) => {
                tracing::warn!("Backup send failed: {e}");
                Some(Reply::text("Failed to send backup file."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linkhub_core::error::Result;
    use linkhub_core::types::UserId;
    use linkhub_store::Hub;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockMessenger {
        notifications: Mutex<Vec<(UserId, String)>>,
    }

    #[async_trait]
    impl Messenger for MockMessenger {
        async fn publish(&self, _target: &str, _text: &str) -> Result<()> {
            Ok(())
        }
        async fn notify(&self, user: UserId, text: &str) -> Result<()> {
            self.notifications.lock().expect("lock").push((user, text.into()));
            Ok(())
        }
        async fn send_document(&self, _user: UserId, _path: &Path) -> Result<()> {
            Ok(())
        }
        async fn bot_username(&self) -> Result<String> {
            Ok("linkhub_bot".into())
        }
    }

    const ADMIN: i64 = 999;

    fn fixture() -> (CommandRouter, Arc<MockMessenger>, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let hub = Hub::open(dir.path().join("data.json"), 30)
            .expect("open")
            .into_shared();
        let messenger = Arc::new(MockMessenger::default());
        let router = CommandRouter::new(hub, messenger.clone(), ADMIN);
        (router, messenger, dir)
    }

    fn user(id: i64) -> Identity {
        Identity::new(id, Some(format!("user{id}")))
    }

    #[tokio::test]
    async fn test_admin_commands_silently_dropped_for_non_admin() {
        let (router, _messenger, _dir) = fixture();
        assert!(router.handle_text(&user(1), "/startrotation").await.is_none());
        assert!(router.handle_text(&user(1), "/setchat @pool").await.is_none());
        assert!(router.handle_text(&user(1), "/broadcast hi").await.is_none());
    }

    #[tokio::test]
    async fn test_start_with_referral_notifies_referrer() {
        let (router, messenger, _dir) = fixture();
        let reply = router.handle_text(&user(1), "/start").await.expect("reply");
        assert!(reply.keyboard.is_some());

        let invite = router.handle_text(&user(1), "/invite").await.expect("invite");
        let token = invite
            .text
            .split("?start=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("token in link");

        router
            .handle_text(&user(2), &format!("/start {token}"))
            .await
            .expect("joined");

        let notes = messenger.notifications.lock().expect("lock");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, 1);
        assert!(notes[0].1.contains("Total invites: 1"));
    }

    #[tokio::test]
    async fn test_self_referral_not_credited() {
        let (router, messenger, _dir) = fixture();
        let invite = router.handle_text(&user(1), "/invite").await.expect("invite");
        let token = invite.text.split("?start=").nth(1).expect("token").trim();
        let token = token.split_whitespace().next().expect("token");

        router
            .handle_text(&user(1), &format!("/start {token}"))
            .await
            .expect("reply");
        assert!(messenger.notifications.lock().expect("lock").is_empty());

        let status = router.handle_text(&user(1), "/status").await.expect("status");
        assert!(status.text.contains("Invites: 0"));
    }

    #[tokio::test]
    async fn test_addlinks_flow_and_quota_reply() {
        let (router, _messenger, _dir) = fixture();
        let reply = router
            .handle_text(&user(1), "/addlinks a b c d e f g")
            .await
            .expect("reply");
        assert!(reply.text.contains("Added 5 link(s)"));

        let reply = router.handle_text(&user(1), "/addlinks extra").await.expect("reply");
        assert!(reply.text.contains("slot limit (5)"));

        let reply = router.handle_text(&user(1), "/addlinks").await.expect("reply");
        assert!(reply.text.starts_with("Usage:"));
    }

    #[tokio::test]
    async fn test_showlinks_and_removelink() {
        let (router, _messenger, _dir) = fixture();
        let reply = router.handle_text(&user(1), "/showlinks").await.expect("reply");
        assert_eq!(reply.text, "You have no links in the pool.");

        router.handle_text(&user(1), "/addlinks l1 l2").await.expect("add");
        let reply = router.handle_text(&user(1), "/showlinks").await.expect("reply");
        assert!(reply.text.contains("1. l1"));
        assert!(reply.text.contains("2. l2"));

        let reply = router.handle_text(&user(1), "/removelink x").await.expect("reply");
        assert_eq!(reply.text, "Provide a valid index number.");
        let reply = router.handle_text(&user(1), "/removelink 5").await.expect("reply");
        assert_eq!(reply.text, "Invalid index.");
        let reply = router.handle_text(&user(1), "/removelink 1").await.expect("reply");
        assert_eq!(reply.text, "✅ Link removed.");
    }

    #[tokio::test]
    async fn test_admin_rotation_controls() {
        let (router, _messenger, _dir) = fixture();
        let admin = Identity::new(ADMIN, Some("admin".into()));

        let reply = router.handle_text(&admin, "/startrotation").await.expect("reply");
        assert!(reply.text.contains("Set target chat first"));

        router.handle_text(&admin, "/setchat @pool").await.expect("setchat");
        let reply = router.handle_text(&admin, "/startrotation").await.expect("reply");
        assert!(reply.text.contains("Rotation started"));

        let reply = router.handle_text(&admin, "/startrotation").await.expect("reply");
        assert!(reply.text.contains("already running"));

        let reply = router.handle_text(&admin, "/stoprotation").await.expect("reply");
        assert!(reply.text.contains("Rotation stopped"));

        let reply = router.handle_text(&admin, "/setinterval 45").await.expect("reply");
        assert!(reply.text.contains("45 minutes"));
        let reply = router.handle_text(&admin, "/setinterval abc").await.expect("reply");
        assert_eq!(reply.text, "Provide integer minutes.");
    }

    #[tokio::test]
    async fn test_broadcast_counts_recipients() {
        let (router, messenger, _dir) = fixture();
        router.handle_text(&user(1), "/start").await.expect("u1");
        router.handle_text(&user(2), "/start").await.expect("u2");

        let admin = Identity::new(ADMIN, None);
        let reply = router.handle_text(&admin, "/broadcast big news").await.expect("reply");
        assert!(reply.text.contains("2 users"));

        let notes = messenger.notifications.lock().expect("lock");
        assert!(notes.iter().all(|(_, t)| t.contains("big news")));
    }

    #[tokio::test]
    async fn test_help_topics() {
        let (router, _messenger, _dir) = fixture();
        assert!(router.help_topic("help_earning").await.contains("20 invites"));
        assert!(router.help_topic("help_admin").await.contains("@linkhub_bot"));
    }
}
