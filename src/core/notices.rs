// User-facing texts

pub const WELCOME: &str = "👋 Welcome to FlirtBot! Let's create your profile.\nHow old are you?";
pub const ASK_GENDER: &str = "What is your gender? (e.g., male, female, non-binary)";
pub const ASK_PREFERENCE: &str = "Who are you interested in chatting with? (e.g., male, female, anyone)";
pub const ASK_LOCATION: &str = "What city or country are you in?";
pub const PROFILE_CREATED: &str = "✅ Profile created! Type /find to meet someone.";
pub const PROFILE_EXISTS: &str = "Your profile is already set up. Type /find to meet someone.";
pub const EMPTY_ANSWER: &str = "Please send a text answer.";

pub const NO_PROFILE: &str = "Please set up your profile first by typing /start";
pub const ALREADY_PAIRED: &str = "You're already in a chat. Type /stop to end it.";
pub const CONNECTED: &str = "✅ Connected. Say hi!";
pub const WAITING: &str = "⏳ Waiting for a partner...";

pub const PARTNER_LEFT: &str = "❌ Your partner has left the chat.";
pub const YOU_LEFT: &str = "❌ You left the chat.";
pub const WITHDRAWN: &str = "You stopped looking for a partner.";
pub const NOT_IN_CHAT: &str = "You're not in a chat.";
pub const NOT_IN_CHAT_HINT: &str = "❗ You're not in a chat. Use /find to get started.";
pub const SEARCH_EXPIRED: &str = "⌛ Nobody matched in time, so we stopped searching. Type /find to try again.";

pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help to see what I can do.";
pub const HELP: &str = "Commands:\n/start - Set up your profile\n/find - Find a partner\n/stop - End chat\n/help - Show help";
