//! Stock brain used when no brain file is configured.

use super::table::ResponseTable;

const RESPONSES: &[(&str, &str)] = &[
    // Greetings
    ("hello", "Hello! How can I help you today?"),
    ("hi", "Hi there! What's up?"),
    ("hey", "Hey! How's it going?"),
    ("good morning", "Good morning! Hope you have a great day!"),
    ("good afternoon", "Good afternoon! How's your day going?"),
    ("good evening", "Good evening! How are you doing?"),
    // Common questions
    ("how are you", "I'm doing great, thanks for asking! How about you?"),
    ("what's up", "Not much, just here to chat with you! What's on your mind?"),
    ("what can you do", "I can chat with you and answer questions based on what I've learned!"),
    ("help", "I'm here to help! Just ask me anything or try saying hello!"),
    // Farewells
    ("bye", "Goodbye! Have a great day!"),
    ("goodbye", "Goodbye! Take care!"),
    ("see you later", "See you later! Have a good one!"),
    ("goodnight", "Goodnight! Sweet dreams!"),
    // Fun
    ("joke", "Why don't scientists trust atoms? Because they make up everything!"),
    ("tell me a joke", "What do you call a fake noodle? An impasta!"),
    ("how's the weather", "I'm not sure about the weather, but I hope it's nice where you are!"),
    ("what's your name", "I'm your friendly Telegram bot! You can call me Bot."),
];

const DEFAULTS: &[&str] = &[
    "I'm not sure how to respond to that. Can you try asking something else?",
    "That's interesting! Tell me more about it.",
    "I don't have a response for that yet, but I'm learning!",
    "Could you rephrase that? I might understand better.",
    "That's a good question! I'm still learning new things.",
];

pub const HELP: &str = "
🤖 *Bot Commands:*
/start - Start the bot
/help - Show this help message
/info - Get bot information
/joke - Get a random joke

💬 *Chat with me:*
Just type anything and I'll try to respond! I can understand:
- Greetings (hello, hi, hey)
- Questions (how are you, what's up)
- Farewells (bye, goodbye)
- And much more!
    ";

const COMMANDS: &[(&str, &str)] = &[
    ("start", "Welcome! I'm your personal chatbot. Type /help to see what I can do!"),
    ("help", HELP),
    (
        "info",
        "I'm a simple chatbot that learns from the responses in my brain file. \
         You can train me by adding more responses!",
    ),
    (
        "joke",
        "Here's a joke for you: Why did the scarecrow win an award? \
         Because he was outstanding in his field!",
    ),
];

/// Build the stock table.
pub fn table() -> ResponseTable {
    let mut table = ResponseTable::from_static(DEFAULTS);
    for (trigger, reply) in RESPONSES {
        table.insert_static(trigger, reply);
    }
    for (name, reply) in COMMANDS {
        table.insert_static_command(name, reply);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_table_shape() {
        let table = table();
        assert_eq!(table.keyed_replies().count(), RESPONSES.len());
        assert_eq!(table.defaults().len(), 5);
        let names: Vec<_> = table.commands().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["start", "help", "info", "joke"]);
    }

    #[test]
    fn help_command_is_verbatim() {
        let table = table();
        assert_eq!(table.resolve_command("help"), HELP);
        assert!(HELP.contains("/joke - Get a random joke"));
    }

    #[test]
    fn greetings_come_first() {
        let table = table();
        let first: Vec<_> = table.triggers().take(4).collect();
        assert_eq!(first, vec!["default", "hello", "hi", "hey"]);
    }
}
