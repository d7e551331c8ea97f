//! # Help Text
//!
//! Help tables for the agent REPL, the permission console and the todo menu.

pub const AGENT: &str = concat!(
    "🤖 ADE Commands\n",
    "┌──────────────────┬──────────────────────────────────────────┐\n",
    "│ /help            │ Show this help                           │\n",
    "│ /mode            │ Toggle autonomous / standard mode        │\n",
    "│ /thoughts        │ Show the autonomous thinking log         │\n",
    "│ /workspace       │ List files in the agent workspace        │\n",
    "│ /clear           │ Clear the thinking log                   │\n",
    "│ remember <text>  │ Save a note to long-term memory          │\n",
    "│ exit, quit       │ Leave ADE                                │\n",
    "└──────────────────┴──────────────────────────────────────────┘\n",
    "\n",
    "Autonomous mode thinks through each request before acting.\n",
    "Standard mode sends the request straight to the agent."
);

pub const PERMISSIONS: &str = concat!(
    "🔐 Permission Manager Commands\n",
    "  check   - Run every permission check\n",
    "  status  - Show the current status table\n",
    "  fix     - Attempt automatic fixes for failing checks\n",
    "  config  - Configure the Gemini API key and model\n",
    "  launch  - Start ADE when no critical issues remain\n",
    "  info    - Show system information\n",
    "  help    - Show this help\n",
    "  exit    - Leave the permission manager"
);

pub const PERMISSION_COMMANDS: [&str; 8] = ["check", "status", "fix", "config", "launch", "info", "help", "exit"];

pub const TODO_MENU: &str = concat!(
    "📝 TODO LIST MANAGER\n",
    "  1. Add todo\n",
    "  2. List pending todos\n",
    "  3. List all todos\n",
    "  4. Complete todo\n",
    "  5. Uncomplete todo\n",
    "  6. Remove todo\n",
    "  7. Clear completed\n",
    "  8. Statistics\n",
    "  0. Quit"
);
