//! # Templates
//!
//! Exposes the file templates from the `templates/` directory.

pub const PYTHON_SCRIPT: &str = include_str!("../../templates/scaffold/python_script.py");
pub const README: &str = include_str!("../../templates/scaffold/readme.md");
pub const CONFIG_JSON: &str = include_str!("../../templates/scaffold/config.json");
pub const HTML_PAGE: &str = include_str!("../../templates/scaffold/html_page.html");

pub const DEMO_README: &str = include_str!("../../templates/demo/README.md");
pub const DEMO_MAIN: &str = include_str!("../../templates/demo/main.py");
pub const DEMO_UTILS: &str = include_str!("../../templates/demo/utils.py");
pub const DEMO_TEST: &str = include_str!("../../templates/demo/test_main.py");
pub const DEMO_SETTINGS: &str = include_str!("../../templates/demo/settings.json");
pub const DEMO_REQUIREMENTS: &str = include_str!("../../templates/demo/requirements.txt");
pub const DEMO_GITIGNORE: &str = include_str!("../../templates/demo/gitignore");

/// Built-in scaffold templates: (name, file-name pattern, body)
pub const SCAFFOLD: [(&str, &str, &str); 4] = [
    ("python_script", "{name}.py", PYTHON_SCRIPT),
    ("readme", "README.md", README),
    ("config_json", "config.json", CONFIG_JSON),
    ("html_page", "{name}.html", HTML_PAGE),
];

pub const PROJECT_README: &str = include_str!("../../templates/project/readme.md");
pub const PROJECT_MAIN: &str = include_str!("../../templates/project/main.py");
pub const PROJECT_TODO_APP: &str = include_str!("../../templates/project/todo_app.py");
pub const PROJECT_WEB_APP: &str = include_str!("../../templates/project/web_app.py");
pub const PROJECT_TEST: &str = include_str!("../../templates/project/test_main.py");
pub const PROJECT_UI: &str = include_str!("../../templates/project/ui.py");
