use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // API keys are deliberately missing from this list
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "OSYNC_HOST",
        "OSYNC_PORT",
        "OSYNC_DATABASE_URL",
        "OSYNC_ERROR_RETRY",
        "OSYNC_ARCHIVE_MIN_AGE_HOURS",
        "OSYNC_ACCEPT_ON_SEND",
        "OSYNC_CREATE_TEMPLATE",
        "OSYNC_EDIT_TEMPLATE",
        "OSYNC_REFURBED_BASE_URL",
        "OSYNC_REFURBED_PAGE_SIZE",
        "OSYNC_TRACKING_URL_TEMPLATE",
        "OSYNC_IDOSELL_BASE_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
