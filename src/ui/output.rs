use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::config::fields;
use crate::config::secrets::SecretRegistry;
use crate::config::Settings;

fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

/// Section banner, e.g. `── INSTALL ──`.
pub fn header(title: &str) {
    println!();
    if use_color() {
        println!("  {} {} {}", "──".dimmed(), title.bold().cyan(), "──".dimmed());
    } else {
        println!("  ── {} ──", title);
    }
    println!();
}

pub fn success(msg: &str) {
    if use_color() {
        println!("  {} {}", "✓".green(), msg);
    } else {
        println!("  ✓ {}", msg);
    }
}

pub fn warn(msg: &str) {
    if use_color() {
        println!("  {} {}", "!".yellow().bold(), msg.yellow());
    } else {
        println!("  ! {}", msg);
    }
}

pub fn info(msg: &str) {
    println!("  {}", msg);
}

/// Echo a command before it streams its own output.
pub fn command_line(cmd: &str) {
    if use_color() {
        println!("  {} {}", "$".dimmed(), cmd.bold());
    } else {
        println!("  $ {}", cmd);
    }
}

/// Render the persisted settings as a two-column table. Values of secret
/// fields, and any value embedding one (such as the connection URL), are
/// masked.
pub fn settings_table(settings: &Settings) -> String {
    let mut secrets = SecretRegistry::new();
    for (key, value) in settings {
        if fields::find(key).is_some_and(|f| f.secret) {
            secrets.track(value);
        }
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Setting").set_alignment(CellAlignment::Left),
        Cell::new("Value").set_alignment(CellAlignment::Left),
    ]);
    for (key, value) in settings {
        let shown = if value.is_empty() {
            "-".to_string()
        } else {
            secrets.mask_value(value)
        };
        table.add_row(vec![Cell::new(key), Cell::new(shown)]);
    }
    table.to_string()
}

pub fn print_settings_summary(settings: &Settings) {
    if settings.is_empty() {
        return;
    }
    println!();
    if use_color() {
        println!("  {}", "Settings".bold());
    } else {
        println!("  Settings");
    }
    for line in settings_table(settings).lines() {
        println!("  {}", line);
    }
    println!();
}
