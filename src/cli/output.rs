//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::auth::{GuardState, Role, RouteRule, User};
use crate::parking::Parking;
use crate::plan::{Plan, PriceQuote};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Spinner shown while the session or a request is in flight
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn format_role(role: &Role) -> String {
    match role {
        Role::SuperAdmin => role.to_string().magenta().to_string(),
        Role::Partner => role.to_string().green().to_string(),
        _ => role.to_string(),
    }
}

/// Format a guard decision as a colored string
pub fn format_guard_state(state: &GuardState) -> String {
    match state {
        GuardState::Allowed => "allowed".green().to_string(),
        GuardState::Loading => "loading".yellow().to_string(),
        GuardState::RedirectForbidden { .. } => state.to_string().red().to_string(),
        GuardState::RedirectLogin { .. } | GuardState::RedirectHome { .. } => {
            state.to_string().yellow().to_string()
        }
    }
}

/// Print the signed-in user
pub fn print_user_detail(user: &User) {
    println!("{}", "Signed in".bold().underline());
    println!();
    println!("  {} {}", "Name:".bold(), user.display_name());
    println!("  {} {}", "Id:".bold(), user.id);
    println!("  {} {}", "Role:".bold(), format_role(&user.role));

    if let Some(phone) = &user.phone {
        println!("  {} {}", "Phone:".bold(), phone);
    }
    if let Some(email) = &user.email {
        println!("  {} {}", "Email:".bold(), email);
    }
}

/// Print the route table
pub fn print_routes_table(rules: &[RouteRule]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Pattern").fg(Color::Cyan),
            Cell::new("Needs auth").fg(Color::Cyan),
            Cell::new("Roles").fg(Color::Cyan),
        ]);

    for rule in rules {
        let roles = if rule.roles.is_empty() {
            "-".to_string()
        } else {
            rule.roles
                .iter()
                .map(Role::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let needs_auth = if rule.needs_auth {
            Cell::new("yes").fg(Color::Yellow)
        } else {
            Cell::new("no")
        };

        table.add_row(vec![Cell::new(rule.pattern), needs_auth, Cell::new(roles)]);
    }

    println!("{table}");
}

/// Print a table of parking lots
pub fn print_parking_table(lots: &[Parking]) {
    if lots.is_empty() {
        info("No parking lots found. Add one with 'parkgate parking add'");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("City").fg(Color::Cyan),
            Cell::new("Price/hr").fg(Color::Cyan),
            Cell::new("Spots").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);

    for lot in lots {
        let status = lot.status.as_deref().unwrap_or("-");
        let status_color = if lot.is_active() {
            Color::Green
        } else {
            Color::Red
        };

        table.add_row(vec![
            Cell::new(lot.id.as_deref().unwrap_or("-")),
            Cell::new(&lot.name),
            Cell::new(&lot.city),
            Cell::new(format!("₹{}", lot.price)),
            Cell::new(lot.spot_count()),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
}

/// Print one parking lot
pub fn print_parking_detail(lot: &Parking) {
    println!("{}", lot.name.bold().underline());
    println!();
    if let Some(id) = &lot.id {
        println!("  {} {}", "Id:".bold(), id);
    }
    println!("  {} {}", "Address:".bold(), lot.address);
    println!("  {} {} {}", "City:".bold(), lot.city, lot.pin_code);
    println!("  {} ₹{}/hr", "Price:".bold(), lot.price);
    println!("  {} {}", "Spots:".bold(), lot.spot_count());

    if let Some(status) = &lot.status {
        let status = if lot.is_active() {
            status.green()
        } else {
            status.red()
        };
        println!("  {} {}", "Status:".bold(), status);
    }
    if let Some(description) = lot.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("  {}", description);
    }
    if let Some(features) = lot.features.as_deref().filter(|f| !f.is_empty()) {
        println!();
        println!("  {}", "Features:".bold());
        for feature in features.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            println!("    - {}", feature);
        }
    }
}

/// Print a price quote
pub fn print_quote(plan: &Plan, quote: &PriceQuote) {
    println!("{}", "Plan quote".bold().underline());
    println!();
    println!("  {} {}", "Slots:".bold(), quote.slots);
    println!("  {} ₹{} per slot", "Price:".bold(), plan.price);
    println!("  {} {}%", "Discount:".bold(), plan.discount);
    println!(
        "  {} {} {}",
        "Total:".bold(),
        format!("₹{}", quote.original).strikethrough().dimmed(),
        format!("₹{}", quote.discounted).green().bold()
    );
}
