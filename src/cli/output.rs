//! Output formatting for the CLI

use crate::{pipeline::GameStats, tictactoe::Board};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Print win/draw/loss counts with rates
pub fn print_stats(stats: &GameStats) {
    print_kv("Games", &format_number(stats.total_games));
    print_kv(
        "Wins",
        &format!("{} ({})", format_number(stats.wins), format_rate(stats.win_rate)),
    );
    print_kv(
        "Draws",
        &format!("{} ({})", format_number(stats.draws), format_rate(stats.draw_rate)),
    );
    print_kv(
        "Losses",
        &format!(
            "{} ({})",
            format_number(stats.losses),
            format_rate(stats.loss_rate)
        ),
    );
}

/// Board with empty cells shown as their position numbers
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    for row in 0..3 {
        let cells: Vec<String> = (0..3)
            .map(|col| {
                let pos = row * 3 + col;
                match board.get(pos).mark() {
                    Some(mark) => mark.to_string(),
                    None => pos.to_string(),
                }
            })
            .collect();
        out.push_str(&format!(" {}\n", cells.join(" | ")));
        if row < 2 {
            out.push_str("---+---+---\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_render_board() {
        let board: Board = "O...X....".parse().unwrap();
        let rendered = render_board(&board);
        assert!(rendered.starts_with(" O | 1 | 2\n"));
        assert!(rendered.contains(" 3 | X | 5\n"));
    }
}
