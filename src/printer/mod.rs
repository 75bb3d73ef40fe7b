//! Colored terminal output (owo-colors).

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Yellow,
    Red,
    Cyan,
}

pub struct TextPrinter {
    pub color: Option<Color>,
}

impl TextPrinter {
    pub fn render(&self, text: &str) -> String {
        match self.color {
            Some(Color::Green) => text.green().to_string(),
            Some(Color::Yellow) => text.yellow().to_string(),
            Some(Color::Red) => text.red().to_string(),
            Some(Color::Cyan) => text.cyan().to_string(),
            None => text.to_string(),
        }
    }

    pub fn print(&self, text: &str) {
        println!("{}", self.render(text));
    }

    pub fn eprint(&self, text: &str) {
        eprintln!("{}", self.render(text));
    }
}

pub fn note(text: &str) {
    TextPrinter { color: Some(Color::Yellow) }.print(text);
}

pub fn success(text: &str) {
    TextPrinter { color: Some(Color::Green) }.print(text);
}

pub fn heading(text: &str) {
    TextPrinter { color: Some(Color::Cyan) }.print(text);
}

pub fn error(text: &str) {
    TextPrinter { color: Some(Color::Red) }.eprint(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_printer_leaves_text_untouched() {
        assert_eq!(TextPrinter { color: None }.render("Score: 9"), "Score: 9");
    }

    #[test]
    fn colored_text_keeps_content() {
        let out = TextPrinter { color: Some(Color::Red) }.render("boom");
        assert!(out.contains("boom"));
        assert_ne!(out, "boom");
    }
}
