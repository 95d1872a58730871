use crate::ui::theme::{theme, Tone};
use crate::ui::Icons;

pub fn header(text: &str) {
    println!("{} {}", Icons::RING, theme().paint(Tone::Heading, text));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, theme().paint(Tone::Label, label), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, theme().paint(Tone::Success, label));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, theme().paint(Tone::Failure, label));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, theme().paint(Tone::Caution, label));
}

pub fn info(label: &str, value: &str) {
    let theme = theme();
    println!(
        "{} {}: {}",
        theme.paint(Tone::Note, Icons::INFO),
        theme.paint(Tone::Label, label),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", theme().paint(Tone::Heading, title));
}

pub fn dim(text: &str) -> String {
    theme().paint(Tone::Label, text)
}

pub fn muted(text: &str) -> String {
    theme().paint(Tone::Aside, text)
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", theme().paint(Tone::Label, label), value);
}
