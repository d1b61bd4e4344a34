//! Welcome banner with a two-colour gradient.
//! Uses figlet's bundled standard font.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Chalkboard green (#2e7d32).
const CHALK_GREEN: (u8, u8, u8) = (0x2e, 0x7d, 0x32);
/// Pencil yellow (#fbc02d).
const PENCIL_YELLOW: (u8, u8, u8) = (0xfb, 0xc0, 0x2d);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Figlet art for `text`, or the plain text if the font cannot render it.
fn render(text: &str) -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(text).map(|figure| figure.to_string()))
        .unwrap_or_else(|| text.to_string())
}

/// Prints "TUTOR" as ASCII art shaded from green to yellow, then the version line.
pub fn print_welcome() {
    let mut out = stdout();
    let art = render("TUTOR");
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(CHALK_GREEN, PENCIL_YELLOW, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let version = env!("CARGO_PKG_VERSION");
    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: PENCIL_YELLOW.0,
        g: PENCIL_YELLOW.1,
        b: PENCIL_YELLOW.2,
    }));
    let _ = out.execute(Print(format!("tutor-profiles v{}\r\n", version)));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
