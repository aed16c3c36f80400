use kielo::RunMetrics;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(grammar: &str, metrics: &RunMetrics, color: bool) {
    let palette = ansi::Palette::new(color);
    eprintln!("\n{}", palette.bold(palette.paint(format!("⚙  Grammar: {grammar}"), ansi::CYAN)));

    eprintln!("\n{}", palette.paint("━━━ Sections ━━━", ansi::GRAY));
    for section in &metrics.sections {
        let status = if section.cap_hit {
            palette.paint("✗ pass cap hit", ansi::YELLOW)
        } else {
            palette.paint(format!("✓ converged in {} passes", section.passes.len()), ansi::GREEN)
        };
        eprintln!("  {} {}", palette.paint(section.kind.label(), ansi::BLUE), status);

        for (idx, pass) in section.passes.iter().enumerate() {
            let counts = format!("fired {}  changed {}", pass.fired, pass.changed);
            let line = format!("    pass {}: {}  {}", idx + 1, counts, palette.dim(format!("{:?}", pass.duration)));
            if pass.changed > 0 {
                eprintln!("{line}");
            } else {
                eprintln!("{}", palette.dim(line));
            }
        }
    }

    eprintln!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    eprintln!(
        "  Total: {}  │  Passes: {}  │  Applications: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.paint(metrics.total_passes().to_string(), ansi::CYAN),
        palette.dim(metrics.rule_applications.to_string()),
    );
    eprintln!();
}
