pub mod report;
pub mod scan;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
   ___                                
  / __\_ _  ___ ___  ___  ___ __ _ _ __
 / _\/ _` |/ __/ _ \/ __|/ __/ _` | '_ \
/ / | (_| | (_|  __/\__ \ (_| (_| | | | |
\/   \__,_|\___\___||___/\___\__,_|_| |_|
"#;
    eprintln!("{}", banner.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "RichFaces / JSF / Seam fingerprinting".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
