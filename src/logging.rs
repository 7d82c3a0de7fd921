use std::io::Write;

use log::{LevelFilter, Record};

/// One log line: `[LEVEL:target]message`.
pub fn render(record: &Record) -> String {
    format!("[{}:{}]{}", record.level(), record.target(), record.args())
}

/// Install `env_logger` with the crate's line format.
///
/// `RUST_LOG` wins over the level picked by `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", render(record)))
        .init();
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    #[test]
    fn line_format() {
        assert_eq!(
            render(
                &Record::builder()
                    .args(format_args!("boom"))
                    .level(Level::Debug)
                    .target("test")
                    .build()
            ),
            "[DEBUG:test]boom"
        );
    }
}
