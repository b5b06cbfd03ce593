use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

/// Environment variable that overrides the log filter.
pub const LOG_ENV_VAR: &str = "SNIPZIP_LOG";

pub fn setup_logger(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose { "warn,snipzip=debug" } else { "warn" };
    let env = Env::default().filter_or(LOG_ENV_VAR, level);

    Builder::from_env(env)
        .format(|buf, record| {
            let level_color = match record.level() {
                Level::Error => "31",
                Level::Warn => "33",
                Level::Info => "32",
                Level::Debug => "36",
                Level::Trace => "35",
            };
            writeln!(
                buf,
                "\x1B[{}m[{}]\x1B[0m {}",
                level_color,
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    #[test]
    fn test_setup_logger() {
        INIT.call_once(|| {
            assert!(setup_logger(false).is_ok());
        });
    }
}
