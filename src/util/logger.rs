use log::LevelFilter;

use crate::error::RResult;

/// Turn a `loglevel` config string into a filter. Unknown values get warn.
pub fn parse_level(levelstr: &str) -> LevelFilter {
    match levelstr.to_lowercase().as_ref() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => {
            println!("rsvp: config: bad `loglevel` value (\"{}\"), defaulting to \"warn\"", levelstr);
            LevelFilter::Warn
        }
    }
}

/// Sets up logging to STDOUT via fern/log. Calling this more than once is
/// fine; the first logger wins.
pub fn setup_logger() -> RResult<()> {
    let levelstr: String = config::get_or(&["loglevel"], String::from("warn"));
    let level = parse_level(&levelstr);
    let res = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply();
    match res {
        Ok(_) => {}
        Err(_) => {
            debug!("logger::setup_logger() -- logger already set up, skipping");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(parse_level("INFO"), LevelFilter::Info);
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("loud"), LevelFilter::Warn);
    }

    #[test]
    fn setup_twice() {
        setup_logger().unwrap();
        setup_logger().unwrap();
    }
}
