use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `hvm=<level>` is used.
pub fn init(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("hvm={level}")).unwrap_or_else(|_| EnvFilter::new("hvm=info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(default_filter("loud").to_string(), "hvm=info");
        assert_eq!(default_filter("debug").to_string(), "hvm=debug");
    }
}
