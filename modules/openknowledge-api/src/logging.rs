use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `.env` is loaded first so `RUST_LOG` and
/// `LOG_FORMAT` may live there. `RUST_LOG` refines the default
/// `openknowledge=info`; `LOG_FORMAT=json` switches to JSON lines.
/// Output goes to stderr so `search` can keep stdout for results.
pub fn init() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env().add_directive("openknowledge=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_output() {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn json_output() -> bool {
    std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_can_come_from_env_file() {
        let dir = std::env::temp_dir().join(format!("openknowledge-logging-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let env_file = dir.join(".env");
        std::fs::write(&env_file, "LOG_FORMAT=JSON\n").unwrap();

        dotenvy::from_path_override(&env_file).unwrap();
        assert!(json_output());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
